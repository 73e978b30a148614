//! Lifecycle Tests - Inhibit Scope, Idle Ticks, and Thread Teardown

mod common;

use common::{fixnum, GcFixture};
use igc::{IgcConfig, GenerationSpec};

fn small_config() -> IgcConfig {
    IgcConfig {
        generations: vec![
            GenerationSpec::new(common::TEST_GENERATION_KB, 0.8),
            GenerationSpec::new(common::TEST_GENERATION_KB * 4, 0.4),
        ],
        ..Default::default()
    }
}

#[test]
fn on_idle_is_cheap_and_harmless_with_nothing_requested() {
    let fixture = GcFixture::with_config(small_config());
    fixture.gc.on_idle().unwrap();
    fixture.gc.on_idle().unwrap();
}

#[test]
fn an_inhibited_scope_survives_a_panic_and_releases_the_collector() {
    let fixture = GcFixture::with_config(small_config());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = fixture.gc.inhibit_gc();
        fixture.cons(fixnum(1), fixnum(2));
        panic!("mutator error mid-critical-section");
    }));
    assert!(result.is_err());

    // The guard dropped during unwinding, so the collector is no longer
    // inhibited and on_idle can make progress again.
    fixture.gc.on_idle().unwrap();
    fixture.cons(fixnum(3), fixnum(4));
}

#[test]
fn nested_inhibit_guards_only_release_once_all_have_dropped() {
    let fixture = GcFixture::with_config(small_config());
    let outer = fixture.gc.inhibit_gc();
    let inner = fixture.gc.inhibit_gc();
    drop(inner);
    // Still inhibited: the outer guard is alive. A plain allocation must
    // still succeed even while inhibited, since inhibit only blocks the
    // idle-tick-triggered cycle, not mutator allocation itself.
    fixture.cons(fixnum(5), fixnum(6));
    drop(outer);
    fixture.gc.on_idle().unwrap();
}

#[test]
fn thread_teardown_then_reattach_on_the_same_thread_succeeds() {
    let fixture = GcFixture::with_config(small_config());
    fixture.gc.thread_remove().unwrap();

    let mut marker = 0usize;
    fixture
        .gc
        .thread_add(&mut marker as *mut usize as usize)
        .unwrap();
    fixture.cons(fixnum(7), fixnum(8));
    fixture.gc.thread_remove().unwrap();
}
