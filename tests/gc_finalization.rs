//! Finalization Tests - a Finalizer Fires Exactly Once for an Unreachable Object

mod common;

use common::{fixnum, GcFixture};
use igc::tagged;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Allocate enough conses to push the youngest generation through at least
/// one forced collection cycle via the out-of-memory retry path.
fn force_a_cycle(fixture: &GcFixture) {
    let cons_size = 2 * std::mem::size_of::<usize>();
    let capacity = common::TEST_GENERATION_KB * 1024;
    for i in 0..(capacity / cons_size + 4) {
        fixture.cons(fixnum(i), fixnum(0));
    }
}

#[test]
fn finalizer_fires_once_when_its_object_becomes_unreachable() {
    let fixture = GcFixture::with_defaults();
    let word = fixture.cons(fixnum(1), fixnum(2));
    let addr = tagged::address_of(word);

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = fired.clone();
    fixture.gc.register_finalizer(
        addr,
        Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );

    // No root keeps `word` alive, so the forced cycle below should find it
    // dead and queue its finalizer.
    force_a_cycle(&fixture);
    fixture.gc.handle_messages();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Further ticks must not run it again.
    force_a_cycle(&fixture);
    fixture.gc.handle_messages();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn finalizer_does_not_fire_while_the_object_is_still_rooted() {
    let fixture = GcFixture::with_defaults();
    let root_word = fixture.cons(fixnum(3), fixnum(4));
    let addr = tagged::address_of(root_word);

    let root_box = Box::new(root_word);
    let root_start = root_box.as_ref() as *const usize as usize;
    let root_end = root_start + std::mem::size_of::<usize>();
    let handle = fixture.gc.mem_insert(root_start, root_end).unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = fired.clone();
    fixture.gc.register_finalizer(
        addr,
        Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );

    force_a_cycle(&fixture);
    fixture.gc.handle_messages();
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    fixture.gc.mem_delete(handle).unwrap();
    drop(root_box);
}

#[test]
fn cancelling_a_finalizer_stops_it_from_ever_running() {
    let fixture = GcFixture::with_defaults();
    let word = fixture.cons(fixnum(5), fixnum(6));
    let addr = tagged::address_of(word);

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_clone = fired.clone();
    fixture.gc.register_finalizer(
        addr,
        Box::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );

    assert!(fixture.gc.cancel_finalizer(addr));
    assert!(!fixture.gc.cancel_finalizer(addr));

    force_a_cycle(&fixture);
    fixture.gc.handle_messages();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
