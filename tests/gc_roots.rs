//! Root Registry Tests - Overlap, Zero-Size, and Lifecycle Invariants

mod common;

use common::GcFixture;

#[test]
fn overlapping_roots_are_rejected_through_the_hook_surface() {
    let fixture = GcFixture::with_defaults();
    let handle = fixture.gc.mem_insert(0x10000, 0x20000).unwrap();
    assert!(fixture.gc.mem_insert(0x18000, 0x28000).is_err());
    fixture.gc.mem_delete(handle).unwrap();
}

#[test]
fn zero_size_root_is_rejected_through_the_hook_surface() {
    let fixture = GcFixture::with_defaults();
    assert!(fixture.gc.mem_insert(0x10000, 0x10000).is_err());
}

#[test]
fn deregistering_an_unknown_handle_errors() {
    let fixture = GcFixture::with_defaults();
    let handle = fixture.gc.mem_insert(0x30000, 0x31000).unwrap();
    fixture.gc.mem_delete(handle).unwrap();
    assert!(fixture.gc.mem_delete(handle).is_err());
}

#[test]
fn growable_structures_replace_their_root_on_resize() {
    let fixture = GcFixture::with_defaults();
    let first = fixture.gc.grow_specpdl(None, 0x40000, 0x41000).unwrap();
    let second = fixture
        .gc
        .grow_specpdl(Some(first), 0x40000, 0x42000)
        .unwrap();
    // The old handle no longer refers to a live root.
    assert!(fixture.gc.mem_delete(first).is_err());
    fixture.gc.mem_delete(second).unwrap();
}

#[test]
fn pdump_image_is_registered_as_an_exact_root() {
    let fixture = GcFixture::with_defaults();
    let handle = fixture.gc.pdump_loaded(0x50000, 0x60000).unwrap();
    fixture.gc.mem_delete(handle).unwrap();
}
