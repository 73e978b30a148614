//! Fix-Protocol, Scan, and Tagged-Word Microbenchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use igc::tagged::{self, Tag};

fn bench_tag_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("tagged_word");
    group.throughput(Throughput::Elements(1));

    group.bench_function("make_fixnum", |b| {
        b.iter(|| black_box(tagged::make(black_box(12345), Tag::Fixnum0 as usize)))
    });

    let word = tagged::make(12345, Tag::Fixnum0 as usize);
    group.bench_function("decode_tag", |b| b.iter(|| black_box(tagged::tag(black_box(word)))));

    let addr_word = tagged::make_address(0x7f00_0000_0000, Tag::Cons as usize);
    group.bench_function("address_of", |b| {
        b.iter(|| black_box(tagged::address_of(black_box(addr_word))))
    });

    group.finish();
}

fn bench_scan_ambiguous(c: &mut Criterion) {
    use igc::object::Fixer;
    use igc::scan;

    struct CountingFixer {
        count: std::cell::Cell<usize>,
    }

    impl Fixer for CountingFixer {
        fn fix_slot(&self, _slot_addr: usize) -> igc::Result<()> {
            self.count.set(self.count.get() + 1);
            Ok(())
        }
    }

    let mut group = c.benchmark_group("scan_ambiguous");

    for &words in &[16usize, 256, 4096] {
        let buffer = vec![0usize; words].into_boxed_slice();
        let start = buffer.as_ptr() as usize;
        let end = start + words * std::mem::size_of::<usize>();
        group.throughput(Throughput::Elements(words as u64));
        group.bench_function(format!("{words}_words"), |b| {
            b.iter(|| {
                let fixer = CountingFixer {
                    count: std::cell::Cell::new(0),
                };
                scan::scan_ambiguous(start, end, &fixer).unwrap();
                black_box(fixer.count.get())
            })
        });
        drop(buffer);
    }

    group.finish();
}

fn bench_allocation_point_reserve_commit(c: &mut Criterion) {
    use igc::heap::pool::{Pool, PoolKind};
    use igc::object::cons::{ConsFormat, CONS_SIZE};
    use igc::allocator::AllocationPoint;
    use igc::config::GenerationSpec;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;

    let backing = vec![0u8; 1 << 20].into_boxed_slice();
    let base = backing.as_ptr() as usize;
    let specs = vec![GenerationSpec::new(512, 0.8), GenerationSpec::new(512, 0.4)];
    let pool = Arc::new(Pool::new(base, PoolKind::Cons, Arc::new(ConsFormat), &specs));
    let epoch = Arc::new(AtomicU64::new(0));
    let ap = AllocationPoint::new(pool, epoch);

    let mut group = c.benchmark_group("allocation_point");
    group.bench_function("reserve_commit_cons", |b| {
        b.iter(|| {
            let addr = ap.reserve(CONS_SIZE).unwrap();
            ap.commit(addr).unwrap();
            black_box(addr)
        })
    });
    group.finish();

    drop(backing);
}

criterion_group!(
    benches,
    bench_tag_roundtrip,
    bench_scan_ambiguous,
    bench_allocation_point_reserve_commit
);
criterion_main!(benches);
