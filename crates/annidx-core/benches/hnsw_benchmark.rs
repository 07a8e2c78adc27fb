//! Build and search throughput for the HNSW engine.

use annidx_core::distance::OpClass;
use annidx_core::index::hnsw::{insert_element, HnswBuildParams, HnswGraph, LockStripes};
use annidx_core::storage::{HnswMeta, InMemoryBufferManager, InMemoryWal, ItemPointer};
use annidx_core::vector::Vector;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DIM: usize = 32;

fn random_vector(rng: &mut impl Rng) -> Vector {
    Vector::F32((0..DIM).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
}

fn build_index(rows: usize, rng: &mut StdRng) -> (InMemoryBufferManager, HnswMeta, ItemPointer, usize) {
    let buffer = InMemoryBufferManager::new();
    let wal = InMemoryWal::new();
    let locks = LockStripes::new(256);
    let opclass = OpClass::l2(DIM);
    let params = HnswBuildParams::default();
    let mut meta = HnswMeta::new(DIM as u32, 16, 64);

    for tid in 0..rows {
        insert_element(
            &buffer,
            &wal,
            &locks,
            &opclass,
            &params,
            &mut meta,
            tid as u64,
            random_vector(rng),
            rng,
        )
        .unwrap();
    }

    let entry = meta.entry.unwrap();
    let entry_ptr = ItemPointer::new(entry.blkno, entry.offno);
    let entry_level = usize::from(entry.level);
    (buffer, meta, entry_ptr, entry_level)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_build");
    for rows in [100usize, 500, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(7);
                build_index(rows, &mut rng)
            });
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let (buffer, _meta, entry_ptr, entry_level) = build_index(2000, &mut rng);
    let opclass = OpClass::l2(DIM);
    let graph = HnswGraph::new(&buffer, &opclass);
    let query = random_vector(&mut rng);

    c.bench_function("hnsw_knn_search_k10", |b| {
        b.iter(|| graph.knn_search(&query, 10, 40, entry_ptr, entry_level).unwrap());
    });
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
