// Paired info benchmarks
// Criterion suite for clustering and per-edge aggregates over synthetic evidence

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scaffold_forge::{
    EdgeId, EdgeLengthArena, EvidenceSource, PairInfo, PairedIndex, PairedInfoLibrary,
    PairedLibraryConfig, Point,
};
use std::time::Duration;

/// Generate a graph and an index with noisy observations around true distances
fn generate_synthetic_evidence(
    edges: usize,
    observations_per_edge: usize,
    seed: u64,
) -> (EdgeLengthArena, PairedIndex) {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = EdgeLengthArena::new();
    for _ in 0..edges {
        graph.add_edge(rng.gen_range(100..5_000));
    }

    let mut index = PairedIndex::new();
    for first in 0..edges {
        for _ in 0..observations_per_edge {
            let second = rng.gen_range(0..edges);
            let d = rng.gen_range(-600.0..600.0_f64).round();
            let weight = rng.gen_range(0.5..5.0);
            index.add_pair_info(EdgeId(first), EdgeId(second), Point::new(d, weight, 10.0));
        }
    }
    (graph, index)
}

/// Benchmark clustering of all observations on a single edge
fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");
    group.sample_size(30);
    group.measurement_time(Duration::from_secs(10));

    for observations in [100, 1_000, 10_000] {
        let (graph, index) = generate_synthetic_evidence(50, observations / 50 + 1, 42);
        let library = PairedInfoLibrary::new(&graph, PairedLibraryConfig::new(55, 100, 500, 50), &index);
        let infos: Vec<PairInfo> = index.pair_infos().into_iter().take(observations).collect();

        group.throughput(Throughput::Elements(infos.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(observations), &infos, |b, infos| {
            b.iter(|| library.cluster(black_box(infos)))
        });
    }
    group.finish();
}

/// Benchmark parallel per-edge summaries across the whole graph
fn bench_edge_summaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_summaries");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(15));

    for edges in [100, 1_000] {
        let (graph, index) = generate_synthetic_evidence(edges, 20, 7);
        let library = PairedInfoLibrary::new(&graph, PairedLibraryConfig::new(55, 100, 500, 50), &index);
        let all_edges: Vec<EdgeId> = graph.edges().collect();

        group.throughput(Throughput::Elements(edges as u64));
        group.bench_with_input(BenchmarkId::from_parameter(edges), &all_edges, |b, all_edges| {
            b.iter(|| library.summarize_edges(black_box(all_edges), EvidenceSource::Raw))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clustering, bench_edge_summaries);
criterion_main!(benches);
