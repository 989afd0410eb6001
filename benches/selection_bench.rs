use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seqpick::core::selector::exhaustive_select;
use seqpick::tools::alipid::parse_alipid_table;
use seqpick::{LazyGreedySelector, MixtureObjective, SelectionConfig, SimilarityMatrix};
use std::fmt::Write;
use std::hint::black_box;

/// Clustered similarities: members of the same family score high, others low
fn generate_matrix(n: usize, families: usize, seed: u64) -> SimilarityMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let family: Vec<usize> = (0..n).map(|_| rng.gen_range(0..families)).collect();
    let mut rows = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let value = if family[i] == family[j] {
                rng.gen_range(0.7..1.0)
            } else {
                rng.gen_range(0.0..0.3)
            };
            rows[i][j] = value;
            rows[j][i] = value;
        }
    }
    SimilarityMatrix::new(rows).expect("generated matrix is symmetric")
}

fn generate_table(n: usize) -> String {
    let mut text = String::from("# p1 p2 %id nid denomid %match nmatch denommatch\n");
    for i in 0..n {
        for j in (i + 1)..n {
            let id = 100.0 - ((i * 31 + j * 17) % 700) as f64 / 10.0;
            writeln!(text, "seq{}/1-300 seq{}/1-300 {:.1} 250 300 {:.1} 280 300", i, j, id, id)
                .expect("writing to a String");
        }
    }
    text
}

fn bench_lazy_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/lazy_greedy");

    for n in [100, 500, 1000].iter() {
        let matrix = generate_matrix(*n, n / 20, 7);
        let config = SelectionConfig::new(n / 10, 0.5);
        let selector = LazyGreedySelector::new();

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| black_box(selector.select(black_box(&matrix), &config).expect("selection")));
        });
    }

    group.finish();
}

fn bench_exhaustive(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection/exhaustive");
    group.sample_size(10);

    for n in [100, 500].iter() {
        let matrix = generate_matrix(*n, n / 20, 7);
        let config = SelectionConfig::new(n / 10, 0.5);
        let objective = MixtureObjective::from_config(&config).expect("objective");

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| {
                black_box(
                    exhaustive_select(black_box(&matrix), &config, &objective).expect("selection"),
                )
            });
        });
    }

    group.finish();
}

fn bench_identity_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing/alipid_table");

    for n in [100, 400].iter() {
        let table = generate_table(*n);
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| black_box(parse_alipid_table(black_box(&table)).expect("table")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lazy_greedy, bench_exhaustive, bench_identity_table);
criterion_main!(benches);
