use allevo_sim::evolution::{BernoulliTrials, KAlleleModel, MutationModel, Mutator};
use allevo_sim::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn bench_trials(c: &mut Criterion) {
    let mut group = c.benchmark_group("bernoulli_trials");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

    // the first two rates use gap skipping, the last two dense draws
    let rates = [1e-6, 1e-3, 0.1, 0.5];
    let sizes = [1_000, 100_000, 1_000_000];

    for &size in &sizes {
        group.throughput(Throughput::Elements(size as u64));
        for &rate in &rates {
            let mut trials = BernoulliTrials::new();
            trials.set_parameter(&[rate], size).unwrap();
            let parameter_string = format!("n={size}/rate={rate}");

            group.bench_with_input(
                BenchmarkId::new("do_trial", &parameter_string),
                &(size, rate),
                |b, _| {
                    b.iter(|| {
                        trials.do_trial(&mut rng);
                        black_box(trials.succ_count(0));
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_mutator(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutator_apply");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

    let rates = [1e-5, 1e-3, 0.2];
    let pop_sizes = [1_000, 10_000];

    for &size in &pop_sizes {
        let structure = GenomeStructure::new(2, vec![50, 50]).unwrap();
        let pop = Population::new("bench", structure, vec![size], AlleleMode::Standard);
        group.throughput(Throughput::Elements((size * 2 * 100) as u64));

        for &rate in &rates {
            let mut mutator = Mutator::new(
                MutationModel::RandomAllele(KAlleleModel::new(4).unwrap()),
                vec![rate],
            )
            .unwrap();
            let parameter_string = format!("size={size}/rate={rate}");

            group.bench_with_input(
                BenchmarkId::new("k_allele", &parameter_string),
                &(size, rate),
                |b, _| {
                    b.iter_batched(
                        || pop.clone(),
                        |mut pop| black_box(mutator.apply(&mut pop, &mut rng).unwrap()),
                        criterion::BatchSize::LargeInput,
                    )
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_trials, bench_mutator);
criterion_main!(benches);
