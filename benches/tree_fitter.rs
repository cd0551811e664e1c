use bosque::test_data::setup_data_housing;
use bosque::tree::{self, FeatureKind, TreeParams};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};

fn bench_tree_fitter(c: &mut Criterion) {
    let (x, y) = setup_data_housing();
    let kinds = FeatureKind::all_numeric(x.ncols());

    let mut group = c.benchmark_group("TreeFitter");

    group.bench_function("housing_default_params", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            tree::fit(x.view(), y.view(), &kinds, &TreeParams::default(), &mut rng).unwrap();
        })
    });
    group.finish();
}

criterion_group!(benches, bench_tree_fitter);
criterion_main!(benches);
