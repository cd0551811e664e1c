use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[cfg(feature = "use-rayon")]
use rayon::prelude::*;

use crate::sample::bootstrap;
use crate::tree::{self, FeatureKind, Node};
use crate::{Error, FitResult, FittedModel, Result};

use super::{Forest, ForestParams};

/// Fits `n_trees` regression trees, each on its own bootstrap sample, and
/// retains each tree's out-of-bag rows. A failure growing any tree aborts
/// the whole fit; no partial ensemble is returned.
pub fn fit(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    kinds: &[FeatureKind],
    params: &ForestParams,
) -> Result<(FitResult, Forest)> {
    params.validate(x.ncols())?;
    if x.nrows() == 0 {
        return Err(Error::EmptyInput);
    }
    if y.len() != x.nrows() {
        return Err(Error::InvalidConfiguration(format!(
            "x has {} rows but y has {} values",
            x.nrows(),
            y.len()
        )));
    }

    let n = x.nrows();
    let mut rng = StdRng::seed_from_u64(params.seed);

    // Pre-generate one seed per tree so the fit is bit-identical whether the
    // trees are grown serially or in parallel.
    let seeds: Vec<u64> = (0..params.n_trees).map(|_| rng.gen()).collect();

    let grow_one = |seed: u64| -> Result<(Node, Vec<usize>)> {
        let mut tree_rng = StdRng::seed_from_u64(seed);
        let sample = bootstrap(n, &mut tree_rng)?;
        let x_sample = x.select(Axis(0), &sample.indices);
        let y_sample = y.select(Axis(0), &sample.indices);
        let (_, node) = tree::fit(
            x_sample.view(),
            y_sample.view(),
            kinds,
            &params.tree_params,
            &mut tree_rng,
        )?;
        Ok((node, sample.oob))
    };

    #[cfg(not(feature = "use-rayon"))]
    let fitted: Result<Vec<(Node, Vec<usize>)>> = seeds.iter().map(|&s| grow_one(s)).collect();

    #[cfg(feature = "use-rayon")]
    let fitted: Result<Vec<(Node, Vec<usize>)>> = seeds.par_iter().map(|&s| grow_one(s)).collect();

    let (trees, oob_sets): (Vec<_>, Vec<_>) = fitted?.into_iter().unzip();
    let forest = Forest::new(trees, oob_sets, x.ncols());

    let y_hat = forest.predict(x);
    let residuals = &y - &y_hat;
    let err = residuals.pow2().mean().unwrap();

    Ok((
        FitResult {
            err,
            residuals,
            y_hat,
        },
        forest,
    ))
}
