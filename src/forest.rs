pub mod fitter;
pub mod params;

pub use fitter::fit;
pub use params::{ForestParams, ForestParamsBuilder};

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::tree::Node;
use crate::{Error, FittedModel, Result};

/// A fitted bagged/random-forest ensemble: trees paired with the out-of-bag
/// rows of the bootstrap sample each was grown on. Immutable after fit.
#[derive(Debug)]
pub struct Forest {
    trees: Vec<Node>,
    oob_sets: Vec<Vec<usize>>,
    n_features: usize,
}

impl Forest {
    pub(crate) fn new(trees: Vec<Node>, oob_sets: Vec<Vec<usize>>, n_features: usize) -> Self {
        Self {
            trees,
            oob_sets,
            n_features,
        }
    }

    pub fn trees(&self) -> &[Node] {
        &self.trees
    }

    pub fn oob_sets(&self) -> &[Vec<usize>] {
        &self.oob_sets
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Root-mean-squared OOB error over the training data: each row is
    /// predicted by averaging only the trees for which it was out-of-bag.
    /// A row that was in-bag for every tree is surfaced as
    /// `InsufficientTrees`, not silently skipped.
    pub fn oob_error(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<f64> {
        let n = x.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if y.len() != n {
            return Err(Error::InvalidConfiguration(format!(
                "x has {} rows but y has {} values",
                n,
                y.len()
            )));
        }
        let mut sums = vec![0.0; n];
        let mut counts = vec![0usize; n];
        for (tree, oob) in self.trees.iter().zip(&self.oob_sets) {
            for &i in oob {
                sums[i] += tree.predict_row(x.row(i));
                counts[i] += 1;
            }
        }
        if let Some(row) = counts.iter().position(|&c| c == 0) {
            return Err(Error::InsufficientTrees { row });
        }
        let mse = sums
            .iter()
            .zip(&counts)
            .zip(y.iter())
            .map(|((&s, &c), &yv)| {
                let d = s / c as f64 - yv;
                d * d
            })
            .sum::<f64>()
            / n as f64;
        Ok(mse.sqrt())
    }

    /// Per-feature total SSE reduction summed over every split in the
    /// ensemble; read-only input for importance ranking.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut importances = Array1::zeros(self.n_features);
        for tree in &self.trees {
            for node in tree.iter() {
                if let Node::Internal {
                    split,
                    sse_reduction,
                    ..
                } = node
                {
                    importances[split.feature] += sse_reduction;
                }
            }
        }
        importances
    }
}

impl FittedModel for Forest {
    /// Unweighted mean of the member trees' predictions.
    fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        let mut result = Array1::zeros(x.nrows());
        for tree in &self.trees {
            result += &tree.predict(x);
        }
        result / self.trees.len() as f64
    }
}
