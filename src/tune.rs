use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

#[cfg(feature = "use-rayon")]
use rayon::prelude::*;

use crate::{Error, Result};

/// A k-fold partition of row indices, built once per tuning run so every
/// candidate sees the identical folds (paired comparison).
#[derive(Debug, Clone)]
pub struct FoldAssignment {
    folds: Vec<Vec<usize>>,
}

impl FoldAssignment {
    pub fn new<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Result<Self> {
        if k < 2 || k > n {
            return Err(Error::InvalidConfiguration(format!(
                "fold count must be in 2..={n}, got {k}"
            )));
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        // Round-robin deal keeps fold sizes within one of each other.
        let mut folds = vec![Vec::new(); k];
        for (pos, idx) in order.into_iter().enumerate() {
            folds[pos % k].push(idx);
        }
        Ok(Self { folds })
    }

    pub fn k(&self) -> usize {
        self.folds.len()
    }

    pub fn folds(&self) -> &[Vec<usize>] {
        &self.folds
    }

    /// Training indices (all folds but `held_out`) and the held-out fold.
    pub fn split(&self, held_out: usize) -> (Vec<usize>, &[usize]) {
        let train = self
            .folds
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != held_out)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();
        (train, &self.folds[held_out])
    }
}

/// Validation score of one candidate on one held-out fold. `complexity`
/// breaks ties between candidates with equal mean error (leaf count for
/// trees, mtry for forests; smaller wins).
#[derive(Debug, Clone, Copy)]
pub struct FoldScore {
    pub rmse: f64,
    pub complexity: f64,
}

#[derive(Debug, Clone)]
pub struct TuneResult {
    /// Index into the candidate list.
    pub best: usize,
    /// Per-candidate mean RMSE across folds, for curve plotting.
    pub mean_scores: Vec<f64>,
    pub mean_complexities: Vec<f64>,
}

/// Root-mean-squared error between predictions and observed targets.
pub fn rmse(pred: ArrayView1<f64>, truth: ArrayView1<f64>) -> f64 {
    let mse = pred
        .iter()
        .zip(truth.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum::<f64>()
        / truth.len() as f64;
    mse.sqrt()
}

/// k-fold cross-validation over an opaque candidate list. `fit_score` fits on
/// the training split and scores on the held-out fold; any cell error aborts
/// the whole run. Winner: minimum mean RMSE, ties broken by smaller mean
/// complexity, then earlier candidate order.
pub fn tune<C, F>(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    k: usize,
    candidates: &[C],
    seed: u64,
    fit_score: F,
) -> Result<TuneResult>
where
    C: Sync,
    F: Fn(ArrayView2<f64>, ArrayView1<f64>, ArrayView2<f64>, ArrayView1<f64>, &C) -> Result<FoldScore>
        + Sync,
{
    if candidates.is_empty() {
        return Err(Error::InvalidConfiguration("candidate list is empty".into()));
    }
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

    let mut rng = StdRng::seed_from_u64(seed);
    let folds = FoldAssignment::new(x.nrows(), k, &mut rng)?;

    let cells: Vec<(usize, usize)> = (0..candidates.len())
        .flat_map(|c| (0..k).map(move |f| (c, f)))
        .collect();

    let run_cell = |&(ci, fi): &(usize, usize)| -> Result<(usize, FoldScore)> {
        let (train, valid) = folds.split(fi);
        let x_train = x.select(Axis(0), &train);
        let y_train = y.select(Axis(0), &train);
        let x_valid = x.select(Axis(0), valid);
        let y_valid = y.select(Axis(0), valid);
        let score = fit_score(
            x_train.view(),
            y_train.view(),
            x_valid.view(),
            y_valid.view(),
            &candidates[ci],
        )?;
        Ok((ci, score))
    };

    #[cfg(not(feature = "use-rayon"))]
    let scored: Result<Vec<(usize, FoldScore)>> = cells.iter().map(run_cell).collect();

    #[cfg(feature = "use-rayon")]
    let scored: Result<Vec<(usize, FoldScore)>> = cells.par_iter().map(run_cell).collect();

    let mut score_sums = vec![0.0; candidates.len()];
    let mut complexity_sums = vec![0.0; candidates.len()];
    for (ci, score) in scored? {
        score_sums[ci] += score.rmse;
        complexity_sums[ci] += score.complexity;
    }
    let kf = k as f64;
    let mean_scores: Vec<f64> = score_sums.iter().map(|s| s / kf).collect();
    let mean_complexities: Vec<f64> = complexity_sums.iter().map(|s| s / kf).collect();

    let mut best = 0;
    for i in 1..candidates.len() {
        if mean_scores[i] < mean_scores[best]
            || (mean_scores[i] == mean_scores[best]
                && mean_complexities[i] < mean_complexities[best])
        {
            best = i;
        }
    }
    if !mean_scores[best].is_finite() {
        return Err(Error::Degenerate(format!(
            "winning mean score is {}",
            mean_scores[best]
        )));
    }

    Ok(TuneResult {
        best,
        mean_scores,
        mean_complexities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::setup_data_simple;
    use ndarray::array;

    #[test]
    fn fold_assignment_partitions_rows() {
        let mut rng = StdRng::seed_from_u64(42);
        let folds = FoldAssignment::new(23, 5, &mut rng).unwrap();
        assert_eq!(folds.k(), 5);
        let mut seen = vec![false; 23];
        for fold in folds.folds() {
            assert!(fold.len() == 4 || fold.len() == 5);
            for &i in fold {
                assert!(!seen[i], "row {i} assigned twice");
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn split_excludes_held_out_fold() {
        let mut rng = StdRng::seed_from_u64(42);
        let folds = FoldAssignment::new(20, 4, &mut rng).unwrap();
        let (train, valid) = folds.split(2);
        assert_eq!(train.len() + valid.len(), 20);
        for i in valid {
            assert!(!train.contains(i));
        }
    }

    #[test]
    fn rejects_out_of_range_k() {
        let mut rng = StdRng::seed_from_u64(42);
        assert!(FoldAssignment::new(10, 1, &mut rng).is_err());
        assert!(FoldAssignment::new(10, 11, &mut rng).is_err());
        assert!(FoldAssignment::new(10, 10, &mut rng).is_ok());
    }

    #[test]
    fn tie_breaks_on_complexity_then_order() {
        let (x, y) = setup_data_simple();
        let candidates = [3.0, 1.0, 1.0];
        let result = tune(x.view(), y.view(), 4, &candidates, 42, |_, _, _, _, &c| {
            Ok(FoldScore {
                rmse: 1.0,
                complexity: c,
            })
        })
        .unwrap();
        // Equal scores everywhere: smaller complexity wins, then list order.
        assert_eq!(result.best, 1);
    }

    #[test]
    fn cell_error_aborts_run() {
        let (x, y) = setup_data_simple();
        let candidates = [1usize, 2];
        let result = tune(x.view(), y.view(), 4, &candidates, 42, |_, _, _, _, &c| {
            if c == 2 {
                Err(Error::EmptyInput)
            } else {
                Ok(FoldScore {
                    rmse: 1.0,
                    complexity: 1.0,
                })
            }
        });
        assert_eq!(result.unwrap_err(), Error::EmptyInput);
    }

    #[test]
    fn non_finite_winner_is_degenerate() {
        let (x, y) = setup_data_simple();
        let candidates = [1usize];
        let result = tune(x.view(), y.view(), 4, &candidates, 42, |_, _, _, _, _| {
            Ok(FoldScore {
                rmse: f64::NAN,
                complexity: 1.0,
            })
        });
        assert!(matches!(result, Err(Error::Degenerate(_))));
    }

    #[test]
    fn empty_candidates_invalid() {
        let (x, y) = setup_data_simple();
        let candidates: [usize; 0] = [];
        let result = tune(x.view(), y.view(), 4, &candidates, 42, |_, _, _, _, _| {
            Ok(FoldScore {
                rmse: 0.0,
                complexity: 0.0,
            })
        });
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn rmse_of_exact_predictions_is_zero() {
        let p = array![1.0, 2.0, 3.0];
        assert_eq!(rmse(p.view(), p.view()), 0.0);
        let t = array![1.0, 2.0, 7.0];
        assert!((rmse(p.view(), t.view()) - (16.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
