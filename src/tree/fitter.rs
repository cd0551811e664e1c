use itertools::Itertools;
use ndarray::{ArrayView1, ArrayView2};
use rand::{seq::index::sample, Rng};

use crate::{Error, FitResult, FittedModel, Result};

use super::node::{FeatureKind, Node, Split, SplitRule};
use super::params::TreeParams;

/// Maximum number of distinct codes a categorical column may hold; category
/// subsets are stored as a `u64` bitmask.
pub const MAX_CATEGORIES: u32 = 64;

/// Grows a regression tree by recursive binary splitting on squared error.
pub fn fit<R: Rng + ?Sized>(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    kinds: &[FeatureKind],
    params: &TreeParams,
    rng: &mut R,
) -> Result<(FitResult, Node)> {
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
    if kinds.len() != x.ncols() {
        return Err(Error::InvalidConfiguration(format!(
            "x has {} columns but schema describes {}",
            x.ncols(),
            kinds.len()
        )));
    }
    for (col, kind) in kinds.iter().enumerate() {
        if *kind != FeatureKind::Categorical {
            continue;
        }
        for &v in x.column(col) {
            if !(v >= 0.0) || v.fract() != 0.0 || v >= MAX_CATEGORIES as f64 {
                return Err(Error::InvalidConfiguration(format!(
                    "categorical column {col} holds {v}; codes must be integers in 0..{MAX_CATEGORIES}"
                )));
            }
        }
    }

    let fitter = TreeFitter { x, y, kinds, params };
    let rows: Vec<usize> = (0..x.nrows()).collect();
    let root = fitter.grow(&rows, 0, rng);

    let y_hat = root.predict(x);
    let residuals = &y - &y_hat;
    let err = residuals.pow2().mean().unwrap();

    Ok((
        FitResult {
            err,
            residuals,
            y_hat,
        },
        root,
    ))
}

struct BestSplit {
    feature: usize,
    rule: SplitRule,
    sse: f64,
}

struct TreeFitter<'a, 'b, 'c, 'd> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'b, f64>,
    kinds: &'c [FeatureKind],
    params: &'d TreeParams,
}

impl TreeFitter<'_, '_, '_, '_> {
    fn grow<R: Rng + ?Sized>(&self, rows: &[usize], depth: usize, rng: &mut R) -> Node {
        let n = rows.len() as f64;
        let (sum, sumsq) = rows.iter().fold((0.0, 0.0), |(s, q), &i| {
            (s + self.y[i], q + self.y[i] * self.y[i])
        });
        let prediction = sum / n;
        let parent_sse = sumsq - sum * sum / n;

        if rows.len() < 2 * self.params.min_node_size || depth >= self.params.max_depth {
            return Node::Leaf {
                prediction,
                n_samples: rows.len(),
            };
        }
        let Some(best) = self.best_split(rows, parent_sse, rng) else {
            return Node::Leaf {
                prediction,
                n_samples: rows.len(),
            };
        };

        let BestSplit { feature, rule, sse } = best;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| rule.goes_left(self.x[[i, feature]]));

        Node::Internal {
            split: Split { feature, rule },
            sse_reduction: parent_sse - sse,
            left: Box::new(self.grow(&left_rows, depth + 1, rng)),
            right: Box::new(self.grow(&right_rows, depth + 1, rng)),
        }
    }

    /// Minimum-SSE split over the candidate features, or `None` when no
    /// candidate strictly reduces the node's SSE. Features are scanned in
    /// ascending index order so ties resolve to the first feature; within a
    /// feature, thresholds are scanned ascending so ties resolve to the
    /// smallest threshold.
    fn best_split<R: Rng + ?Sized>(
        &self,
        rows: &[usize],
        parent_sse: f64,
        rng: &mut R,
    ) -> Option<BestSplit> {
        let ncols = self.x.ncols();
        let features: Vec<usize> = match self.params.mtry {
            Some(m) if m < ncols => {
                let mut sampled = sample(rng, ncols, m).into_vec();
                sampled.sort_unstable();
                sampled
            }
            _ => (0..ncols).collect(),
        };

        let mut best: Option<BestSplit> = None;
        for feat in features {
            let candidate = match self.kinds[feat] {
                FeatureKind::Numeric => self.scan_numeric(feat, rows),
                FeatureKind::Categorical => self.scan_categorical(feat, rows),
            };
            if let Some(c) = candidate {
                if best.as_ref().map_or(true, |b| c.sse < b.sse) {
                    best = Some(c);
                }
            }
        }
        best.filter(|b| b.sse < parent_sse)
    }

    fn scan_numeric(&self, feat: usize, rows: &[usize]) -> Option<BestSplit> {
        let min = self.params.min_node_size;
        let mut vals: Vec<(f64, f64)> = rows
            .iter()
            .map(|&i| (self.x[[i, feat]], self.y[i]))
            .collect();
        vals.sort_by(|a, b| a.0.total_cmp(&b.0));
        let n = vals.len();
        let (total_sum, total_sumsq) = vals
            .iter()
            .fold((0.0, 0.0), |(s, q), &(_, y)| (s + y, q + y * y));

        let mut best: Option<(f64, f64)> = None;
        let (mut sum_l, mut sumsq_l) = (0.0, 0.0);
        for i in 0..n - 1 {
            let (v, yv) = vals[i];
            sum_l += yv;
            sumsq_l += yv * yv;
            if v == vals[i + 1].0 {
                // Candidate thresholds sit between distinct values only.
                continue;
            }
            let n_l = i + 1;
            let n_r = n - n_l;
            if n_l < min || n_r < min {
                continue;
            }
            let sum_r = total_sum - sum_l;
            let sumsq_r = total_sumsq - sumsq_l;
            let sse = (sumsq_l - sum_l * sum_l / n_l as f64)
                + (sumsq_r - sum_r * sum_r / n_r as f64);
            if best.map_or(true, |(b, _)| sse < b) {
                best = Some((sse, (v + vals[i + 1].0) / 2.0));
            }
        }
        best.map(|(sse, t)| BestSplit {
            feature: feat,
            rule: SplitRule::Threshold(t),
            sse,
        })
    }

    fn scan_categorical(&self, feat: usize, rows: &[usize]) -> Option<BestSplit> {
        let min = self.params.min_node_size;
        // (code, count, sum, sumsq) per category present at this node.
        let mut stats: Vec<(u32, usize, f64, f64)> = Vec::new();
        for &i in rows {
            let code = self.x[[i, feat]] as u32;
            let yv = self.y[i];
            match stats.iter_mut().find(|s| s.0 == code) {
                Some(s) => {
                    s.1 += 1;
                    s.2 += yv;
                    s.3 += yv * yv;
                }
                None => stats.push((code, 1, yv, yv * yv)),
            }
        }
        if stats.len() < 2 {
            return None;
        }
        // For squared error the optimal category subset is a prefix of the
        // categories sorted by mean target, so only those prefixes are scanned.
        let stats: Vec<_> = stats
            .into_iter()
            .sorted_by(|a, b| {
                (a.2 / a.1 as f64)
                    .total_cmp(&(b.2 / b.1 as f64))
                    .then(a.0.cmp(&b.0))
            })
            .collect();

        let n = rows.len();
        let (total_sum, total_sumsq) = stats
            .iter()
            .fold((0.0, 0.0), |(s, q), &(_, _, cs, cq)| (s + cs, q + cq));

        let mut best: Option<(f64, u64)> = None;
        let mut mask: u64 = 0;
        let (mut n_l, mut sum_l, mut sumsq_l) = (0usize, 0.0, 0.0);
        for &(code, cn, cs, cq) in &stats[..stats.len() - 1] {
            mask |= 1 << code;
            n_l += cn;
            sum_l += cs;
            sumsq_l += cq;
            let n_r = n - n_l;
            if n_l < min || n_r < min {
                continue;
            }
            let sum_r = total_sum - sum_l;
            let sumsq_r = total_sumsq - sumsq_l;
            let sse = (sumsq_l - sum_l * sum_l / n_l as f64)
                + (sumsq_r - sum_r * sum_r / n_r as f64);
            let better = match best {
                None => true,
                Some((b_sse, b_mask)) => sse < b_sse || (sse == b_sse && mask < b_mask),
            };
            if better {
                best = Some((sse, mask));
            }
        }
        best.map(|(sse, mask)| BestSplit {
            feature: feat,
            rule: SplitRule::Categories(mask),
            sse,
        })
    }
}
