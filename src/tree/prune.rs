use ndarray::{ArrayView1, ArrayView2};

use crate::{Error, Result};

use super::node::{Node, Split};

/// One entry of the cost-complexity path: collapsing at `alpha` leaves a
/// subtree with `n_leaves` leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneStep {
    pub alpha: f64,
    pub n_leaves: usize,
}

/// Weakest-link cost-complexity path of `root` over its training data,
/// from the full tree (alpha 0) down to the root-only leaf.
pub fn prune_path(
    root: &Node,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
) -> Result<Vec<PruneStep>> {
    let mut tree = annotate(root, x, y)?;
    let mut path = vec![PruneStep {
        alpha: 0.0,
        n_leaves: n_leaves(&tree),
    }];
    let mut last_alpha = 0.0;
    while let Some(g) = min_link(&tree) {
        // Clamp against float noise so recorded alphas never decrease.
        let alpha = g.max(last_alpha);
        collapse_weakest(&mut tree, g);
        path.push(PruneStep {
            alpha,
            n_leaves: n_leaves(&tree),
        });
        last_alpha = alpha;
    }
    Ok(path)
}

/// Smallest subtree of `root` optimal for the complexity penalty `alpha`,
/// i.e. minimizing training SSE + alpha * leaf count. `alpha <= 0` returns
/// the tree unpruned; an alpha at or above the path's last value returns the
/// root-only leaf.
pub fn prune(root: &Node, x: ArrayView2<f64>, y: ArrayView1<f64>, alpha: f64) -> Result<Node> {
    if alpha <= 0.0 {
        return annotate(root, x, y).map(|t| rebuild(&t));
    }
    let mut tree = annotate(root, x, y)?;
    while let Some(g) = min_link(&tree) {
        if g > alpha {
            break;
        }
        collapse_weakest(&mut tree, g);
    }
    Ok(rebuild(&tree))
}

struct PruneNode {
    prediction: f64,
    n_samples: usize,
    sse_as_leaf: f64,
    branch: Option<Branch>,
}

struct Branch {
    split: Split,
    sse_reduction: f64,
    left: Box<PruneNode>,
    right: Box<PruneNode>,
}

fn annotate(root: &Node, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<PruneNode> {
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
    let rows: Vec<usize> = (0..x.nrows()).collect();
    Ok(annotate_node(root, &rows, x, y))
}

fn annotate_node(node: &Node, rows: &[usize], x: ArrayView2<f64>, y: ArrayView1<f64>) -> PruneNode {
    let n = rows.len();
    let (sum, sumsq) = rows
        .iter()
        .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));
    let prediction = if n > 0 { sum / n as f64 } else { 0.0 };
    let sse_as_leaf = if n > 0 { sumsq - sum * sum / n as f64 } else { 0.0 };

    let branch = match node {
        Node::Leaf { .. } => None,
        Node::Internal {
            split,
            sse_reduction,
            left,
            right,
        } => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .copied()
                .partition(|&i| split.rule.goes_left(x[[i, split.feature]]));
            Some(Branch {
                split: split.clone(),
                sse_reduction: *sse_reduction,
                left: Box::new(annotate_node(left, &left_rows, x, y)),
                right: Box::new(annotate_node(right, &right_rows, x, y)),
            })
        }
    };

    PruneNode {
        prediction,
        n_samples: n,
        sse_as_leaf,
        branch,
    }
}

fn subtree_stats(node: &PruneNode) -> (f64, usize) {
    match &node.branch {
        None => (node.sse_as_leaf, 1),
        Some(b) => {
            let (ls, ll) = subtree_stats(&b.left);
            let (rs, rl) = subtree_stats(&b.right);
            (ls + rs, ll + rl)
        }
    }
}

fn link_strength(node: &PruneNode) -> Option<f64> {
    node.branch.as_ref()?;
    let (sse, leaves) = subtree_stats(node);
    Some((node.sse_as_leaf - sse) / (leaves - 1) as f64)
}

/// Smallest SSE increase per leaf removed over all internal nodes.
fn min_link(node: &PruneNode) -> Option<f64> {
    let branch = node.branch.as_ref()?;
    let mut g = link_strength(node)?;
    if let Some(lg) = min_link(&branch.left) {
        g = g.min(lg);
    }
    if let Some(rg) = min_link(&branch.right) {
        g = g.min(rg);
    }
    Some(g)
}

/// Collapses every internal node whose link strength matches the current
/// minimum. Top-down: a collapsed node discards its whole subtree.
fn collapse_weakest(node: &mut PruneNode, g_min: f64) {
    if node.branch.is_none() {
        return;
    }
    let g = link_strength(node).unwrap();
    if g <= g_min + 1e-12 {
        node.branch = None;
        return;
    }
    if let Some(branch) = node.branch.as_mut() {
        collapse_weakest(&mut branch.left, g_min);
        collapse_weakest(&mut branch.right, g_min);
    }
}

fn n_leaves(node: &PruneNode) -> usize {
    subtree_stats(node).1
}

fn rebuild(node: &PruneNode) -> Node {
    match &node.branch {
        None => Node::Leaf {
            prediction: node.prediction,
            n_samples: node.n_samples,
        },
        Some(b) => Node::Internal {
            split: b.split.clone(),
            sse_reduction: b.sse_reduction,
            left: Box::new(rebuild(&b.left)),
            right: Box::new(rebuild(&b.right)),
        },
    }
}
