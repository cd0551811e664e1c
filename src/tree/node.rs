use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::FittedModel;

/// Column semantics of the feature matrix. Categorical columns hold
/// non-negative integer codes (at most 64 distinct codes) stored as `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl FeatureKind {
    pub fn all_numeric(n_features: usize) -> Vec<FeatureKind> {
        vec![FeatureKind::Numeric; n_features]
    }
}

/// How an internal node routes a single feature value.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitRule {
    /// Numeric rule: left iff `value < threshold`.
    Threshold(f64),
    /// Categorical rule: left iff the bit for the value's integer code is set.
    Categories(u64),
}

impl SplitRule {
    pub fn goes_left(&self, value: f64) -> bool {
        match self {
            SplitRule::Threshold(t) => value < *t,
            SplitRule::Categories(mask) => (mask >> value as u32) & 1 == 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub feature: usize,
    pub rule: SplitRule,
}

/// A fitted regression tree node. Children are exclusively owned, so the
/// whole tree frees recursively on drop.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf {
        prediction: f64,
        n_samples: usize,
    },
    Internal {
        split: Split,
        sse_reduction: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { prediction, .. } => return *prediction,
                Node::Internal {
                    split, left, right, ..
                } => {
                    node = if split.rule.goes_left(row[split.feature]) {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Preorder traversal over all nodes, for the visualization layer.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }
}

impl FittedModel for Node {
    fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        Array1::from_iter(x.outer_iter().map(|row| self.predict_row(row)))
    }
}

pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        if let Node::Internal { left, right, .. } = node {
            self.stack.push(right);
            self.stack.push(left);
        }
        Some(node)
    }
}
