use crate::tree::{TreeParams, TreeParamsBuilder};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ForestParams {
    /// Number of bootstrap trees (B).
    pub n_trees: usize,
    pub tree_params: TreeParams,
    pub seed: u64,
}

impl ForestParams {
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.n_trees < 1 {
            return Err(Error::InvalidConfiguration(
                "n_trees must be at least 1".into(),
            ));
        }
        self.tree_params.validate(n_features)
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParamsBuilder::new().build()
    }
}

// Builder with passthroughs for the nested tree parameters.
pub struct ForestParamsBuilder {
    n_trees: usize,
    tree_params_builder: TreeParamsBuilder,
    seed: u64,
}

impl ForestParamsBuilder {
    pub fn new() -> Self {
        Self {
            n_trees: 100,
            tree_params_builder: TreeParamsBuilder::new(),
            seed: 42,
        }
    }

    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn min_node_size(mut self, min_node_size: usize) -> Self {
        self.tree_params_builder = self.tree_params_builder.min_node_size(min_node_size);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.tree_params_builder = self.tree_params_builder.max_depth(max_depth);
        self
    }

    pub fn mtry(mut self, mtry: Option<usize>) -> Self {
        self.tree_params_builder = self.tree_params_builder.mtry(mtry);
        self
    }

    pub fn build(self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            tree_params: self.tree_params_builder.build(),
            seed: self.seed,
        }
    }
}

impl Default for ForestParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
