use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    /// Minimum number of rows on each side of a split.
    pub min_node_size: usize,
    /// Maximum number of splits on any root-to-leaf path.
    pub max_depth: usize,
    /// Features considered per split. `None` means all features (plain tree);
    /// `Some(m)` draws m features fresh at every split (forest variant).
    pub mtry: Option<usize>,
}

impl TreeParams {
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.min_node_size < 1 {
            return Err(Error::InvalidConfiguration(
                "min_node_size must be at least 1".into(),
            ));
        }
        if self.max_depth < 1 {
            return Err(Error::InvalidConfiguration(
                "max_depth must be at least 1".into(),
            ));
        }
        if let Some(m) = self.mtry {
            if m < 1 || m > n_features {
                return Err(Error::InvalidConfiguration(format!(
                    "mtry must be in 1..={n_features}, got {m}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParamsBuilder::new().build()
    }
}

pub struct TreeParamsBuilder {
    min_node_size: usize,
    max_depth: usize,
    mtry: Option<usize>,
}

impl TreeParamsBuilder {
    pub fn new() -> Self {
        Self {
            min_node_size: 5,
            max_depth: 30,
            mtry: None,
        }
    }

    pub fn min_node_size(mut self, min_node_size: usize) -> Self {
        self.min_node_size = min_node_size;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn mtry(mut self, mtry: Option<usize>) -> Self {
        self.mtry = mtry;
        self
    }

    pub fn build(self) -> TreeParams {
        TreeParams {
            min_node_size: self.min_node_size,
            max_depth: self.max_depth,
            mtry: self.mtry,
        }
    }
}

impl Default for TreeParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
