pub mod forest;
pub mod sample;
pub mod test_data;
pub mod tree;
pub mod tune;

use ndarray::{Array1, ArrayView2};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("fit called with zero rows")]
    EmptyInput,
    #[error("row {row} was never out-of-bag; grow more trees")]
    InsufficientTrees { row: usize },
    #[error("degenerate result: {0}")]
    Degenerate(String),
}

#[derive(Debug)]
pub struct FitResult {
    pub err: f64,
    pub residuals: Array1<f64>,
    pub y_hat: Array1<f64>,
}

pub trait FittedModel {
    fn predict(&self, x: ArrayView2<f64>) -> Array1<f64>;
}
