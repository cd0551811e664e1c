pub mod fitter;
pub mod node;
pub mod params;
pub mod prune;

pub use fitter::fit;
pub use node::{FeatureKind, Node, NodeIter, Split, SplitRule};
pub use params::{TreeParams, TreeParamsBuilder};
