pub mod budget;
pub mod error;
pub mod flat;
pub mod residual;
pub mod tensor;
mod test;
pub mod topk;

pub use budget::CompressionBudget;
pub use error::{CompressionErr, Result};
pub use flat::FlatView;
pub use residual::{Mask, ResidualStore};
pub use tensor::{ParameterSet, Tensor};
pub use topk::{SelectionStats, SparseUpdate, TopKSelector};
