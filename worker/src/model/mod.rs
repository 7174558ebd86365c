//! The model boundary of the worker.
//!
//! The worker never owns model semantics, it only needs a loss and a gradient
//! per parameter tensor for every batch. Whatever the model produces is run
//! through the sparsifier, and the parameters the server scatters back replace
//! the driver's `ParameterSet` in place, which is what the model reads on its
//! next call.

mod error;
mod linear;

use compression::{ParameterSet, Tensor};

use crate::data::BatchRef;

pub use error::ModelErr;
pub use linear::LinearModel;

/// A trainable model seen from the worker loop.
pub trait Model {
    /// The shape of every parameter tensor, in wire order.
    fn shapes(&self) -> Vec<Vec<usize>>;

    /// Runs a forward and backward pass over `batch`.
    ///
    /// # Arguments
    /// * `params` - The current parameters, as last scattered by the server.
    /// * `batch` - The samples to train on.
    ///
    /// # Returns
    /// The batch loss and one gradient tensor per parameter, shaped like `params`.
    fn forward_backward(
        &mut self,
        params: &ParameterSet,
        batch: BatchRef<'_>,
    ) -> Result<(f32, Vec<Tensor>), ModelErr>;

    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, lr: f32);
}
