use std::num::NonZeroUsize;

use compression::{ParameterSet, Tensor};
use ndarray::{ArrayView2, Axis, Ix1, Ix2};

use super::{Model, ModelErr};
use crate::data::BatchRef;

/// Dense linear regression, `y = W x + b` under mean squared error.
///
/// Parameters are `[W, b]` with shapes `[output, input]` and `[output]`. The
/// gradients it reports are already scaled by the learning rate, so what the
/// worker sends is the plain SGD delta and the server only has to aggregate.
#[derive(Debug, Clone)]
pub struct LinearModel {
    input: usize,
    output: usize,
    lr: f32,
}

impl LinearModel {
    /// Creates a new `LinearModel`.
    ///
    /// # Arguments
    /// * `input` - The amount of features per sample.
    /// * `output` - The amount of targets per sample.
    /// * `lr` - The initial learning rate.
    ///
    /// # Returns
    /// A new `LinearModel` instance.
    pub fn new(input: NonZeroUsize, output: NonZeroUsize, lr: f32) -> Self {
        Self {
            input: input.get(),
            output: output.get(),
            lr,
        }
    }
}

impl Model for LinearModel {
    fn shapes(&self) -> Vec<Vec<usize>> {
        vec![vec![self.output, self.input], vec![self.output]]
    }

    fn forward_backward(
        &mut self,
        params: &ParameterSet,
        batch: BatchRef<'_>,
    ) -> Result<(f32, Vec<Tensor>), ModelErr> {
        let [w, b] = params.tensors() else {
            return Err(ModelErr::ShapeMismatch {
                what: "params",
                got: params.len(),
                expected: 2,
            });
        };

        let w = w
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| ModelErr::InvalidInput("weights must be a matrix"))?;
        let b = b
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|_| ModelErr::InvalidInput("bias must be a vector"))?;

        if w.dim() != (self.output, self.input) {
            return Err(ModelErr::ShapeMismatch {
                what: "weights",
                got: w.len(),
                expected: self.output * self.input,
            });
        }
        if b.len() != self.output {
            return Err(ModelErr::ShapeMismatch {
                what: "bias",
                got: b.len(),
                expected: self.output,
            });
        }
        if batch.x_size != self.input {
            return Err(ModelErr::ShapeMismatch {
                what: "features",
                got: batch.x_size,
                expected: self.input,
            });
        }
        if batch.y_size != self.output {
            return Err(ModelErr::ShapeMismatch {
                what: "targets",
                got: batch.y_size,
                expected: self.output,
            });
        }

        let n = batch.len();
        if n == 0 {
            return Err(ModelErr::InvalidInput("batch must be non-empty"));
        }

        let xs = ArrayView2::from_shape((n, self.input), batch.xs).map_err(|_| {
            ModelErr::ShapeMismatch {
                what: "batch features",
                got: batch.xs.len(),
                expected: n * self.input,
            }
        })?;
        let ys = ArrayView2::from_shape((n, self.output), batch.ys).map_err(|_| {
            ModelErr::ShapeMismatch {
                what: "batch targets",
                got: batch.ys.len(),
                expected: n * self.output,
            }
        })?;

        let mut err = xs.dot(&w.t());
        err += &b;
        err -= &ys;

        let count = (n * self.output) as f32;
        let loss = err.iter().map(|e| e * e).sum::<f32>() / count;
        if !loss.is_finite() {
            return Err(ModelErr::Diverged { loss });
        }

        let step = self.lr * 2.0 / count;
        let mut grad_w = err.t().dot(&xs);
        grad_w.mapv_inplace(|g| g * step);
        let mut grad_b = err.sum_axis(Axis(0));
        grad_b.mapv_inplace(|g| g * step);

        Ok((loss, vec![grad_w.into_dyn(), grad_b.into_dyn()]))
    }

    fn learning_rate(&self) -> f32 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.lr = lr;
    }
}
