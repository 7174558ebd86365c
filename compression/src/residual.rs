use ndarray::ArrayD;

use crate::{
    CompressionErr, FlatView, ParameterSet, Result, Tensor,
    tensor::{self, check_shapes},
};

/// Per-tensor selection mask, `true` marks a transmitted coordinate.
pub type Mask = ArrayD<bool>;

/// The not-yet-transmitted gradient mass, one tensor per parameter.
///
/// Between steps every coordinate holds the sum of every local gradient
/// contribution minus everything transmitted from it. The only mutations are
/// `accumulate` and `clear_selected`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualStore {
    tensors: Vec<Tensor>,
}

impl ResidualStore {
    /// Creates a zero-filled `ResidualStore` matching `params` shape for shape.
    ///
    /// # Arguments
    /// * `params` - The parameter set the residual tracks.
    ///
    /// # Returns
    /// A new `ResidualStore` instance.
    pub fn zeros_like(params: &ParameterSet) -> Self {
        let tensors = params.iter().map(|p| Tensor::zeros(p.raw_dim())).collect();
        Self { tensors }
    }

    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    pub fn numel(&self) -> usize {
        tensor::numel(&self.tensors)
    }

    /// A flat view over every residual coordinate, in parameter order.
    pub fn view(&self) -> FlatView<'_> {
        FlatView::new(&self.tensors)
    }

    /// Adds `grads[i]` into the residual tensor `i`, elementwise.
    ///
    /// # Arguments
    /// * `grads` - The new local gradients.
    ///
    /// # Returns
    /// A shape error if `grads` doesn't match the residual shape for shape,
    /// or `NonFinite` if a sum would be NaN. On error the residual is left
    /// untouched.
    pub fn accumulate(&mut self, grads: &[Tensor]) -> Result<()> {
        check_shapes("gradient", &self.tensors, grads)?;

        if let Some(offset) = first_nan_sum(&self.view(), &FlatView::new(grads)) {
            return Err(CompressionErr::NonFinite { offset });
        }

        for (r, g) in self.tensors.iter_mut().zip(grads) {
            r.zip_mut_with(g, |r, &g| *r += g);
        }

        Ok(())
    }

    /// Zeroes every coordinate flagged in `masks`, leaves the rest as is.
    ///
    /// # Arguments
    /// * `masks` - One mask per residual tensor.
    ///
    /// # Returns
    /// A shape error if `masks` doesn't match the residual shape for shape.
    pub fn clear_selected(&mut self, masks: &[Mask]) -> Result<()> {
        check_shapes("mask", &self.tensors, masks)?;

        for (r, m) in self.tensors.iter_mut().zip(masks) {
            r.zip_mut_with(m, |r, &selected| {
                if selected {
                    *r = 0.0;
                }
            });
        }

        Ok(())
    }
}

fn first_nan_sum(residual: &FlatView<'_>, grads: &FlatView<'_>) -> Option<usize> {
    residual
        .iter()
        .zip(grads.iter())
        .position(|(r, g)| (r + g).is_nan())
}
