//! Residual-compensated Top-K sparsification.

use crate::{
    CompressionBudget, CompressionErr, FlatView, Mask, ParameterSet, ResidualStore, Result,
    Tensor,
};

/// The coordinates transmitted on one step, dense tensors that are zero
/// everywhere except at the selected coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseUpdate {
    tensors: Vec<Tensor>,
}

impl SparseUpdate {
    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// The amount of non-zero coordinates.
    pub fn nnz(&self) -> usize {
        self.tensors
            .iter()
            .map(|t| t.iter().filter(|&&x| x != 0.0).count())
            .sum()
    }

    pub fn into_tensors(self) -> Vec<Tensor> {
        self.tensors
    }
}

/// What a single selection did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionStats {
    pub k: usize,
    /// The k-th largest residual magnitude, `None` when there was nothing to select from.
    pub threshold: Option<f32>,
    /// Coordinates at or above the threshold, at least `k` when there are coordinates.
    pub selected: usize,
}

/// Selects which coordinates to transmit under a fixed budget.
#[derive(Debug, Clone, Copy)]
pub struct TopKSelector {
    budget: CompressionBudget,
}

impl TopKSelector {
    /// Creates a new `TopKSelector`.
    ///
    /// # Arguments
    /// * `budget` - The transmission budget, derived from the model's coordinate count.
    ///
    /// # Returns
    /// A new `TopKSelector` instance.
    pub fn new(budget: CompressionBudget) -> Self {
        Self { budget }
    }

    /// Creates a `TopKSelector` whose budget is derived from `params`.
    pub fn for_params(ratio: f64, params: &ParameterSet) -> Result<Self> {
        CompressionBudget::new(ratio, params.numel()).map(Self::new)
    }

    pub fn budget(&self) -> &CompressionBudget {
        &self.budget
    }

    /// Folds `grads` into `residual` and extracts this step's sparse update.
    ///
    /// Every coordinate whose accumulated magnitude is at least the k-th
    /// largest one is moved out of the residual and into the update, so ties
    /// at the threshold may send more than `k` coordinates. Per coordinate,
    /// `residual + grad` before the call equals `residual + update` after it.
    ///
    /// # Arguments
    /// * `residual` - The error feedback accumulator, updated in place.
    /// * `grads` - This step's local gradients.
    ///
    /// # Returns
    /// The sparse update and selection statistics, or an error if `grads`
    /// doesn't match the residual shapes, the budget was derived from another
    /// model size, or an accumulated coordinate would be NaN. The residual is
    /// only mutated once every check passed.
    pub fn select(
        &self,
        residual: &mut ResidualStore,
        grads: &[Tensor],
    ) -> Result<(SparseUpdate, SelectionStats)> {
        let total = residual.numel();
        if total != self.budget.total() {
            return Err(CompressionErr::TensorCountMismatch {
                what: "budget coordinates",
                got: total,
                expected: self.budget.total(),
            });
        }

        residual.accumulate(grads)?;

        let k = self.budget.k();
        let Some(threshold) = kth_largest_magnitude(&residual.view(), k) else {
            let tensors = residual.tensors().to_vec();
            let stats = SelectionStats {
                k,
                threshold: None,
                selected: 0,
            };

            return Ok((SparseUpdate { tensors }, stats));
        };

        let masks: Vec<Mask> = residual
            .tensors()
            .iter()
            .map(|r| r.mapv(|x| x.abs() >= threshold))
            .collect();

        let tensors = residual
            .tensors()
            .iter()
            .zip(&masks)
            .map(|(r, m)| {
                let mut sent = r.clone();
                sent.zip_mut_with(m, |x, &selected| {
                    if !selected {
                        *x = 0.0;
                    }
                });
                sent
            })
            .collect();

        residual.clear_selected(&masks)?;

        let selected = masks
            .iter()
            .map(|m| m.iter().filter(|&&s| s).count())
            .sum();

        let stats = SelectionStats {
            k,
            threshold: Some(threshold),
            selected,
        };

        Ok((SparseUpdate { tensors }, stats))
    }
}

/// Finds the `k`-th largest magnitude of `view` without sorting or copying it.
///
/// The bit patterns of non-negative floats order the same way as their
/// values, so the largest pattern `t` with `|x| >= t` holding for at least `k`
/// coordinates is exactly the `k`-th largest magnitude. Binary searching it
/// takes at most 32 counting passes.
///
/// `None` for an empty view. The residual never holds NaN, `accumulate`
/// refuses it.
fn kth_largest_magnitude(view: &FlatView<'_>, k: usize) -> Option<f32> {
    if view.is_empty() {
        return None;
    }

    let k = k.min(view.len());
    let count_at_least = |bits: u32| {
        let t = f32::from_bits(bits);
        view.iter().filter(|x| x.abs() >= t).count()
    };

    // count_at_least(lo) >= k always holds, lo starts at +0.0.
    let (mut lo, mut hi) = (0_u32, f32::INFINITY.to_bits());
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);

        if count_at_least(mid) >= k {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    Some(f32::from_bits(lo))
}
