use ndarray::{ArrayD, IxDyn};

use crate::{CompressionErr, Result};

/// An n-dimensional, row-major `f32` array.
pub type Tensor = ArrayD<f32>;

/// The ordered sequence of a model's parameter tensors.
///
/// The order is the wire order of every collective exchange, shapes are fixed
/// for the lifetime of the set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    tensors: Vec<Tensor>,
}

impl ParameterSet {
    /// Creates a new `ParameterSet`.
    ///
    /// Tensors not in standard layout are copied into it, so every tensor can
    /// be viewed as one contiguous slice.
    ///
    /// # Arguments
    /// * `tensors` - The parameter tensors, in wire order.
    ///
    /// # Returns
    /// A new `ParameterSet` instance.
    pub fn new(tensors: Vec<Tensor>) -> Self {
        let tensors = tensors
            .into_iter()
            .map(|t| {
                if t.is_standard_layout() {
                    t
                } else {
                    t.as_standard_layout().into_owned()
                }
            })
            .collect();

        Self { tensors }
    }

    /// Creates a zero-filled `ParameterSet` with the given shapes.
    pub fn zeros<S: AsRef<[usize]>>(shapes: impl IntoIterator<Item = S>) -> Self {
        let tensors = shapes
            .into_iter()
            .map(|shape| Tensor::zeros(IxDyn(shape.as_ref())))
            .collect();

        Self { tensors }
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// The total amount of scalar coordinates across every tensor.
    pub fn numel(&self) -> usize {
        numel(&self.tensors)
    }

    pub fn shapes(&self) -> Vec<Vec<usize>> {
        self.tensors.iter().map(|t| t.shape().to_vec()).collect()
    }

    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tensor> {
        self.tensors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tensor> {
        self.tensors.iter_mut()
    }

    pub fn into_tensors(self) -> Vec<Tensor> {
        self.tensors
    }

    /// Checks that `other` is shape-for-shape identical to this set.
    ///
    /// # Arguments
    /// * `what` - The name of `other` used in the error.
    /// * `other` - The tensors to check.
    ///
    /// # Returns
    /// A `TensorCountMismatch` or `ShapeMismatch` error on the first difference.
    pub fn check_matches(&self, what: &'static str, other: &[Tensor]) -> Result<()> {
        check_shapes(what, &self.tensors, other)
    }
}

impl From<Vec<Tensor>> for ParameterSet {
    fn from(tensors: Vec<Tensor>) -> Self {
        Self::new(tensors)
    }
}

pub(crate) fn numel(tensors: &[Tensor]) -> usize {
    tensors.iter().map(|t| t.len()).sum()
}

/// Checks that `got` has the same amount of tensors as `expected` and the
/// same shape at every index.
pub(crate) fn check_shapes<A, B>(
    what: &'static str,
    expected: &[ArrayD<A>],
    got: &[ArrayD<B>],
) -> Result<()> {
    if expected.len() != got.len() {
        return Err(CompressionErr::TensorCountMismatch {
            what,
            got: got.len(),
            expected: expected.len(),
        });
    }

    let mismatch = expected
        .iter()
        .zip(got)
        .position(|(e, g)| e.shape() != g.shape());

    match mismatch {
        Some(index) => Err(CompressionErr::ShapeMismatch {
            what,
            index,
            got: got[index].shape().to_vec(),
            expected: expected[index].shape().to_vec(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;

    #[test]
    fn zeros_keeps_shapes_and_order() {
        let params = ParameterSet::zeros([vec![2, 3], vec![3], vec![]]);

        assert_eq!(params.len(), 3);
        assert_eq!(params.shapes(), vec![vec![2, 3], vec![3], vec![]]);
        assert_eq!(params.numel(), 10);
        assert!(params.iter().all(|t| t.iter().all(|&x| x == 0.0)));
    }

    #[test]
    fn transposed_tensors_are_made_contiguous() {
        let t = arr2(&[[1.0_f32, 2.0], [3.0, 4.0]]).reversed_axes().into_dyn();
        assert!(!t.is_standard_layout());

        let params = ParameterSet::new(vec![t]);
        let slice = params.tensors()[0].as_slice().unwrap();
        assert_eq!(slice, &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn check_matches_reports_first_difference() {
        let params = ParameterSet::zeros([vec![2], vec![2, 2]]);

        let fewer = vec![arr1(&[0.0_f32, 0.0]).into_dyn()];
        assert_eq!(
            params.check_matches("gradient", &fewer),
            Err(CompressionErr::TensorCountMismatch {
                what: "gradient",
                got: 1,
                expected: 2
            })
        );

        let reshaped = vec![
            arr1(&[0.0_f32, 0.0]).into_dyn(),
            arr1(&[0.0_f32; 4]).into_dyn(),
        ];
        assert_eq!(
            params.check_matches("gradient", &reshaped),
            Err(CompressionErr::ShapeMismatch {
                what: "gradient",
                index: 1,
                got: vec![4],
                expected: vec![2, 2]
            })
        );

        let same = ParameterSet::zeros([vec![2], vec![2, 2]]).into_tensors();
        assert_eq!(params.check_matches("gradient", &same), Ok(()));
    }
}
