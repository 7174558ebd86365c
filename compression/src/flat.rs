//! A flat, read-only view over a sequence of tensors.
//!
//! Maps a logical offset in the concatenation of every tensor (in sequence
//! order, each tensor row-major) to the tensor holding it, without building
//! the concatenation.

use crate::Tensor;

/// Logical concatenation of a tensor sequence.
#[derive(Debug, Clone)]
pub struct FlatView<'a> {
    tensors: &'a [Tensor],
    // `starts[i]` is the logical offset of tensor `i`'s first element,
    // `starts[len]` is the total length.
    starts: Vec<usize>,
}

impl<'a> FlatView<'a> {
    /// Creates a new `FlatView`.
    ///
    /// # Arguments
    /// * `tensors` - The tensors to view, in order.
    ///
    /// # Returns
    /// A new `FlatView` instance.
    pub fn new(tensors: &'a [Tensor]) -> Self {
        let mut starts = Vec::with_capacity(tensors.len() + 1);
        let mut acc = 0;
        starts.push(acc);

        for t in tensors {
            acc += t.len();
            starts.push(acc);
        }

        Self { tensors, starts }
    }

    /// The total amount of coordinates.
    pub fn len(&self) -> usize {
        self.starts[self.tensors.len()]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps a logical offset to `(tensor index, offset inside the tensor)`.
    ///
    /// # Returns
    /// `None` if `offset` is out of bounds.
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        if offset >= self.len() {
            return None;
        }

        // Last tensor starting at or before `offset`, skips empty tensors.
        let idx = self.starts.partition_point(|&start| start <= offset) - 1;
        Some((idx, offset - self.starts[idx]))
    }

    /// Returns the value at a logical offset.
    pub fn get(&self, offset: usize) -> Option<f32> {
        let (idx, local) = self.locate(offset)?;
        let tensor = &self.tensors[idx];

        match tensor.as_slice() {
            Some(slice) => slice.get(local).copied(),
            None => tensor.iter().nth(local).copied(),
        }
    }

    /// Iterates every coordinate in logical order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.tensors.iter().flat_map(|t| t.iter().copied())
    }
}
