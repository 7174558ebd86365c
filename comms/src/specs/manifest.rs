use serde::{Deserialize, Serialize};

/// Wire-level description of a model's parameters: one shape per tensor, in
/// the order every collective exchange walks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamManifest {
    pub shapes: Vec<Vec<usize>>,
}

impl ParamManifest {
    /// Creates a new `ParamManifest`.
    ///
    /// # Arguments
    /// * `shapes` - The shape of every parameter tensor, in order.
    ///
    /// # Returns
    /// A new `ParamManifest` instance.
    pub fn new(shapes: Vec<Vec<usize>>) -> Self {
        Self { shapes }
    }

    /// The amount of parameter tensors.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// The total amount of scalar coordinates across every tensor.
    pub fn numel(&self) -> usize {
        self.shapes
            .iter()
            .map(|shape| shape.iter().product::<usize>())
            .sum()
    }
}
