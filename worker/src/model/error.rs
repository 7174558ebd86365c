use std::fmt;

/// Failures of a forward/backward pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelErr {
    InvalidInput(&'static str),
    /// `what` has `got` elements where the model needs `expected`.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// The loss stopped being a finite number.
    Diverged { loss: f32 },
}

impl fmt::Display for ModelErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelErr::InvalidInput(detail) => write!(f, "invalid input: {detail}"),
            ModelErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "{what} has {got} elements, expected {expected}"),
            ModelErr::Diverged { loss } => write!(f, "training diverged, loss is {loss}"),
        }
    }
}

impl std::error::Error for ModelErr {}
