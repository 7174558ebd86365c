use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire compression module.
pub type Result<T> = std::result::Result<T, CompressionErr>;

/// The compression module's error type.
///
/// Every variant is a precondition violation, none of them is recoverable by
/// retrying the same call.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressionErr {
    TensorCountMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    ShapeMismatch {
        what: &'static str,
        index: usize,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    InvalidRatio(f64),
    NonFinite {
        offset: usize,
    },
}

impl Display for CompressionErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionErr::TensorCountMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "{what} has {got} tensors but the parameter set has {expected}"
            ),
            CompressionErr::ShapeMismatch {
                what,
                index,
                got,
                expected,
            } => write!(
                f,
                "{what} tensor {index} has shape {got:?}, expected {expected:?}"
            ),
            CompressionErr::InvalidRatio(ratio) => {
                write!(f, "the compression ratio must be in [0, 1], got {ratio}")
            }
            CompressionErr::NonFinite { offset } => {
                write!(f, "the residual is NaN at flat offset {offset}")
            }
        }
    }
}

impl Error for CompressionErr {}
