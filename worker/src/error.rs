use std::{error::Error, fmt, io};

use compression::CompressionErr;

use crate::{model::ModelErr, protocol::SyncState};

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
///
/// Every variant is fatal to the training run, the synchronous group has no
/// notion of a degraded member.
#[derive(Debug)]
pub enum WorkerErr {
    Io(io::Error),
    Compression(CompressionErr),
    Model(ModelErr),
    InvalidConfig(String),
    /// The root reported a failure instead of the expected frame.
    Server(String),
    UnexpectedMessage {
        expected: &'static str,
        got: &'static str,
    },
    /// A scattered chunk doesn't fit the tensor it's meant to replace.
    ShapeMismatch {
        got: usize,
        expected: usize,
    },
    /// The root's manifest disagrees with the local parameters.
    ManifestMismatch {
        index: Option<usize>,
        got: Vec<Vec<usize>>,
        expected: Vec<Vec<usize>>,
    },
    InvalidState {
        op: &'static str,
        state: SyncState,
    },
    NonContiguous {
        index: usize,
    },
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::Compression(e) => write!(f, "compression error: {e}"),
            WorkerErr::Model(e) => write!(f, "model error: {e}"),
            WorkerErr::InvalidConfig(detail) => write!(f, "invalid config: {detail}"),
            WorkerErr::Server(detail) => write!(f, "server error: {detail}"),
            WorkerErr::UnexpectedMessage { expected, got } => {
                write!(f, "unexpected message: expected {expected}, got {got}")
            }
            WorkerErr::ShapeMismatch { got, expected } => write!(
                f,
                "scatter length mismatch: got {got} values, expected {expected}"
            ),
            WorkerErr::ManifestMismatch {
                index: Some(i),
                got,
                expected,
            } => write!(
                f,
                "manifest mismatch at tensor {i}: server has {:?}, local is {:?}",
                got[*i], expected[*i]
            ),
            WorkerErr::ManifestMismatch {
                index: None,
                got,
                expected,
            } => write!(
                f,
                "manifest mismatch: server has {} tensors, local has {}",
                got.len(),
                expected.len()
            ),
            WorkerErr::InvalidState { op, state } => {
                write!(f, "cannot {op} while in state {state:?}")
            }
            WorkerErr::NonContiguous { index } => {
                write!(f, "tensor {index} is not laid out contiguously")
            }
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Io(e) => Some(e),
            WorkerErr::Compression(e) => Some(e),
            WorkerErr::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CompressionErr> for WorkerErr {
    fn from(value: CompressionErr) -> Self {
        Self::Compression(value)
    }
}

impl From<ModelErr> for WorkerErr {
    fn from(value: ModelErr) -> Self {
        Self::Model(value)
    }
}

impl From<serde_json::Error> for WorkerErr {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        match value {
            WorkerErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
