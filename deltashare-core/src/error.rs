use deltashare_math::ArrayError;
use thiserror::Error;

/// How a collection's layout diverged from the captured baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyMismatch {
    /// Baseline parameter absent from the collection.
    Missing(String),
    /// Collection carries a parameter the baseline never had.
    Unexpected(String),
    /// Same name, different dimensions.
    Shape {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}

impl std::fmt::Display for KeyMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing parameter '{name}'"),
            Self::Unexpected(name) => write!(f, "unexpected parameter '{name}'"),
            Self::Shape {
                name,
                expected,
                got,
            } => write!(f, "parameter '{name}' has shape {got:?}, expected {expected:?}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SharingError {
    #[error("No deltas recorded this round")]
    EmptyAccumulation,
    #[error("Parameter layout mismatch: {0}")]
    MismatchedKeys(KeyMismatch),
    #[error("Flat vector has {got} elements, expected {expected}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("Index {index} outside [0, {len})")]
    InvalidIndex { index: i64, len: usize },
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfig(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Math error: {0}")]
    Math(#[from] ArrayError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SharingError {
    /// True for errors confined to one incoming message.
    ///
    /// The receive path drops such a message and keeps going; every other
    /// error aborts the peer's round.
    pub fn is_message_local(&self) -> bool {
        matches!(
            self,
            Self::LengthMismatch { .. } | Self::InvalidIndex { .. } | Self::MalformedMessage(_)
        )
    }
}
