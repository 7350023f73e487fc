use thiserror::Error;

/// Failures of the underlying key-value store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to serialize progress data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage I/O failed for key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed item id, status or category.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Operation not allowed in the current state (e.g. answering a finished
    /// quiz, or with a choice the current question does not offer).
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

impl EngineError {
    pub fn is_persistence(&self) -> bool {
        matches!(self, EngineError::Persistence(_))
    }
}
