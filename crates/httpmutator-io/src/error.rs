//! Error types for reading, writing and running the pipeline

use httpmutator_core::{EngineError, InputError};

/// Errors while reading exchanges
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Underlying reader failed
    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),

    /// A JSONL line is not valid JSON
    #[error("invalid JSON at line {line}: {reason}")]
    InvalidJson {
        /// 1-based line number
        line: usize,
        /// Parser message
        reason: String,
    },

    /// A record parsed but is not a valid response
    #[error("invalid response in {record}: {source}")]
    InvalidResponse {
        /// Which record (line or entry)
        record: String,
        /// What was wrong
        #[source]
        source: InputError,
    },

    /// The HAR document does not have the expected layout
    #[error("invalid HAR document: {0}")]
    InvalidHar(String),
}

impl ReadError {
    /// Create invalid response error
    #[inline]
    pub fn invalid_response(record: impl Into<String>, source: InputError) -> Self {
        Self::InvalidResponse {
            record: record.into(),
            source,
        }
    }
}

/// Errors while writing mutants or reports
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Underlying writer failed
    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("cannot serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Output already closed
    #[error("{0} is already closed")]
    Closed(&'static str),
}

/// Errors from the pipeline facade
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No selection strategy was configured
    #[error("a mutation strategy is required")]
    MissingStrategy,

    /// Engine failed on an exchange
    #[error("exchange {id}: {source}")]
    Engine {
        /// Exchange identifier
        id: String,
        /// Engine failure
        #[source]
        source: EngineError,
    },

    /// Input could not be read
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Output could not be written
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl PipelineError {
    /// True for I/O problems (unreadable input, unwritable output)
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Read(ReadError::Io(_)) | Self::Write(WriteError::Io(_))
        )
    }
}

/// Result alias for readers
pub type ReadResult<T> = Result<T, ReadError>;

/// Result alias for writers and reporters
pub type WriteResult<T> = Result<T, WriteError>;

/// Result alias for the pipeline
pub type PipelineResult<T> = Result<T, PipelineError>;
