//! Error types for the mutation engine
//!
//! Three failure domains, handled differently:
//! - Configuration problems are fatal and surface when the engine is built
//! - Malformed input responses are reported to the caller of the engine
//! - Assembly failures for single mutants are logged and the mutant dropped

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A required key has no value
    #[error("missing configuration key: {0}")]
    MissingKey(String),

    /// A key exists but its value has the wrong shape
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Offending key
        key: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A configuration document could not be parsed
    #[error("cannot parse configuration: {0}")]
    Parse(String),

    /// A configuration file could not be read
    #[error("cannot read configuration file {path}: {reason}")]
    Io {
        /// File path
        path: String,
        /// Underlying I/O error message
        reason: String,
    },
}

impl ConfigError {
    /// Create invalid value error
    #[inline]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors about the shape of a canonical response document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// The document is not a JSON object
    #[error("response must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The status code field is absent
    #[error("response has no \"Status Code\" field")]
    MissingStatusCode,

    /// The status code is not an integer in 100..=599
    #[error("invalid status code: {0}")]
    InvalidStatusCode(String),

    /// The headers field is not an object
    #[error("\"Headers\" must be a JSON object, got {0}")]
    InvalidHeaders(&'static str),

    /// A body number is outside the supported integer and float kinds
    #[error("unsupported body value at {path}: {value}")]
    UnsupportedBodyKind {
        /// Location of the value
        path: String,
        /// Rendered value
        value: String,
    },
}

/// Failure to turn a partial mutation back into a full response
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    /// Mutated status code is not a valid HTTP status
    #[error("mutated status code is not valid: {0}")]
    StatusCode(String),

    /// Mutated header set is not an object of strings
    #[error("mutated headers are not valid: {0}")]
    Headers(String),

    /// Body location no longer exists in the original body
    #[error("body location {0} does not resolve")]
    BodyPath(String),
}

/// Errors surfaced while streaming mutant groups
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Input response is malformed
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// Engine could not be configured
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias for configuration access
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
