//! Error types for revlog operations.
//!
//! Every variant carries a structured error code so callers (and the CLI)
//! can tell a skipped record from a halted run from an engine failure.

use thiserror::Error;

/// Result type alias for revlog operations.
pub type RevlogResult<T> = Result<T, RevlogError>;

/// Main error type for all revlog operations.
#[derive(Error, Debug)]
pub enum RevlogError {
    /// A single log record could not be parsed. The record is skipped.
    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord {
        line: u64,
        message: String,
        code: ErrorCode,
    },

    /// The log had no data records after the header.
    #[error("Empty input: no review records after the header")]
    EmptyInput,

    /// Every timeline was discarded by trimming or the same-day filter.
    #[error("No trainable sequences: all {entities} entities were trimmed or filtered")]
    NoTrainableSequences { entities: usize },

    /// The external scheduling engine reported a failure.
    #[error("Engine error: {message}")]
    Engine {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Records (REC_xxx)
    RecMissingField,
    RecInvalidNumber,
    RecOutOfRange,
    RecInvalidEncoding,

    // Input (IN_xxx)
    InEmpty,
    InNoTrainable,

    // Engine (ENG_xxx)
    EngInitFailed,
    EngTrainingFailed,
    EngInferenceFailed,

    // Configuration / IO
    Config,
    Io,
    Serialization,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RecMissingField => "REC_001",
            ErrorCode::RecInvalidNumber => "REC_002",
            ErrorCode::RecOutOfRange => "REC_003",
            ErrorCode::RecInvalidEncoding => "REC_004",
            ErrorCode::InEmpty => "IN_001",
            ErrorCode::InNoTrainable => "IN_002",
            ErrorCode::EngInitFailed => "ENG_001",
            ErrorCode::EngTrainingFailed => "ENG_002",
            ErrorCode::EngInferenceFailed => "ENG_003",
            ErrorCode::Config => "CFG_001",
            ErrorCode::Io => "IO_001",
            ErrorCode::Serialization => "SER_001",
        }
    }
}

impl RevlogError {
    /// Create a malformed record error.
    pub fn malformed(line: u64, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            message: message.into(),
            code,
        }
    }

    /// Create an engine error, keeping the engine's own error as the source.
    pub fn engine<E>(code: ErrorCode, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Engine {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }

    /// Create an engine error from a plain message.
    pub fn engine_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedRecord { code, .. } => *code,
            Self::EmptyInput => ErrorCode::InEmpty,
            Self::NoTrainableSequences { .. } => ErrorCode::InNoTrainable,
            Self::Engine { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::Config,
            Self::Io(_) => ErrorCode::Io,
            Self::Serialization(_) => ErrorCode::Serialization,
        }
    }

    /// Whether this error halts a run without the engine being called.
    pub fn halts_before_engine(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::NoTrainableSequences { .. })
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::MalformedRecord { .. } => {
                Some("Expected columns: card_id, review_time (ms), review_rating (1-4), review_state (0-3)")
            }
            Self::EmptyInput => Some("Check that the log has records below its header line"),
            Self::NoTrainableSequences { .. } => Some(
                "Cards need a learning-phase review followed by a review on a later day",
            ),
            Self::Configuration(_) => Some("Please check your configuration file and environment"),
            _ => None,
        }
    }
}
