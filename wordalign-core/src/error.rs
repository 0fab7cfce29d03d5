//! Error types for training, decoding and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, AlignError>;

#[derive(Debug, Error)]
pub enum AlignError {
    /// A training sentence does not fit in the position type.
    #[error("sentence {index}: {side} side has {len} tokens (limit {max})")]
    SentenceTooLong {
        index: usize,
        side: &'static str,
        len: usize,
        max: usize,
    },

    /// Parallel text whose two sides disagree on the number of sentences.
    #[error("source has {source_lines} sentences but target has {target_lines}")]
    LineCountMismatch {
        source_lines: usize,
        target_lines: usize,
    },

    /// The persisted lexical table for a Model 2 warm start could not be loaded.
    #[error("warm start unavailable from {}: {reason}", .path.display())]
    WarmStartUnavailable { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlignError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn warm_start(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WarmStartUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
