//! # AppError
//!
//! Centralized error handling for the joke labeler.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

use crate::models::JokeId;

/// Why a label submission was refused before anything was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelRejection {
    #[error("missing joke id")]
    MissingJokeId,

    #[error("must provide segments or mark no punchline")]
    EmptySubmission,

    #[error("unknown joke id {0}")]
    UnknownJoke(JokeId),
}

/// The primary error type for all jl-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Rejected label submission
    #[error("validation error: {0}")]
    ValidationError(#[from] LabelRejection),

    /// Infrastructure failure (e.g., DB down, commit failed)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for joke labeler logic.
pub type Result<T> = std::result::Result<T, AppError>;
