//! Shared error types for the services crate.

use thiserror::Error;

use hygiene_core::model::{CertificateError, QuizError, UserStatsError};
use storage::repository::StorageError;

/// Errors emitted by quiz session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("no questions available for {category} ({difficulty})")]
    NoQuestions {
        category: String,
        difficulty: String,
    },
    #[error("no quiz is active")]
    NoActiveQuiz,
    #[error("a certificate needs a passing score, got {0:.1}%")]
    NotPassing(f64),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
    #[error(transparent)]
    Stats(#[from] UserStatsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by artifact renderers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode artifact: {0}")]
    Json(#[from] serde_json::Error),
}
