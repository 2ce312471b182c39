//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, QuizId, SessionError};

/// Failures talking to the quiz generation/submission backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizApiError {
    #[error("quiz api request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generated quiz is invalid: {0}")]
    InvalidQuiz(#[from] QuizError),
    #[error("quiz {0} is not known to the backend")]
    UnknownQuiz(QuizId),
}

/// Errors emitted by `QuizLoopService`.
///
/// Transport failures are kept apart from session contract violations so a
/// failed upload never reads as a broken session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz generation failed")]
    GenerationFailed(#[source] QuizApiError),
    #[error("quiz submission failed")]
    SubmissionFailed(#[source] QuizApiError),
    #[error("session has not been submitted yet")]
    NotSubmitted,
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base URL {raw:?}")]
    InvalidBaseUrl { raw: String },
    #[error("invalid value for {name}: {raw:?}")]
    InvalidValue { name: &'static str, raw: String },
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("only educators can view student progress")]
    AccessDenied,
}
