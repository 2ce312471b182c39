#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod config;
pub mod error;
pub mod feedback;
pub mod progress_service;
pub mod sessions;
pub mod timer;

pub use quiz_core::Clock;

pub use api::{GenerateQuizRequest, HttpQuizApi, MockQuizApi, QuizApi, QuizAttempt, QuizSubmission};
pub use app_services::AppServices;
pub use config::ApiConfig;
pub use error::{ConfigError, ProgressError, QuizApiError, QuizServiceError};
pub use progress_service::ProgressService;
pub use sessions::{ActiveQuiz, QuizLoopService, SubmittedQuiz, TickOutcome};
pub use timer::SessionTimer;
