mod active;
mod workflow;

// Public API of the quiz session subsystem.
pub use crate::error::QuizServiceError;
pub use active::ActiveQuiz;
pub use workflow::{QuizLoopService, SubmittedQuiz, TickOutcome};
