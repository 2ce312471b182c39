//! The quiz backend as seen by the session loop.
//!
//! `QuizApi` is the only seam between sessions and transport. `HttpQuizApi`
//! speaks JSON to a remote backend; `MockQuizApi` generates and grades
//! quizzes in-process.

mod http;
mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quiz_core::model::{Difficulty, Quiz, QuizId, QuizResult, QuizSession, UserId};

use crate::error::QuizApiError;

pub use http::HttpQuizApi;
pub use mock::MockQuizApi;

/// Wire value for an unanswered slot.
pub const UNANSWERED: i64 = -1;

/// Body of `POST /quiz/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateQuizRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub num_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl GenerateQuizRequest {
    #[must_use]
    pub fn new(topic: impl Into<String>, difficulty: Difficulty, num_questions: u32) -> Self {
        Self {
            topic: topic.into(),
            difficulty,
            num_questions,
            user_id: None,
        }
    }

    #[must_use]
    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Body of `POST /quiz/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub quiz_id: QuizId,
    pub answers: Vec<i64>,
    #[serde(default)]
    pub time_spent: u32,
}

impl QuizSubmission {
    /// Snapshot the answers of a session that has not been submitted yet.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        Self {
            quiz_id: session.quiz().id().clone(),
            answers: encode_answers(session.answers()),
            time_spent: session.elapsed_secs(),
        }
    }

    #[must_use]
    pub fn from_result(result: &QuizResult) -> Self {
        Self {
            quiz_id: result.quiz_id().clone(),
            answers: encode_answers(result.answers()),
            time_spent: result.time_spent_secs(),
        }
    }

    /// Answers with the `-1` sentinel (or any other out-of-range value)
    /// mapped back to `None`.
    #[must_use]
    pub fn decoded_answers(&self) -> Vec<Option<usize>> {
        self.answers
            .iter()
            .map(|&answer| usize::try_from(answer).ok())
            .collect()
    }
}

fn encode_answers(answers: &[Option<usize>]) -> Vec<i64> {
    answers
        .iter()
        .map(|answer| {
            answer
                .and_then(|index| i64::try_from(index).ok())
                .unwrap_or(UNANSWERED)
        })
        .collect()
}

/// The backend's record of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: String,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub answers: Vec<i64>,
    pub score: u8,
    pub completed_at: String,
    #[serde(default)]
    pub time_spent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Quiz generation and submission collaborator.
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn generate_quiz(&self, request: &GenerateQuizRequest) -> Result<Quiz, QuizApiError>;

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizAttempt, QuizApiError>;
}
