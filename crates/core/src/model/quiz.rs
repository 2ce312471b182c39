use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;

/// Applied when a quiz carries no explicit time limit.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 30;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("time limit must be > 0 minutes")]
    InvalidTimeLimit,

    #[error("question {question} has an empty prompt")]
    EmptyPrompt { question: QuestionId },

    #[error("question {question} needs at least 2 options, got {len}")]
    TooFewOptions { question: QuestionId, len: usize },

    #[error("question {question} marks option {index} correct but has {options} options")]
    CorrectAnswerOutOfRange {
        question: QuestionId,
        index: usize,
        options: usize,
    },

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(QuizError::UnknownDifficulty(other.to_string())),
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// An immutable, ordered set of questions with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    id: QuizId,
    title: String,
    topic: String,
    difficulty: Difficulty,
    questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_limit: Option<u32>,
    created_at: DateTime<Utc>,
}

impl Quiz {
    /// Build a validated quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the title is blank, there are no questions,
    /// the time limit is zero, or any question is invalid.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        topic: impl Into<String>,
        difficulty: Difficulty,
        questions: Vec<Question>,
        time_limit_minutes: Option<u32>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        let quiz = Self {
            id,
            title: title.into().trim().to_string(),
            topic: topic.into().trim().to_string(),
            difficulty,
            questions,
            time_limit: time_limit_minutes,
            created_at,
        };
        quiz.validate()?;
        Ok(quiz)
    }

    /// Re-check every invariant, including each question's.
    ///
    /// Quizzes deserialized from a generator bypass [`Quiz::new`], so sessions
    /// call this before starting.
    ///
    /// # Errors
    ///
    /// See [`Quiz::new`].
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        if self.time_limit == Some(0) {
            return Err(QuizError::InvalidTimeLimit);
        }
        self.questions.iter().try_for_each(Question::validate)
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// The limit as given by the generator, if any.
    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit
    }

    /// Total seconds a session gets, falling back to the 30 minute default.
    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit
            .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES)
            .saturating_mul(60)
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
