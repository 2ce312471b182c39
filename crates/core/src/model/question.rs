use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::quiz::QuizError;

/// A single multiple-choice question.
///
/// Immutable once built: options are fixed and `correct_answer` always
/// indexes into them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyPrompt` if the prompt is blank,
    /// `QuizError::TooFewOptions` for fewer than two options, and
    /// `QuizError::CorrectAnswerOutOfRange` if the correct index is not an option.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuizError> {
        let question = Self {
            id,
            question: prompt.into().trim().to_string(),
            options,
            correct_answer,
            explanation: explanation
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
        };
        question.validate()?;
        Ok(question)
    }

    /// Re-check the invariants. Used for questions that arrived over the wire.
    ///
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.question.trim().is_empty() {
            return Err(QuizError::EmptyPrompt {
                question: self.id.clone(),
            });
        }
        if self.options.len() < 2 {
            return Err(QuizError::TooFewOptions {
                question: self.id.clone(),
                len: self.options.len(),
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuizError::CorrectAnswerOutOfRange {
                question: self.id.clone(),
                index: self.correct_answer,
                options: self.options.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_answer)
    }
}
