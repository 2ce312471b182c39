use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::model::question::Question;
use crate::model::quiz::{Quiz, QuizError};
use crate::model::result::QuizResult;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Contract violations raised by [`QuizSession`]. None of them are transient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid quiz: {0}")]
    InvalidQuiz(#[from] QuizError),

    #[error("answer {index} is out of range for a question with {options} options")]
    InvalidArgument { index: usize, options: usize },

    #[error("question index {index} is out of range (quiz has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot {operation} while session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    InProgress,
    /// The user asked to submit and is looking at the confirmation prompt.
    PendingConfirmation,
    /// Terminal.
    Submitted,
}

impl SessionStatus {
    /// True while the countdown should keep running.
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, SessionStatus::Submitted)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::InProgress => "in progress",
            SessionStatus::PendingConfirmation => "pending confirmation",
            SessionStatus::Submitted => "submitted",
        };
        f.write_str(label)
    }
}

/// Render seconds as `m:ss` for the countdown display.
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    format!("{minutes}:{remainder:02}")
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a quiz.
///
/// Tracks the current question, one answer slot per question, and the
/// countdown. Every mutating operation is rejected once the session is
/// `Submitted`. The session never reads the wall clock: timestamps come from
/// the caller and `tick` is driven by an external one-second timer.
pub struct QuizSession {
    quiz: Arc<Quiz>,
    current: usize,
    answers: Vec<Option<usize>>,
    initial_secs: u32,
    remaining_secs: u32,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Start a session at the first question with every slot unanswered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidQuiz` if the quiz has no questions or
    /// otherwise fails validation.
    pub fn new(quiz: Arc<Quiz>, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        quiz.validate()?;

        let initial_secs = quiz.time_limit_secs();
        let answers = vec![None; quiz.question_count()];
        Ok(Self {
            quiz,
            current: 0,
            answers,
            initial_secs,
            remaining_secs: initial_secs,
            status: SessionStatus::InProgress,
            started_at,
            result: None,
        })
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn quiz_arc(&self) -> Arc<Quiz> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status == SessionStatus::Submitted
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        // `current` is kept in bounds and the quiz is non-empty.
        &self.quiz.questions()[self.current]
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.answers.len()
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<usize> {
        self.answer_for(self.current)
    }

    /// Number of slots holding an answer. Display only.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.is_some()).count()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn initial_secs(&self) -> u32 {
        self.initial_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.initial_secs - self.remaining_secs
    }

    /// The result produced by submission, once there is one.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// Record `option` as the answer to the current question, replacing any
    /// earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` unless the session is in progress,
    /// and `SessionError::InvalidArgument` if `option` is not an option index.
    pub fn select_answer(&mut self, option: usize) -> Result<(), SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(self.invalid_state("select an answer"));
        }
        let options = self.current_question().option_count();
        if option >= options {
            return Err(SessionError::InvalidArgument {
                index: option,
                options,
            });
        }
        self.answers[self.current] = Some(option);
        Ok(())
    }

    /// Advance one question. No-op on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is submitted.
    pub fn go_to_next(&mut self) -> Result<(), SessionError> {
        self.ensure_active("navigate")?;
        if !self.is_last() {
            self.current += 1;
        }
        Ok(())
    }

    /// Step back one question. No-op on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is submitted.
    pub fn go_to_previous(&mut self) -> Result<(), SessionError> {
        self.ensure_active("navigate")?;
        self.current = self.current.saturating_sub(1);
        Ok(())
    }

    /// Jump straight to `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IndexOutOfRange` if `index` is past the last
    /// question, and `SessionError::InvalidState` if the session is submitted.
    /// The session is left untouched on error.
    pub fn go_to_question(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_active("navigate")?;
        if index >= self.answers.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.answers.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Advisory: the user wants to submit. Does not submit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is submitted.
    pub fn request_submit_confirmation(&mut self) -> Result<(), SessionError> {
        self.ensure_active("request confirmation")?;
        self.status = SessionStatus::PendingConfirmation;
        Ok(())
    }

    /// Back out of the confirmation prompt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is submitted.
    pub fn cancel_submit_confirmation(&mut self) -> Result<(), SessionError> {
        self.ensure_active("cancel confirmation")?;
        self.status = SessionStatus::InProgress;
        Ok(())
    }

    /// Count down one second.
    ///
    /// Reaching zero submits the session with whatever answers are recorded
    /// and returns the result; otherwise returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is submitted.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<QuizResult>, SessionError> {
        self.ensure_active("tick")?;
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Ok(None);
        }
        Ok(Some(self.finish(now, true)))
    }

    /// Score the recorded answers and move to `Submitted`. Exactly once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is already
    /// submitted; the earlier result is kept as is.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<QuizResult, SessionError> {
        self.ensure_active("submit")?;
        Ok(self.finish(now, false))
    }

    /// Number of recorded answers that match the key.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.quiz
            .questions()
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| question.is_correct(**answer))
            .count()
    }

    fn finish(&mut self, now: DateTime<Utc>, timed_out: bool) -> QuizResult {
        let result = QuizResult::new(
            self.quiz.id().clone(),
            self.answers.clone(),
            self.correct_count(),
            now,
            self.elapsed_secs(),
            timed_out,
        );
        self.status = SessionStatus::Submitted;
        self.result = Some(result.clone());
        result
    }

    fn ensure_active(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.status.is_active() {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            status: self.status,
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", self.quiz.id())
            .field("questions", &self.answers.len())
            .field("current", &self.current)
            .field("answered", &self.answered_count())
            .field("remaining_secs", &self.remaining_secs)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
