use std::sync::Arc;
use std::time::Duration;

use quiz_core::Clock;
use quiz_core::model::{Quiz, QuizResult, QuizSession, SessionError};

use super::active::ActiveQuiz;
use crate::api::{GenerateQuizRequest, QuizApi, QuizAttempt, QuizSubmission};
use crate::error::QuizServiceError;
use crate::timer::TICK_PERIOD;

/// A submitted attempt and, if the upload went through, the backend's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedQuiz {
    pub result: QuizResult,
    pub attempt: Option<QuizAttempt>,
}

/// What one timer tick did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    TimedOut(SubmittedQuiz),
}

/// Orchestrates quiz generation, the countdown, and submission.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    api: Arc<dyn QuizApi>,
    tick_period: Duration,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn QuizApi>) -> Self {
        Self {
            clock,
            api,
            tick_period: TICK_PERIOD,
        }
    }

    #[must_use]
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    /// Generate a quiz and start an attempt at it.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::GenerationFailed` if the backend fails, and
    /// `QuizServiceError::Session` if the quiz cannot back a session.
    pub async fn start_quiz(
        &self,
        request: &GenerateQuizRequest,
    ) -> Result<ActiveQuiz, QuizServiceError> {
        let quiz = self.api.generate_quiz(request).await.map_err(|err| {
            tracing::warn!(topic = %request.topic, error = %err, "quiz generation failed");
            QuizServiceError::GenerationFailed(err)
        })?;
        tracing::info!(
            quiz_id = %quiz.id(),
            topic = quiz.topic(),
            difficulty = %quiz.difficulty(),
            questions = quiz.question_count(),
            "quiz generated"
        );
        self.begin(quiz)
    }

    /// Start an attempt at an existing quiz. Must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` if the quiz has no questions.
    pub fn begin(&self, quiz: Quiz) -> Result<ActiveQuiz, QuizServiceError> {
        let session = QuizSession::new(Arc::new(quiz), self.clock.now())?;
        Ok(ActiveQuiz::start(session, self.tick_period))
    }

    /// Apply one countdown tick. At zero the session submits itself, the
    /// timer is stopped and the result is uploaded.
    ///
    /// An upload failure after a timeout is not an error here: the result is
    /// kept and `finalize_submission` can retry it.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` if the session is already submitted.
    pub async fn apply_tick(&self, active: &mut ActiveQuiz) -> Result<TickOutcome, QuizServiceError> {
        let Some(result) = active.session_mut().tick(self.clock.now())? else {
            return Ok(TickOutcome::Running {
                remaining_secs: active.session().remaining_secs(),
            });
        };

        active.stop_timer();
        tracing::info!(
            quiz_id = %result.quiz_id(),
            score = result.score(),
            answered = active.session().answered_count(),
            "time limit reached, quiz submitted"
        );

        let attempt = match self.upload(&QuizSubmission::from_result(&result)).await {
            Ok(attempt) => {
                active.set_attempt(attempt.clone());
                Some(attempt)
            }
            Err(err) => {
                tracing::warn!(error = %err, "upload after timeout failed, will retry on finalize");
                None
            }
        };
        Ok(TickOutcome::TimedOut(SubmittedQuiz { result, attempt }))
    }

    /// Submit the attempt.
    ///
    /// The answers are uploaded first; only an accepted upload moves the
    /// session to `Submitted`. On failure the session keeps its status so the
    /// user can retry.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::SubmissionFailed` if the backend rejects the
    /// upload, and `QuizServiceError::Session` if the session was already
    /// submitted.
    pub async fn submit(&self, active: &mut ActiveQuiz) -> Result<SubmittedQuiz, QuizServiceError> {
        let status = active.session().status();
        if !status.is_active() {
            return Err(SessionError::InvalidState {
                operation: "submit",
                status,
            }
            .into());
        }

        let submission = QuizSubmission::from_session(active.session());
        let attempt = self.upload(&submission).await?;

        let result = active.session_mut().submit(self.clock.now())?;
        active.stop_timer();
        active.set_attempt(attempt.clone());
        tracing::info!(
            quiz_id = %result.quiz_id(),
            attempt_id = %result.attempt_id(),
            score = result.score(),
            time_spent_secs = result.time_spent_secs(),
            "quiz submitted"
        );

        Ok(SubmittedQuiz {
            result,
            attempt: Some(attempt),
        })
    }

    /// Retry the upload of a submitted attempt whose upload failed.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotSubmitted` if the session is still
    /// running, and `QuizServiceError::SubmissionFailed` if the upload fails again.
    pub async fn finalize_submission(
        &self,
        active: &mut ActiveQuiz,
    ) -> Result<QuizAttempt, QuizServiceError> {
        if let Some(attempt) = active.attempt() {
            return Ok(attempt.clone());
        }
        let result = active
            .session()
            .result()
            .ok_or(QuizServiceError::NotSubmitted)?;

        let attempt = self.upload(&QuizSubmission::from_result(result)).await?;
        tracing::info!(quiz_id = %attempt.quiz_id, "submission retry succeeded");
        active.set_attempt(attempt.clone());
        Ok(attempt)
    }

    async fn upload(&self, submission: &QuizSubmission) -> Result<QuizAttempt, QuizServiceError> {
        self.api.submit_quiz(submission).await.map_err(|err| {
            tracing::warn!(quiz_id = %submission.quiz_id, error = %err, "quiz submission failed");
            QuizServiceError::SubmissionFailed(err)
        })
    }
}
