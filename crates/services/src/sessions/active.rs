use std::fmt;
use std::time::Duration;

use quiz_core::model::{QuizSession, SessionError};

use crate::api::QuizAttempt;
use crate::timer::SessionTimer;

/// A running quiz attempt: the session plus the timer that drives it.
///
/// The timer starts with the attempt and is stopped on submission. Dropping
/// an `ActiveQuiz` (the user exits) cancels the timer and produces nothing.
pub struct ActiveQuiz {
    session: QuizSession,
    timer: SessionTimer,
    attempt: Option<QuizAttempt>,
}

impl ActiveQuiz {
    pub(crate) fn start(session: QuizSession, tick_period: Duration) -> Self {
        tracing::info!(
            quiz_id = %session.quiz().id(),
            questions = session.question_count(),
            time_limit_secs = session.initial_secs(),
            "quiz session started"
        );
        Self {
            session,
            timer: SessionTimer::start(tick_period),
            attempt: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    /// The backend's record of this attempt, once the upload succeeded.
    #[must_use]
    pub fn attempt(&self) -> Option<&QuizAttempt> {
        self.attempt.as_ref()
    }

    pub(crate) fn set_attempt(&mut self, attempt: QuizAttempt) {
        self.attempt = Some(attempt);
    }

    /// True if the result still has to reach the backend.
    #[must_use]
    pub fn upload_pending(&self) -> bool {
        self.session.is_submitted() && self.attempt.is_none()
    }

    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub(crate) fn stop_timer(&mut self) {
        self.timer.stop();
    }

    /// Wait for the next timer tick. Returns `false` once the timer is stopped.
    pub async fn next_tick(&mut self) -> bool {
        self.timer.tick().await
    }

    /// Record `option` for the current question.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::select_answer`].
    pub fn select_answer(&mut self, option: usize) -> Result<(), SessionError> {
        self.session.select_answer(option)
    }

    /// # Errors
    ///
    /// See [`QuizSession::go_to_next`].
    pub fn go_to_next(&mut self) -> Result<(), SessionError> {
        self.session.go_to_next()
    }

    /// # Errors
    ///
    /// See [`QuizSession::go_to_previous`].
    pub fn go_to_previous(&mut self) -> Result<(), SessionError> {
        self.session.go_to_previous()
    }

    /// # Errors
    ///
    /// See [`QuizSession::go_to_question`].
    pub fn go_to_question(&mut self, index: usize) -> Result<(), SessionError> {
        self.session.go_to_question(index)
    }

    /// # Errors
    ///
    /// See [`QuizSession::request_submit_confirmation`].
    pub fn request_submit_confirmation(&mut self) -> Result<(), SessionError> {
        self.session.request_submit_confirmation()
    }

    /// # Errors
    ///
    /// See [`QuizSession::cancel_submit_confirmation`].
    pub fn cancel_submit_confirmation(&mut self) -> Result<(), SessionError> {
        self.session.cancel_submit_confirmation()
    }

    /// Abandon the attempt. The timer is cancelled and no result is kept.
    pub fn exit(mut self) {
        if !self.session.is_submitted() {
            tracing::info!(
                quiz_id = %self.session.quiz().id(),
                answered = self.session.answered_count(),
                "quiz abandoned"
            );
        }
        self.timer.stop();
    }
}

impl fmt::Debug for ActiveQuiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveQuiz")
            .field("session", &self.session)
            .field("timer_running", &self.timer.is_running())
            .field("uploaded", &self.attempt.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quiz_core::model::Difficulty;
    use quiz_core::time::fixed_clock;

    use crate::api::{GenerateQuizRequest, MockQuizApi};
    use crate::sessions::QuizLoopService;
    use crate::timer::TICK_PERIOD;

    async fn started() -> super::ActiveQuiz {
        let api = Arc::new(MockQuizApi::seeded(fixed_clock(), 6));
        let service = QuizLoopService::new(fixed_clock(), api);
        service
            .start_quiz(&GenerateQuizRequest::new("Biology", Difficulty::Easy, 2))
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn exit_cancels_the_timer_task() {
        let active = started().await;
        let task = active.timer.abort_handle();
        assert!(active.timer_running());

        active.exit();
        tokio::time::sleep(TICK_PERIOD * 3).await;
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_attempt_cancels_the_timer_task() {
        let mut active = started().await;
        assert!(active.next_tick().await);
        let task = active.timer.abort_handle();

        drop(active);
        tokio::time::sleep(TICK_PERIOD * 3).await;
        assert!(task.is_finished());
    }
}
