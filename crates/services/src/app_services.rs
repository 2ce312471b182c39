use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::User;

use crate::api::{HttpQuizApi, MockQuizApi, QuizApi};
use crate::config::ApiConfig;
use crate::error::QuizApiError;
use crate::progress_service::ProgressService;
use crate::sessions::QuizLoopService;

/// Services for one signed-in user. Built after login and dropped on
/// logout; nothing here is process-global.
#[derive(Clone)]
pub struct AppServices {
    user: User,
    quiz_loop: Arc<QuizLoopService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    #[must_use]
    pub fn new(clock: Clock, user: User, api: Arc<dyn QuizApi>) -> Self {
        Self {
            user,
            quiz_loop: Arc::new(QuizLoopService::new(clock, api)),
            progress: Arc::new(ProgressService::new()),
        }
    }

    /// Talk to the configured backend, or fall back to the in-process mock
    /// when no backend is configured.
    ///
    /// # Errors
    ///
    /// Returns `QuizApiError` if the HTTP client cannot be built.
    pub fn from_config(
        clock: Clock,
        user: User,
        config: Option<ApiConfig>,
        mock_seed: Option<u64>,
    ) -> Result<Self, QuizApiError> {
        let api: Arc<dyn QuizApi> = match config {
            Some(config) => {
                tracing::info!(base_url = %config.base_url, "using remote quiz backend");
                Arc::new(HttpQuizApi::new(config)?)
            }
            None => {
                tracing::info!("no quiz backend configured, using in-process generator");
                let mock = match mock_seed {
                    Some(seed) => MockQuizApi::seeded(clock, seed),
                    None => MockQuizApi::new(clock),
                };
                Arc::new(mock.with_user(user.id.clone()))
            }
        };
        Ok(Self::new(clock, user, api))
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}
