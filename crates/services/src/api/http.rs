use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use quiz_core::model::{Difficulty, Question, Quiz, QuizId};

use super::{GenerateQuizRequest, QuizApi, QuizAttempt, QuizSubmission};
use crate::config::ApiConfig;
use crate::error::QuizApiError;

/// `QuizApi` over JSON/HTTP.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    config: ApiConfig,
}

impl HttpQuizApi {
    /// # Errors
    ///
    /// Returns `QuizApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, QuizApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(self.config.endpoint(path));
        match self.config.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn generate_quiz(&self, request: &GenerateQuizRequest) -> Result<Quiz, QuizApiError> {
        let response = self.post("quiz/generate").json(request).send().await?;
        if !response.status().is_success() {
            return Err(QuizApiError::HttpStatus(response.status()));
        }

        let payload: QuizPayload = response.json().await?;
        let quiz = payload.into_quiz()?;
        tracing::debug!(quiz_id = %quiz.id(), "received generated quiz");
        Ok(quiz)
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizAttempt, QuizApiError> {
        let response = self.post("quiz/submit").json(submission).send().await?;
        if !response.status().is_success() {
            return Err(QuizApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

/// Generator payload. `created_at` is kept as text because some backends
/// emit naive ISO timestamps without an offset.
#[derive(Debug, Deserialize)]
struct QuizPayload {
    id: QuizId,
    title: String,
    topic: String,
    difficulty: Difficulty,
    questions: Vec<Question>,
    #[serde(default)]
    time_limit: Option<u32>,
    created_at: String,
}

impl QuizPayload {
    fn into_quiz(self) -> Result<Quiz, QuizApiError> {
        let created_at = parse_timestamp(&self.created_at).unwrap_or_else(Utc::now);
        Ok(Quiz::new(
            self.id,
            self.title,
            self.topic,
            self.difficulty,
            self.questions,
            self.time_limit,
            created_at,
        )?)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizError;

    #[test]
    fn parses_offset_and_naive_timestamps() {
        let with_offset = parse_timestamp("2023-11-14T22:13:20Z").unwrap();
        let naive = parse_timestamp("2023-11-14T22:13:20.123456").unwrap();
        assert_eq!(with_offset.timestamp(), 1_700_000_000);
        assert_eq!(naive.timestamp(), 1_700_000_000);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn payload_is_validated() {
        let json = r#"{
            "id": "quiz_1",
            "title": "Physics Quiz - Easy",
            "topic": "Physics",
            "difficulty": "easy",
            "questions": [
                {"id": "q_1", "question": "Unit of force?", "options": ["N", "J"], "correct_answer": 5}
            ],
            "time_limit": 30,
            "created_at": "2024-01-01T10:00:00.5"
        }"#;
        let payload: QuizPayload = serde_json::from_str(json).unwrap();
        let err = payload.into_quiz().unwrap_err();
        assert!(matches!(
            err,
            QuizApiError::InvalidQuiz(QuizError::CorrectAnswerOutOfRange { .. })
        ));
    }

    #[test]
    fn valid_payload_becomes_quiz() {
        let json = r#"{
            "id": "quiz_1",
            "title": "Physics Quiz - Easy",
            "topic": "Physics",
            "difficulty": "easy",
            "questions": [
                {"id": "q_1", "question": "Unit of force?", "options": ["N", "J"], "correct_answer": 0}
            ],
            "created_at": "2024-01-01T10:00:00"
        }"#;
        let payload: QuizPayload = serde_json::from_str(json).unwrap();
        let quiz = payload.into_quiz().unwrap();
        assert_eq!(quiz.question_count(), 1);
        assert_eq!(quiz.time_limit_secs(), 1800);
    }
}
