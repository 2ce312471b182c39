use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quiz_core::model::{Question, QuestionId, Quiz, QuizId, UserId, score_percent};
use quiz_core::Clock;

use super::{GenerateQuizRequest, QuizApi, QuizAttempt, QuizSubmission};
use crate::error::QuizApiError;
use crate::feedback::feedback_for;

const MOCK_TIME_LIMIT_MINUTES: u32 = 30;

const MOCK_OPTIONS: [&str; 4] = [
    "Option A - This is the first possible answer",
    "Option B - This is the second possible answer",
    "Option C - This is the third possible answer",
    "Option D - This is the fourth possible answer",
];

/// In-process backend: builds placeholder quizzes with four fixed options
/// and a random correct answer, and grades submissions against them.
pub struct MockQuizApi {
    clock: Clock,
    user_id: UserId,
    rng: Mutex<StdRng>,
    quizzes: Mutex<HashMap<QuizId, Arc<Quiz>>>,
    next_id: AtomicU64,
}

impl MockQuizApi {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::with_rng(clock, StdRng::seed_from_u64(rand::random()))
    }

    /// Deterministic answer keys for tests and demos.
    #[must_use]
    pub fn seeded(clock: Clock, seed: u64) -> Self {
        Self::with_rng(clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(clock: Clock, rng: StdRng) -> Self {
        Self {
            clock,
            user_id: UserId::new("current-user"),
            rng: Mutex::new(rng),
            quizzes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Attempts are attributed to this user.
    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }

    /// Make a quiz built elsewhere gradable by this backend.
    pub fn register(&self, quiz: Arc<Quiz>) {
        self.quizzes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(quiz.id().clone(), quiz);
    }

    fn build_quiz(&self, request: &GenerateQuizRequest) -> Result<Quiz, QuizApiError> {
        let now = self.clock.now();
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = QuizId::new(format!("quiz_{}_{seq}", now.timestamp_millis()));
        let topic = request.topic.trim();

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let questions = (1..=request.num_questions)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Sample {topic} question {i}?"),
                    MOCK_OPTIONS.iter().map(|option| (*option).to_string()).collect(),
                    rng.random_range(0..MOCK_OPTIONS.len()),
                    Some(format!("This is the explanation for question {i}.")),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quiz::new(
            id,
            format!("{topic} Quiz"),
            topic,
            request.difficulty,
            questions,
            Some(MOCK_TIME_LIMIT_MINUTES),
            now,
        )?)
    }
}

#[async_trait]
impl QuizApi for MockQuizApi {
    async fn generate_quiz(&self, request: &GenerateQuizRequest) -> Result<Quiz, QuizApiError> {
        let quiz = Arc::new(self.build_quiz(request)?);
        self.register(Arc::clone(&quiz));
        Ok(Quiz::clone(&quiz))
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizAttempt, QuizApiError> {
        let quiz = self
            .quizzes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&submission.quiz_id)
            .cloned()
            .ok_or_else(|| QuizApiError::UnknownQuiz(submission.quiz_id.clone()))?;

        let answers = submission.decoded_answers();
        let correct = quiz
            .questions()
            .iter()
            .zip(&answers)
            .filter(|(question, answer)| question.is_correct(**answer))
            .count();
        let score = score_percent(correct, quiz.question_count());
        let now = self.clock.now();
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);

        Ok(QuizAttempt {
            id: format!("attempt_{}_{seq}", now.timestamp_millis()),
            quiz_id: submission.quiz_id.clone(),
            user_id: self.user_id.clone(),
            answers: submission.answers.clone(),
            score,
            completed_at: now.to_rfc3339(),
            time_spent: submission.time_spent,
            feedback: Some(feedback_for(score, quiz.topic())),
        })
    }
}
