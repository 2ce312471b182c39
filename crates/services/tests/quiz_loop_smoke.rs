use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use quiz_core::model::{
    Difficulty, Question, QuestionId, Quiz, QuizId, SessionError, SessionStatus,
};
use quiz_core::time::{fixed_clock, fixed_now};
use services::{
    GenerateQuizRequest, MockQuizApi, QuizApi, QuizApiError, QuizAttempt, QuizLoopService,
    QuizServiceError, QuizSubmission, TickOutcome,
};

/// Mock backend whose calls can be made to fail on demand.
struct FlakyApi {
    inner: MockQuizApi,
    fail_generate: AtomicBool,
    fail_submit: AtomicBool,
}

impl FlakyApi {
    fn new() -> Self {
        Self {
            inner: MockQuizApi::seeded(fixed_clock(), 11),
            fail_generate: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
        }
    }

    fn unavailable() -> QuizApiError {
        QuizApiError::HttpStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[async_trait]
impl QuizApi for FlakyApi {
    async fn generate_quiz(&self, request: &GenerateQuizRequest) -> Result<Quiz, QuizApiError> {
        if self.fail_generate.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.generate_quiz(request).await
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizAttempt, QuizApiError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.submit_quiz(submission).await
    }
}

fn one_minute_quiz(correct: &[usize]) -> Quiz {
    let questions = correct
        .iter()
        .enumerate()
        .map(|(i, &answer)| {
            Question::new(
                QuestionId::new(format!("q{}", i + 1)),
                format!("Question {}?", i + 1),
                vec!["A".into(), "B".into(), "C".into(), "D".into()],
                answer,
                None,
            )
            .unwrap()
        })
        .collect();
    Quiz::new(
        QuizId::new("timed"),
        "Timed Quiz",
        "Timing",
        Difficulty::Easy,
        questions,
        Some(1),
        fixed_now(),
    )
    .unwrap()
}

#[tokio::test]
async fn answering_everything_correctly_scores_full_marks() {
    let api = Arc::new(MockQuizApi::seeded(fixed_clock(), 5));
    let service = QuizLoopService::new(fixed_clock(), api);
    let request = GenerateQuizRequest::new("Geography", Difficulty::Medium, 5);

    let mut active = service.start_quiz(&request).await.unwrap();
    assert!(active.timer_running());

    let key: Vec<usize> = active
        .session()
        .quiz()
        .questions()
        .iter()
        .map(Question::correct_answer)
        .collect();
    for answer in key {
        active.select_answer(answer).unwrap();
        active.go_to_next().unwrap();
    }
    assert_eq!(active.session().answered_count(), 5);

    active.request_submit_confirmation().unwrap();
    let submitted = service.submit(&mut active).await.unwrap();

    assert_eq!(submitted.result.score(), 100);
    assert_eq!(submitted.attempt.as_ref().map(|a| a.score), Some(100));
    assert_eq!(active.session().status(), SessionStatus::Submitted);
    assert!(!active.timer_running());
    assert!(!active.upload_pending());
}

#[tokio::test]
async fn generation_failure_is_reported_separately() {
    let api = Arc::new(FlakyApi::new());
    api.fail_generate.store(true, Ordering::SeqCst);
    let service = QuizLoopService::new(fixed_clock(), api);

    let err = service
        .start_quiz(&GenerateQuizRequest::new("Art", Difficulty::Easy, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizServiceError::GenerationFailed(_)));
}

#[tokio::test]
async fn failed_submission_keeps_session_open_for_retry() {
    let api = Arc::new(FlakyApi::new());
    let service = QuizLoopService::new(fixed_clock(), api.clone());
    let mut active = service
        .start_quiz(&GenerateQuizRequest::new("Music", Difficulty::Hard, 2))
        .await
        .unwrap();
    active.select_answer(1).unwrap();
    active.request_submit_confirmation().unwrap();

    api.fail_submit.store(true, Ordering::SeqCst);
    let err = service.submit(&mut active).await.unwrap_err();
    assert!(matches!(err, QuizServiceError::SubmissionFailed(_)));
    assert_eq!(active.session().status(), SessionStatus::PendingConfirmation);
    assert!(active.session().result().is_none());
    assert!(active.timer_running());

    api.fail_submit.store(false, Ordering::SeqCst);
    let submitted = service.submit(&mut active).await.unwrap();
    assert_eq!(submitted.result.answers(), &[Some(1), None]);
    assert_eq!(active.session().status(), SessionStatus::Submitted);
}

#[tokio::test]
async fn second_submit_is_rejected_and_result_kept() {
    let api = Arc::new(MockQuizApi::seeded(fixed_clock(), 9));
    let service = QuizLoopService::new(fixed_clock(), api);
    let mut active = service
        .start_quiz(&GenerateQuizRequest::new("Poetry", Difficulty::Easy, 3))
        .await
        .unwrap();

    let first = service.submit(&mut active).await.unwrap();
    let err = service.submit(&mut active).await.unwrap_err();

    assert!(matches!(
        err,
        QuizServiceError::Session(SessionError::InvalidState { .. })
    ));
    assert_eq!(active.session().result(), Some(&first.result));
}

#[tokio::test(start_paused = true)]
async fn countdown_submits_at_zero_and_stops_the_timer() {
    let api = Arc::new(MockQuizApi::seeded(fixed_clock(), 2));
    let quiz = one_minute_quiz(&[0, 1, 2]);
    api.register(Arc::new(quiz.clone()));
    let service = QuizLoopService::new(fixed_clock(), api);

    let mut active = service.begin(quiz).unwrap();
    let mut ticks = 0;
    let mut outcome = None;
    while active.next_tick().await {
        ticks += 1;
        match service.apply_tick(&mut active).await.unwrap() {
            TickOutcome::Running { remaining_secs } => assert_eq!(remaining_secs, 60 - ticks),
            TickOutcome::TimedOut(submitted) => outcome = Some(submitted),
        }
    }

    let submitted = outcome.expect("timeout should submit");
    assert_eq!(ticks, 60);
    assert_eq!(submitted.result.score(), 0);
    assert!(submitted.result.timed_out());
    assert_eq!(submitted.result.time_spent_secs(), 60);
    assert!(submitted.attempt.is_some());
    assert_eq!(active.session().status(), SessionStatus::Submitted);
    assert!(!active.timer_running());
    assert!(!active.next_tick().await);
}

#[tokio::test(start_paused = true)]
async fn timed_out_upload_can_be_retried() {
    let api = Arc::new(FlakyApi::new());
    let quiz = one_minute_quiz(&[3]);
    api.inner.register(Arc::new(quiz.clone()));
    let service = QuizLoopService::new(fixed_clock(), api.clone());

    let mut active = service.begin(quiz).unwrap();
    active.select_answer(3).unwrap();
    api.fail_submit.store(true, Ordering::SeqCst);

    let mut timed_out = None;
    while active.next_tick().await {
        if let TickOutcome::TimedOut(submitted) = service.apply_tick(&mut active).await.unwrap() {
            timed_out = Some(submitted);
        }
    }
    let submitted = timed_out.unwrap();
    assert_eq!(submitted.result.score(), 100);
    assert!(submitted.attempt.is_none());
    assert!(active.upload_pending());

    assert!(matches!(
        service.finalize_submission(&mut active).await,
        Err(QuizServiceError::SubmissionFailed(_))
    ));

    api.fail_submit.store(false, Ordering::SeqCst);
    let attempt = service.finalize_submission(&mut active).await.unwrap();
    assert_eq!(attempt.score, 100);
    assert!(!active.upload_pending());
}

#[tokio::test]
async fn finalize_before_submit_is_rejected() {
    let api = Arc::new(MockQuizApi::seeded(fixed_clock(), 4));
    let service = QuizLoopService::new(fixed_clock(), api);
    let mut active = service
        .start_quiz(&GenerateQuizRequest::new("Law", Difficulty::Medium, 1))
        .await
        .unwrap();

    assert!(matches!(
        service.finalize_submission(&mut active).await,
        Err(QuizServiceError::NotSubmitted)
    ));
    active.exit();
}
