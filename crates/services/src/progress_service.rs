use std::sync::{Mutex, PoisonError};

use quiz_core::model::{AttemptRecord, QuizResult, StudentProgress, User, UserId};

use crate::error::ProgressError;

/// In-memory log of finished attempts for the running app, with
/// per-student aggregation for educators.
#[derive(Debug, Default)]
pub struct ProgressService {
    attempts: Mutex<Vec<AttemptRecord>>,
}

impl ProgressService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a finished attempt by `user` on a quiz about `topic`.
    pub fn record(&self, user_id: &UserId, topic: &str, result: &QuizResult) {
        let record = AttemptRecord {
            user_id: user_id.clone(),
            topic: topic.to_string(),
            score: result.score(),
            completed_at: result.completed_at(),
        };
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Attempts by `user_id`, oldest first.
    #[must_use]
    pub fn history(&self, user_id: &UserId) -> Vec<AttemptRecord> {
        let mut history: Vec<AttemptRecord> = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by_key(|record| record.completed_at);
        history
    }

    /// The signed-in user's own aggregate.
    #[must_use]
    pub fn own_progress(&self, user: &User) -> StudentProgress {
        StudentProgress::from_attempts(user, &self.history(&user.id))
    }

    /// Aggregates for every student in `students`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::AccessDenied` unless `viewer` is an educator.
    pub fn student_progress(
        &self,
        viewer: &User,
        students: &[User],
    ) -> Result<Vec<StudentProgress>, ProgressError> {
        if !viewer.is_educator() {
            return Err(ProgressError::AccessDenied);
        }
        let attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(students
            .iter()
            .filter(|student| !student.is_educator())
            .map(|student| StudentProgress::from_attempts(student, &attempts))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, Question, QuestionId, Quiz, QuizId, QuizSession, Role};
    use quiz_core::time::fixed_now;
    use std::sync::Arc;

    fn finished_result(answer: usize) -> QuizResult {
        let question = Question::new(
            QuestionId::new("q1"),
            "Pick A",
            vec!["A".into(), "B".into()],
            0,
            None,
        )
        .unwrap();
        let quiz = Quiz::new(
            QuizId::new("quiz"),
            "Quiz",
            "Topic",
            Difficulty::Easy,
            vec![question],
            None,
            fixed_now(),
        )
        .unwrap();
        let mut session = QuizSession::new(Arc::new(quiz), fixed_now()).unwrap();
        session.select_answer(answer).unwrap();
        session.submit(fixed_now()).unwrap()
    }

    fn student(id: &str) -> User {
        User::new(UserId::new(id), format!("{id}@demo.com"), id, Role::Student)
    }

    fn educator() -> User {
        User::new(UserId::new("educator1"), "educator@demo.com", "Demo Educator", Role::Educator)
    }

    #[test]
    fn students_cannot_see_progress_of_others() {
        let service = ProgressService::new();
        let err = service
            .student_progress(&student("s1"), &[student("s2")])
            .unwrap_err();
        assert_eq!(err, ProgressError::AccessDenied);
    }

    #[test]
    fn educator_sees_each_student() {
        let service = ProgressService::new();
        let s1 = student("s1");
        let s2 = student("s2");
        service.record(&s1.id, "Math", &finished_result(0));
        service.record(&s1.id, "Math", &finished_result(1));
        service.record(&s2.id, "Art", &finished_result(0));

        let progress = service
            .student_progress(&educator(), &[s1, s2, educator()])
            .unwrap();

        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].total_quizzes, 2);
        assert_eq!(progress[0].topic_progress.get("Math"), Some(&50.0));
        assert_eq!(progress[1].total_quizzes, 1);
        assert_eq!(progress[1].topic_progress.get("Art"), Some(&100.0));
    }

    #[test]
    fn history_only_contains_own_attempts() {
        let service = ProgressService::new();
        let s1 = student("s1");
        service.record(&s1.id, "Math", &finished_result(0));
        service.record(&UserId::new("other"), "Math", &finished_result(0));
        assert_eq!(service.history(&s1.id).len(), 1);
        assert_eq!(service.own_progress(&s1).total_quizzes, 1);
    }
}
