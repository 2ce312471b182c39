use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::UserId;
use crate::model::user::User;

/// The slice of a submitted attempt needed for progress reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub user_id: UserId,
    pub topic: String,
    pub score: u8,
    pub completed_at: DateTime<Utc>,
}

/// Per-student aggregate shown to educators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProgress {
    pub user_id: UserId,
    pub user_name: String,
    pub total_quizzes: u32,
    pub average_score: f64,
    pub last_activity: Option<DateTime<Utc>>,
    /// Average score per topic.
    pub topic_progress: BTreeMap<String, f64>,
}

impl StudentProgress {
    /// Aggregate the attempts belonging to `student`. Attempts for other
    /// users are ignored.
    #[must_use]
    pub fn from_attempts(student: &User, attempts: &[AttemptRecord]) -> Self {
        let mine: Vec<&AttemptRecord> = attempts
            .iter()
            .filter(|attempt| attempt.user_id == student.id)
            .collect();

        let mut topics: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for attempt in &mine {
            topics
                .entry(attempt.topic.clone())
                .or_default()
                .push(attempt.score);
        }

        let scores: Vec<u8> = mine.iter().map(|attempt| attempt.score).collect();
        Self {
            user_id: student.id.clone(),
            user_name: student.name.clone(),
            total_quizzes: u32::try_from(mine.len()).unwrap_or(u32::MAX),
            average_score: mean(&scores),
            last_activity: mine.iter().map(|attempt| attempt.completed_at).max(),
            topic_progress: topics
                .into_iter()
                .map(|(topic, scores)| (topic, mean(&scores)))
                .collect(),
        }
    }
}

fn mean(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: u32 = scores.iter().map(|&score| u32::from(score)).sum();
    f64::from(total) / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::Role;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn record(user: &str, topic: &str, score: u8, minutes: i64) -> AttemptRecord {
        AttemptRecord {
            user_id: UserId::new(user),
            topic: topic.into(),
            score,
            completed_at: fixed_now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn aggregates_scores_per_topic() {
        let student = User::new(UserId::new("s1"), "s1@demo.com", "Demo Student", Role::Student);
        let attempts = vec![
            record("s1", "Algebra", 80, 0),
            record("s1", "Algebra", 60, 5),
            record("s1", "Biology", 100, 10),
            record("s2", "Algebra", 0, 20),
        ];

        let progress = StudentProgress::from_attempts(&student, &attempts);

        assert_eq!(progress.total_quizzes, 3);
        assert!((progress.average_score - 80.0).abs() < f64::EPSILON);
        assert_eq!(progress.last_activity, Some(fixed_now() + Duration::minutes(10)));
        assert_eq!(progress.topic_progress.get("Algebra"), Some(&70.0));
        assert_eq!(progress.topic_progress.get("Biology"), Some(&100.0));
    }

    #[test]
    fn student_without_attempts_has_empty_progress() {
        let student = User::new(UserId::new("s3"), "s3@demo.com", "Quiet", Role::Student);
        let progress = StudentProgress::from_attempts(&student, &[]);
        assert_eq!(progress.total_quizzes, 0);
        assert!(progress.average_score.abs() < f64::EPSILON);
        assert_eq!(progress.last_activity, None);
        assert!(progress.topic_progress.is_empty());
    }
}
