use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, QuizId};

/// Percentage score, rounded half-up: `round(100 * correct / total)`.
///
/// Returns 0 for an empty quiz.
#[must_use]
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    // (200c + t) / 2t == floor(100c/t + 1/2)
    let score = (200 * correct + total) / (2 * total);
    u8::try_from(score).unwrap_or(100)
}

/// Outcome of one submitted session.
///
/// Holds its own copy of the answer record; nothing aliases the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    attempt_id: AttemptId,
    quiz_id: QuizId,
    answers: Vec<Option<usize>>,
    correct_count: usize,
    score: u8,
    completed_at: DateTime<Utc>,
    time_spent_secs: u32,
    timed_out: bool,
}

impl QuizResult {
    pub(crate) fn new(
        quiz_id: QuizId,
        answers: Vec<Option<usize>>,
        correct_count: usize,
        completed_at: DateTime<Utc>,
        time_spent_secs: u32,
        timed_out: bool,
    ) -> Self {
        let score = score_percent(correct_count, answers.len());
        Self {
            attempt_id: AttemptId::generate(),
            quiz_id,
            answers,
            correct_count,
            score,
            completed_at,
            time_spent_secs,
            timed_out,
        }
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.answers.len()
    }

    /// Integer percentage in `0..=100`.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Seconds elapsed between session start and submission.
    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    /// True when the countdown reached zero and forced the submission.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }
}

/// Coarse grading shown on the result screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreBand {
    /// 80 and above.
    Excellent,
    /// 60 to 79.
    Good,
    NeedsPractice,
}

impl ScoreBand {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            _ => Self::NeedsPractice,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ScoreBand::Excellent => {
                "Excellent work! You have a strong understanding of this topic."
            }
            ScoreBand::Good => {
                "Good job! There's room for improvement, but you're on the right track."
            }
            ScoreBand::NeedsPractice => {
                "Keep practicing! Review the material and try again to improve your score."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rounds_half_up() {
        assert_eq!(score_percent(3, 4), 75);
        assert_eq!(score_percent(1, 8), 13);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(0, 4), 0);
        assert_eq!(score_percent(5, 5), 100);
    }

    #[test]
    fn score_of_empty_quiz_is_zero() {
        assert_eq!(score_percent(0, 0), 0);
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(80), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(79), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(60), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(59), ScoreBand::NeedsPractice);
        assert_eq!(ScoreBand::from_score(0), ScoreBand::NeedsPractice);
    }
}
