/// Short coaching message for a finished quiz.
#[must_use]
pub fn feedback_for(score: u8, topic: &str) -> String {
    match score {
        90.. => format!(
            "Excellent work on {topic}! You've mastered this topic. Consider exploring advanced concepts."
        ),
        70..=89 => format!(
            "Good job on {topic}! You have a solid understanding. Review the areas you missed for improvement."
        ),
        50..=69 => format!(
            "You're making progress in {topic}. Focus on the fundamentals and practice more questions."
        ),
        _ => format!(
            "Keep practicing {topic}! Consider reviewing the basic concepts and taking additional quizzes."
        ),
    }
}
