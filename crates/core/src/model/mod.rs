mod ids;
mod progress;
mod question;
mod quiz;
mod result;
mod session;
mod user;

pub use ids::{AttemptId, ParseIdError, QuestionId, QuizId, UserId};

pub use progress::{AttemptRecord, StudentProgress};
pub use question::Question;
pub use quiz::{DEFAULT_TIME_LIMIT_MINUTES, Difficulty, Quiz, QuizError};
pub use result::{QuizResult, ScoreBand, score_percent};
pub use session::{QuizSession, SessionError, SessionStatus, format_remaining};
pub use user::{Role, User};
