mod answer;
mod config;
mod ids;
mod question;
mod session;

pub use answer::{AnswerValue, MatchSelection};
pub use config::{ConfigError, SessionConfig};
pub use ids::{ConfigId, ParseIdError, QuestionId, SessionId};
pub use question::{
    CorrectText, Difficulty, MatchPair, Question, QuestionError, QuestionKind, QuestionType,
};
pub use session::{AnswerOutcome, QuizSession, SessionStatus};
