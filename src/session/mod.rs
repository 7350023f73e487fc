pub mod bank;
pub mod question;
pub mod quiz;
pub mod result;

pub use bank::QuestionBank;
pub use question::QuizQuestion;
pub use quiz::{AnswerFeedback, QuizSession, QuizState};
pub use result::QuizResult;
