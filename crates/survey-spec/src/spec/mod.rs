pub mod question;
pub mod survey;

pub use question::{AnswerOption, AnswerValue, Question, QuestionType};
pub use survey::Survey;
