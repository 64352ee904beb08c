pub mod loaders;
pub mod question;
pub mod rubric;
pub mod session;

pub use loaders::{load_question_bank_or_default, load_rubric_or_default};
pub use question::QuestionBank;
pub use rubric::{Rubric, RubricRule};
pub use session::{Phase, Session, Speaker, Turn};
