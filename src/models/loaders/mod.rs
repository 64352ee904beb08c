pub mod toml_loader;

pub use toml_loader::{
    load_question_bank, load_question_bank_or_default, load_rubric, load_rubric_or_default,
};
