//! 概念题题库
//!
//! 只读、按下标访问；`len()` 决定概念问答阶段的边界

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 默认题库
const DEFAULT_QUESTIONS: [&str; 5] = [
    "What is the difference between a formula and a function in Excel? Give an example of each.",
    "Explain the purpose of a Pivot Table and when you would use one.",
    "Describe how you would use the VLOOKUP or XLOOKUP function. What are their main limitations?",
    "How would you use a combination of IF and AND functions to create a conditional formula?",
    "What is data validation in Excel, and how does it improve data integrity?",
];

/// 题库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    questions: Vec<String>,
}

impl QuestionBank {
    /// 从题目列表创建题库，空列表视为配置错误
    pub fn new(questions: Vec<String>) -> Result<Self, ConfigError> {
        if questions.is_empty() {
            return Err(ConfigError::EmptyQuestionBank);
        }
        Ok(Self { questions })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// 题库在构造时保证非空
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self {
            questions: DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bank() {
        let bank = QuestionBank::default();
        assert_eq!(bank.len(), 5);
        assert!(bank.get(0).unwrap().contains("formula"));
        assert!(bank.get(5).is_none());
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(matches!(
            QuestionBank::new(Vec::new()),
            Err(ConfigError::EmptyQuestionBank)
        ));
    }
}
