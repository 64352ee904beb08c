use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 面试阶段
///
/// 终止阶段不单独建模：会话结束即从存储中移除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// 概念问答
    ConceptualQa,
    /// 实操任务已下发
    TaskIssued,
}

/// 发言方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Interviewer,
    Candidate,
}

/// 一条对话记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
        }
    }

    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
        }
    }
}

/// 单个候选人的面试会话
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub phase: Phase,
    /// 已完成的概念轮数
    pub turn_index: usize,
    /// 只追加的对话记录，会原样交给 LLM
    history: Vec<Turn>,
    pub conceptual_feedback: Option<String>,
    pub started_at: DateTime<Local>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phase: Phase::ConceptualQa,
            turn_index: 0,
            history: Vec::new(),
            conceptual_feedback: None,
            started_at: Local::now(),
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// 最近一次面试官发言（即当前待回答的问题）
    pub fn last_interviewer_line(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Interviewer)
            .map(|t| t.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new("alice");
        assert_eq!(session.phase, Phase::ConceptualQa);
        assert_eq!(session.turn_index, 0);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_last_interviewer_line() {
        let mut session = Session::new("alice");
        session.push(Turn::interviewer("Q1"));
        session.push(Turn::candidate("A1"));
        assert_eq!(session.last_interviewer_line(), Some("Q1"));
    }
}
