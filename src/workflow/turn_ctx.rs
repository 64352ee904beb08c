//! 单轮处理上下文
//!
//! 封装"我正在处理哪个候选人的第几轮"这一信息，主要用于日志前缀

use std::fmt::Display;

/// 单轮处理上下文
#[derive(Debug, Clone)]
pub struct TurnCtx {
    /// 会话 ID
    pub session_id: String,

    /// 进入本轮时的 turn_index
    pub turn_index: usize,
}

impl TurnCtx {
    pub fn new(session_id: impl Into<String>, turn_index: usize) -> Self {
        Self {
            session_id: session_id.into(),
            turn_index,
        }
    }
}

impl Display for TurnCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[会话 {} 第 {} 轮]", self.session_id, self.turn_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TurnCtx::new("alice", 3).to_string(), "[会话 alice 第 3 轮]");
    }
}
