//! 反馈生成 - 业务能力层
//!
//! 外部文本生成服务的边界：给定对话记录和模式，返回一段文本。
//! 任何失败（超时、网络错误、空响应）都不会向调用方抛出，
//! 重试耗尽后返回固定的兜底文案。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::models::Turn;
use crate::services::llm_service::TextGenerator;

/// 所有尝试失败后的兜底文案
pub const FALLBACK_TEXT: &str =
    "Sorry, I'm having trouble connecting right now. Please try again later.";

const ACKNOWLEDGE_PROMPT: &str = "You are a professional Excel technical interviewer. \
Acknowledge the candidate's latest answer concisely in one or two sentences. \
Do not ask a question yourself; the next question will be asked separately.";

const FINAL_REVIEW_PROMPT: &str = "You are a professional Excel interviewer. Review the entire conversation below. \
Based on the candidate's answers, provide constructive feedback on their performance. \
Finally, give them an estimated score out of 100. \
Example: 'Overall, your performance was excellent... Score: 90/100.'";

/// 生成模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackMode {
    /// 面试中途：简短回应并衔接下一题
    AcknowledgeAndContinue,
    /// 阶段结束：整体点评并给出估分
    FinalReview,
}

impl FeedbackMode {
    pub fn system_prompt(self) -> &'static str {
        match self {
            FeedbackMode::AcknowledgeAndContinue => ACKNOWLEDGE_PROMPT,
            FeedbackMode::FinalReview => FINAL_REVIEW_PROMPT,
        }
    }
}

/// 反馈生成器
///
/// 职责：
/// - 每次尝试都有超时
/// - 失败后按线性退避重试有限次数
/// - 永远返回文本，不返回错误
pub struct FeedbackSynthesizer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl FeedbackSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &Config) -> Self {
        Self {
            generator,
            timeout: Duration::from_secs(config.llm_timeout_secs),
            max_retries: config.llm_max_retries,
            backoff: Duration::from_millis(config.llm_retry_backoff_ms),
        }
    }

    /// 自定义超时和重试策略
    pub fn with_policy(
        generator: Arc<dyn TextGenerator>,
        timeout: Duration,
        max_retries: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            generator,
            timeout,
            max_retries,
            backoff,
        }
    }

    /// 生成反馈文本
    pub async fn synthesize(&self, history: &[Turn], mode: FeedbackMode) -> String {
        let attempts = self.max_retries + 1;

        for attempt in 1..=attempts {
            match self.attempt(history, mode).await {
                Ok(text) => {
                    debug!("反馈生成成功 ({:?}, 第 {} 次尝试)", mode, attempt);
                    return text;
                }
                Err(e) => {
                    warn!("⚠️ 反馈生成失败 (第 {}/{} 次): {}", attempt, attempts, e);
                    if attempt < attempts {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
            }
        }

        warn!("⚠️ 反馈生成重试耗尽，使用兜底文案");
        FALLBACK_TEXT.to_string()
    }

    async fn attempt(&self, history: &[Turn], mode: FeedbackMode) -> Result<String, LlmError> {
        let model = self.generator.model_name().to_string();

        let call = self.generator.generate(mode.system_prompt(), history);
        let text = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| LlmError::Timeout {
                model: model.clone(),
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| LlmError::ApiCallFailed {
                model: model.clone(),
                source: e.into(),
            })?;

        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent { model });
        }
        Ok(text)
    }
}
