//! LLM 服务 - 业务能力层
//!
//! 只负责"给定系统提示词和对话记录，返回一段文本"，不关心面试流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, LlmError};
use crate::models::{Speaker, Turn};

/// 文本生成能力
///
/// 外部文本生成服务的抽象边界，测试中可替换为桩实现
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 模型名称（仅用于日志）
    fn model_name(&self) -> &str;

    /// 以 `system_prompt` 为系统消息，把 `transcript` 原样作为对话发送
    async fn generate(&self, system_prompt: &str, transcript: &[Turn]) -> Result<String>;
}

/// LLM 服务
///
/// 职责：
/// - 调用 OpenAI 兼容的 chat completion 接口
/// - 面试官发言映射为 assistant，候选人发言映射为 user
/// - 不做超时和重试（由 `FeedbackSynthesizer` 负责）
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未配置 LLM_API_KEY，LLM 调用将失败并使用兜底文案");
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 构建消息列表
    fn build_messages(
        system_prompt: &str,
        transcript: &[Turn],
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()?;
        messages.push(ChatCompletionRequestMessage::System(system_msg));

        for turn in transcript {
            let message = match turn.speaker {
                Speaker::Interviewer => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(turn.text.as_str())
                        .build()?,
                ),
                Speaker::Candidate => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.text.as_str())
                        .build()?,
                ),
            };
            messages.push(message);
        }

        Ok(messages)
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, system_prompt: &str, transcript: &[Turn]) -> Result<String> {
        debug!(
            "调用 LLM API，模型: {}，对话条数: {}",
            self.model_name,
            transcript.len()
        );

        let messages = Self::build_messages(system_prompt, transcript)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.6)
            .max_tokens(250u32)
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content)
    }
}
