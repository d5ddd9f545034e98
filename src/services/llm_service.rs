//! LLM 服务 - 业务能力层
//!
//! 只负责"把一段提示词发给 LLM 并拿回文本"，不关心如何解析结果
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServiceError;

const SYSTEM_MESSAGE: &str = "You extract questions from Mongolian mathematics exams. \
                              Reply with JSON only, no commentary.";

/// LLM 文本补全能力
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 模型名称（用于日志）
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// 第 `attempt` 次失败后的等待时间：2^attempt 秒
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// LLM 服务
///
/// 失败时按指数退避重试，最多 `max_retries` 次。
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_retries: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_retries: config.llm_max_retries.max(1),
        }
    }

    /// 第 `attempt` 次调用
    async fn send_to_llm(&self, attempt: u32, user_message: &str) -> Result<String, ServiceError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()
            .map_err(|e| self.failed(attempt, e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| self.failed(attempt, e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.1)
            .max_tokens(8192u32)
            .build()
            .map_err(|e| self.failed(attempt, e))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| self.failed(attempt, e))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ServiceError::LlmEmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    fn failed(&self, attempts: u32, e: impl std::fmt::Display) -> ServiceError {
        ServiceError::LlmFailed {
            model: self.model_name.clone(),
            attempts,
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for LlmService {
    fn model(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.send_to_llm(attempt, prompt).await {
                Ok(content) => {
                    debug!("LLM API 调用成功 (第 {} 次)", attempt);
                    return Ok(content);
                }
                Err(e @ ServiceError::LlmEmptyContent { .. }) => return Err(e),
                Err(e) => {
                    warn!(
                        "LLM API 调用失败 (第 {}/{} 次): {}",
                        attempt, self.max_retries, e
                    );
                    last_error = match e {
                        ServiceError::LlmFailed { message, .. } => message,
                        other => other.to_string(),
                    };
                    if attempt < self.max_retries {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(self.failed(self.max_retries, last_error))
    }
}
