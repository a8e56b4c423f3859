//! LLM providers
//!
//! A [`ChatModel`] turns a system prompt, prior turns and the user's query
//! into a stream of text deltas. The concrete provider is picked from the
//! configured model name.

use crate::config::AppConfig;
use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

pub mod gemini;
pub mod openai;
pub mod sse;

pub use gemini::GeminiClient;
pub use openai::OpenAIClient;

/// Stream of text deltas from a model
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Speaker of a forwarded history turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Everything a provider needs for one completion
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompts: Vec<String>,
    pub history: Vec<HistoryTurn>,
    pub user_query: String,
    pub temperature: f32,
}

/// A streaming chat-completion backend
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Start a completion. Errors returned here happen before any token is produced.
    async fn stream_chat(&self, request: ChatRequest) -> Result<TokenStream>;
}

//
// ================= Model selection =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmModelName {
    Gpt4Turbo,
    Gpt35Turbo,
    Gpt4o,
    Gpt4oMini,
    Gpt5,
    Gpt5Mini,
    Llama3,
    Gemini25Pro,
    Gemini25Flash,
    Gemini25FlashLite,
    Gemini20Flash,
    Gemini20FlashLite,
    Mock,
}

impl LlmModelName {
    pub const ALL: &'static [LlmModelName] = &[
        LlmModelName::Gpt4Turbo,
        LlmModelName::Gpt35Turbo,
        LlmModelName::Gpt4o,
        LlmModelName::Gpt4oMini,
        LlmModelName::Gpt5,
        LlmModelName::Gpt5Mini,
        LlmModelName::Llama3,
        LlmModelName::Gemini25Pro,
        LlmModelName::Gemini25Flash,
        LlmModelName::Gemini25FlashLite,
        LlmModelName::Gemini20Flash,
        LlmModelName::Gemini20FlashLite,
        LlmModelName::Mock,
    ];

    /// Identifier sent to the provider API
    pub fn api_name(self) -> &'static str {
        match self {
            LlmModelName::Gpt4Turbo => "gpt-4-turbo",
            LlmModelName::Gpt35Turbo => "gpt-3.5-turbo",
            LlmModelName::Gpt4o => "gpt-4o",
            LlmModelName::Gpt4oMini => "gpt-4o-mini-2024-07-18",
            LlmModelName::Gpt5 => "gpt-5",
            LlmModelName::Gpt5Mini => "gpt-5-mini",
            LlmModelName::Llama3 => "llama3",
            LlmModelName::Gemini25Pro => "gemini-2.5-pro",
            LlmModelName::Gemini25Flash => "gemini-2.5-flash",
            LlmModelName::Gemini25FlashLite => "gemini-2.5-flash-lite",
            LlmModelName::Gemini20Flash => "gemini-2.0-flash",
            LlmModelName::Gemini20FlashLite => "gemini-2.0-flash-lite",
            LlmModelName::Mock => "mock",
        }
    }

    pub fn provider(self) -> Result<Provider> {
        match self {
            LlmModelName::Gpt4Turbo
            | LlmModelName::Gpt35Turbo
            | LlmModelName::Gpt4o
            | LlmModelName::Gpt4oMini
            | LlmModelName::Gpt5
            | LlmModelName::Gpt5Mini => Ok(Provider::OpenAI),
            LlmModelName::Gemini25Pro
            | LlmModelName::Gemini25Flash
            | LlmModelName::Gemini25FlashLite
            | LlmModelName::Gemini20Flash
            | LlmModelName::Gemini20FlashLite => Ok(Provider::Gemini),
            LlmModelName::Mock => Ok(Provider::Mock),
            LlmModelName::Llama3 => Err(AgentError::UnsupportedModel(self.api_name().to_string())),
        }
    }
}

impl FromStr for LlmModelName {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        // Short aliases for dated snapshots
        let wanted = match wanted.as_str() {
            "gpt-4o-mini" => "gpt-4o-mini-2024-07-18",
            "gpt-4-o" => "gpt-4o",
            other => other,
        };

        LlmModelName::ALL
            .iter()
            .copied()
            .find(|m| m.api_name() == wanted)
            .ok_or_else(|| AgentError::UnsupportedModel(s.to_string()))
    }
}

impl fmt::Display for LlmModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Build the chat model selected by the configuration
pub fn build_chat_model(config: &AppConfig) -> Result<Arc<dyn ChatModel>> {
    let model = config.llm_model;

    match model.provider()? {
        Provider::OpenAI => {
            let key = config
                .openai_api_key
                .clone()
                .ok_or_else(|| AgentError::MissingEnv("OPENAI_API_KEY".to_string()))?;
            Ok(Arc::new(OpenAIClient::new(
                key,
                model.api_name().to_string(),
                config.openai_base_url.clone(),
            )?))
        }
        Provider::Gemini => {
            let key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| AgentError::MissingEnv("GEMINI_API_KEY".to_string()))?;
            Ok(Arc::new(GeminiClient::new(key, model.api_name().to_string())?))
        }
        Provider::Mock => Ok(Arc::new(MockChatModel::default())),
    }
}

//
// ================= Mock =================
//

/// Offline model for development & testing
///
/// Streams a fixed reply word by word, or echoes the query when no reply is set.
#[derive(Debug, Clone, Default)]
pub struct MockChatModel {
    reply: Option<String>,
}

impl MockChatModel {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TokenStream> {
        let reply = self
            .reply
            .clone()
            .unwrap_or_else(|| format!("You asked: {}", request.user_query));

        let tokens: Vec<Result<String>> = reply
            .split_inclusive(' ')
            .map(|t| Ok(t.to_string()))
            .collect();

        Ok(Box::pin(stream::iter(tokens)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_model_name_parsing() {
        assert_eq!("gpt-4o-mini".parse::<LlmModelName>().unwrap(), LlmModelName::Gpt4oMini);
        assert_eq!(" Gemini-2.5-Flash ".parse::<LlmModelName>().unwrap(), LlmModelName::Gemini25Flash);
        assert!("claude-9".parse::<LlmModelName>().is_err());
    }

    #[test]
    fn test_provider_mapping() {
        assert_eq!(LlmModelName::Gpt5.provider().unwrap(), Provider::OpenAI);
        assert_eq!(LlmModelName::Gemini20FlashLite.provider().unwrap(), Provider::Gemini);
        assert!(matches!(
            LlmModelName::Llama3.provider(),
            Err(AgentError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn test_every_name_round_trips() {
        for model in LlmModelName::ALL {
            assert_eq!(model.api_name().parse::<LlmModelName>().unwrap(), *model);
        }
    }

    #[tokio::test]
    async fn test_mock_streams_words() {
        let model = MockChatModel::with_reply("Your balance is ₹500");
        let request = ChatRequest {
            system_prompts: vec![],
            history: vec![],
            user_query: "balance?".to_string(),
            temperature: 0.7,
        };

        let tokens: Vec<String> = model
            .stream_chat(request)
            .await
            .unwrap()
            .map(|t| t.unwrap())
            .collect()
            .await;

        assert_eq!(tokens, vec!["Your ", "balance ", "is ", "₹500"]);
    }
}
