//! OpenAI-compatible chat completions client (streaming)

use super::sse::data_events;
use super::{ChatModel, ChatRequest, TokenStream, TurnRole};
use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Reusable OpenAI client (connection-pooled)
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        info!("Initialized OpenAI client: model={}, base_url={}", model, base_url);

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }

    fn build_request(&self, request: &ChatRequest) -> CompletionRequest {
        let mut messages = Vec::with_capacity(request.system_prompts.len() + request.history.len() + 1);

        for prompt in &request.system_prompts {
            messages.push(Message {
                role: "system",
                content: prompt.clone(),
            });
        }
        for turn in &request.history {
            messages.push(Message {
                role: match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Assistant => "assistant",
                },
                content: turn.content.clone(),
            });
        }
        messages.push(Message {
            role: "user",
            content: request.user_query.clone(),
        });

        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            stream: true,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TokenStream> {
        if self.api_key.is_empty() {
            return Err(AgentError::MissingEnv("OPENAI_API_KEY".to_string()));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(&request);

        info!(model = %self.model, history = request.history.len(), "Calling OpenAI API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI API request failed: {}", e);
                AgentError::LlmError(format!("OpenAI API error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error response: {}", error_text);
            return Err(AgentError::ProviderStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let tokens = data_events(response.bytes_stream())
            .take_while(|event| {
                let done = matches!(event, Ok(data) if data.trim() == "[DONE]");
                futures::future::ready(!done)
            })
            .filter_map(|event| futures::future::ready(parse_event(event).transpose()));

        Ok(Box::pin(tokens))
    }
}

/// Extract the text delta from one streamed chunk
fn parse_event(event: Result<String>) -> Result<Option<String>> {
    let data = event?;
    let chunk: CompletionChunk = serde_json::from_str(&data).map_err(|e| {
        debug!("Unparseable OpenAI chunk: {}", data);
        AgentError::StreamError(format!("OpenAI chunk parse error: {}", e))
    })?;

    if let Some(err) = chunk.error {
        return Err(AgentError::LlmError(err.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty()))
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
