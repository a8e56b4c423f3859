//! Gemini API client
//!
//! Streams replies through `streamGenerateContent` with server-sent events.
//! Uses a long-lived reqwest::Client for connection pooling.

use super::sse::data_events;
use super::{ChatModel, ChatRequest, TokenStream, TurnRole};
use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn build_request(&self, request: &ChatRequest) -> GeminiRequest {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| Content {
                role: Some(
                    match turn.role {
                        TurnRole::User => "user",
                        TurnRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        contents.push(Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: request.user_query.clone(),
            }],
        });

        GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 2048,
            },
            system_instruction: SystemInstruction {
                parts: request
                    .system_prompts
                    .iter()
                    .map(|text| Part { text: text.clone() })
                    .collect(),
            },
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TokenStream> {
        if self.api_key.is_empty() {
            return Err(AgentError::MissingEnv("GEMINI_API_KEY".to_string()));
        }

        let body = self.build_request(&request);

        info!(model = %self.model, history = request.history.len(), "Calling Gemini API");

        let response = self
            .client
            .post(self.stream_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                AgentError::LlmError(format!("Gemini API error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(AgentError::ProviderStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let tokens = data_events(response.bytes_stream())
            .filter_map(|event| futures::future::ready(parse_event(event).transpose()));

        Ok(Box::pin(tokens))
    }
}

/// Extract the text of one streamed `GenerateContentResponse`
fn parse_event(event: Result<String>) -> Result<Option<String>> {
    let data = event?;
    let chunk: GeminiResponse = serde_json::from_str(&data).map_err(|e| {
        debug!("Unparseable Gemini chunk: {}", data);
        AgentError::StreamError(format!("Gemini parse error: {}", e))
    })?;

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(None);
    };

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        warn!("Gemini stopped the reply for safety reasons");
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    Ok(Some(text).filter(|t| !t.is_empty()))
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::HistoryTurn;

    #[test]
    fn test_request_serialization() {
        let client = GeminiClient::new("key".to_string(), "gemini-2.5-flash".to_string()).unwrap();
        let request = ChatRequest {
            system_prompts: vec!["You are a finance assistant".to_string()],
            history: vec![HistoryTurn {
                role: TurnRole::Assistant,
                content: "Hi! How can I help?".to_string(),
            }],
            user_query: "What did I spend on Swiggy?".to_string(),
            temperature: 0.7,
        };

        let json = serde_json::to_value(client.build_request(&request)).unwrap();
        assert_eq!(json["contents"][0]["role"], "model");
        assert_eq!(json["contents"][1]["role"], "user");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "What did I spend on Swiggy?");
        assert_eq!(
            json["system_instruction"]["parts"][0]["text"],
            "You are a finance assistant"
        );
        assert!(client.stream_url().contains("gemini-2.5-flash:streamGenerateContent?alt=sse"));
    }

    #[test]
    fn test_parse_stream_chunk() {
        let chunk = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"You spent "},{"text":"₹1,581"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(
            parse_event(Ok(chunk.to_string())).unwrap(),
            Some("You spent ₹1,581".to_string())
        );

        let empty = r#"{"candidates":[],"usageMetadata":{"promptTokenCount":10}}"#;
        assert_eq!(parse_event(Ok(empty.to_string())).unwrap(), None);
    }
}
