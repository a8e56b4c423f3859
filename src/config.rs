//! Application configuration loaded from the environment

use crate::error::AgentError;
use crate::finance_context::ContextOptions;
use crate::history::WindowConfig;
use crate::llm::{LlmModelName, Provider};
use crate::Result;
use std::collections::HashMap;
use std::str::FromStr;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Served to the browser client at `/config`
    pub api_base_url: String,
    pub llm_model: LlmModelName,
    pub temperature: f32,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub context: ContextOptions,
    pub history: WindowConfig,
}

impl AppConfig {
    /// Load from process environment (after `.env`)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    /// Build from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_var::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let llm_model: LlmModelName = get("LLM_MODEL")
            .as_deref()
            .unwrap_or(DEFAULT_MODEL)
            .parse()?;

        let temperature = match get("LLM_TEMPERATURE") {
            Some(raw) => parse_var::<f32>("LLM_TEMPERATURE", &raw)?,
            None => DEFAULT_TEMPERATURE,
        };
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AgentError::ConfigError(format!(
                "LLM_TEMPERATURE must be between 0 and 2, got {}",
                temperature
            )));
        }

        let defaults = WindowConfig::default();
        let history = WindowConfig {
            max_messages: match get("HISTORY_MAX_MESSAGES") {
                Some(raw) => parse_var("HISTORY_MAX_MESSAGES", &raw)?,
                None => defaults.max_messages,
            },
            max_tokens: match get("HISTORY_MAX_TOKENS") {
                Some(raw) => parse_var("HISTORY_MAX_TOKENS", &raw)?,
                None => defaults.max_tokens,
            },
        };

        let context = ContextOptions {
            mask_account_numbers: match get("MASK_ACCOUNT_NUMBERS") {
                Some(raw) => parse_bool("MASK_ACCOUNT_NUMBERS", &raw)?,
                None => false,
            },
            transaction_limit: get("CONTEXT_TRANSACTION_LIMIT")
                .map(|raw| parse_var::<usize>("CONTEXT_TRANSACTION_LIMIT", &raw))
                .transpose()?,
        };
        if context.transaction_limit == Some(0) {
            return Err(AgentError::ConfigError(
                "CONTEXT_TRANSACTION_LIMIT must be at least 1; unset it for the full listing"
                    .to_string(),
            ));
        }

        let config = Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            api_base_url: get("API_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            llm_model,
            temperature,
            openai_api_key: get("OPENAI_API_KEY").or_else(|| get("OPEN_AI_KEY")),
            openai_base_url: get("OPENAI_BASE_URL"),
            gemini_api_key: get("GEMINI_API_KEY"),
            context,
            history,
        };

        config.validate()?;
        Ok(config)
    }

    /// The selected provider must be usable and have its key
    fn validate(&self) -> Result<()> {
        match self.llm_model.provider()? {
            Provider::OpenAI if self.openai_api_key.is_none() => {
                Err(AgentError::MissingEnv("OPENAI_API_KEY".to_string()))
            }
            Provider::Gemini if self.gemini_api_key.is_none() => {
                Err(AgentError::MissingEnv("GEMINI_API_KEY".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| AgentError::ConfigError(format!("{} has an invalid value: {}", key, raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AgentError::ConfigError(format!(
            "{} has an invalid value: {}",
            key, raw
        ))),
    }
}
