//! Finance Chat Agent
//!
//! A conversational backend for personal finance questions that:
//! - Screens every query with a deterministic topic classifier
//! - Flattens the user's banking snapshot into prompt context
//! - Forwards admitted queries and recent chat turns to a hosted LLM
//! - Streams the model's reply back as newline-delimited JSON
//!
//! REQUEST FLOW:
//! QUERY → CLASSIFY → CONTEXT → PROMPT → STREAM

pub mod agent;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod finance_context;
pub mod history;
pub mod llm;
pub mod models;
pub mod prompt;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::{AgentSettings, FinanceAgent};
pub use classifier::{ClassificationResult, TopicClassifier, Verdict};
