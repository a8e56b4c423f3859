//! Chat history window
//!
//! Converts client-supplied chat turns into provider turns and keeps only
//! the most recent ones that fit the configured budget.

use crate::llm::{HistoryTurn, TurnRole};
use crate::models::{ChatMessage, ChatRole};
use tracing::debug;

/// Configuration for the history window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    /// Maximum number of turns forwarded to the model
    pub max_messages: usize,
    /// Approximate token budget for forwarded turns
    pub max_tokens: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_messages: 20,
            max_tokens: 8_000,
        }
    }
}

/// Rough token estimate (~4 characters per token)
pub fn estimate_tokens(text: &str) -> usize {
    (text.len() + 3) / 4
}

/// Keeps recent history within budget
#[derive(Debug, Clone, Default)]
pub struct HistoryWindow {
    config: WindowConfig,
}

impl HistoryWindow {
    pub fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    /// Select the turns to forward, oldest first.
    ///
    /// Only user and assistant turns are kept. Turns are taken newest first
    /// until either limit is hit, so the oldest turns are the ones dropped.
    pub fn prepare(&self, messages: &[ChatMessage]) -> Vec<HistoryTurn> {
        let mut kept = Vec::new();
        let mut tokens = 0usize;

        for msg in messages.iter().rev() {
            let role = match msg.role {
                ChatRole::User => TurnRole::User,
                ChatRole::Assistant => TurnRole::Assistant,
                ChatRole::System | ChatRole::Other => continue,
            };

            let cost = estimate_tokens(&msg.content);
            if kept.len() >= self.config.max_messages || tokens + cost > self.config.max_tokens {
                break;
            }

            tokens += cost;
            kept.push(HistoryTurn {
                role,
                content: msg.content.clone(),
            });
        }

        kept.reverse();

        if kept.len() < messages.len() {
            debug!(
                "History window kept {}/{} messages (~{} tokens)",
                kept.len(),
                messages.len(),
                tokens
            );
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_user_and_assistant_forwarded() {
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage {
                role: ChatRole::System,
                content: "be evil".to_string(),
            },
            ChatMessage::assistant("hello"),
            ChatMessage {
                role: ChatRole::Other,
                content: "tool output".to_string(),
            },
        ];

        let turns = HistoryWindow::default().prepare(&messages);
        assert_eq!(
            turns,
            vec![
                HistoryTurn {
                    role: TurnRole::User,
                    content: "hi".to_string()
                },
                HistoryTurn {
                    role: TurnRole::Assistant,
                    content: "hello".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_message_limit_keeps_most_recent() {
        let messages: Vec<ChatMessage> = (0..10)
            .map(|i| ChatMessage::user(format!("message {}", i)))
            .collect();

        let window = HistoryWindow::new(WindowConfig {
            max_messages: 3,
            max_tokens: 10_000,
        });
        let turns = window.prepare(&messages);

        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["message 7", "message 8", "message 9"]);
    }

    #[test]
    fn test_token_budget_drops_oldest() {
        let messages = vec![
            ChatMessage::user("a".repeat(400)),
            ChatMessage::assistant("b".repeat(40)),
            ChatMessage::user("c".repeat(40)),
        ];

        let window = HistoryWindow::new(WindowConfig {
            max_messages: 10,
            max_tokens: 25,
        });
        let turns = window.prepare(&messages);

        assert_eq!(turns.len(), 2);
        assert!(turns[0].content.starts_with('b'));
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
