//! UI-agnostic session state types
//!
//! These are the values the presentation layer reads to decide what to draw.
//! None of them depend on a particular UI framework.

use serde::{Deserialize, Serialize};

/// A message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Result of probing the server at the current address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Address changed and the probe has not resolved yet
    #[default]
    Unknown,
    Connected,
    Failed,
}

/// What the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Failed,
    /// Connected with a model to target
    ChatReady,
    /// Connected, but the server offered no model
    Blocked,
}

impl SessionPhase {
    pub fn derive(status: ConnectionStatus, has_model: bool) -> Self {
        match (status, has_model) {
            (ConnectionStatus::Unknown, _) => SessionPhase::Connecting,
            (ConnectionStatus::Failed, _) => SessionPhase::Failed,
            (ConnectionStatus::Connected, true) => SessionPhase::ChatReady,
            (ConnectionStatus::Connected, false) => SessionPhase::Blocked,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, SessionPhase::ChatReady | SessionPhase::Blocked)
    }
}
