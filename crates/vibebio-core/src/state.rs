//! UI-agnostic application state types
//!
//! This module contains data structures that are shared between the terminal UI
//! and the non-interactive print mode, and don't depend on any UI framework.

use serde::{Deserialize, Serialize};

/// A message in the generation exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Lifecycle of a single generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// No request has been made yet
    #[default]
    Idle,
    /// Request sent, waiting for the first chunk
    Requesting,
    /// Chunks are arriving
    Streaming,
    /// Stream ended normally
    Complete,
    /// Stream errored or was dropped; partial content is kept
    Failed,
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::Requesting | RequestState::Streaming)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Requesting => "requesting",
            RequestState::Streaming => "streaming",
            RequestState::Complete => "complete",
            RequestState::Failed => "failed",
        }
    }
}
