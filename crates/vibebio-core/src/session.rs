//! The bio form's view state
//!
//! A [`Session`] owns the input text, the selected vibe, the request state,
//! and the messages of the current run. It is the single writer of the reply
//! buffer: generation events are applied here, in arrival order.

use crate::generation::GenerationEvent;
use crate::state::{ChatMessage, ChatRole, RequestState};
use crate::suggestions::SuggestionFormat;
use crate::vibe::Vibe;

/// What a submit hands to the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub bio: String,
    pub vibe: Vibe,
    pub request_id: u64,
}

/// Result of applying one generation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// Event belonged to an older request
    Ignored,
    /// First chunk of the current request; results just became visible
    FirstChunk,
    Chunk,
    Completed,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    input: String,
    vibe: Vibe,
    bio: String,
    request_state: RequestState,
    messages: Vec<ChatMessage>,
    request_id: u64,
    last_error: Option<String>,
}

impl Session {
    pub fn new(vibe: Vibe) -> Self {
        Self {
            vibe,
            ..Self::default()
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn vibe(&self) -> Vibe {
        self.vibe
    }

    /// Input snapshot taken at the last submit
    pub fn bio(&self) -> &str {
        &self.bio
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn is_loading(&self) -> bool {
        self.request_state.is_in_flight()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn update_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn select_vibe(&mut self, vibe: Vibe) {
        self.vibe = vibe;
    }

    /// Start a new request from the current input and vibe.
    ///
    /// Returns `None` while another request is still in flight.
    pub fn submit(&mut self) -> Option<GenerateRequest> {
        if self.request_state.is_in_flight() {
            log::debug!(
                "Ignoring submit while request {} is {}",
                self.request_id,
                self.request_state.label()
            );
            return None;
        }

        self.bio = self.input.clone();
        self.request_id += 1;
        self.request_state = RequestState::Requesting;
        self.last_error = None;
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: self.bio.clone(),
        });

        log::debug!("Submitting request {} ({})", self.request_id, self.vibe.as_str());

        Some(GenerateRequest {
            bio: self.bio.clone(),
            vibe: self.vibe,
            request_id: self.request_id,
        })
    }

    /// Apply a generation event for the current request.
    pub fn apply(&mut self, event: GenerationEvent) -> StreamUpdate {
        if event.request_id() != self.request_id || !self.request_state.is_in_flight() {
            log::debug!(
                "Ignoring event for request {} (current {}, {})",
                event.request_id(),
                self.request_id,
                self.request_state.label()
            );
            return StreamUpdate::Ignored;
        }

        match event {
            GenerationEvent::Chunk { text, .. } => {
                if self.request_state == RequestState::Requesting {
                    self.request_state = RequestState::Streaming;
                    self.messages.push(ChatMessage {
                        role: ChatRole::Assistant,
                        content: text,
                    });
                    StreamUpdate::FirstChunk
                } else {
                    if let Some(message) = self.messages.last_mut() {
                        message.content.push_str(&text);
                    }
                    StreamUpdate::Chunk
                }
            }
            GenerationEvent::Complete { .. } => {
                self.request_state = RequestState::Complete;
                StreamUpdate::Completed
            }
            GenerationEvent::Failed { error, .. } => {
                self.request_state = RequestState::Failed;
                self.last_error = Some(error.clone());
                StreamUpdate::Failed(error)
            }
        }
    }

    /// Content of the last message when it came from the assistant
    pub fn generated_bios(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == ChatRole::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Card texts for the current reply
    pub fn cards(&self, format: SuggestionFormat) -> Vec<String> {
        format.cards(self.generated_bios())
    }
}
