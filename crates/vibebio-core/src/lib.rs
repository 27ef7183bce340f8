pub mod ai;
pub mod config;
pub mod error;
pub mod generation;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod state;
pub mod suggestions;
pub mod vibe;

// Re-export main types for convenience
pub use ai::{Backend, ChunkStream, EndpointClient, OllamaClient, OpenAIClient};
pub use config::Config;
pub use error::GenerateError;
pub use generation::{forward_stream, spawn_generation, GenerationEvent};
pub use provider::Provider;
pub use session::{GenerateRequest, Session, StreamUpdate};
pub use state::{ChatMessage, ChatRole, RequestState};
pub use suggestions::{extract_suggestions, SuggestionFormat, Suggestions};
pub use vibe::Vibe;
