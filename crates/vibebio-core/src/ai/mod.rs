pub mod decode;
pub mod endpoint;
pub mod ollama;
pub mod openai;

use std::pin::Pin;

use futures_util::Stream;

pub use endpoint::EndpointClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use crate::config::Config;
use crate::error::GenerateError;
use crate::provider::Provider;
use crate::session::GenerateRequest;

/// Text chunks of one streamed reply, in arrival order
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, GenerateError>> + Send>>;

/// A configured completion backend
#[derive(Debug, Clone)]
pub enum Backend {
    /// Hosted bio endpoint that builds its own prompt
    Endpoint(EndpointClient),
    /// Local Ollama server with the given model
    Ollama { client: OllamaClient, model: String },
    /// OpenAI chat completions with the given model
    OpenAI { client: OpenAIClient, model: String },
}

impl Backend {
    /// Build the backend for `provider` from configuration.
    ///
    /// Fails when the provider needs an API key that isn't available.
    pub fn from_config(
        config: &Config,
        provider: Provider,
        model: &str,
    ) -> Result<Self, GenerateError> {
        match provider {
            Provider::Endpoint => Ok(Backend::Endpoint(EndpointClient::new(&config.endpoint_url()))),
            Provider::Ollama => Ok(Backend::Ollama {
                client: OllamaClient::new(&config.ollama_url()),
                model: model.to_string(),
            }),
            Provider::OpenAI => {
                let key = config.openai_api_key().ok_or_else(|| {
                    GenerateError::NotConfigured(
                        "OpenAI API key missing. Set OPENAI_API_KEY or openai_api_key in config"
                            .to_string(),
                    )
                })?;
                let client = match &config.openai_url {
                    Some(url) => OpenAIClient::new(&key).with_url(url),
                    None => OpenAIClient::new(&key),
                };
                Ok(Backend::OpenAI {
                    client,
                    model: model.to_string(),
                })
            }
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Backend::Endpoint(_) => Provider::Endpoint,
            Backend::Ollama { .. } => Provider::Ollama,
            Backend::OpenAI { .. } => Provider::OpenAI,
        }
    }

    /// Open the reply stream for one request
    pub async fn stream(&self, request: &GenerateRequest) -> Result<ChunkStream, GenerateError> {
        match self {
            Backend::Endpoint(client) => client.stream(&request.bio, request.vibe).await,
            Backend::Ollama { client, model } => {
                client.stream(model, &request.bio, request.vibe).await
            }
            Backend::OpenAI { client, model } => {
                client.stream(model, &request.bio, request.vibe).await
            }
        }
    }
}
