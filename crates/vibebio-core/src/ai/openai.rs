use std::fmt;

use reqwest::Client;
use serde::Serialize;

use super::decode::{decode_stream, SseDecoder};
use super::ChunkStream;
use crate::error::GenerateError;
use crate::prompt::build_bio_prompt;
use crate::vibe::Vibe;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    url: String,
}

impl fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAIClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            url: OPENAI_CHAT_URL.to_string(),
        }
    }

    /// Point at an OpenAI-compatible server instead of api.openai.com
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub async fn stream(
        &self,
        model: &str,
        bio: &str,
        vibe: Vibe,
    ) -> Result<ChunkStream, GenerateError> {
        let request = OpenAIRequest {
            model: model.to_string(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: build_bio_prompt(bio, vibe),
            }],
            stream: true,
            temperature: 0.7,
            max_tokens: 200,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerateError::from_response(response).await);
        }

        Ok(decode_stream(response.bytes_stream(), SseDecoder::default()))
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "gpt-4o-mini".to_string(),
            "gpt-4o".to_string(),
            "gpt-4-turbo".to_string(),
            "gpt-3.5-turbo".to_string(),
        ]
    }
}
