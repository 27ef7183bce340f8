use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::decode::{decode_stream, OllamaDecoder};
use super::ChunkStream;
use crate::error::GenerateError;
use crate::prompt::build_bio_prompt;
use crate::vibe::Vibe;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn stream(
        &self,
        model: &str,
        bio: &str,
        vibe: Vibe,
    ) -> Result<ChunkStream, GenerateError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: model.to_string(),
            prompt: build_bio_prompt(bio, vibe),
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                GenerateError::Network(format!(
                    "{}. Make sure Ollama is running with: ollama serve",
                    e
                ))
            })?;

        if !response.status().is_success() {
            return Err(GenerateError::from_response(response).await);
        }

        Ok(decode_stream(response.bytes_stream(), OllamaDecoder::default()))
    }

    pub async fn list_models(&self) -> Result<Vec<String>, GenerateError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(GenerateError::from_response(response).await);
        }

        let models_response: OllamaModelsResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Parse(e.to_string()))?;

        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let client = OllamaClient::new("http://localhost:11434/");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_asks_for_streaming() {
        let body = serde_json::to_value(OllamaRequest {
            model: "llama3.2".to_string(),
            prompt: "p".to_string(),
            stream: true,
        })
        .unwrap();
        assert_eq!(body["stream"], serde_json::json!(true));
        assert_eq!(body["model"], serde_json::json!("llama3.2"));
    }
}
