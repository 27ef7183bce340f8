use reqwest::Client;
use serde::Serialize;

use super::decode::{decode_stream, TextDecoder};
use super::ChunkStream;
use crate::error::GenerateError;
use crate::vibe::Vibe;

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:3000/api/chat";

#[derive(Serialize)]
struct EndpointRequest<'a> {
    bio: &'a str,
    vibe: &'a str,
}

/// Client for a hosted bio endpoint.
///
/// The endpoint owns prompt construction; we send `{bio, vibe}` and read the
/// body back as plain UTF-8 text until the connection closes.
#[derive(Debug, Clone)]
pub struct EndpointClient {
    client: Client,
    url: String,
}

impl EndpointClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    pub async fn stream(&self, bio: &str, vibe: Vibe) -> Result<ChunkStream, GenerateError> {
        let request = EndpointRequest {
            bio,
            vibe: vibe.as_str(),
        };

        log::debug!("POST {} (vibe {})", self.url, vibe.as_str());

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerateError::from_response(response).await);
        }

        Ok(decode_stream(response.bytes_stream(), TextDecoder::default()))
    }
}
