use thiserror::Error;

/// Errors that can occur while generating bios
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Backend is missing something it needs (API key, URL)
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Connection refused, dropped mid-stream, timeouts
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status or an error payload
    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    /// A streamed frame could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        GenerateError::Network(err.to_string())
    }
}

impl GenerateError {
    /// Build an `Api` error from a failed response, summarizing its body as the message
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        GenerateError::Api {
            code,
            message: summarize_body(&body),
        }
    }
}

const MAX_MESSAGE_CHARS: usize = 200;

/// Message of a JSON error body, else its first non-blank line, cut to a
/// length that fits a status line
fn summarize_body(body: &str) -> String {
    let json_message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let error = value.get("error").unwrap_or(&value);
            error
                .as_str()
                .or_else(|| error.get("message").and_then(|m| m.as_str()))
                .map(str::to_string)
        });
    let text = json_message.unwrap_or_else(|| body.to_string());
    let Some(line) = text.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return "request failed".to_string();
    };
    match line.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((end, _)) => format!("{}…", &line[..end]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_body() {
        assert_eq!(summarize_body(""), "request failed");
        assert_eq!(summarize_body("  \n\t\n"), "request failed");
        assert_eq!(summarize_body("  slow down  "), "slow down");

        let html = "\n<html>\n<head><title>502 Bad Gateway</title></head>\n<body>...</body>\n</html>\n";
        assert_eq!(summarize_body(html), "<html>");

        let openai = "{\n  \"error\": {\n    \"message\": \"Incorrect API key provided\",\n    \"type\": \"invalid_request_error\"\n  }\n}";
        assert_eq!(summarize_body(openai), "Incorrect API key provided");
        assert_eq!(summarize_body(r#"{"error":"model 'gemma9' not found"}"#), "model 'gemma9' not found");

        let long = "é".repeat(500);
        let summary = summarize_body(&long);
        assert_eq!(summary.chars().count(), MAX_MESSAGE_CHARS + 1);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            GenerateError::Api {
                code: 500,
                message: "boom".to_string()
            }
            .to_string(),
            "API error (500): boom"
        );
        assert_eq!(
            GenerateError::NotConfigured("missing key".to_string()).to_string(),
            "Not configured: missing key"
        );
    }
}
