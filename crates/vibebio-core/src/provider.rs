#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Endpoint,
    Ollama,
    OpenAI,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Endpoint => "endpoint",
            Provider::Ollama => "ollama",
            Provider::OpenAI => "openai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "endpoint" => Some(Provider::Endpoint),
            "ollama" => Some(Provider::Ollama),
            "openai" => Some(Provider::OpenAI),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::Endpoint, Provider::Ollama, Provider::OpenAI]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Endpoint => "Bio endpoint (Hosted)",
            Provider::Ollama => "Ollama (Local)",
            Provider::OpenAI => "ChatGPT (OpenAI)",
        }
    }

    /// Model used when nothing is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Endpoint => "",
            Provider::Ollama => "llama3.2:latest",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }

    /// The hosted endpoint picks its own model
    pub fn has_models(&self) -> bool {
        !matches!(self, Provider::Endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for provider in Provider::all() {
            assert_eq!(Provider::from_str(provider.as_str()), Some(provider));
        }
        assert_eq!(Provider::from_str("OpenAI"), Some(Provider::OpenAI));
        assert_eq!(Provider::from_str("claude"), None);
    }

    #[test]
    fn test_endpoint_has_no_model_choice() {
        assert!(!Provider::Endpoint.has_models());
        assert!(Provider::Ollama.has_models());
        assert_eq!(Provider::Endpoint.default_model(), "");
    }
}
