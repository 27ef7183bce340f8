use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::ai::endpoint::DEFAULT_ENDPOINT_URL;
use crate::ai::ollama::DEFAULT_OLLAMA_URL;
use crate::provider::Provider;
use crate::suggestions::SuggestionFormat;
use crate::vibe::Vibe;

const DEFAULT_NOTIFICATION_MS: u64 = 2000;

/// Where copied bios go
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardBackend {
    /// System clipboard, falling back to OSC 52
    #[default]
    Auto,
    /// Only the OS clipboard
    System,
    /// Only the OSC 52 terminal escape sequence
    Osc52,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub provider: Option<String>,
    pub default_model: Option<String>,
    pub endpoint_url: Option<String>,
    pub ollama_url: Option<String>,
    pub openai_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub default_vibe: Option<Vibe>,
    pub suggestion_format: Option<SuggestionFormat>,
    pub clipboard: Option<ClipboardBackend>,
    pub notification_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Endpoint.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_default_model(model: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.default_model = Some(model.to_string());
        config.save()
    }

    pub fn save_provider(provider: Provider) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.switch_provider(provider);
        config.save()
    }

    /// Select `provider`. The saved model belongs to the old provider, so a
    /// change of provider drops it.
    pub fn switch_provider(&mut self, provider: Provider) {
        if self.provider() != provider {
            self.default_model = None;
        }
        self.provider = Some(provider.as_str().to_string());
    }

    /// Directory holding config.json and the log file
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("vibebio"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Endpoint)
    }

    /// Model for `provider`: the saved default, else the provider's own default
    pub fn model_for(&self, provider: Provider) -> String {
        match &self.default_model {
            Some(model) if provider.has_models() && !model.trim().is_empty() => model.clone(),
            _ => provider.default_model().to_string(),
        }
    }

    /// VIBEBIO_ENDPOINT env var first, then config
    pub fn endpoint_url(&self) -> String {
        std::env::var("VIBEBIO_ENDPOINT")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.endpoint_url.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT_URL.to_string())
    }

    pub fn ollama_url(&self) -> String {
        self.ollama_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
    }

    /// OPENAI_API_KEY env var first, then config
    pub fn openai_api_key(&self) -> Option<String> {
        std::env::var("OPENAI_API_KEY")
            .ok()
            .or_else(|| self.openai_api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn default_vibe(&self) -> Vibe {
        self.default_vibe.unwrap_or_default()
    }

    pub fn suggestion_format(&self) -> SuggestionFormat {
        self.suggestion_format.unwrap_or_default()
    }

    pub fn clipboard_backend(&self) -> ClipboardBackend {
        self.clipboard.unwrap_or_default()
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms.unwrap_or(DEFAULT_NOTIFICATION_MS))
    }
}
