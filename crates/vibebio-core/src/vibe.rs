use serde::{Deserialize, Serialize};

/// Tone the generated bios should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    #[default]
    Professional,
    Casual,
    Funny,
}

impl Vibe {
    /// Label sent to the completion backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Professional => "Professional",
            Vibe::Casual => "Casual",
            Vibe::Funny => "Funny",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "professional" => Some(Vibe::Professional),
            "casual" => Some(Vibe::Casual),
            "funny" => Some(Vibe::Funny),
            _ => None,
        }
    }

    pub fn all() -> Vec<Vibe> {
        vec![Vibe::Professional, Vibe::Casual, Vibe::Funny]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Vibe::Professional => "Professional",
            Vibe::Casual => "Casual",
            Vibe::Funny => "Funny",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Vibe::Professional => Vibe::Casual,
            Vibe::Casual => Vibe::Funny,
            Vibe::Funny => Vibe::Professional,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Vibe::Professional => Vibe::Funny,
            Vibe::Casual => Vibe::Professional,
            Vibe::Funny => Vibe::Casual,
        }
    }
}
