//! Clipboard access
//!
//! The system clipboard goes through arboard. Terminals reached over SSH or
//! without a display server can still take text through an OSC 52 escape
//! sequence.

use std::fmt;
use std::io::{self, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use vibebio_core::config::ClipboardBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardError {
    /// System clipboard is not available
    SystemUnavailable,
    /// Error writing to clipboard
    WriteError,
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::SystemUnavailable => write!(f, "system clipboard unavailable"),
            ClipboardError::WriteError => write!(f, "failed to write to clipboard"),
        }
    }
}

pub trait Clipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard for the running terminal session
pub struct TerminalClipboard {
    backend: ClipboardBackend,
    // Kept alive: on X11 the contents vanish when the owner is dropped
    system: Option<arboard::Clipboard>,
}

impl TerminalClipboard {
    pub fn new(backend: ClipboardBackend) -> Self {
        Self {
            backend,
            system: None,
        }
    }

    fn copy_system(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.system.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|_| ClipboardError::SystemUnavailable)?;
            self.system = Some(clipboard);
        }

        match self.system.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .map_err(|_| ClipboardError::WriteError),
            None => Err(ClipboardError::SystemUnavailable),
        }
    }
}

impl Clipboard for TerminalClipboard {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        match self.backend {
            ClipboardBackend::System => self.copy_system(text),
            ClipboardBackend::Osc52 => copy_osc52(text),
            ClipboardBackend::Auto => self.copy_system(text).or_else(|e| {
                log::debug!("System clipboard failed ({}), using OSC 52", e);
                copy_osc52(text)
            }),
        }
    }
}

/// Write `text` to the terminal's clipboard via OSC 52.
///
/// Goes to stderr, the stream the UI draws on.
fn copy_osc52(text: &str) -> Result<(), ClipboardError> {
    let sequence = encode_osc52(text);
    let mut stderr = io::stderr();
    stderr
        .write_all(sequence.as_bytes())
        .map_err(|_| ClipboardError::WriteError)?;
    stderr.flush().map_err(|_| ClipboardError::WriteError)
}

pub fn encode_osc52(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_osc52() {
        assert_eq!(encode_osc52("hi"), "\x1b]52;c;aGk=\x07");
        assert_eq!(encode_osc52(""), "\x1b]52;c;\x07");
    }

    #[test]
    fn test_osc52_backend_always_succeeds() {
        let mut clipboard = TerminalClipboard::new(ClipboardBackend::Osc52);
        assert!(clipboard.copy("Tool-builder extraordinaire.").is_ok());
    }

    #[test]
    fn test_system_backend_returns_result() {
        // Depends on a display server; only the shape of the result is checked
        let mut clipboard = TerminalClipboard::new(ClipboardBackend::System);
        let result = clipboard.copy("test");
        assert!(
            result.is_ok()
                || matches!(
                    result,
                    Err(ClipboardError::SystemUnavailable) | Err(ClipboardError::WriteError)
                )
        );
    }
}
