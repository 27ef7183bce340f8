//! Turning streamed response bodies into text chunks
//!
//! Each backend frames its stream differently (raw text, NDJSON, SSE). A
//! [`ChunkDecoder`] buffers partial frames across network reads and
//! [`decode_stream`] drives one over a byte stream.

use std::collections::VecDeque;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use super::ChunkStream;
use crate::error::GenerateError;

/// Backend-specific framing of a streamed body
pub trait ChunkDecoder: Send {
    /// Feed raw bytes, returning any text completed by them
    fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, GenerateError>;

    /// Called once the body ends; flushes whatever is still buffered
    fn finish(&mut self) -> Result<Vec<String>, GenerateError>;
}

/// Plain UTF-8 text, possibly split mid-character across reads
#[derive(Debug, Default)]
pub struct TextDecoder {
    pending: Vec<u8>,
}

impl ChunkDecoder for TextDecoder {
    fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, GenerateError> {
        self.pending.extend_from_slice(bytes);

        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            // error_len() is None when the tail is an incomplete sequence
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                return Ok(vec![text]);
            }
        };

        if valid_up_to == 0 {
            return Ok(Vec::new());
        }

        let rest = self.pending.split_off(valid_up_to);
        let complete = std::mem::replace(&mut self.pending, rest);
        Ok(vec![String::from_utf8_lossy(&complete).into_owned()])
    }

    fn finish(&mut self) -> Result<Vec<String>, GenerateError> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Ok(vec![text])
    }
}

/// Buffers bytes and hands back complete newline-terminated lines
#[derive(Debug, Default)]
struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    fn take_rest(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

#[derive(Deserialize)]
struct OllamaStreamLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Ollama `/api/generate` NDJSON: `{"response":"...","done":false}` per line
#[derive(Debug, Default)]
pub struct OllamaDecoder {
    lines: LineBuffer,
    done: bool,
}

impl OllamaDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Option<String>, GenerateError> {
        if self.done {
            return Ok(None);
        }

        let parsed: OllamaStreamLine = serde_json::from_str(line)
            .map_err(|e| GenerateError::Parse(format!("invalid Ollama frame: {}", e)))?;

        if let Some(message) = parsed.error {
            return Err(GenerateError::Api { code: 200, message });
        }
        if parsed.done {
            self.done = true;
        }
        if parsed.response.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parsed.response))
        }
    }
}

impl ChunkDecoder for OllamaDecoder {
    fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, GenerateError> {
        let mut out = Vec::new();
        for line in self.lines.push(bytes) {
            if let Some(text) = self.decode_line(&line)? {
                out.push(text);
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<String>, GenerateError> {
        match self.lines.take_rest() {
            Some(line) => Ok(self.decode_line(&line)?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }
}

/// OpenAI chat completions SSE: `data: {"choices":[{"delta":{"content":"..."}}]}`
#[derive(Debug, Default)]
pub struct SseDecoder {
    lines: LineBuffer,
    done: bool,
}

impl SseDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Option<String>, GenerateError> {
        if self.done {
            return Ok(None);
        }

        // event:, id:, and comment lines carry no text
        let data = match line.strip_prefix("data:") {
            Some(data) => data.trim_start(),
            None => return Ok(None),
        };

        if data == "[DONE]" {
            self.done = true;
            return Ok(None);
        }

        let json: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| GenerateError::Parse(format!("invalid SSE data: {}", e)))?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("stream error")
                .to_string();
            return Err(GenerateError::Api { code: 200, message });
        }

        Ok(json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("delta"))
            .and_then(|d| d.get("content"))
            .and_then(|c| c.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()))
    }
}

impl ChunkDecoder for SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, GenerateError> {
        let mut out = Vec::new();
        for line in self.lines.push(bytes) {
            if let Some(text) = self.decode_line(&line)? {
                out.push(text);
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<String>, GenerateError> {
        match self.lines.take_rest() {
            Some(line) => Ok(self.decode_line(&line)?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }
}

struct DecodeState<S, D> {
    bytes: S,
    decoder: D,
    pending: VecDeque<Result<String, GenerateError>>,
    finished: bool,
}

/// Drive `decoder` over a body stream, yielding text chunks in arrival order.
///
/// The first error ends the stream after it is yielded.
pub fn decode_stream<S, E, D>(bytes: S, decoder: D) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<GenerateError> + 'static,
    D: ChunkDecoder + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder,
        pending: VecDeque::new(),
        finished: false,
    };

    let chunks = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(bytes)) => match state.decoder.push(&bytes) {
                    Ok(texts) => state.pending.extend(texts.into_iter().map(Ok)),
                    Err(e) => {
                        state.finished = true;
                        state.pending.push_back(Err(e));
                    }
                },
                Some(Err(e)) => {
                    state.finished = true;
                    state.pending.push_back(Err(e.into()));
                }
                None => {
                    state.finished = true;
                    match state.decoder.finish() {
                        Ok(texts) => state.pending.extend(texts.into_iter().map(Ok)),
                        Err(e) => state.pending.push_back(Err(e)),
                    }
                }
            }
        }
    });

    Box::pin(chunks)
}
