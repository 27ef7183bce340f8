//! Running one generation request
//!
//! A request runs on its own tokio task. Chunks are forwarded to the UI as
//! [`GenerationEvent`]s through a caller-supplied `emit` callback, which
//! returns `false` once nobody is listening any more.

use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::ai::Backend;
use crate::error::GenerateError;
use crate::session::GenerateRequest;

/// Progress of a streamed reply, tagged with the request it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Chunk { request_id: u64, text: String },
    Complete { request_id: u64 },
    Failed { request_id: u64, error: String },
}

impl GenerationEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            GenerationEvent::Chunk { request_id, .. }
            | GenerationEvent::Complete { request_id }
            | GenerationEvent::Failed { request_id, .. } => *request_id,
        }
    }
}

/// Forward every chunk of `chunks` in arrival order, then `Complete` or `Failed`.
///
/// Returns `false` if `emit` reported the receiver gone; the stream is
/// dropped at that point.
pub async fn forward_stream<S, F>(request_id: u64, mut chunks: S, emit: &mut F) -> bool
where
    S: Stream<Item = Result<String, GenerateError>> + Unpin,
    F: FnMut(GenerationEvent) -> bool,
{
    let mut received = 0usize;

    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(text) => {
                received += text.len();
                if !emit(GenerationEvent::Chunk { request_id, text }) {
                    log::debug!("Receiver gone, dropping stream for request {}", request_id);
                    return false;
                }
            }
            Err(e) => {
                log::error!("Request {} failed after {} bytes: {}", request_id, received, e);
                return emit(GenerationEvent::Failed {
                    request_id,
                    error: e.to_string(),
                });
            }
        }
    }

    log::debug!("Request {} complete ({} bytes)", request_id, received);
    emit(GenerationEvent::Complete { request_id })
}

/// Start `request` against `backend` on a background task.
///
/// Abort the returned handle to cancel the request.
pub fn spawn_generation<F>(backend: Backend, request: GenerateRequest, mut emit: F) -> JoinHandle<()>
where
    F: FnMut(GenerationEvent) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let request_id = request.request_id;
        match backend.stream(&request).await {
            Ok(stream) => {
                forward_stream(request_id, stream, &mut emit).await;
            }
            Err(e) => {
                log::error!(
                    "Request {} to {} failed: {}",
                    request_id,
                    backend.provider().as_str(),
                    e
                );
                emit(GenerationEvent::Failed {
                    request_id,
                    error: e.to_string(),
                });
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(items: Vec<Result<&str, GenerateError>>) -> impl Stream<Item = Result<String, GenerateError>> + Unpin {
        stream::iter(
            items
                .into_iter()
                .map(|item| item.map(str::to_string))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_forwards_chunks_in_order_then_completes() {
        let mut events = Vec::new();
        let mut emit = |event: GenerationEvent| {
            events.push(event);
            true
        };

        let alive = forward_stream(7, chunks(vec![Ok("A"), Ok("B"), Ok("C")]), &mut emit).await;

        assert!(alive);
        assert_eq!(
            events,
            vec![
                GenerationEvent::Chunk { request_id: 7, text: "A".to_string() },
                GenerationEvent::Chunk { request_id: 7, text: "B".to_string() },
                GenerationEvent::Chunk { request_id: 7, text: "C".to_string() },
                GenerationEvent::Complete { request_id: 7 },
            ]
        );
    }

    #[tokio::test]
    async fn test_error_ends_with_failed() {
        let mut events = Vec::new();
        let mut emit = |event: GenerationEvent| {
            events.push(event);
            true
        };

        forward_stream(
            1,
            chunks(vec![
                Ok("1. Half"),
                Err(GenerateError::Network("connection reset".to_string())),
            ]),
            &mut emit,
        )
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            GenerationEvent::Failed { request_id: 1, error } if error.contains("connection reset")
        ));
    }

    #[tokio::test]
    async fn test_stops_when_receiver_is_gone() {
        let mut seen = 0;
        let mut emit = |_event: GenerationEvent| {
            seen += 1;
            false
        };

        let alive = forward_stream(3, chunks(vec![Ok("A"), Ok("B")]), &mut emit).await;

        assert!(!alive);
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn test_spawn_reports_connection_failure() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        // Port 9 (discard) on localhost is expected to refuse connections
        let backend = Backend::Endpoint(crate::ai::EndpointClient::new("http://127.0.0.1:9/api/chat"));
        let request = GenerateRequest {
            bio: "I build tools.".to_string(),
            vibe: crate::vibe::Vibe::Funny,
            request_id: 5,
        };

        spawn_generation(backend, request, move |event| tx.send(event).is_ok())
            .await
            .unwrap();

        match rx.recv().await {
            Some(GenerationEvent::Failed { request_id, .. }) => assert_eq!(request_id, 5),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_request_id_accessor() {
        assert_eq!(GenerationEvent::Complete { request_id: 9 }.request_id(), 9);
        assert_eq!(
            GenerationEvent::Failed { request_id: 4, error: String::new() }.request_id(),
            4
        );
    }
}
