//! Streams a reply from a local HTTP server through the endpoint backend into a session.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use vibebio_core::{
    spawn_generation, Backend, EndpointClient, GenerationEvent, RequestState, Session,
    StreamUpdate, SuggestionFormat, Vibe,
};

/// Read one HTTP request (headers plus Content-Length body) and return the body
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            let body_start = header_end + 4;
            if buf.len() >= body_start + content_length {
                return String::from_utf8_lossy(&buf[body_start..body_start + content_length])
                    .to_string();
            }
        }
    }
}

/// Serve one request, writing `pieces` as separate writes and closing the connection
async fn serve_once(listener: TcpListener, status: &'static str, pieces: Vec<&'static [u8]>) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let body = read_request(&mut socket).await;

    let head = format!(
        "HTTP/1.1 {}\r\ncontent-type: text/plain; charset=utf-8\r\nconnection: close\r\n\r\n",
        status
    );
    socket.write_all(head.as_bytes()).await.unwrap();
    for piece in pieces {
        socket.write_all(piece).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    socket.shutdown().await.unwrap();
    body
}

async fn run(session: &mut Session, backend: Backend) -> Vec<StreamUpdate> {
    let request = session.submit().expect("no request in flight");
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();
    let handle = spawn_generation(backend, request, move |event| tx.send(event).is_ok());

    let mut updates = Vec::new();
    while let Some(event) = rx.recv().await {
        let update = session.apply(event);
        let done = matches!(update, StreamUpdate::Completed | StreamUpdate::Failed(_));
        updates.push(update);
        if done {
            break;
        }
    }
    handle.await.unwrap();
    updates
}

#[tokio::test]
async fn streams_bios_into_two_cards() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let reply: Vec<&'static [u8]> = vec![
        &b"1. Tool-builder "[..],
        &b"extraordinaire. "[..],
        // "é" split across two writes
        &b"2. I make things that work (mostly) \xC3"[..],
        &b"\xA9."[..],
    ];
    let server = tokio::spawn(serve_once(listener, "200 OK", reply));

    let mut session = Session::new(Vibe::Professional);
    session.update_input("I build tools.");
    session.select_vibe(Vibe::Funny);

    let backend = Backend::Endpoint(EndpointClient::new(&format!("http://{}/api/chat", addr)));
    let updates = run(&mut session, backend).await;

    let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({ "bio": "I build tools.", "vibe": "Funny" }));

    assert_eq!(updates.first(), Some(&StreamUpdate::FirstChunk));
    assert_eq!(updates.last(), Some(&StreamUpdate::Completed));
    assert_eq!(session.request_state(), RequestState::Complete);
    assert_eq!(
        session.cards(SuggestionFormat::Marker),
        vec![
            "Tool-builder extraordinaire.".to_string(),
            "I make things that work (mostly) é.".to_string(),
        ]
    );
}

#[tokio::test]
async fn non_success_status_fails_the_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(
        listener,
        "429 Too Many Requests",
        vec![&b"slow down"[..]],
    ));

    let mut session = Session::default();
    session.update_input("anything");

    let backend = Backend::Endpoint(EndpointClient::new(&format!("http://{}/api/chat", addr)));
    let updates = run(&mut session, backend).await;
    server.await.unwrap();

    match updates.as_slice() {
        [StreamUpdate::Failed(error)] => {
            assert!(error.contains("429"), "unexpected error: {}", error);
            assert!(error.contains("slow down"));
        }
        other => panic!("expected a single failure, got {:?}", other),
    }
    assert_eq!(session.request_state(), RequestState::Failed);
    assert_eq!(session.generated_bios(), None);

    // The user can resubmit after a failure
    assert!(session.submit().is_some());
}
