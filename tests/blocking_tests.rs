use std::io::{BufRead, BufReader, Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lisa_sdk::blocking::LisaClient;
use lisa_sdk::stream::FrameLines;
use lisa_sdk::types::generate::StreamFrame;
use lisa_sdk::types::FoundationModel;
use lisa_sdk::{Error, Result};

fn test_model() -> FoundationModel {
    FoundationModel::new("ecs.textgen.tgi", "falcon-7b")
}

// ---------------------------------------------------------------------------
// FrameLines over in-memory readers
// ---------------------------------------------------------------------------

fn cursor(body: &str) -> Cursor<Vec<u8>> {
    Cursor::new(body.as_bytes().to_vec())
}

/// Reader that raises a flag on drop, standing in for a live response body.
struct DropReader {
    inner: Cursor<Vec<u8>>,
    dropped: Arc<AtomicBool>,
}

impl DropReader {
    fn new(body: &str) -> (Self, Arc<AtomicBool>) {
        let dropped = Arc::new(AtomicBool::new(false));
        (
            Self {
                inner: cursor(body),
                dropped: dropped.clone(),
            },
            dropped,
        )
    }
}

impl Drop for DropReader {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

impl Read for DropReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for DropReader {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

#[test]
fn frame_lines_yields_tokens_then_finish() {
    let body = "data:{\"token\":{\"text\":\"Hi\"}}\n\
                b\n\
                data:{\"token\":{\"text\":\"!\"}}\n\
                data:{\"finishReason\":\"stop\",\"generatedTokens\":2}\n";
    let frames = FrameLines::new(cursor(body))
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(
        frames,
        vec![
            StreamFrame::Token { text: "Hi".into() },
            StreamFrame::Token { text: "!".into() },
            StreamFrame::Finish {
                finish_reason: "stop".into(),
                generated_tokens: 2
            },
        ]
    );
}

#[test]
fn frame_lines_ignores_lines_after_finish() {
    let body = "data:{\"finishReason\":\"stop\",\"generatedTokens\":0}\n\
                data:{\"token\":{\"text\":\"late\"}}\n";
    let mut lines = FrameLines::new(cursor(body));
    assert!(lines.next().unwrap().unwrap().is_finish());
    assert!(lines.next().is_none());
}

#[test]
fn frame_lines_decode_error_ends_iteration() {
    let body = "data:{\"token\":{\"text\":\"ok\"}}\n\
                data:{bad json\n\
                data:{\"token\":{\"text\":\"never seen\"}}\n";
    let mut lines = FrameLines::new(cursor(body));
    assert_eq!(
        lines.next().unwrap().unwrap(),
        StreamFrame::Token { text: "ok".into() }
    );
    let err = lines.next().unwrap().unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "got {err:?}");
    assert!(lines.next().is_none());
}

#[test]
fn frame_lines_releases_reader_on_finish() {
    let body = "data:{\"token\":{\"text\":\"a\"}}\n\
                data:{\"finishReason\":\"stop\",\"generatedTokens\":1}\n";
    let (reader, dropped) = DropReader::new(body);
    let mut lines = FrameLines::new(reader);

    assert!(!lines.next().unwrap().unwrap().is_finish());
    assert!(!dropped.load(Ordering::SeqCst));
    assert!(lines.next().unwrap().unwrap().is_finish());
    // Released while the iterator itself is still alive.
    assert!(dropped.load(Ordering::SeqCst));
}

#[test]
fn frame_lines_releases_reader_on_early_drop() {
    let body = "data:{\"token\":{\"text\":\"first\"}}\n\
                data:{\"token\":{\"text\":\"second\"}}\n\
                data:{\"finishReason\":\"stop\",\"generatedTokens\":2}\n";
    let (reader, dropped) = DropReader::new(body);
    let mut lines = FrameLines::new(reader);

    assert_eq!(
        lines.next().unwrap().unwrap(),
        StreamFrame::Token { text: "first".into() }
    );
    drop(lines);
    assert!(dropped.load(Ordering::SeqCst));
}

// ---------------------------------------------------------------------------
// Blocking client against a single-shot local HTTP server
// ---------------------------------------------------------------------------

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serves exactly one request with a canned response, on its own thread.
fn spawn_server(response: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut socket, _)) = listener.accept() {
            drain_request(&mut socket);
            let _ = socket.write_all(response.as_bytes());
            let _ = socket.flush();
        }
    });
    format!("http://{addr}")
}

/// Reads the request head and any Content-Length body so the client never
/// sees a reset while it is still writing.
fn drain_request(socket: &mut TcpStream) {
    let mut reader = BufReader::new(&mut *socket);
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        let _ = reader.read_exact(&mut body);
    }
}

fn blocking_client(base_url: &str) -> LisaClient {
    LisaClient::builder()
        .base_url(base_url)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[test]
fn blocking_generate_stream_end_to_end() {
    let body = "b\n\
                data:{\"token\":{\"text\":\"Hi\"}}\n\
                data:{\"token\":{\"text\":\"!\"}}\n\
                data:{\"finishReason\":\"stop\",\"generatedTokens\":2}\n";
    let base_url = spawn_server(http_response("200 OK", body));
    let client = blocking_client(&base_url);

    let frames = client
        .generate_stream("Say hi", &test_model())
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(
        frames,
        vec![
            StreamFrame::Token { text: "Hi".into() },
            StreamFrame::Token { text: "!".into() },
            StreamFrame::Finish {
                finish_reason: "stop".into(),
                generated_tokens: 2
            },
        ]
    );
}

#[test]
fn blocking_generate_stream_maps_non_success_status() {
    let base_url = spawn_server(http_response(
        "404 Not Found",
        r#"{"message":"model not found"}"#,
    ));
    let client = blocking_client(&base_url);

    let err = client
        .generate_stream("Say hi", &test_model())
        .err()
        .expect("status failure must abort before any frame is decoded");
    assert!(
        matches!(&err, Error::NotFound(m) if m == "model not found"),
        "got {err:?}"
    );
}

#[test]
fn blocking_generate_returns_the_complete_response() {
    let base_url = spawn_server(http_response(
        "200 OK",
        r#"{"generatedText":"Hello there","generatedTokens":3,"finishReason":"stop"}"#,
    ));
    let client = blocking_client(&base_url);

    let response = client.generate("Say hello", &test_model()).unwrap();
    assert_eq!(response.generated_text, "Hello there");
    assert_eq!(response.generated_tokens, 3);
    assert_eq!(response.finish_reason, "stop");
}

#[test]
fn blocking_embed_returns_vectors() {
    let base_url = spawn_server(http_response("200 OK", r#"{"embeddings":[[0.5,0.25]]}"#));
    let client = blocking_client(&base_url);

    let embeddings = client.embed("one text", &test_model()).unwrap();
    assert_eq!(embeddings, vec![vec![0.5, 0.25]]);
}
