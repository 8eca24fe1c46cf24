//! End-to-end tests for the stream consumer over real HTTP.
//! Each test runs a one-shot HTTP/1.1 server on a local port that answers
//! with a hand-written chunked body (no mocks).

use beehive_chat::{
    ConversationStore, HttpTransport, Message, StreamConsumer, STREAM_ERROR_TEXT,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const CHUNKED_HEAD: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Transfer-Encoding: chunked\r\n\
Connection: close\r\n\r\n";

/// What the test server sends back
struct Reply {
    head: &'static str,
    chunks: Vec<Vec<u8>>,
    /// Send the terminating zero-length chunk
    complete: bool,
}

impl Reply {
    fn chunked(chunks: &[&[u8]]) -> Self {
        Self {
            head: CHUNKED_HEAD,
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            complete: true,
        }
    }
}

/// Read one request; returns its head and body as text
async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= head_end + 4 + content_length {
                return text;
            }
        }
    }
}

async fn spawn_server(reply: Reply) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        socket.write_all(reply.head.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        for chunk in &reply.chunks {
            let mut frame = format!("{:x}\r\n", chunk.len()).into_bytes();
            frame.extend_from_slice(chunk);
            frame.extend_from_slice(b"\r\n");
            socket.write_all(&frame).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if reply.complete {
            socket.write_all(b"0\r\n\r\n").await.unwrap();
            socket.flush().await.unwrap();
        }
        request
    });

    (base_url, handle)
}

fn consumer(base_url: &str) -> StreamConsumer {
    let transport = HttpTransport::new(base_url).expect("client builds");
    StreamConsumer::new(Arc::new(ConversationStore::new()), Arc::new(transport))
}

#[tokio::test]
async fn streams_answer_into_placeholder() {
    let (base_url, server) =
        spawn_server(Reply::chunked(&[b"Hel".as_slice(), b"lo wor".as_slice(), b"ld".as_slice()])).await;
    let consumer = consumer(&base_url);

    consumer.send("hello").await;

    assert_eq!(
        consumer.store().snapshot().messages,
        vec![Message::user("hello"), Message::assistant("Hello world")]
    );

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /ask HTTP/1.1\r\n"));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(request.ends_with(r#"{"query":"hello"}"#));
}

#[tokio::test]
async fn character_split_between_http_chunks() {
    let bee = "🐝".as_bytes();
    let (base_url, _server) = spawn_server(Reply::chunked(&[
        b"Honey ".as_slice(),
        &bee[..2],
        &bee[2..],
        b" bees".as_slice(),
    ]))
    .await;
    let consumer = consumer(&base_url);

    consumer.send("bees?").await;

    assert_eq!(
        consumer.store().snapshot().last(),
        Some(&Message::assistant("Honey 🐝 bees"))
    );
}

#[tokio::test]
async fn dropped_connection_keeps_partial_answer() {
    let (base_url, server) = spawn_server(Reply {
        head: CHUNKED_HEAD,
        chunks: vec![b"partial".to_vec()],
        complete: false,
    })
    .await;
    let consumer = consumer(&base_url);

    let session = consumer.spawn_send("q");
    let mut updates = consumer.store().subscribe();
    updates
        .wait_for(|c| c.messages.get(1).is_some_and(|m| m.text == "partial"))
        .await
        .unwrap();
    // closing the socket mid-body ends the stream with an error
    server.await.unwrap();
    session.await.unwrap();

    let messages = consumer.store().snapshot().messages;
    assert_eq!(
        messages[1..],
        [
            Message::assistant("partial"),
            Message::assistant(STREAM_ERROR_TEXT)
        ]
    );
}

#[tokio::test]
async fn no_content_reply_counts_as_missing_body() {
    let (base_url, _server) = spawn_server(Reply {
        head: "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n",
        chunks: Vec::new(),
        complete: false,
    })
    .await;
    let consumer = consumer(&base_url);

    consumer.send("q").await;

    assert_eq!(
        consumer.store().snapshot().messages,
        vec![
            Message::user("q"),
            Message::assistant(""),
            Message::assistant(STREAM_ERROR_TEXT),
        ]
    );
}

#[tokio::test]
async fn unreachable_service_reports_notice() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let consumer = consumer(&base_url);

    consumer.send("anyone there?").await;

    let messages = consumer.store().snapshot().messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], Message::assistant(""));
    assert_eq!(messages[2], Message::assistant(STREAM_ERROR_TEXT));
}

#[tokio::test]
async fn error_status_body_is_streamed_as_text() {
    let (base_url, _server) = spawn_server(Reply {
        head: "HTTP/1.1 500 Internal Server Error\r\n\
Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
        chunks: vec![b"Internal Server Error".to_vec()],
        complete: true,
    })
    .await;
    let consumer = consumer(&base_url);

    consumer.send("q").await;

    assert_eq!(
        consumer.store().snapshot().last(),
        Some(&Message::assistant("Internal Server Error"))
    );
}

#[tokio::test]
async fn trailing_slash_in_base_url() {
    let (base_url, server) = spawn_server(Reply::chunked(&[b"ok".as_slice()])).await;
    let consumer = consumer(&format!("{}/", base_url));

    consumer.send("q").await;

    assert_eq!(consumer.store().snapshot().messages[1].text, "ok");
    assert!(server.await.unwrap().starts_with("POST /ask "));
}

#[tokio::test]
async fn two_sends_in_a_row() {
    let (first_url, _first) = spawn_server(Reply::chunked(&[b"one".as_slice()])).await;
    let (second_url, _second) = spawn_server(Reply::chunked(&[b"two".as_slice()])).await;
    let store = Arc::new(ConversationStore::new());
    let first = StreamConsumer::new(store.clone(), Arc::new(HttpTransport::new(&first_url).unwrap()));
    let second = StreamConsumer::new(store.clone(), Arc::new(HttpTransport::new(&second_url).unwrap()));

    first.send("first").await;
    second.send("second").await;

    assert_eq!(
        store.snapshot().messages,
        vec![
            Message::user("first"),
            Message::assistant("one"),
            Message::user("second"),
            Message::assistant("two"),
        ]
    );
}
