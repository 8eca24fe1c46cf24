use crate::error::StreamError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;

/// Base URL of the question-answering service
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Path of the streaming ask endpoint
pub const ASK_PATH: &str = "/ask";

/// Raw body chunks in arrival order
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StreamError>>;

/// Opens the answer stream for a query.
///
/// `Ok(None)` means the endpoint answered without a readable body.
#[async_trait]
pub trait AskTransport: Send + Sync {
    async fn open(&self, query: &str) -> Result<Option<ByteStream>, StreamError>;
}

/// Body of `POST /ask`
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub query: &'a str,
}

/// HTTP transport for the ask endpoint
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// No request timeout is set: a hung answer only stalls its own session.
    pub fn new(base_url: &str) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: ask_url(base_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AskTransport for HttpTransport {
    async fn open(&self, query: &str) -> Result<Option<ByteStream>, StreamError> {
        tracing::debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&AskRequest { query })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("ask endpoint answered {}", status);

        // Statuses that never carry a body
        if matches!(status.as_u16(), 204 | 205 | 304) {
            return Ok(None);
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from));
        Ok(Some(stream.boxed()))
    }
}

/// Join the base URL and the ask path
pub fn ask_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ASK_PATH)
}
