use crate::client::AskTransport;
use crate::conversation::ConversationStore;
use crate::decode::Utf8StreamDecoder;
use crate::error::StreamError;
use crate::events::MessageHandle;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Notice appended when a stream session fails for any reason
pub const STREAM_ERROR_TEXT: &str = "⚠️ Error streaming response";

/// Sends queries and feeds the streamed answers into the conversation store
#[derive(Clone)]
pub struct StreamConsumer {
    store: Arc<ConversationStore>,
    transport: Arc<dyn AskTransport>,
}

impl StreamConsumer {
    pub fn new(store: Arc<ConversationStore>, transport: Arc<dyn AskTransport>) -> Self {
        Self { store, transport }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Run one query to completion.
    ///
    /// Never fails: every outcome is reported through the store. Blank
    /// queries are ignored without touching the network.
    pub async fn send(&self, query: &str) {
        if self.store.append_user(query).is_none() {
            tracing::debug!("ignoring blank query");
            return;
        }
        let placeholder = self.store.append_assistant_placeholder();

        let session = StreamSession::new(placeholder);
        match session.run(&self.store, self.transport.as_ref(), query).await {
            Ok(answer) => {
                tracing::debug!(
                    slot = placeholder.index(),
                    bytes = answer.len(),
                    "stream complete"
                );
            }
            Err(e) => {
                tracing::warn!(
                    slot = placeholder.index(),
                    kind = e.kind(),
                    "stream failed: {}",
                    e
                );
                self.store.append_assistant_error(STREAM_ERROR_TEXT);
            }
        }
    }

    /// Start a query in the background.
    ///
    /// Sessions are independent: a new query does not wait for, or cancel,
    /// one that is still streaming.
    pub fn spawn_send(&self, query: impl Into<String>) -> JoinHandle<()> {
        let consumer = self.clone();
        let query = query.into();
        tokio::spawn(async move { consumer.send(&query).await })
    }
}

/// State of one request, alive from placeholder to completion or failure
struct StreamSession {
    target: MessageHandle,
    buffer: String,
    decoder: Utf8StreamDecoder,
}

impl StreamSession {
    fn new(target: MessageHandle) -> Self {
        Self {
            target,
            buffer: String::new(),
            decoder: Utf8StreamDecoder::new(),
        }
    }

    /// Read the body in arrival order, republishing the whole answer so far
    /// after every chunk that completes at least one character.
    async fn run(
        mut self,
        store: &ConversationStore,
        transport: &dyn AskTransport,
        query: &str,
    ) -> Result<String, StreamError> {
        let mut body = transport.open(query).await?.ok_or(StreamError::NoBody)?;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            let text = self.decoder.decode(&chunk)?;
            if text.is_empty() {
                continue;
            }
            self.buffer.push_str(&text);
            store.update_message_at(self.target, &self.buffer);
        }

        self.decoder.finish()?;
        Ok(self.buffer)
    }
}
