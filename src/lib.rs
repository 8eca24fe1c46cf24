//! Streaming chat client for a question-answering endpoint.
//!
//! [`StreamConsumer`] sends a query, reads the chunked answer and keeps the
//! matching assistant message in the [`ConversationStore`] up to date.
//! Renderers subscribe to the store and redraw on every revision.

pub mod client;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod decode;
pub mod error;
pub mod events;
pub mod logging;
pub mod streaming;
pub mod ui;

pub use client::{AskTransport, ByteStream, HttpTransport, DEFAULT_BASE_URL};
pub use config::Config;
pub use conversation::ConversationStore;
pub use decode::Utf8StreamDecoder;
pub use error::{DecodeError, StreamError};
pub use events::{Conversation, Message, MessageHandle, Sender};
pub use streaming::{StreamConsumer, STREAM_ERROR_TEXT};
