//! Error types for the streaming core

use thiserror::Error;

/// Failures of the streaming UTF-8 decoder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A byte sequence that can never become valid UTF-8
    #[error("invalid UTF-8 sequence at byte {offset}")]
    Malformed { offset: usize },

    /// The stream ended in the middle of a multi-byte character
    #[error("stream ended inside a multi-byte character ({pending} bytes pending)")]
    Truncated { pending: usize },
}

/// Everything that can end a stream session early.
///
/// All variants surface to the user as the same notice; the detail only
/// reaches the logs.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The response arrived without a body to read
    #[error("response has no readable body")]
    NoBody,

    /// HTTP request or body read failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection-level failure outside of reqwest
    #[error("transport error: {0}")]
    Transport(String),

    /// Body bytes are not valid UTF-8
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl StreamError {
    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            StreamError::NoBody => "stream_open",
            StreamError::Http(_) | StreamError::Transport(_) => "transport",
            StreamError::Decode(_) => "decode",
        }
    }
}
