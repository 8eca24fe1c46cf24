//! Conversation store shared between stream sessions and renderers

use crate::events::{Conversation, Message, MessageHandle};
use tokio::sync::watch;

/// Owns the ordered message list and publishes every change.
///
/// Mutations go through `watch::Sender::send_if_modified`, so each one is
/// applied atomically and subscribers only wake up for real changes.
#[derive(Debug)]
pub struct ConversationStore {
    tx: watch::Sender<Conversation>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Conversation::default());
        Self { tx }
    }

    /// Add a user message. Blank input is ignored.
    pub fn append_user(&self, text: &str) -> Option<MessageHandle> {
        if text.trim().is_empty() {
            return None;
        }
        Some(self.push(Message::user(text)))
    }

    /// Add an empty assistant message that a stream session will fill in
    pub fn append_assistant_placeholder(&self) -> MessageHandle {
        self.push(Message::assistant(String::new()))
    }

    /// Add an assistant message carrying an error notice
    pub fn append_assistant_error(&self, message: &str) -> MessageHandle {
        self.push(Message::assistant(message))
    }

    /// Replace the text of the last message if it belongs to the assistant.
    ///
    /// Addresses the tail, so two open sessions would race on it. Stream
    /// sessions use [`ConversationStore::update_message_at`] instead.
    pub fn update_last_assistant(&self, text: &str) -> bool {
        self.tx.send_if_modified(|conversation| {
            match conversation.messages.last_mut() {
                Some(last) if last.is_assistant() => {
                    last.text.clear();
                    last.text.push_str(text);
                    conversation.revision += 1;
                    true
                }
                _ => false,
            }
        })
    }

    /// Replace the text of the assistant message behind `handle`
    pub fn update_message_at(&self, handle: MessageHandle, text: &str) -> bool {
        self.tx.send_if_modified(|conversation| {
            match conversation.messages.get_mut(handle.0) {
                Some(message) if message.is_assistant() => {
                    message.text.clear();
                    message.text.push_str(text);
                    conversation.revision += 1;
                    true
                }
                _ => false,
            }
        })
    }

    /// Current state of the conversation
    pub fn snapshot(&self) -> Conversation {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.tx.borrow().revision
    }

    /// Receive a notification for every published revision
    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.tx.subscribe()
    }

    fn push(&self, message: Message) -> MessageHandle {
        let mut handle = MessageHandle(0);
        self.tx.send_modify(|conversation| {
            handle = MessageHandle(conversation.messages.len());
            conversation.messages.push(message);
            conversation.revision += 1;
        });
        handle
    }
}
