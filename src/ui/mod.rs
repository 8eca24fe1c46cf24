//! Terminal chat interface

pub mod app;
pub mod composer;
pub mod header;
pub mod history;
pub mod markdown;

pub use app::run;
pub use composer::{Composer, ComposerResult};
pub use header::Header;
pub use history::ConversationView;
