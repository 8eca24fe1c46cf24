use crate::client::HttpTransport;
use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::events::Conversation;
use crate::streaming::StreamConsumer;
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;

/// Ask a single question and print the answer as it streams in
pub async fn ask(config: &Config, query: &str, transcript: bool) -> Result<()> {
    if query.trim().is_empty() {
        println!("Nothing to ask.");
        return Ok(());
    }

    let transport = HttpTransport::new(&config.base_url).context("Failed to create HTTP client")?;
    let store = Arc::new(ConversationStore::new());
    let consumer = StreamConsumer::new(store.clone(), Arc::new(transport));

    let mut updates = store.subscribe();
    let mut session = consumer.spawn_send(query);
    let mut printer = AnswerPrinter::default();
    let mut stdout = io::stdout();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let conversation = updates.borrow_and_update().clone();
                printer.write_update(&conversation, &mut stdout)?;
            }
            joined = &mut session => {
                joined.context("Stream session panicked")?;
                break;
            }
        }
    }

    printer.write_update(&store.snapshot(), &mut stdout)?;
    writeln!(stdout)?;

    if let Some(notice) = printer.notice {
        eprintln!("{}", notice);
    }

    if transcript {
        let json = serde_json::to_string_pretty(&store.snapshot())
            .context("Failed to serialize conversation")?;
        println!("{}", json);
    }

    Ok(())
}

/// Prints only the part of the answer that has not been printed yet
#[derive(Debug, Default)]
struct AnswerPrinter {
    printed: usize,
    notice: Option<String>,
}

impl AnswerPrinter {
    // The conversation holds exactly one query: [user, answer, optional notice]
    const ANSWER: usize = 1;
    const NOTICE: usize = 2;

    fn write_update(&mut self, conversation: &Conversation, out: &mut impl Write) -> io::Result<()> {
        if let Some(answer) = conversation.messages.get(Self::ANSWER) {
            if let Some(fresh) = answer.text.get(self.printed..) {
                if !fresh.is_empty() {
                    out.write_all(fresh.as_bytes())?;
                    out.flush()?;
                    self.printed = answer.text.len();
                }
            }
        }
        if let Some(notice) = conversation.messages.get(Self::NOTICE) {
            self.notice = Some(notice.text.clone());
        }
        Ok(())
    }
}
