use crate::client::HttpTransport;
use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::events::Conversation;
use crate::streaming::StreamConsumer;
use crate::ui::composer::{Composer, ComposerResult};
use crate::ui::header::Header;
use crate::ui::history::ConversationView;
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::sync::watch;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Open the terminal chat and run until the user quits
pub async fn run(config: Config) -> Result<()> {
    let transport = HttpTransport::new(&config.base_url).context("Failed to create HTTP client")?;
    let store = Arc::new(ConversationStore::new());
    let consumer = StreamConsumer::new(store, Arc::new(transport));
    tracing::info!("chatting with {}", config.base_url);

    let mut guard = TerminalGuard::new(setup_terminal()?, restore_terminal);
    let result = App::new(&config, consumer).run(&mut guard.terminal).await;
    guard.restore()?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Owns the terminal while the UI runs and hands it back to the shell on
/// drop, including when the UI panics.
struct TerminalGuard<B: Backend> {
    terminal: Terminal<B>,
    on_exit: fn(&mut Terminal<B>) -> Result<()>,
    active: bool,
}

impl<B: Backend> TerminalGuard<B> {
    fn new(terminal: Terminal<B>, on_exit: fn(&mut Terminal<B>) -> Result<()>) -> Self {
        Self {
            terminal,
            on_exit,
            active: true,
        }
    }

    fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        (self.on_exit)(&mut self.terminal)
    }
}

impl<B: Backend> Drop for TerminalGuard<B> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Terminal front end over the conversation store
struct App {
    title: String,
    consumer: StreamConsumer,
    composer: Composer,
    updates: watch::Receiver<Conversation>,
    conversation: Conversation,
    should_quit: bool,
}

impl App {
    fn new(config: &Config, consumer: StreamConsumer) -> Self {
        let updates = consumer.store().subscribe();
        let conversation = updates.borrow().clone();
        Self {
            title: config.ui.title.clone(),
            composer: Composer::new(config.ui.placeholder.clone()),
            consumer,
            updates,
            conversation,
            should_quit: false,
        }
    }

    /// Redraw on every key press and every published revision
    async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut events = EventStream::new();

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) => self.handle_key(key),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                    None => break,
                },
                changed = self.updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.conversation = self.updates.borrow_and_update().clone();
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(query) => {
                // Sessions run detached; each fills its own placeholder
                self.consumer.spawn_send(query);
            }
            ComposerResult::Quit => self.should_quit = true,
            ComposerResult::None => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(3),    // Conversation
                Constraint::Length(3), // Composer
            ])
            .split(frame.size());

        frame.render_widget(Header::new(&self.title), chunks[0]);
        frame.render_widget(ConversationView::new(&self.conversation), chunks[1]);
        frame.render_widget(&self.composer, chunks[2]);
    }
}
