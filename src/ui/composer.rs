use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Quit,
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position in characters
    pub cursor_position: usize,
}

/// Single-line input for questions
#[derive(Debug, Clone)]
pub struct Composer {
    state: TextAreaState,
    placeholder: String,
}

impl Composer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: placeholder.into(),
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return ComposerResult::Quit;
            }
            KeyCode::Esc => return ComposerResult::Quit,
            KeyCode::Enter => {
                if !self.state.content.trim().is_empty() {
                    let content = std::mem::take(&mut self.state.content);
                    self.state.cursor_position = 0;
                    return ComposerResult::Submitted(content);
                }
            }
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => {
                if self.state.cursor_position > 0 {
                    self.state.cursor_position -= 1;
                    let at = self.byte_offset(self.state.cursor_position);
                    self.state.content.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.state.cursor_position < self.char_count() {
                    let at = self.byte_offset(self.state.cursor_position);
                    self.state.content.remove(at);
                }
            }
            KeyCode::Left => {
                self.state.cursor_position = self.state.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.state.cursor_position < self.char_count() {
                    self.state.cursor_position += 1;
                }
            }
            KeyCode::Home => self.state.cursor_position = 0,
            KeyCode::End => self.state.cursor_position = self.char_count(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Get current content
    pub fn content(&self) -> &str {
        &self.state.content
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.state.cursor_position);
        self.state.content.insert(at, c);
        self.state.cursor_position += 1;
    }

    fn char_count(&self) -> usize {
        self.state.content.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.state
            .content
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.state.content.len())
    }
}

impl Widget for &Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Ask")
            .style(Style::default().fg(Color::Green));

        let line = if self.state.content.is_empty() {
            Line::from(vec![
                Span::styled("▌", Style::default().fg(Color::Green)),
                Span::styled(self.placeholder.as_str(), Style::default().fg(Color::DarkGray)),
            ])
        } else {
            let at = self.byte_offset(self.state.cursor_position);
            let (before, after) = self.state.content.split_at(at);
            Line::from(vec![
                Span::styled(before, Style::default().fg(Color::White)),
                Span::styled("▌", Style::default().fg(Color::Green)),
                Span::styled(after, Style::default().fg(Color::White)),
            ])
        };

        Paragraph::new(line).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(composer: &mut Composer, code: KeyCode) -> ComposerResult {
        composer.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            press(composer, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_and_clears() {
        let mut composer = Composer::new("Ask...");
        type_text(&mut composer, "flood risk?");

        let result = press(&mut composer, KeyCode::Enter);
        assert_eq!(result, ComposerResult::Submitted("flood risk?".into()));
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut composer = Composer::new("Ask...");
        type_text(&mut composer, "   ");
        assert_eq!(press(&mut composer, KeyCode::Enter), ComposerResult::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn editing_handles_multibyte_characters() {
        let mut composer = Composer::new("Ask...");
        type_text(&mut composer, "cafe");
        press(&mut composer, KeyCode::Backspace);
        type_text(&mut composer, "é");
        press(&mut composer, KeyCode::Home);
        type_text(&mut composer, "☕ ");
        press(&mut composer, KeyCode::End);
        press(&mut composer, KeyCode::Left);
        press(&mut composer, KeyCode::Delete);
        assert_eq!(composer.content(), "☕ caf");
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let mut composer = Composer::new("Ask...");
        assert_eq!(press(&mut composer, KeyCode::Esc), ComposerResult::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(composer.handle_key(ctrl_c), ComposerResult::Quit);
        assert_eq!(composer.content(), "");
    }
}
