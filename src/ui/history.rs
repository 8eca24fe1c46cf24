//! Conversation display component

use crate::events::{Conversation, Message, Sender};
use crate::ui::markdown::render_markdown;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Share of the width a single message may use
const BUBBLE_WIDTH_PERCENT: usize = 70;

/// Renders the conversation, newest messages anchored to the bottom.
///
/// User text is right-aligned and shown as typed. Assistant text is
/// left-aligned and rendered as markdown as it arrives.
pub struct ConversationView<'a> {
    conversation: &'a Conversation,
}

impl<'a> ConversationView<'a> {
    pub fn new(conversation: &'a Conversation) -> Self {
        Self { conversation }
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let bubble_width = (width as usize * BUBBLE_WIDTH_PERCENT / 100).max(1);
        let mut lines = Vec::new();

        for message in self.conversation.iter() {
            lines.extend(render_message(message, bubble_width));
            // spacing between messages
            lines.push(Line::from(""));
        }
        lines
    }
}

impl Widget for ConversationView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL);
        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.conversation.is_empty() {
            let welcome = vec![
                Line::from(Span::styled(
                    "Welcome! 🐝",
                    Style::default().fg(Color::Yellow),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Type a question below and press Enter.",
                    Style::default().fg(Color::Gray),
                )),
                Line::from(Span::styled(
                    "Esc or Ctrl+C to quit.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            Paragraph::new(welcome).render(inner_area, buf);
            return;
        }

        let lines = self.lines(inner_area.width);
        let height = inner_area.height as usize;
        let offset = lines.len().saturating_sub(height);
        let offset = u16::try_from(offset).unwrap_or(u16::MAX);

        Paragraph::new(lines)
            .scroll((offset, 0))
            .render(inner_area, buf);
    }
}

/// Render one message into aligned lines
fn render_message(message: &Message, width: usize) -> Vec<Line<'static>> {
    let (label, alignment, style) = match message.sender {
        Sender::User => (
            "You",
            Alignment::Right,
            Style::default().fg(Color::White).bg(Color::Green),
        ),
        Sender::Assistant => (
            "🐝 Beehive",
            Alignment::Left,
            Style::default().fg(Color::Yellow),
        ),
    };

    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(alignment)];

    if message.text.is_empty() && message.is_assistant() {
        // placeholder still waiting for the first bytes
        let cursor = Span::styled("▋", Style::default().fg(Color::Yellow));
        lines.push(Line::from(cursor).alignment(alignment));
        return lines;
    }

    match message.sender {
        Sender::User => {
            for content_line in wrap_text(&message.text, width) {
                lines.push(Line::from(Span::styled(content_line, style)).alignment(alignment));
            }
        }
        Sender::Assistant => {
            for line in render_markdown(&message.text, style, width) {
                lines.push(line.alignment(alignment));
            }
        }
    }
    lines
}

/// Wrap text to fit within the given display width, keeping explicit line
/// breaks. Words longer than a line are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap_text("flood risk is rising fast", 10),
            vec!["flood risk", "is rising", "fast"]
        );
    }

    #[test]
    fn wrap_keeps_newlines() {
        assert_eq!(
            wrap_text("# Title\n\n- item", 40),
            vec!["# Title", "", "- item"]
        );
    }

    #[test]
    fn wrap_counts_columns_not_bytes() {
        assert_eq!(wrap_text("été été", 7), vec!["été été"]);
        assert_eq!(wrap_text("🐝🐝🐝", 4), vec!["🐝🐝", "🐝"]);
    }

    #[test]
    fn long_word_is_split_across_lines() {
        assert_eq!(
            wrap_text("a supercalifragilistic b", 5),
            vec!["a", "super", "calif", "ragil", "istic", "b"]
        );
    }

    fn render_to_text(conversation: &Conversation, area: Rect) -> String {
        let mut buf = Buffer::empty(area);
        ConversationView::new(conversation).render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf.get(x, y).symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn assistant_markdown_is_rendered_without_markers() {
        let mut conversation = Conversation::default();
        conversation
            .messages
            .push(Message::assistant("## Risk\n**High** flood risk"));

        let rendered = render_to_text(&conversation, Rect::new(0, 0, 40, 8));
        assert!(rendered.contains("Risk"));
        assert!(rendered.contains("High flood risk"));
        assert!(!rendered.contains("##"));
        assert!(!rendered.contains("**"));
    }

    #[test]
    fn user_text_is_not_treated_as_markdown() {
        let lines = render_message(&Message::user("**bold** please"), 30);
        assert_eq!(lines[1].spans[0].content, "**bold** please");
    }

    #[test]
    fn long_url_is_fully_visible() {
        let mut conversation = Conversation::default();
        conversation.messages.push(Message::assistant(
            "see https://example.org/very/long/path/to/a/report.pdf",
        ));

        let rendered = render_to_text(&conversation, Rect::new(0, 0, 30, 8));
        let visible: String = rendered
            .lines()
            .map(|row| row.trim_matches(|c| c == '│' || c == ' '))
            .collect();
        assert!(visible.contains("https://example.org/very/long/path/to/a/report.pdf"));
    }

    #[test]
    fn user_lines_align_right_and_assistant_left() {
        let user = render_message(&Message::user("hi"), 20);
        assert!(user.iter().all(|l| l.alignment == Some(Alignment::Right)));

        let assistant = render_message(&Message::assistant("hello"), 20);
        assert!(assistant.iter().all(|l| l.alignment == Some(Alignment::Left)));
    }

    #[test]
    fn empty_placeholder_shows_cursor() {
        let lines = render_message(&Message::assistant(""), 20);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].spans[0].content, "▋");
    }

    #[test]
    fn view_anchors_latest_message_to_bottom() {
        let mut conversation = Conversation::default();
        for i in 0..10 {
            conversation.messages.push(Message::user(format!("question {i}")));
            conversation.messages.push(Message::assistant(format!("answer {i}")));
        }

        let rendered = render_to_text(&conversation, Rect::new(0, 0, 40, 8));
        assert!(rendered.contains("answer 9"));
        assert!(!rendered.contains("question 0"));
    }
}
