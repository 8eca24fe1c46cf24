//! Markdown rendering for assistant answers

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Convert markdown into styled lines no wider than `width` columns.
///
/// Answers are rendered while they stream in, so an unclosed `**` shows as
/// text until the rest arrives.
pub fn render_markdown(text: &str, base: Style, width: usize) -> Vec<Line<'static>> {
    let mut out = LineWrapper::new(width);
    let mut styles = vec![base];
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut code_block: Option<String> = None;

    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        let style = *styles.last().unwrap_or(&base);
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    out.finish_line();
                    let heading = match level {
                        HeadingLevel::H1 => Modifier::BOLD | Modifier::UNDERLINED,
                        _ => Modifier::BOLD,
                    };
                    styles.push(style.add_modifier(heading));
                }
                Tag::CodeBlock(kind) => {
                    out.finish_line();
                    if let CodeBlockKind::Fenced(lang) = kind {
                        if !lang.is_empty() {
                            out.push_text(&lang, base.fg(Color::DarkGray));
                            out.finish_line();
                        }
                    }
                    code_block = Some(String::new());
                }
                Tag::List(start) => {
                    out.finish_line();
                    lists.push(start);
                }
                Tag::Item => {
                    out.finish_line();
                    let indent = "  ".repeat(lists.len().saturating_sub(1));
                    let bullet = match lists.last_mut() {
                        Some(Some(n)) => {
                            *n += 1;
                            format!("{}{}. ", indent, *n - 1)
                        }
                        _ => format!("{}• ", indent),
                    };
                    out.push_span(&bullet, base.fg(Color::DarkGray));
                }
                Tag::BlockQuote { .. } => {
                    out.finish_line();
                    styles.push(style.fg(Color::Gray).add_modifier(Modifier::ITALIC));
                }
                Tag::Emphasis => styles.push(style.add_modifier(Modifier::ITALIC)),
                Tag::Strong => styles.push(style.add_modifier(Modifier::BOLD)),
                Tag::Strikethrough => styles.push(style.add_modifier(Modifier::CROSSED_OUT)),
                Tag::Link { .. } => {
                    styles.push(style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED))
                }
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(_) | TagEnd::BlockQuote { .. } => {
                    out.finish_line();
                    styles.pop();
                }
                TagEnd::Paragraph => {
                    out.finish_line();
                    if lists.is_empty() {
                        out.blank_line();
                    }
                }
                TagEnd::CodeBlock => {
                    let code_style = Style::default().fg(Color::Cyan);
                    for code_line in code_block.take().unwrap_or_default().lines() {
                        out.push_span("  ", code_style);
                        out.push_text(code_line, code_style);
                        out.finish_line();
                    }
                    out.blank_line();
                }
                TagEnd::List(_) => {
                    out.finish_line();
                    lists.pop();
                    if lists.is_empty() {
                        out.blank_line();
                    }
                }
                TagEnd::Item => out.finish_line(),
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                    styles.pop();
                }
                _ => {}
            },
            Event::Text(text) => match code_block.as_mut() {
                Some(code) => code.push_str(&text),
                None => out.push_text(&text, style),
            },
            Event::Code(code) => {
                out.push_text(&code, style.fg(Color::Cyan).add_modifier(Modifier::BOLD));
            }
            Event::SoftBreak => out.push_text(" ", style),
            Event::HardBreak => out.finish_line(),
            Event::Rule => {
                out.finish_line();
                out.push_span(&"─".repeat(width.min(40)), base.fg(Color::DarkGray));
                out.finish_line();
            }
            Event::Html(html) | Event::InlineHtml(html) => out.push_text(&html, style),
            _ => {}
        }
    }

    out.into_lines()
}

/// Accumulates styled words into lines of at most `width` display columns.
/// Words wider than a whole line are split across lines.
pub(crate) struct LineWrapper {
    width: usize,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    used: usize,
}

impl LineWrapper {
    pub(crate) fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            lines: Vec::new(),
            spans: Vec::new(),
            used: 0,
        }
    }

    /// Add text that may be broken at spaces
    pub(crate) fn push_text(&mut self, text: &str, style: Style) {
        for word in text.split_inclusive(' ') {
            self.push_word(word, style);
        }
    }

    fn push_word(&mut self, word: &str, style: Style) {
        let visible = word.trim_end_matches(' ');
        if visible.is_empty() && self.used == 0 {
            return;
        }
        if self.used > 0 && self.used + visible.width() > self.width {
            self.break_line();
        }

        if self.used + visible.width() <= self.width {
            if self.used + word.width() <= self.width {
                self.push_span(word, style);
            } else {
                self.push_span(visible, style);
            }
            return;
        }

        let mut piece = String::new();
        let mut piece_width = 0;
        for c in visible.chars() {
            let w = c.width().unwrap_or(0);
            if self.used + piece_width + w > self.width && self.used + piece_width > 0 {
                self.push_span(&std::mem::take(&mut piece), style);
                piece_width = 0;
                self.break_line();
            }
            piece.push(c);
            piece_width += w;
        }
        self.push_span(&piece, style);
        if self.used < self.width && word.len() > visible.len() {
            self.push_span(" ", style);
        }
    }

    /// Add text on the current line without breaking it
    pub(crate) fn push_span(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.used += text.width();
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => self.spans.push(Span::styled(text.to_string(), style)),
        }
    }

    fn break_line(&mut self) {
        if let Some(last) = self.spans.last_mut() {
            let kept = last.content.trim_end_matches(' ').len();
            last.content.to_mut().truncate(kept);
        }
        self.spans.retain(|s| !s.content.is_empty());
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        self.used = 0;
    }

    /// End the current line if it has content
    pub(crate) fn finish_line(&mut self) {
        if !self.spans.is_empty() {
            self.break_line();
        }
    }

    pub(crate) fn blank_line(&mut self) {
        self.finish_line();
        self.lines.push(Line::from(""));
    }

    /// Finished lines, without trailing blanks
    pub(crate) fn into_lines(mut self) -> Vec<Line<'static>> {
        self.finish_line();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}
