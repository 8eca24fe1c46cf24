use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Title bar
pub struct Header<'a> {
    title: &'a str,
}

impl<'a> Header<'a> {
    pub fn new(title: &'a str) -> Self {
        Self { title }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::raw(" 🐝 "),
            Span::styled(self.title, Style::default().add_modifier(Modifier::BOLD)),
        ]);
        Paragraph::new(line)
            .style(Style::default().fg(Color::Black).bg(Color::Yellow))
            .render(area, buf);
    }
}
