use std::str::FromStr;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Widget, Wrap};

use crate::core::chat::ChatMessage;
use crate::tui::component::Component;

const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// A stateless component that renders one chat row: `HH:MM:SS <author> text`,
/// with the author in the row's CSS color.
///
/// # Height Calculation
///
/// [`calculate_height`](Self::calculate_height) predicts the rendered height
/// with `textwrap`, using options that match Ratatui's `Paragraph` wrapping,
/// so the parent `MessageList` can lay out the scroll canvas without
/// rendering every row.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a ChatMessage,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a ChatMessage) -> Self {
        Self { message }
    }

    fn plain_text(message: &ChatMessage) -> String {
        format!(
            "{} <{}> {}",
            message.timestamp.format(TIMESTAMP_FORMAT),
            message.author,
            message.text
        )
    }

    /// Calculate the height required for this row given a width.
    pub fn calculate_height(message: &ChatMessage, width: u16) -> u16 {
        if width == 0 {
            return 1;
        }
        let options = textwrap::Options::new(width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);
        let plain = Self::plain_text(message);
        let lines = textwrap::wrap(&plain, options);
        (lines.len() as u16).max(1)
    }

    fn author_style(&self) -> Style {
        let style = Style::default().add_modifier(Modifier::BOLD);
        match parse_color(&self.message.color) {
            Some(color) => style.fg(color),
            None => style,
        }
    }
}

impl<'a> Widget for Message<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let mut text_lines = self.message.text.split('\n');
        let first = text_lines.next().unwrap_or_default();

        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("{} ", self.message.timestamp.format(TIMESTAMP_FORMAT)),
                Style::default().add_modifier(Modifier::DIM),
            ),
            Span::styled(format!("<{}>", self.message.author), self.author_style()),
            Span::raw(format!(" {first}")),
        ])];
        lines.extend(text_lines.map(|l| Line::raw(l.to_string())));

        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

impl<'a> Component for Message<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

/// CSS named colors ratatui does not know by name.
const CSS_NAMES: &[(&str, (u8, u8, u8))] = &[
    ("orange", (0xff, 0xa5, 0x00)),
    ("purple", (0x80, 0x00, 0x80)),
    ("pink", (0xff, 0xc0, 0xcb)),
    ("brown", (0xa5, 0x2a, 0x2a)),
    ("navy", (0x00, 0x00, 0x80)),
    ("teal", (0x00, 0x80, 0x80)),
    ("lime", (0x00, 0xff, 0x00)),
    ("olive", (0x80, 0x80, 0x00)),
    ("maroon", (0x80, 0x00, 0x00)),
    ("silver", (0xc0, 0xc0, 0xc0)),
    ("gold", (0xff, 0xd7, 0x00)),
    ("violet", (0xee, 0x82, 0xee)),
    ("indigo", (0x4b, 0x00, 0x82)),
];

/// Parse a CSS color string. `None` means "terminal default".
///
/// Accepts `#rrggbb`, `#rgb`, `rgb(r, g, b)`, ratatui's color names and a
/// handful of extra CSS names.
pub fn parse_color(css: &str) -> Option<Color> {
    let value = css.trim().to_ascii_lowercase();
    if value.is_empty() || value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    if let Some(hex) = value.strip_prefix('#')
        && hex.len() == 3
        && hex.chars().all(|c| c.is_ascii_hexdigit())
    {
        let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
        return Color::from_str(&format!("#{expanded}")).ok();
    }

    if let Some(args) = value.strip_prefix("rgb(").and_then(|v| v.strip_suffix(')')) {
        let parts: Vec<u8> = args
            .split(',')
            .filter_map(|p| p.trim().parse().ok())
            .collect();
        return match parts[..] {
            [r, g, b] => Some(Color::Rgb(r, g, b)),
            _ => None,
        };
    }

    if let Some((_, (r, g, b))) = CSS_NAMES.iter().find(|(name, _)| *name == value) {
        return Some(Color::Rgb(*r, *g, *b));
    }

    Color::from_str(&value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::ChatLog;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn row(author: &str, color: &str, text: &str) -> ChatMessage {
        let mut log = ChatLog::new();
        log.append(author, color, text).clone()
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#112233"), Some(Color::Rgb(0x11, 0x22, 0x33)));
        assert_eq!(parse_color("#f00"), Some(Color::Rgb(0xff, 0, 0)));
        assert_eq!(parse_color(" #FF0000 "), Some(Color::Rgb(0xff, 0, 0)));
    }

    #[test]
    fn test_parse_named_and_rgb_colors() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("Orange"), Some(Color::Rgb(0xff, 0xa5, 0x00)));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Color::Rgb(1, 2, 3)));
    }

    #[test]
    fn test_unparseable_colors_fall_back() {
        assert_eq!(parse_color(""), None);
        assert_eq!(parse_color("not-a-color"), None);
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("12"), None);
        assert_eq!(parse_color("rgb(1, 2)"), None);
    }

    #[test]
    fn calculate_height_single_line_fits() {
        let message = row("Bob", "#445566", "hi");
        assert_eq!(Message::calculate_height(&message, 80), 1);
    }

    #[test]
    fn calculate_height_counts_embedded_newlines() {
        let message = row("System", "#ff0000", "Action received: jump\n{}");
        assert_eq!(Message::calculate_height(&message, 80), 2);
    }

    #[test]
    fn calculate_height_wraps_long_text() {
        // "HH:MM:SS <Bob> " is 15 columns; 30 more characters overflow width 40.
        let message = row("Bob", "#445566", &"word ".repeat(6));
        assert_eq!(Message::calculate_height(&message, 40), 2);
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        let message = row("Bob", "#445566", "hi");
        assert_eq!(Message::calculate_height(&message, 0), 1);
    }

    #[test]
    fn test_render_colors_author() {
        let message = row("Bob", "#445566", "hi");
        let backend = TestBackend::new(40, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                f.render_widget(Message::new(&message), area);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("<Bob> hi"));
        // Column 9 is the '<' after "HH:MM:SS ".
        assert_eq!(buffer[(9, 0)].fg, Color::Rgb(0x44, 0x55, 0x66));
    }
}
