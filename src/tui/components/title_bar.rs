//! # TitleBar Component
//!
//! Top status bar showing which demo is running and how the connection is doing.
//!
//! ## Responsibilities
//!
//! - Display the page title and connection phase
//! - Display the status message from the last update
//! - Show how many invocation prompts wait for the operator
//! - Show "↓ New" when there are rows below the scroll position
//!
//! TitleBar is purely presentational: everything arrives as props and it keeps
//! no state between frames.
//!
//! ## Conditional Formatting
//!
//! Segments are joined with `" | "`, most important first, so narrow terminals
//! still show the title and phase:
//!
//! `"Chat room [connected] | Submitted chat-form | 1 prompt | ↓ New"`

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::core::session::Phase;
use crate::tui::component::Component;

pub struct TitleBar {
    pub title: &'static str,
    pub phase: Phase,
    pub status_message: String,
    pub pending_prompts: usize,
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(title: &'static str, phase: Phase, status_message: String) -> Self {
        Self {
            title,
            phase,
            status_message,
            pending_prompts: 0,
            has_unseen_content: false,
        }
    }

    fn phase_color(&self) -> Color {
        match self.phase {
            Phase::Connected => Color::Green,
            Phase::Connecting => Color::Yellow,
            Phase::Disconnected => Color::DarkGray,
        }
    }

    fn tail(&self) -> String {
        let mut segments = Vec::new();
        if !self.status_message.is_empty() {
            segments.push(self.status_message.clone());
        }
        match self.pending_prompts {
            0 => {}
            1 => segments.push("1 prompt".to_string()),
            n => segments.push(format!("{n} prompts")),
        }
        if self.has_unseen_content {
            segments.push("↓ New".to_string());
        }
        segments
            .iter()
            .map(|s| format!(" | {s}"))
            .collect()
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::raw(format!("{} ", self.title)),
            Span::styled(
                format!("[{}]", self.phase.label()),
                Style::default().fg(self.phase_color()),
            ),
            Span::raw(self.tail()),
        ]);
        frame.render_widget(line, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(title_bar: &mut TitleBar) -> String {
        let backend = TestBackend::new(100, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_title_bar_with_everything() {
        let mut title_bar =
            TitleBar::new("Chat room", Phase::Connected, "Submitted chat-form".to_string());
        title_bar.pending_prompts = 2;
        title_bar.has_unseen_content = true;

        let text = rendered(&mut title_bar);
        assert!(text.contains("Chat room [connected]"));
        assert!(text.contains("| Submitted chat-form"));
        assert!(text.contains("| 2 prompts"));
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_minimal() {
        let mut title_bar = TitleBar::new("API tester", Phase::Disconnected, String::new());
        let text = rendered(&mut title_bar);
        assert!(text.contains("API tester [disconnected]"));
        assert!(!text.contains('|'));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_single_prompt_is_singular() {
        let mut title_bar = TitleBar::new("API tester", Phase::Connected, String::new());
        title_bar.pending_prompts = 1;
        assert!(rendered(&mut title_bar).contains("| 1 prompt "));
    }
}
