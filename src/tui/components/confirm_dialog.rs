//! # Confirm Dialog Component
//!
//! Popup for the oldest invocation waiting on the operator (API tester page).
//! Shows the action name, id and parameters; `y` accepts, `n` or Esc declines.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::client::ActionInvocation;
use crate::tui::components::centered_rect;
use crate::tui::event::TuiEvent;

/// `Some(true)` to accept, `Some(false)` to decline.
pub fn confirm_choice(event: &TuiEvent) -> Option<bool> {
    match event {
        TuiEvent::InputChar('y' | 'Y') => Some(true),
        TuiEvent::InputChar('n' | 'N') | TuiEvent::Escape => Some(false),
        _ => None,
    }
}

pub struct ConfirmDialog<'a> {
    pub invocation: &'a ActionInvocation,
    /// Prompts queued behind this one.
    pub waiting: usize,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(invocation: &'a ActionInvocation, waiting: usize) -> Self {
        Self { invocation, waiting }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(60, 50, area);
        frame.render_widget(Clear, overlay);

        let title = if self.waiting > 0 {
            format!(" Invocation ({} more waiting) ", self.waiting)
        } else {
            " Invocation ".to_string()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title)
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(" y Accept  n Decline ").centered())
            .padding(Padding::horizontal(1));

        let params = serde_json::to_string_pretty(&self.invocation.params)
            .unwrap_or_else(|_| self.invocation.params.to_string());

        let mut lines = vec![
            Line::from(vec![
                Span::raw("Execute "),
                Span::styled(
                    self.invocation.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("?"),
            ]),
            Line::styled(
                format!("id: {}", self.invocation.id),
                Style::default().fg(Color::DarkGray),
            ),
            Line::raw(""),
        ];
        lines.extend(params.lines().map(|l| Line::raw(l.to_string())));

        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
            overlay,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::json;

    #[test]
    fn test_confirm_choice_keys() {
        assert_eq!(confirm_choice(&TuiEvent::InputChar('y')), Some(true));
        assert_eq!(confirm_choice(&TuiEvent::InputChar('N')), Some(false));
        assert_eq!(confirm_choice(&TuiEvent::Escape), Some(false));
        assert_eq!(confirm_choice(&TuiEvent::InputChar('x')), None);
        assert_eq!(confirm_choice(&TuiEvent::Submit), None);
    }

    #[test]
    fn test_render_shows_name_id_and_params() {
        let invocation = ActionInvocation {
            id: "abc-1".into(),
            name: "jump".into(),
            params: json!({ "height": 3 }),
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|f| {
                ConfirmDialog::new(&invocation, 2).render(f, f.area());
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Execute jump?"));
        assert!(text.contains("id: abc-1"));
        assert!(text.contains("\"height\": 3"));
        assert!(text.contains("2 more waiting"));
    }
}
