//! # FormPanel Component
//!
//! Renders the focused form of the active page and routes keystrokes into the
//! [`FormBinder`].
//!
//! ## Layout
//!
//! ```text
//! ╭ Forms (Ctrl+N/P) ───────────────────────╮
//! │ Join │ Chat                              │
//! │ Name   : Alice                           │
//! │ Color  : #112233 ██                      │
//! ╰──────────────────────────────────────────╯
//! ```
//!
//! The first inner row lists every form with the focused one highlighted.
//! One row per field follows. Long values show their tail so the cursor stays
//! visible; embedded newlines are drawn as `↵`.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph, Tabs};
use unicode_width::UnicodeWidthStr;

use crate::core::forms::{FieldKind, FieldValue, FormBinder, FormSubmission};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::parse_color;
use crate::tui::event::TuiEvent;

/// Borders plus the tab row.
const VERTICAL_OVERHEAD: u16 = 3;
const SWATCH: &str = " ██";

/// Height needed to show the focused form.
pub fn panel_height(binder: &FormBinder) -> u16 {
    let fields = binder.focused().map_or(0, |f| f.spec.fields.len()) as u16;
    fields.max(1) + VERTICAL_OVERHEAD
}

pub struct FormPanel<'a> {
    pub binder: &'a FormBinder,
    /// Whether keystrokes currently go to the form (no overlay on top).
    pub active: bool,
}

impl<'a> FormPanel<'a> {
    pub fn new(binder: &'a FormBinder, active: bool) -> Self {
        Self { binder, active }
    }
}

/// Keep the end of `text` that fits in `width` columns.
fn tail_fit(text: &str, width: usize) -> String {
    let flat = text.replace('\n', "↵");
    if flat.width() <= width {
        return flat;
    }
    let mut kept: Vec<char> = Vec::new();
    let mut used = 0;
    for c in flat.chars().rev() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        kept.push(c);
    }
    kept.iter().rev().collect()
}

impl<'a> Component for FormPanel<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Forms (Ctrl+N/P)");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(form) = self.binder.focused() else {
            frame.render_widget(Paragraph::new("No forms on this page"), inner);
            return;
        };

        let [tabs_area, fields_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

        let titles: Vec<&str> = self.binder.forms().iter().map(|f| f.spec.title).collect();
        let tabs = Tabs::new(titles)
            .select(self.binder.focused_form_index())
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, tabs_area);

        let label_width = form
            .spec
            .fields
            .iter()
            .map(|f| f.label.width())
            .max()
            .unwrap_or(0);

        let mut lines = Vec::with_capacity(form.spec.fields.len());
        let mut cursor = None;
        for (idx, field) in form.spec.fields.iter().enumerate() {
            let focused = idx == self.binder.focused_field();
            let label_style = if focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            let prefix = format!("{:<label_width$}", field.label);
            let mut spans = vec![Span::styled(prefix, label_style), Span::raw(" : ")];
            let prefix_width = (label_width + 3) as u16;

            match form.value(idx) {
                Some(FieldValue::Bool(checked)) => {
                    spans.push(Span::raw(if *checked { "[x]" } else { "[ ]" }));
                }
                Some(FieldValue::Text(text)) => {
                    let reserve = if field.kind == FieldKind::Color { SWATCH.width() } else { 0 };
                    let avail = (fields_area.width.saturating_sub(prefix_width) as usize)
                        .saturating_sub(reserve + 1);
                    let shown = tail_fit(text, avail);
                    if focused {
                        cursor = Some((
                            fields_area.x + prefix_width + shown.width() as u16,
                            fields_area.y + idx as u16,
                        ));
                    }
                    let style = match field.kind {
                        FieldKind::Json => Style::default().fg(Color::Cyan),
                        _ => Style::default(),
                    };
                    spans.push(Span::styled(shown, style));
                    if field.kind == FieldKind::Color
                        && let Some(color) = parse_color(text)
                    {
                        spans.push(Span::styled(SWATCH, Style::default().fg(color)));
                    }
                }
                None => {}
            }
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(lines), fields_area);

        if self.active
            && let Some((x, y)) = cursor
            && y < fields_area.bottom()
        {
            frame.set_cursor_position((x.min(fields_area.right().saturating_sub(1)), y));
        }
    }
}

/// Routes editing keys to the focused field; emits a submission on Enter.
impl EventHandler for FormBinder {
    type Event = FormSubmission;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(' ') if self.toggle_focused() => None,
            TuiEvent::InputChar(c) => {
                if let Some(text) = self.focused_text_mut() {
                    text.push(*c);
                }
                None
            }
            TuiEvent::Paste(pasted) => {
                if let Some(text) = self.focused_text_mut() {
                    text.push_str(pasted);
                }
                None
            }
            TuiEvent::Backspace => {
                if let Some(text) = self.focused_text_mut() {
                    text.pop();
                }
                None
            }
            TuiEvent::NextField => {
                self.next_field();
                None
            }
            TuiEvent::PrevField => {
                self.prev_field();
                None
            }
            TuiEvent::NextForm => {
                self.next_form();
                None
            }
            TuiEvent::PrevForm => {
                self.prev_form();
                None
            }
            TuiEvent::Submit => self.submit_focused(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forms::{FieldSpec, FormSpec};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn binder() -> FormBinder {
        FormBinder::new(vec![
            FormSpec::new(
                "user-form",
                "Join",
                vec![
                    FieldSpec::text("username", "Name"),
                    FieldSpec::color("user-color", "Color").with_default("#112233"),
                ],
            ),
            FormSpec::new(
                "context-form",
                "Context",
                vec![
                    FieldSpec::text("message", "Message").clearing(),
                    FieldSpec::checkbox("silent", "Silent", false),
                ],
            ),
        ])
    }

    fn type_text(binder: &mut FormBinder, text: &str) {
        for c in text.chars() {
            binder.handle_event(&TuiEvent::InputChar(c));
        }
    }

    #[test]
    fn test_typing_and_submit() {
        let mut binder = binder();
        type_text(&mut binder, "Alicee");
        binder.handle_event(&TuiEvent::Backspace);
        let submission = binder.handle_event(&TuiEvent::Submit).unwrap();
        assert_eq!(submission.form, "user-form");
        assert_eq!(submission.values.text("username"), "Alice");
        assert_eq!(submission.values.text("user-color"), "#112233");
    }

    #[test]
    fn test_space_toggles_checkbox_but_types_in_text() {
        let mut binder = binder();
        binder.handle_event(&TuiEvent::NextForm);
        type_text(&mut binder, "a b");
        binder.handle_event(&TuiEvent::NextField);
        binder.handle_event(&TuiEvent::InputChar(' '));

        let submission = binder.handle_event(&TuiEvent::Submit).unwrap();
        assert_eq!(submission.values.text("message"), "a b");
        assert!(submission.values.flag("silent"));
        // The message field clears after submit.
        assert_eq!(binder.focused().unwrap().value(0), Some(&FieldValue::Text(String::new())));
    }

    #[test]
    fn test_paste_appends() {
        let mut binder = binder();
        binder.handle_event(&TuiEvent::Paste("Bob".into()));
        let submission = binder.handle_event(&TuiEvent::Submit).unwrap();
        assert_eq!(submission.values.text("username"), "Bob");
    }

    #[test]
    fn test_tail_fit_keeps_end() {
        assert_eq!(tail_fit("abcdef", 3), "def");
        assert_eq!(tail_fit("a\nb", 10), "a↵b");
        assert_eq!(tail_fit("abc", 10), "abc");
    }

    #[test]
    fn test_panel_height_follows_focused_form() {
        let binder = binder();
        assert_eq!(panel_height(&binder), 2 + VERTICAL_OVERHEAD);
        assert_eq!(panel_height(&FormBinder::default()), 1 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn test_render_shows_tabs_fields_and_swatch() {
        let binder = binder();
        let mut terminal = Terminal::new(TestBackend::new(50, 6)).unwrap();
        terminal
            .draw(|f| {
                FormPanel::new(&binder, true).render(f, f.area());
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Forms (Ctrl+N/P)"));
        assert!(text.contains("Join"));
        assert!(text.contains("Context"));
        assert!(text.contains("Name  : "));
        assert!(text.contains("Color : #112233 ██"));
    }
}
