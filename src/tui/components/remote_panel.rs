//! # Remote Panel Component
//!
//! Overlay for acting as the remote side of a loopback connection.
//! Opened with Ctrl+R, dismissed with Esc.
//!
//! Lists the actions the page has registered. Up/Down picks one, which
//! prefills the parameters with a sample built from its schema; typing edits
//! the parameters, Enter invokes, Ctrl+D closes the connection from the
//! remote side. F5 asks for every action again; F6, F7 and F8 send a
//! graceful shutdown, its cancellation and an immediate shutdown.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `RemotePanelState` lives in `TuiState`
//! - `RemotePanel` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap};

use crate::client::{ActionDescriptor, ShutdownKind, schema};
use crate::tui::components::centered_rect;
use crate::tui::event::TuiEvent;

/// Persistent state for the remote panel overlay.
pub struct RemotePanelState {
    pub actions: Vec<ActionDescriptor>,
    pub selected: usize,
    pub params: String,
    pub list_state: ListState,
}

/// Events emitted by the remote panel.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    Invoke { name: String, params: String },
    Close,
    ReregisterAll,
    Shutdown(ShutdownKind),
    Dismiss,
}

fn sample_params(action: &ActionDescriptor) -> String {
    action
        .schema
        .as_ref()
        .map(|s| schema::sample(s).to_string())
        .unwrap_or_default()
}

impl RemotePanelState {
    pub fn new(actions: &[ActionDescriptor]) -> Self {
        let mut state = Self {
            actions: Vec::new(),
            selected: 0,
            params: String::new(),
            list_state: ListState::default(),
        };
        state.sync(actions);
        state
    }

    /// Follow the registered set, keeping the selection by name when possible.
    pub fn sync(&mut self, actions: &[ActionDescriptor]) {
        if self.actions == actions {
            return;
        }
        let current = self.actions.get(self.selected).map(|a| a.name.clone());
        self.actions = actions.to_vec();
        match current.and_then(|name| self.actions.iter().position(|a| a.name == name)) {
            Some(idx) => self.selected = idx,
            None => self.select(0),
        }
        self.list_state
            .select((!self.actions.is_empty()).then_some(self.selected));
    }

    fn select(&mut self, idx: usize) {
        self.selected = idx;
        self.params = self.actions.get(idx).map(sample_params).unwrap_or_default();
        self.list_state
            .select((!self.actions.is_empty()).then_some(idx));
    }

    pub fn handle_event(&mut self, event: &TuiEvent) -> Option<RemoteEvent> {
        match event {
            TuiEvent::Escape => Some(RemoteEvent::Dismiss),
            TuiEvent::Disconnect => Some(RemoteEvent::Close),
            TuiEvent::Function(5) => Some(RemoteEvent::ReregisterAll),
            TuiEvent::Function(6) => Some(RemoteEvent::Shutdown(ShutdownKind::Graceful {
                wants_shutdown: true,
            })),
            TuiEvent::Function(7) => Some(RemoteEvent::Shutdown(ShutdownKind::Graceful {
                wants_shutdown: false,
            })),
            TuiEvent::Function(8) => Some(RemoteEvent::Shutdown(ShutdownKind::Immediate)),
            TuiEvent::ScrollUp => {
                if !self.actions.is_empty() {
                    self.select(self.selected.saturating_sub(1));
                }
                None
            }
            TuiEvent::ScrollDown => {
                if !self.actions.is_empty() {
                    self.select((self.selected + 1).min(self.actions.len() - 1));
                }
                None
            }
            TuiEvent::InputChar(c) => {
                self.params.push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                self.params.push_str(text);
                None
            }
            TuiEvent::Backspace => {
                self.params.pop();
                None
            }
            TuiEvent::Submit => self.actions.get(self.selected).map(|action| RemoteEvent::Invoke {
                name: action.name.clone(),
                params: self.params.clone(),
            }),
            _ => None,
        }
    }
}

/// Transient render wrapper for the remote panel overlay.
pub struct RemotePanel<'a> {
    state: &'a mut RemotePanelState,
}

impl<'a> RemotePanel<'a> {
    pub fn new(state: &'a mut RemotePanelState) -> Self {
        Self { state }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Remote side ")
            .title_alignment(Alignment::Left)
            .title_bottom(
                Line::from(" ↑↓ Action  Enter Invoke  F5 Reregister  F6/F7/F8 Shutdown  Ctrl+D Close  Esc Back ")
                    .centered(),
            )
            .padding(Padding::horizontal(1));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let [list_area, params_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(4)]).areas(inner);

        if self.state.actions.is_empty() {
            let empty = Paragraph::new("No actions registered.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(empty, list_area);
        } else {
            let items: Vec<ListItem> = self
                .state
                .actions
                .iter()
                .enumerate()
                .map(|(i, action)| {
                    let style = if i == self.state.selected {
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(action.name.clone(), style),
                        Span::styled(
                            format!("  {}", action.description),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();
            frame.render_stateful_widget(List::new(items), list_area, &mut self.state.list_state);
        }

        let params = Paragraph::new(self.state.params.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::TOP).title(" Parameters (JSON) "));
        frame.render_widget(params, params_area);
    }
}
