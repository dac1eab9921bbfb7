//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! Each turn draws if something changed, waits briefly for terminal input,
//! routes every pending key, then drains client events from the session
//! channel into `Action::Client`. Client events carry no wakeup of their own,
//! so the poll timeout stays short.
//!
//! ## Key Routing
//!
//! In order: Ctrl+C, resize, Ctrl+R, the remote panel (when open), scrolling,
//! the invocation prompt (when one waits), Ctrl+D, then the form binder.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::client::{Connector, LoopbackConnector, RemoteControl};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{MessageListState, RemoteEvent, RemotePanelState, confirm_choice};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    /// Remote side overlay (None = hidden)
    pub remote: Option<RemotePanelState>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            remote: None,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Tab and Ctrl+J arrive unambiguously;
        // terminals without it ignore the request.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Build the connector the pages talk through, plus a remote control when
/// the connector supports acting as the remote side.
pub fn build_connector(config: &ResolvedConfig) -> (Arc<dyn Connector>, Option<RemoteControl>) {
    let connector = LoopbackConnector::new(config.counterpart.clone());
    let remote = connector.remote();
    info!(
        "Using loopback counterpart (auto_answer={}, ignore_forces={})",
        config.counterpart.auto_answer, config.counterpart.ignore_forces
    );
    (Arc::new(connector), Some(remote))
}

/// Route one terminal event. Returns the action to apply, if any.
fn route_event(app: &mut App, tui: &mut TuiState, event: TuiEvent) -> Option<Action> {
    match event {
        TuiEvent::ForceQuit => return Some(Action::Quit),
        TuiEvent::Resize => return None,
        TuiEvent::ToggleRemote => {
            if tui.remote.take().is_none() {
                if app.remote.is_some() {
                    tui.remote = Some(RemotePanelState::new(app.session.registered()));
                } else {
                    app.status_message = "No remote control for this connector".to_string();
                }
            }
            return None;
        }
        _ => {}
    }

    if let Some(remote) = tui.remote.as_mut() {
        let remote_event = remote.handle_event(&event)?;
        tui.remote = None;
        return match remote_event {
            RemoteEvent::Invoke { name, params } => Some(Action::RemoteInvoke { name, params }),
            RemoteEvent::Close => Some(Action::RemoteClose),
            RemoteEvent::ReregisterAll => Some(Action::RemoteReregisterAll),
            RemoteEvent::Shutdown(kind) => Some(Action::RemoteShutdown(kind)),
            RemoteEvent::Dismiss => None,
        };
    }

    if matches!(
        event,
        TuiEvent::ScrollUp
            | TuiEvent::ScrollDown
            | TuiEvent::ScrollPageUp
            | TuiEvent::ScrollPageDown
            | TuiEvent::ScrollToBottom
    ) {
        tui.message_list.handle_event(&event);
        return None;
    }

    if app.current_prompt().is_some() && !matches!(event, TuiEvent::Disconnect) {
        return confirm_choice(&event).map(|accept| Action::ConfirmInvocation { accept });
    }

    if matches!(event, TuiEvent::Disconnect) {
        return Some(Action::Disconnect);
    }

    app.forms
        .handle_event(&event)
        .map(|submission| Action::SubmitForm {
            form: submission.form,
            values: submission.values,
        })
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let (connector, remote) = build_connector(&config);
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(config.page, &config, connector, tx, remote);
    let mut tui = TuiState::new();
    info!(
        "Starting {} page over the {} connector",
        config.page.title(),
        app.session.connector_name()
    );

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let mut needs_redraw = true; // Force first frame

    'outer: loop {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let first_event = poll_event_timeout(POLL_TIMEOUT);
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if let Some(action) = route_event(&mut app, &mut tui, event)
                && update(&mut app, action) == Effect::Quit
            {
                break 'outer;
            }
        }

        // Client events for the session
        while let Ok(envelope) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", envelope);
            if update(&mut app, Action::Client(envelope)) == Effect::Quit {
                break 'outer;
            }
        }
    }

    ratatui::restore();
    Ok(())
}
