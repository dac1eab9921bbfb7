//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as struct fields:
//! - `TitleBar`: page title, connection phase, status
//! - `Message`: one chat row
//! - `FormPanel`: the focused form of the active page
//! - `ConfirmDialog`: the invocation waiting on the operator
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components whose state persists in `TuiState` and which emit events:
//! - `MessageList`: scrollable chat log with layout caching and bottom pinning
//! - `RemotePanel`: overlay for acting as the remote side
//!
//! The `FormBinder` itself is the event handler for form editing; its state
//! lives in the core `App` because pages read and rewrite form values.
//!
//! ## Props-Based Data Flow
//!
//! Components receive external data as props, not by reaching into `App`:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new(app.kind.title(), app.session.phase(), app.status_message.clone());
//! title_bar.render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs             (this file)
//! ├── title_bar.rs       (top status bar)
//! ├── message.rs         (single chat row + CSS color parsing)
//! ├── message_list.rs    (scrollable log)
//! ├── form_panel.rs      (form rendering + key routing)
//! ├── confirm_dialog.rs  (invocation prompt)
//! └── remote_panel.rs    (loopback remote side)
//! ```

use ratatui::layout::{Constraint, Layout, Rect};

mod title_bar;
pub use title_bar::TitleBar;

pub mod confirm_dialog;
pub mod form_panel;
pub mod message;
pub mod message_list;
pub mod remote_panel;
pub use confirm_dialog::{ConfirmDialog, confirm_choice};
pub use form_panel::{FormPanel, panel_height};
pub use message_list::{MessageList, MessageListState};
pub use remote_panel::{RemoteEvent, RemotePanel, RemotePanelState};

/// Compute a centered rect using percentage of the outer rect.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
