//! # MessageList Component
//!
//! Scrollable view of the chat log.
//!
//! ## Responsibilities
//!
//! - Display the rows of the [`ChatLog`]
//! - Keep the view pinned to the bottom while the operator is reading the
//!   newest rows, and leave it alone while they are scrolled up
//! - Cache row heights (the log is append-only, so only new rows are measured)
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the log (props).
//!
//! ## Pinning
//!
//! When new rows show up, the state first checks whether the view was within
//! [`PIN_TOLERANCE`] rows of the bottom of the *previous* content. If it was,
//! the view follows the new bottom; otherwise the offset from the top is kept.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::chat::{ChatLog, ChatMessage};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Rows from the bottom that still count as "at the bottom".
pub const PIN_TOLERANCE: u16 = 2;

/// True when a view at `offset` shows (nearly) the end of `content_height`.
pub fn is_near_bottom(offset: u16, content_height: u16, viewport_height: u16) -> bool {
    let max_y = content_height.saturating_sub(viewport_height);
    max_y.saturating_sub(offset) <= PIN_TOLERANCE
}

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, follow the bottom as rows are appended
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true, // Start attached to bottom
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Record, before new rows are laid out, whether the view should follow them.
    pub fn before_append(&mut self) {
        self.stick_to_bottom = is_near_bottom(
            self.scroll_state.offset().y,
            self.layout.total_height(),
            self.viewport_height,
        );
    }

    /// Re-engage auto-scroll if the operator has scrolled down to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Move the view to the last full page of content.
    pub fn pin_to_bottom(&mut self) {
        self.stick_to_bottom = true;
        let x = self.scroll_state.offset().x;
        self.scroll_state.set_offset(Position {
            x,
            y: self.max_offset(),
        });
    }

    /// Whether rows exist below the visible area.
    pub fn has_unseen_content(&self) -> bool {
        self.scroll_state.offset().y < self.max_offset()
    }
}

/// Scrollable chat log component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub log: &'a ChatLog,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, log: &'a ChatLog) -> Self {
        Self { state, log }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let messages = self.log.messages();

        // 1. Pin decision happens against the layout as it was before the new rows.
        self.state.viewport_height = area.height;
        let appended = messages.len() > self.state.layout.message_count;
        if appended && self.state.layout.content_width == content_width {
            self.state.before_append();
        }

        // 2. Update layout cache
        self.state.layout.measure(messages, content_width);
        let total_height = self.state.layout.total_height();

        if self.state.stick_to_bottom {
            self.state.pin_to_bottom();
        } else {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible rows into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };
        for i in visible_range {
            let height = self.state.layout.heights[i];
            let row_rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(Message::new(&messages[i]), row_rect);
            y_offset += height;
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Implemented on `MessageListState` because `MessageList` is rebuilt each
/// frame and cannot hold the scroll position.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => self.pin_to_bottom(),
            _ => {}
        }
        None
    }
}

/// Cached row heights for an append-only log.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    message_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_count: 0,
            content_width: 0,
        }
    }

    /// Rows whose cached height is still valid. Rows never change once
    /// appended, so only a width change (or a shorter log) invalidates.
    pub fn reusable_count(&self, message_count: usize, content_width: u16) -> usize {
        if self.content_width != content_width || message_count < self.message_count {
            return 0;
        }
        self.heights.len().min(message_count)
    }

    /// Measure rows not yet cached and refresh the prefix sums.
    pub fn measure(&mut self, messages: &[ChatMessage], content_width: u16) {
        let reusable = self.reusable_count(messages.len(), content_width);
        self.heights.truncate(reusable);
        for message in &messages[self.heights.len()..] {
            self.heights.push(Message::calculate_height(message, content_width));
        }
        self.rebuild_prefix_heights();
        self.message_count = messages.len();
        self.content_width = content_width;
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
