//! # Chat Log
//!
//! The ordered, append-only list of rows the event renderer shows.
//! Rows are never edited or evicted.

use chrono::{DateTime, Local};

pub const SYSTEM_AUTHOR: &str = "System";
pub const SYSTEM_COLOR: &str = "#ff0000";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub author: String,
    /// CSS color string, rendered as given.
    pub color: String,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn is_system(&self) -> bool {
        self.author == SYSTEM_AUTHOR
    }
}

#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row at the end and return it.
    pub fn append(&mut self, author: &str, color: &str, text: &str) -> &ChatMessage {
        self.messages.push(ChatMessage {
            author: author.to_string(),
            color: color.to_string(),
            text: text.to_string(),
            timestamp: Local::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Texts of every row, oldest first.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.text.as_str()).collect()
    }
}
