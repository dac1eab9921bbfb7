//! # Demo Pages
//!
//! A page owns its forms and decides what each submission does. Everything a
//! handler may touch is lent to it through [`PageContext`] for the duration of
//! one call.
//!
//! ```text
//! FormSubmission ──▶ Page::submit ──▶ PageContext { session, log, ... }
//! SessionEvent   ──▶ Page::on_ready / dispatch / Page::on_closed
//! ```

pub mod chat_room;
pub mod playground;
pub mod tester;

pub use chat_room::ChatRoom;
pub use playground::Playground;
pub use tester::ApiTester;

use std::collections::VecDeque;

use log::debug;

use crate::PageKind;
use crate::client::{ActionInvocation, NoticeLevel, ShutdownKind};
use crate::core::chat::{ChatLog, SYSTEM_AUTHOR, SYSTEM_COLOR};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::Subscribers;
use crate::core::error::HarnessError;
use crate::core::forms::{FormSpec, FormSubmission};
use crate::core::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub name: String,
    pub color: String,
}

/// Local operator and remote counterpart, as far as they are known.
#[derive(Debug, Default)]
pub struct Participants {
    pub user: Option<Participant>,
    pub counterpart: Option<Participant>,
}

pub struct PageContext<'a> {
    pub session: &'a mut Session,
    pub log: &'a mut ChatLog,
    pub participants: &'a mut Participants,
    pub subscribers: &'a mut Subscribers,
    /// Invocations waiting for the operator to confirm or decline.
    pub prompts: &'a mut VecDeque<ActionInvocation>,
    pub config: &'a ResolvedConfig,
    /// Forward every posted row to the client as context.
    pub mirror_chat: bool,
}

impl PageContext<'_> {
    /// Append a row and, on mirroring pages, send it as context while connected.
    pub fn post(&mut self, author: &str, color: &str, text: &str) {
        self.log.append(author, color, text);
        if self.mirror_chat && self.session.is_connected() {
            self.session
                .send_context(&format!("Chat message from {author}: {text}"), false);
        }
    }

    /// [`post`](Self::post) as the system author.
    pub fn system(&mut self, text: &str) {
        self.post(SYSTEM_AUTHOR, SYSTEM_COLOR, text);
    }

    /// System row that is never mirrored.
    pub fn note(&mut self, text: &str) {
        self.log.append(SYSTEM_AUTHOR, SYSTEM_COLOR, text);
    }

    /// Connect with the configured server URL and game name.
    pub fn connect_default(&mut self) -> Result<(), HarnessError> {
        let url = self.config.server_url.clone();
        let game = self.config.game_name.clone();
        self.session.connect(&url, &game)?;
        Ok(())
    }

    /// Close the connection and forget its subscriptions and prompts.
    pub fn disconnect(&mut self) -> bool {
        let changed = self.session.disconnect();
        if changed {
            self.subscribers.clear();
            self.prompts.clear();
        }
        changed
    }
}

/// The row every page appends when its connection ends.
pub fn closed_note(reason: Option<&str>, ctx: &mut PageContext<'_>) {
    match reason {
        Some(reason) => ctx.note(&format!("Disconnected: {reason}")),
        None => ctx.note("Disconnected"),
    }
}

pub trait Page {
    fn kind(&self) -> PageKind;

    /// Forms currently shown, in display order.
    fn forms(&self) -> Vec<FormSpec>;

    fn submit(
        &mut self,
        submission: &FormSubmission,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), HarnessError>;

    /// Runs once per connection when the client reports ready.
    fn on_ready(&mut self, ctx: &mut PageContext<'_>);

    fn on_closed(&mut self, reason: Option<&str>, ctx: &mut PageContext<'_>) {
        closed_note(reason, ctx);
    }

    /// Warnings and errors become system rows; info notices only go to the log file.
    fn on_notice(&mut self, level: NoticeLevel, message: &str, ctx: &mut PageContext<'_>) {
        match level {
            NoticeLevel::Info => debug!("Notice: {}", message),
            NoticeLevel::Warning => ctx.note(&format!("Warning: {message}")),
            NoticeLevel::Error => ctx.note(&format!("Error: {message}")),
        }
    }

    /// Demo pages hold nothing worth saving, so a shutdown request is
    /// acknowledged right away. A cancelled graceful request needs no answer.
    fn on_shutdown(&mut self, kind: ShutdownKind, ctx: &mut PageContext<'_>) {
        match kind {
            ShutdownKind::Graceful { wants_shutdown: false } => {
                ctx.note("Shutdown request cancelled");
                return;
            }
            ShutdownKind::Graceful { wants_shutdown: true } => ctx.note("Graceful shutdown requested"),
            ShutdownKind::Immediate => ctx.note("Immediate shutdown requested"),
        }
        if ctx.session.send_shutdown_ready() {
            ctx.note("Ready to shut down");
        }
    }

    /// Operator answered the oldest prompt.
    fn on_confirm(&mut self, invocation: ActionInvocation, _accept: bool, ctx: &mut PageContext<'_>) {
        debug!("{:?} page has no prompts; answering {} with failure", self.kind(), invocation.id);
        ctx.session
            .send_action_result(&invocation.id, false, Some("No operator prompt on this page.".into()));
    }
}

/// Build the page for `kind`, prefilled from `config`.
pub fn build(kind: PageKind, config: &ResolvedConfig) -> Box<dyn Page> {
    match kind {
        PageKind::Chat => Box::new(ChatRoom::new(config)),
        PageKind::Playground => Box::new(Playground::new(config)),
        PageKind::Tester => Box::new(ApiTester::new(config)),
    }
}
