//! # Application State
//!
//! Core business state for the harness. This module contains domain logic
//! only - no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── kind: PageKind                  // which demo is running
//! ├── page: Box<dyn Page>             // form handlers + ready hook
//! ├── session: Session                // client handle, generation, phase
//! ├── log: ChatLog                    // rendered rows
//! ├── participants: Participants      // local user + counterpart
//! ├── subscribers: Subscribers        // invocation handlers
//! ├── prompts: VecDeque               // invocations awaiting the operator
//! ├── forms: FormBinder               // live form values + focus
//! ├── status_message: String          // status bar text
//! ├── error: Option<String>           // last handler error
//! ├── remote: Option<RemoteControl>   // act as the remote side (loopback only)
//! └── config: ResolvedConfig
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::PageKind;
use crate::client::{ActionInvocation, Connector, Envelope, RemoteControl};
use crate::core::chat::ChatLog;
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::Subscribers;
use crate::core::forms::FormBinder;
use crate::core::pages::{self, Page, PageContext, Participants};
use crate::core::session::Session;

pub struct App {
    pub kind: PageKind,
    pub page: Box<dyn Page>,
    pub session: Session,
    pub log: ChatLog,
    pub participants: Participants,
    pub subscribers: Subscribers,
    pub prompts: VecDeque<ActionInvocation>,
    pub forms: FormBinder,
    pub status_message: String,
    pub error: Option<String>,
    pub remote: Option<RemoteControl>,
    pub config: ResolvedConfig,
}

impl App {
    pub fn new(
        kind: PageKind,
        config: &ResolvedConfig,
        connector: Arc<dyn Connector>,
        events: Sender<Envelope>,
        remote: Option<RemoteControl>,
    ) -> Self {
        let page = pages::build(kind, config);
        let forms = FormBinder::new(page.forms());
        Self {
            kind,
            page,
            session: Session::new(connector, events),
            log: ChatLog::new(),
            participants: Participants::default(),
            subscribers: Subscribers::new(),
            prompts: VecDeque::new(),
            forms,
            status_message: format!("{} ready", kind.title()),
            error: None,
            remote,
            config: config.clone(),
        }
    }

    /// Run `f` with the page and a context borrowing the rest of the state.
    pub fn with_page<R>(&mut self, f: impl FnOnce(&mut dyn Page, &mut PageContext<'_>) -> R) -> R {
        let mut ctx = PageContext {
            session: &mut self.session,
            log: &mut self.log,
            participants: &mut self.participants,
            subscribers: &mut self.subscribers,
            prompts: &mut self.prompts,
            config: &self.config,
            mirror_chat: self.kind.mirrors_chat(),
        };
        f(self.page.as_mut(), &mut ctx)
    }

    /// Bring the binder in line with the forms the page currently shows.
    pub fn sync_forms(&mut self) {
        self.forms.sync(self.page.forms());
    }

    /// Oldest invocation waiting for the operator.
    pub fn current_prompt(&self) -> Option<&ActionInvocation> {
        self.prompts.front()
    }
}

#[cfg(test)]
mod tests {
    use crate::PageKind;
    use crate::core::session::Phase;
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let (app, log, _rx) = test_app(PageKind::Chat);
        assert_eq!(app.status_message, "Chat room ready");
        assert_eq!(app.session.phase(), Phase::Disconnected);
        assert!(app.log.is_empty());
        assert!(app.error.is_none());
        assert!(log.calls().is_empty());
        assert_eq!(app.forms.forms().len(), 1);
    }

    #[test]
    fn test_tester_shows_every_form() {
        let (app, _log, _rx) = test_app(PageKind::Tester);
        let ids: Vec<&str> = app.forms.forms().iter().map(|f| f.id()).collect();
        assert_eq!(
            ids,
            vec!["connect", "disconnect", "context", "register", "unregister", "force", "result"]
        );
    }
}
