//! # Invocation Dispatch
//!
//! Invocations are published to every subscribed [`InvocationHandler`] in
//! subscription order. Each handler looks at the action name and decides
//! whether to act.
//!
//! ```text
//! Invocation ──▶ handler 1 ──▶ handler 2 ──▶ ... ──▶ nobody acted?
//!                                                    └─▶ failure "Unknown action: {name}"
//! ```

use log::{debug, warn};

use crate::client::ActionInvocation;
use crate::core::pages::PageContext;

/// What a handler did with an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Not for this handler.
    Ignored,
    /// Result already sent.
    Answered,
    /// Accepted; the result will be sent later (operator prompt).
    Deferred,
}

pub trait InvocationHandler {
    /// Handlers with the same key replace each other on subscribe.
    fn key(&self) -> Option<&str> {
        None
    }

    fn handle(&mut self, invocation: &ActionInvocation, ctx: &mut PageContext<'_>) -> Handled;
}

struct FnHandler<F>(F);

impl<F> InvocationHandler for FnHandler<F>
where
    F: FnMut(&ActionInvocation, &mut PageContext<'_>) -> Handled,
{
    fn handle(&mut self, invocation: &ActionInvocation, ctx: &mut PageContext<'_>) -> Handled {
        (self.0)(invocation, ctx)
    }
}

/// Unkeyed handler from a closure.
pub fn from_fn<F>(f: F) -> Box<dyn InvocationHandler>
where
    F: FnMut(&ActionInvocation, &mut PageContext<'_>) -> Handled + 'static,
{
    Box::new(FnHandler(f))
}

#[derive(Default)]
pub struct Subscribers {
    handlers: Vec<Box<dyn InvocationHandler>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler`, or replace in place an existing handler with the same key.
    pub fn subscribe(&mut self, handler: Box<dyn InvocationHandler>) {
        if let Some(key) = handler.key()
            && let Some(slot) = self.handlers.iter_mut().find(|h| h.key() == Some(key))
        {
            debug!("Replacing invocation handler {:?}", key);
            *slot = handler;
            return;
        }
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    fn absorb(&mut self, other: Subscribers) {
        for handler in other.handlers {
            self.subscribe(handler);
        }
    }
}

/// Offer `invocation` to every subscriber. Answers with a failure when none acted.
///
/// Handlers may subscribe further handlers while running; those are kept and
/// see the next invocation.
pub fn dispatch(invocation: &ActionInvocation, ctx: &mut PageContext<'_>) -> Handled {
    let mut subscribers = std::mem::take(ctx.subscribers);
    let mut outcome = Handled::Ignored;
    for handler in subscribers.handlers.iter_mut() {
        match handler.handle(invocation, ctx) {
            Handled::Ignored => {}
            Handled::Answered => outcome = Handled::Answered,
            Handled::Deferred => {
                if outcome == Handled::Ignored {
                    outcome = Handled::Deferred;
                }
            }
        }
    }
    subscribers.absorb(std::mem::take(ctx.subscribers));
    *ctx.subscribers = subscribers;

    match outcome {
        Handled::Ignored => {
            warn!("No handler for action {} (id={})", invocation.name, invocation.id);
            ctx.session.send_action_result(
                &invocation.id,
                false,
                Some(format!("Unknown action: {}", invocation.name)),
            );
        }
        Handled::Answered if ctx.session.is_pending(&invocation.id) => {
            warn!(
                "Invocation {} reported answered but no result was sent",
                invocation.id
            );
        }
        _ => {}
    }
    outcome
}
