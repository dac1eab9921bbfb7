//! # Actions
//!
//! Everything that can happen in the harness becomes an `Action`.
//! Operator submits a form? That's `Action::SubmitForm`.
//! Client delivers something? That's `Action::Client(envelope)`.
//!
//! The `update()` function takes the current state and an action and applies
//! it. Calls into the client go through the session, which owns the handle.
//!
//! ```text
//! State + Action  →  update()  →  New State (+ Effect for the event loop)
//! ```

use log::{debug, info, warn};
use serde_json::Value;

use crate::core::dispatch::dispatch;
use crate::core::forms::{FormSubmission, FormValues};
use crate::core::session::SessionEvent;
use crate::core::state::App;
use crate::client::{ClientError, Envelope, RemoteControl, ShutdownKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A form was submitted with these values.
    SubmitForm { form: String, values: FormValues },
    /// An event from the client, tagged with its connection generation.
    Client(Envelope),
    /// Operator answered the oldest invocation prompt.
    ConfirmInvocation { accept: bool },
    /// Ctrl+D
    Disconnect,
    /// Act as the remote side: invoke `name` with JSON `params`.
    RemoteInvoke { name: String, params: String },
    /// Act as the remote side: drop the connection.
    RemoteClose,
    /// Act as the remote side: ask for every action to be registered again.
    RemoteReregisterAll,
    /// Act as the remote side: request a shutdown.
    RemoteShutdown(ShutdownKind),
    Quit,
}

/// What the event loop should do after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    let effect = match action {
        Action::SubmitForm { form, values } => {
            submit_form(app, FormSubmission { form, values });
            Effect::None
        }
        Action::Client(envelope) => {
            handle_client_event(app, envelope);
            Effect::None
        }
        Action::ConfirmInvocation { accept } => {
            match app.prompts.pop_front() {
                Some(invocation) => {
                    app.with_page(|page, ctx| page.on_confirm(invocation, accept, ctx));
                    app.status_message = match app.prompts.len() {
                        0 => "Prompt answered".to_string(),
                        n => format!("Prompt answered ({n} waiting)"),
                    };
                }
                None => debug!("Confirm with no pending prompt"),
            }
            Effect::None
        }
        Action::Disconnect => {
            let changed = app.with_page(|page, ctx| {
                let changed = ctx.disconnect();
                if changed {
                    page.on_closed(None, ctx);
                }
                changed
            });
            app.status_message = if changed {
                "Disconnected".to_string()
            } else {
                "Not connected".to_string()
            };
            Effect::None
        }
        Action::RemoteInvoke { name, params } => {
            remote_invoke(app, &name, &params);
            Effect::None
        }
        Action::RemoteClose => {
            remote_call(app, "Remote side closing", |r| r.close("Closed by operator"));
            Effect::None
        }
        Action::RemoteReregisterAll => {
            remote_call(app, "Asked for all actions again", RemoteControl::reregister_all);
            Effect::None
        }
        Action::RemoteShutdown(kind) => {
            remote_call(app, &format!("Sent {}", kind.command()), |r| r.shutdown(kind));
            Effect::None
        }
        Action::Quit => {
            info!("Quit requested");
            app.session.disconnect();
            Effect::Quit
        }
    };
    app.sync_forms();
    effect
}

fn submit_form(app: &mut App, submission: FormSubmission) {
    debug!("Submit {}: {:?}", submission.form, submission.values);
    let result = app.with_page(|page, ctx| {
        let result = page.submit(&submission, ctx);
        if let Err(e) = &result {
            ctx.note(&format!("Error: {e}"));
        }
        result
    });
    match result {
        Ok(()) => {
            app.error = None;
            app.status_message = format!("Submitted {}", submission.form);
        }
        Err(e) => {
            warn!("Form {} failed: {}", submission.form, e);
            app.status_message = format!("Error: {e}");
            app.error = Some(e.to_string());
        }
    }
}

fn handle_client_event(app: &mut App, envelope: Envelope) {
    let Some(event) = app.session.accept(envelope) else {
        return;
    };
    match event {
        SessionEvent::Ready => {
            app.subscribers.clear();
            app.prompts.clear();
            app.with_page(|page, ctx| page.on_ready(ctx));
            app.status_message = "Connected".to_string();
        }
        SessionEvent::Invocation(invocation) => {
            app.with_page(|_, ctx| dispatch(&invocation, ctx));
            if !app.prompts.is_empty() {
                app.status_message = format!("{} prompt(s) waiting: y/n", app.prompts.len());
            }
        }
        SessionEvent::Closed { reason } => {
            app.subscribers.clear();
            app.prompts.clear();
            app.with_page(|page, ctx| page.on_closed(reason.as_deref(), ctx));
            app.status_message = "Connection closed".to_string();
        }
        SessionEvent::Notice { level, message } => {
            app.with_page(|page, ctx| page.on_notice(level, &message, ctx));
        }
        SessionEvent::Reregistered { count } => {
            app.with_page(|_, ctx| {
                ctx.note(&format!("Remote side asked for all actions again; re-registered {count}"))
            });
            app.status_message = "Actions re-registered".to_string();
        }
        SessionEvent::Shutdown(kind) => {
            app.with_page(|page, ctx| page.on_shutdown(kind, ctx));
            app.status_message = format!("Remote side sent {}", kind.command());
        }
    }
}

/// Run `call` on the remote control and report the outcome in the status bar.
fn remote_call(
    app: &mut App,
    done: &str,
    call: impl FnOnce(&RemoteControl) -> Result<(), ClientError>,
) {
    app.status_message = match app.remote.as_ref().map(call) {
        Some(Ok(())) => done.to_string(),
        Some(Err(e)) => format!("Remote side failed: {e}"),
        None => "No remote control for this connector".to_string(),
    };
}

fn remote_invoke(app: &mut App, name: &str, params: &str) {
    let Some(remote) = app.remote.as_ref() else {
        app.status_message = "No remote control for this connector".to_string();
        return;
    };
    let params = if params.trim().is_empty() {
        Ok(Value::Object(Default::default()))
    } else {
        serde_json::from_str::<Value>(params)
    };
    let result = match params {
        Ok(params) => remote.invoke(name, params).map_err(|e| e.to_string()),
        Err(e) => Err(format!("invalid parameters: {e}")),
    };
    app.status_message = match result {
        Ok(()) => format!("Invoking {name}"),
        Err(e) => format!("Remote invoke failed: {e}"),
    };
}
