//! Chat room page: pick a name, chat, and let the remote side join in.

use log::{info, warn};

use crate::PageKind;
use crate::client::{ActionInvocation, ForceRequest};
use crate::core::actions::{ChatAction, SendChatMessage, SetName, chat_actions};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::{Handled, InvocationHandler};
use crate::core::error::HarnessError;
use crate::core::forms::{FieldSpec, FormSpec, FormSubmission};
use crate::core::pages::{Page, PageContext, Participant, closed_note};

pub const USER_FORM: &str = "user-form";
pub const CHAT_FORM: &str = "chat-form";

const GAME_CONTEXT: &str = "This game is a simple chat room designed to test the API.";
const NAME_PROMPT: &str = "Please set your name and text color.";

pub struct ChatRoom {
    joined: bool,
    default_name: String,
    default_color: String,
}

impl ChatRoom {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            joined: false,
            default_name: config.user_name.clone(),
            default_color: config.user_color.clone(),
        }
    }

    pub fn joined(&self) -> bool {
        self.joined
    }

    fn join(
        &mut self,
        submission: &FormSubmission,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), HarnessError> {
        let Some(name) = submission.values.optional("username") else {
            return Err(HarnessError::InvalidParams("username is required".into()));
        };
        let color = submission.values.text("user-color").trim().to_string();
        info!("Joining chat as {} ({})", name, color);
        // Prefill the join form with the last values if it comes back.
        self.default_name = name.clone();
        self.default_color = color.clone();
        ctx.participants.user = Some(Participant { name, color });
        ctx.connect_default()?;
        self.joined = true;
        Ok(())
    }

    fn say(&self, submission: &FormSubmission, ctx: &mut PageContext<'_>) -> Result<(), HarnessError> {
        let Some(user) = ctx.participants.user.clone() else {
            return Err(HarnessError::InvalidParams("set a username first".into()));
        };
        let text = submission.values.text("chat-input");
        if text.trim().is_empty() {
            return Ok(());
        }
        ctx.post(&user.name, &user.color, text);
        Ok(())
    }
}

impl Page for ChatRoom {
    fn kind(&self) -> PageKind {
        PageKind::Chat
    }

    fn forms(&self) -> Vec<FormSpec> {
        if self.joined {
            vec![FormSpec::new(
                CHAT_FORM,
                "Chat",
                vec![FieldSpec::text("chat-input", "Message").clearing()],
            )]
        } else {
            vec![FormSpec::new(
                USER_FORM,
                "Join the chat",
                vec![
                    FieldSpec::text("username", "Username").with_default(self.default_name.clone()),
                    FieldSpec::color("user-color", "Color").with_default(self.default_color.clone()),
                ],
            )]
        }
    }

    fn submit(
        &mut self,
        submission: &FormSubmission,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), HarnessError> {
        match submission.form.as_str() {
            USER_FORM => self.join(submission, ctx),
            CHAT_FORM => self.say(submission, ctx),
            other => Err(HarnessError::UnknownForm(other.to_string())),
        }
    }

    fn on_ready(&mut self, ctx: &mut PageContext<'_>) {
        ctx.note("Connected to API");
        ctx.session.register_actions(chat_actions());
        ctx.subscribers.subscribe(Box::new(SetNameHandler { done: false }));
        ctx.subscribers.subscribe(Box::new(ChatMessageHandler));
        ctx.session.send_context(GAME_CONTEXT, false);
        ctx.session
            .force_actions(ForceRequest::new(NAME_PROMPT, vec![SetName::NAME.to_string()]));
    }

    /// Back to the join form so the operator can reconnect.
    fn on_closed(&mut self, reason: Option<&str>, ctx: &mut PageContext<'_>) {
        self.joined = false;
        ctx.participants.counterpart = None;
        closed_note(reason, ctx);
    }
}

/// Captures the counterpart's name and color, once.
struct SetNameHandler {
    done: bool,
}

impl InvocationHandler for SetNameHandler {
    fn key(&self) -> Option<&str> {
        Some(SetName::NAME)
    }

    fn handle(&mut self, invocation: &ActionInvocation, ctx: &mut PageContext<'_>) -> Handled {
        if invocation.name != SetName::NAME {
            return Handled::Ignored;
        }
        if self.done {
            warn!("set_name invoked again (id={})", invocation.id);
            ctx.session
                .send_action_result(&invocation.id, false, Some("Name is already set.".into()));
            return Handled::Answered;
        }
        let args = match SetName::parse(&invocation.params) {
            Ok(args) => args,
            Err(e) => {
                ctx.session
                    .send_action_result(&invocation.id, false, Some(e.to_string()));
                return Handled::Answered;
            }
        };

        self.done = true;
        ctx.participants.counterpart = Some(Participant {
            name: args.name.clone(),
            color: args.color,
        });
        ctx.session.send_action_result(&invocation.id, true, None);
        ctx.session.unregister_actions(vec![SetName::NAME.to_string()]);

        let user = ctx
            .participants
            .user
            .as_ref()
            .map(|u| u.name.clone())
            .unwrap_or_default();
        ctx.system(&format!("{user} has joined the chat room. Welcome!"));
        ctx.system(&format!("{} has joined the chat room. Welcome!", args.name));
        Handled::Answered
    }
}

/// Renders messages from the counterpart under its captured name and color.
struct ChatMessageHandler;

impl InvocationHandler for ChatMessageHandler {
    fn key(&self) -> Option<&str> {
        Some(SendChatMessage::NAME)
    }

    fn handle(&mut self, invocation: &ActionInvocation, ctx: &mut PageContext<'_>) -> Handled {
        if invocation.name != SendChatMessage::NAME {
            return Handled::Ignored;
        }
        match SendChatMessage::parse(&invocation.params) {
            Ok(args) => {
                let author = ctx.participants.counterpart.clone().unwrap_or(Participant {
                    name: "Anonymous".into(),
                    color: String::new(),
                });
                ctx.post(&author.name, &author.color, &args.message);
                ctx.session.send_action_result(&invocation.id, true, None);
            }
            Err(e) => {
                ctx.session
                    .send_action_result(&invocation.id, false, Some(e.to_string()));
            }
        }
        Handled::Answered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientEvent, Command};
    use crate::core::action::{Action, update};
    use crate::core::forms::{FieldValue, FormValues};
    use crate::core::session::Phase;
    use crate::core::state::App;
    use crate::test_support::{
        Call, CallLog, deliver, invoke, ready, test_app, test_app_with, test_config,
    };
    use serde_json::json;

    fn submit(app: &mut App, form: &str, values: FormValues) {
        update(
            app,
            Action::SubmitForm {
                form: form.to_string(),
                values,
            },
        );
    }

    fn join(app: &mut App, name: &str, color: &str) {
        submit(
            app,
            USER_FORM,
            FormValues::new()
                .with_text("username", name)
                .with_text("user-color", color),
        );
    }

    /// Alice joins, the client gets ready and Bob bootstraps via set_name.
    fn bootstrap() -> (App, CallLog) {
        let (mut app, log, _rx) = test_app(PageKind::Chat);
        join(&mut app, "Alice", "#112233");
        ready(&mut app);
        invoke(&mut app, "name-1", "set_name", json!({ "name": "Bob", "color": "#445566" }));
        (app, log)
    }

    #[test]
    fn test_join_connects_lazily() {
        let (mut app, log, _rx) = test_app(PageKind::Chat);
        assert!(log.calls().is_empty());
        join(&mut app, "Alice", "#112233");
        assert_eq!(app.session.phase(), Phase::Connecting);
        assert_eq!(app.forms.forms()[0].id(), CHAT_FORM);
    }

    #[test]
    fn test_join_requires_username() {
        let (mut app, log, _rx) = test_app(PageKind::Chat);
        join(&mut app, "  ", "#112233");
        assert!(log.calls().is_empty());
        assert_eq!(app.forms.forms()[0].id(), USER_FORM);
        assert!(app.status_message.contains("username"));
    }

    #[test]
    fn test_ready_registers_and_forces_set_name() {
        let (mut app, log, _rx) = test_app(PageKind::Chat);
        join(&mut app, "Alice", "#112233");
        ready(&mut app);

        let commands = log.commands();
        assert!(matches!(
            &commands[0],
            Command::RegisterActions { actions }
                if actions.iter().map(|a| a.name.as_str()).collect::<Vec<_>>() == ["set_name", "send_chat_message"]
        ));
        assert_eq!(
            commands[1],
            Command::Context {
                message: GAME_CONTEXT.to_string(),
                silent: false
            }
        );
        match &commands[2] {
            Command::ForceActions(request) => {
                assert_eq!(request.query, NAME_PROMPT);
                assert_eq!(request.action_names, vec!["set_name".to_string()]);
            }
            other => panic!("expected force, got {other:?}"),
        }
        assert_eq!(app.log.texts(), vec!["Connected to API"]);
    }

    #[test]
    fn test_set_name_bootstrap() {
        let (app, log) = bootstrap();

        let texts = app.log.texts();
        assert_eq!(
            &texts[texts.len() - 2..],
            [
                "Alice has joined the chat room. Welcome!",
                "Bob has joined the chat room. Welcome!"
            ]
        );
        assert_eq!(log.results(), vec![("name-1".to_string(), true, None)]);
        assert!(log.commands().contains(&Command::UnregisterActions {
            action_names: vec!["set_name".to_string()]
        }));
        let names: Vec<&str> = app.session.registered().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["send_chat_message"]);
        assert!(log
            .contexts()
            .contains(&"Chat message from System: Bob has joined the chat room. Welcome!".to_string()));
    }

    #[test]
    fn test_set_name_only_once() {
        let (mut app, log) = bootstrap();
        log.clear();
        invoke(&mut app, "name-2", "set_name", json!({ "name": "Eve", "color": "#000000" }));
        assert_eq!(app.participants.counterpart.as_ref().unwrap().name, "Bob");
        assert_eq!(log.results().len(), 1);
        assert!(!log.results()[0].1);
    }

    #[test]
    fn test_send_chat_message_renders_as_counterpart() {
        let (mut app, log) = bootstrap();
        log.clear();
        let rows_before = app.log.len();

        invoke(&mut app, "msg-1", "send_chat_message", json!({ "message": "hi" }));

        assert_eq!(app.log.len(), rows_before + 1);
        let row = app.log.last().unwrap();
        assert_eq!((row.author.as_str(), row.color.as_str(), row.text.as_str()), ("Bob", "#445566", "hi"));
        assert_eq!(log.results(), vec![("msg-1".to_string(), true, None)]);
        assert_eq!(log.contexts(), vec!["Chat message from Bob: hi".to_string()]);
    }

    #[test]
    fn test_malformed_chat_params_fail() {
        let (mut app, log) = bootstrap();
        log.clear();
        invoke(&mut app, "msg-2", "send_chat_message", json!({ "text": "wrong field" }));
        let results = log.results();
        assert_eq!(results.len(), 1);
        assert!(!results[0].1);
        assert!(results[0].2.as_deref().unwrap().contains("message"));
    }

    #[test]
    fn test_chat_form_mirrors_only_when_connected() {
        let (mut app, log, _rx) = test_app(PageKind::Chat);
        join(&mut app, "Alice", "#112233");
        submit(&mut app, CHAT_FORM, FormValues::new().with_text("chat-input", "early"));
        assert!(log.contexts().is_empty());
        assert_eq!(app.log.last().unwrap().text, "early");

        ready(&mut app);
        submit(&mut app, CHAT_FORM, FormValues::new().with_text("chat-input", "later"));
        assert!(log.contexts().contains(&"Chat message from Alice: later".to_string()));
    }

    #[test]
    fn test_failed_join_keeps_join_form() {
        let config = ResolvedConfig {
            server_url: String::new(),
            ..test_config()
        };
        let (mut app, log, _rx) = test_app_with(PageKind::Chat, &config);
        join(&mut app, "Alice", "#112233");

        assert!(log.calls().is_empty());
        assert_eq!(app.session.phase(), Phase::Disconnected);
        assert_eq!(app.error.as_deref(), Some("client error: rejected: server URL is empty"));
        assert_eq!(app.forms.forms()[0].id(), USER_FORM);
    }

    #[test]
    fn test_disconnect_then_rejoin() {
        let (mut app, log) = bootstrap();
        update(&mut app, Action::Disconnect);
        assert_eq!(app.forms.forms()[0].id(), USER_FORM);
        assert!(app.participants.counterpart.is_none());
        // Last values come back prefilled.
        assert_eq!(app.forms.forms()[0].value(0), Some(&FieldValue::Text("Alice".into())));

        join(&mut app, "Alice", "#112233");
        assert_eq!(app.session.phase(), Phase::Connecting);
        assert_eq!(app.forms.forms()[0].id(), CHAT_FORM);
        let connects = log.calls().iter().filter(|c| matches!(c, Call::Connect { .. })).count();
        assert_eq!(connects, 2);
    }

    #[test]
    fn test_remote_close_brings_back_join_form() {
        let (mut app, _log) = bootstrap();
        deliver(&mut app, ClientEvent::Closed { reason: Some("bye".into()) });
        assert_eq!(app.forms.forms()[0].id(), USER_FORM);
        assert_eq!(app.log.last().unwrap().text, "Disconnected: bye");
    }

    #[test]
    fn test_unknown_form_is_reported() {
        let (mut app, _log, _rx) = test_app(PageKind::Chat);
        submit(&mut app, "action-form", FormValues::new());
        assert_eq!(app.error.as_deref(), Some("unknown form: action-form"));
    }
}
