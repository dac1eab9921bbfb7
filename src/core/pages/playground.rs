//! Action playground: the chat room plus free-form action registration and
//! a few debug buttons for poking the client with odd traffic.

use log::{debug, info};
use serde_json::Value;
use uuid::Uuid;

use crate::PageKind;
use crate::client::{ActionDescriptor, ActionInvocation, ForceRequest};
use crate::core::actions::{ChatAction, SendChatMessage};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::{Handled, InvocationHandler};
use crate::core::error::HarnessError;
use crate::core::forms::{FieldSpec, FormSpec, FormSubmission};
use crate::core::pages::chat_room::{CHAT_FORM, ChatRoom, USER_FORM};
use crate::core::pages::{Page, PageContext};

pub const ACTION_FORM: &str = "action-form";
pub const REGISTER_RANDOM: &str = "register-random";
pub const FORCE_RANDOM: &str = "force-random";
pub const SEND_SUCCESS: &str = "send-success";
pub const SEND_FAILURE: &str = "send-failure";

/// Id used by the stray-result debug buttons. Never matches a real invocation.
pub const STRAY_RESULT_ID: &str = "random_id";

pub struct Playground {
    chat: ChatRoom,
    /// Target of the "force random" button.
    random_action: String,
}

impl Playground {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            chat: ChatRoom::new(config),
            random_action: SendChatMessage::NAME.to_string(),
        }
    }

    fn register_custom(
        &mut self,
        submission: &FormSubmission,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), HarnessError> {
        if !ctx.session.is_connected() {
            debug!("Ignoring action registration while not connected");
            return Ok(());
        }
        let name = submission.values.text("action-name").trim().to_string();
        if name.is_empty() {
            return Err(HarnessError::InvalidParams("action name is required".into()));
        }
        let schema = parse_schema(submission.values.text("action-schema"))?;

        ctx.system(&format!("Registering action: {name}"));
        let mut descriptor =
            ActionDescriptor::new(name.clone(), submission.values.text("action-description"));
        if let Some(schema) = schema {
            descriptor = descriptor.with_schema(schema);
        }
        ctx.session.register_actions(vec![descriptor]);
        ctx.subscribers.subscribe(Box::new(CustomActionHandler { name }));
        Ok(())
    }

    fn register_random(&mut self, ctx: &mut PageContext<'_>) {
        let name = format!("action_{}", Uuid::new_v4().as_u128() % 1_000_000);
        info!("Registering random action {}", name);
        if ctx
            .session
            .register_actions(vec![ActionDescriptor::new(name.clone(), "Random action")])
        {
            self.random_action = name;
        }
    }
}

/// Blank means "no schema"; anything else must be valid JSON.
pub fn parse_schema(text: &str) -> Result<Option<Value>, HarnessError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| HarnessError::InvalidSchema(e.to_string()))
}

impl Page for Playground {
    fn kind(&self) -> PageKind {
        PageKind::Playground
    }

    fn forms(&self) -> Vec<FormSpec> {
        let mut forms = self.chat.forms();
        if self.chat.joined() {
            forms.push(FormSpec::new(
                ACTION_FORM,
                "Register action",
                vec![
                    FieldSpec::text("action-name", "Name").clearing(),
                    FieldSpec::text("action-description", "Description"),
                    FieldSpec::json("action-schema", "Schema")
                        .with_default(r#"{"type": "object", "properties": {}}"#),
                ],
            ));
            forms.push(FormSpec::new(REGISTER_RANDOM, "Register random action", vec![]));
            forms.push(FormSpec::new(FORCE_RANDOM, "Force random action", vec![]));
            forms.push(FormSpec::new(SEND_SUCCESS, "Send stray success", vec![]));
            forms.push(FormSpec::new(SEND_FAILURE, "Send stray failure", vec![]));
        }
        forms
    }

    fn submit(
        &mut self,
        submission: &FormSubmission,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), HarnessError> {
        match submission.form.as_str() {
            USER_FORM | CHAT_FORM => self.chat.submit(submission, ctx),
            ACTION_FORM => self.register_custom(submission, ctx),
            REGISTER_RANDOM => {
                self.register_random(ctx);
                Ok(())
            }
            FORCE_RANDOM => {
                ctx.session.force_actions(ForceRequest::new(
                    "Execute an action",
                    vec![self.random_action.clone()],
                ));
                Ok(())
            }
            SEND_SUCCESS => {
                ctx.session.send_action_result(STRAY_RESULT_ID, true, None);
                Ok(())
            }
            SEND_FAILURE => {
                ctx.session.send_action_result(STRAY_RESULT_ID, false, None);
                Ok(())
            }
            other => Err(HarnessError::UnknownForm(other.to_string())),
        }
    }

    fn on_ready(&mut self, ctx: &mut PageContext<'_>) {
        self.chat.on_ready(ctx);
    }

    fn on_closed(&mut self, reason: Option<&str>, ctx: &mut PageContext<'_>) {
        self.random_action = SendChatMessage::NAME.to_string();
        self.chat.on_closed(reason, ctx);
    }
}

/// Answers invocations of one operator-registered action.
struct CustomActionHandler {
    name: String,
}

impl InvocationHandler for CustomActionHandler {
    fn key(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn handle(&mut self, invocation: &ActionInvocation, ctx: &mut PageContext<'_>) -> Handled {
        if invocation.name != self.name {
            return Handled::Ignored;
        }
        ctx.system(&format!("Action received: {}\n{}", invocation.name, invocation.params));
        ctx.session.send_action_result(&invocation.id, true, None);
        Handled::Answered
    }
}
