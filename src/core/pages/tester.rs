//! Generic API tester: one form per client operation, and an operator
//! prompt for every invocation.

use log::info;

use crate::PageKind;
use crate::client::{ActionDescriptor, ActionInvocation, ForceRequest, NoticeLevel};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::{Handled, InvocationHandler};
use crate::core::error::HarnessError;
use crate::core::forms::{FieldSpec, FormSpec, FormSubmission};
use crate::core::pages::playground::parse_schema;
use crate::core::pages::{Page, PageContext};

pub const CONNECT_FORM: &str = "connect";
pub const DISCONNECT_FORM: &str = "disconnect";
pub const CONTEXT_FORM: &str = "context";
pub const REGISTER_FORM: &str = "register";
pub const UNREGISTER_FORM: &str = "unregister";
pub const FORCE_FORM: &str = "force";
pub const RESULT_FORM: &str = "result";

pub const CONFIRMED_MESSAGE: &str = "Action confirmed by operator.";
pub const DECLINED_MESSAGE: &str = "Action declined by operator.";

pub struct ApiTester {
    server_url: String,
    game_name: String,
}

impl ApiTester {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            server_url: config.server_url.clone(),
            game_name: config.game_name.clone(),
        }
    }
}

fn required(submission: &FormSubmission, field: &str) -> Result<String, HarnessError> {
    submission
        .values
        .optional(field)
        .ok_or_else(|| HarnessError::InvalidParams(format!("{field} is required")))
}

/// Console line for an operation the session may have dropped.
fn report(ctx: &mut PageContext<'_>, sent: bool, what: String) {
    if sent {
        ctx.note(&what);
    } else {
        ctx.note(&format!("Not connected; {what} dropped"));
    }
}

impl Page for ApiTester {
    fn kind(&self) -> PageKind {
        PageKind::Tester
    }

    fn forms(&self) -> Vec<FormSpec> {
        vec![
            FormSpec::new(
                CONNECT_FORM,
                "Connect",
                vec![
                    FieldSpec::text("server_url", "Server URL").with_default(self.server_url.clone()),
                    FieldSpec::text("game_name", "Game").with_default(self.game_name.clone()),
                ],
            ),
            FormSpec::new(DISCONNECT_FORM, "Disconnect", vec![]),
            FormSpec::new(
                CONTEXT_FORM,
                "Send context",
                vec![
                    FieldSpec::text("message", "Message").clearing(),
                    FieldSpec::checkbox("silent", "Silent", false),
                ],
            ),
            FormSpec::new(
                REGISTER_FORM,
                "Register action",
                vec![
                    FieldSpec::text("name", "Name"),
                    FieldSpec::text("description", "Description"),
                    FieldSpec::json("schema", "Schema"),
                ],
            ),
            FormSpec::new(
                UNREGISTER_FORM,
                "Unregister actions",
                vec![FieldSpec::text("names", "Names (comma separated)")],
            ),
            FormSpec::new(
                FORCE_FORM,
                "Force actions",
                vec![
                    FieldSpec::text("query", "Query"),
                    FieldSpec::text("state", "State"),
                    FieldSpec::checkbox("ephemeral", "Ephemeral context", false),
                    FieldSpec::text("names", "Names (comma separated)"),
                ],
            ),
            FormSpec::new(
                RESULT_FORM,
                "Send action result",
                vec![
                    FieldSpec::text("id", "Invocation id"),
                    FieldSpec::checkbox("success", "Success", true),
                    FieldSpec::text("message", "Message"),
                ],
            ),
        ]
    }

    fn submit(
        &mut self,
        submission: &FormSubmission,
        ctx: &mut PageContext<'_>,
    ) -> Result<(), HarnessError> {
        let values = &submission.values;
        match submission.form.as_str() {
            CONNECT_FORM => {
                let url = required(submission, "server_url")?;
                let game = required(submission, "game_name")?;
                ctx.session.connect(&url, &game)?;
                ctx.note(&format!("Connecting to {url} as {game}"));
            }
            DISCONNECT_FORM => {
                if ctx.disconnect() {
                    self.on_closed(None, ctx);
                } else {
                    ctx.note("Not connected");
                }
            }
            CONTEXT_FORM => {
                let message = values.text("message");
                let sent = ctx.session.send_context(message, values.flag("silent"));
                report(ctx, sent, format!("Context: {message}"));
            }
            REGISTER_FORM => {
                let name = required(submission, "name")?;
                let schema = parse_schema(values.text("schema"))?;
                let mut descriptor = ActionDescriptor::new(name.clone(), values.text("description"));
                if let Some(schema) = schema {
                    descriptor = descriptor.with_schema(schema);
                }
                let sent = ctx.session.register_actions(vec![descriptor]);
                report(ctx, sent, format!("Register: {name}"));
            }
            UNREGISTER_FORM => {
                let names = values.list("names");
                if names.is_empty() {
                    return Err(HarnessError::InvalidParams("names is required".into()));
                }
                let line = format!("Unregister: {}", names.join(", "));
                let sent = ctx.session.unregister_actions(names);
                report(ctx, sent, line);
            }
            FORCE_FORM => {
                let names = values.list("names");
                if names.is_empty() {
                    return Err(HarnessError::InvalidParams("names is required".into()));
                }
                let line = format!("Force: {}", names.join(", "));
                let mut request = ForceRequest::new(values.text("query"), names);
                request.state = values.optional("state");
                request.ephemeral_context = values.flag("ephemeral");
                let sent = ctx.session.force_actions(request);
                report(ctx, sent, line);
            }
            RESULT_FORM => {
                let id = required(submission, "id")?;
                let success = values.flag("success");
                let sent = ctx
                    .session
                    .send_action_result(&id, success, values.optional("message"));
                report(
                    ctx,
                    sent,
                    format!("Result for {id}: {}", if success { "success" } else { "failure" }),
                );
            }
            other => return Err(HarnessError::UnknownForm(other.to_string())),
        }
        Ok(())
    }

    fn on_ready(&mut self, ctx: &mut PageContext<'_>) {
        ctx.note("Connected");
        ctx.subscribers.subscribe(Box::new(OperatorPrompt));
    }

    fn on_notice(&mut self, level: NoticeLevel, message: &str, ctx: &mut PageContext<'_>) {
        let label = match level {
            NoticeLevel::Info => "Info",
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Error => "Error",
        };
        ctx.note(&format!("{label}: {message}"));
    }

    fn on_confirm(&mut self, invocation: ActionInvocation, accept: bool, ctx: &mut PageContext<'_>) {
        info!(
            "Operator {} {} (id={})",
            if accept { "confirmed" } else { "declined" },
            invocation.name,
            invocation.id
        );
        let message = if accept { CONFIRMED_MESSAGE } else { DECLINED_MESSAGE };
        ctx.session
            .send_action_result(&invocation.id, accept, Some(message.to_string()));
        ctx.note(&format!("{}: {message}", invocation.name));
    }
}

/// Queues every invocation for the operator.
struct OperatorPrompt;

impl InvocationHandler for OperatorPrompt {
    fn key(&self) -> Option<&str> {
        Some("operator-prompt")
    }

    fn handle(&mut self, invocation: &ActionInvocation, ctx: &mut PageContext<'_>) -> Handled {
        ctx.note(&format!(
            "Action requested: {} {}",
            invocation.name, invocation.params
        ));
        ctx.prompts.push_back(invocation.clone());
        Handled::Deferred
    }
}
