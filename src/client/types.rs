use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A capability offered to the remote counterpart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    /// JSON-schema-shaped parameter contract. `None` means the action takes no parameters.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<Value>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// One request from the remote side to execute a registered action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    pub id: String,
    pub name: String,
    /// Parsed parameters; `Value::Null` when the remote sent none.
    #[serde(default)]
    pub params: Value,
}

/// Hint asking the remote side to invoke one of `action_names` soon.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ForceRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(default)]
    pub ephemeral_context: bool,
    pub action_names: Vec<String>,
}

impl ForceRequest {
    pub fn new(query: impl Into<String>, action_names: Vec<String>) -> Self {
        Self {
            query: query.into(),
            action_names,
            ..Default::default()
        }
    }
}

/// Outgoing command from the page to the remote side.
///
/// Serializes to the game API's command envelope, minus the `game` field
/// which is added by [`Command::to_wire`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "command", content = "data")]
pub enum Command {
    #[serde(rename = "startup")]
    Startup,
    #[serde(rename = "context")]
    Context { message: String, silent: bool },
    #[serde(rename = "actions/register")]
    RegisterActions { actions: Vec<ActionDescriptor> },
    #[serde(rename = "actions/unregister")]
    UnregisterActions { action_names: Vec<String> },
    #[serde(rename = "actions/force")]
    ForceActions(ForceRequest),
    #[serde(rename = "action/result")]
    ActionResult {
        id: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Answer to a shutdown request: the game is at a point where it can be closed.
    #[serde(rename = "shutdown/ready")]
    ShutdownReady,
}

impl Command {
    /// Short name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Startup => "startup",
            Command::Context { .. } => "context",
            Command::RegisterActions { .. } => "actions/register",
            Command::UnregisterActions { .. } => "actions/unregister",
            Command::ForceActions(_) => "actions/force",
            Command::ActionResult { .. } => "action/result",
            Command::ShutdownReady => "shutdown/ready",
        }
    }

    /// The JSON document this command corresponds to on the game API.
    pub fn to_wire(&self, game: &str) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(ref mut map) = value {
            map.insert("game".to_string(), Value::String(game.to_string()));
        }
        value
    }
}

/// Severity of a counterpart notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// How the remote side wants the game to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// Wind down at the next good point; `wants_shutdown: false` cancels.
    Graceful { wants_shutdown: bool },
    /// Save and stop now.
    Immediate,
}

impl ShutdownKind {
    /// Game API command name of the request.
    pub fn command(&self) -> &'static str {
        match self {
            ShutdownKind::Graceful { .. } => "shutdown/graceful",
            ShutdownKind::Immediate => "shutdown/immediate",
        }
    }
}

/// Everything the client delivers back to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Connection established; fires once per connection.
    Ready,
    Invocation(ActionInvocation),
    /// Connection closed, by either side.
    Closed { reason: Option<String> },
    /// Diagnostic from the client or remote side (validation warnings etc.).
    Notice { level: NoticeLevel, message: String },
    /// Remote side dropped every action and wants them registered again.
    ReregisterAll,
    Shutdown(ShutdownKind),
}

/// A client event tagged with the connection generation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: u64,
    pub event: ClientEvent,
}
