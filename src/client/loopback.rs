//! # Loopback Counterpart
//!
//! An in-process stand-in for the remote side of the game API, so the demo
//! pages can run without a network.
//!
//! ```text
//!   Session ──▶ LoopbackHandle ──(unbounded mpsc)──▶ Counterpart task
//!      ▲                                                   │
//!      └──────────────── EventSink (std mpsc) ◀────────────┘
//!                                  ▲
//!   RemoteControl ──(same mpsc)────┘ operator acting as the remote side
//! ```
//!
//! The counterpart keeps the active action set for its connection, checks
//! registrations against what the game API supports, and answers forced
//! actions on its own when `auto_answer` is set.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::handle::{ClientError, ClientHandle, Connector, EventSink};
use super::schema;
use super::types::{
    ActionDescriptor, ActionInvocation, ClientEvent, Command, ForceRequest, NoticeLevel,
    ShutdownKind,
};

/// Behaviour knobs for the loopback counterpart.
#[derive(Debug, Clone, Default)]
pub struct CounterpartConfig {
    /// Answer forced actions immediately instead of waiting for the operator.
    pub auto_answer: bool,
    /// Drop every `actions/force` request.
    pub ignore_forces: bool,
    /// Artificial delay before each event is delivered.
    pub latency: Duration,
    /// Parameters used when auto-answering, keyed by action name.
    /// Actions without an entry get parameters sampled from their schema.
    pub canned_params: HashMap<String, Value>,
}

enum Inbound {
    Command(Command),
    Disconnect,
    RemoteInvoke { name: String, params: Value },
    RemoteClose { reason: String },
    RemoteReregisterAll,
    RemoteShutdown(ShutdownKind),
}

type Slot = Arc<Mutex<Option<UnboundedSender<Inbound>>>>;

fn current(slot: &Slot) -> Option<UnboundedSender<Inbound>> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Connector whose handles talk to an in-process counterpart task.
///
/// Must be used from within a tokio runtime.
pub struct LoopbackConnector {
    config: CounterpartConfig,
    slot: Slot,
}

impl LoopbackConnector {
    pub fn new(config: CounterpartConfig) -> Self {
        Self {
            config,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Control for acting as the remote side of the most recent connection.
    pub fn remote(&self) -> RemoteControl {
        RemoteControl {
            slot: self.slot.clone(),
        }
    }
}

impl Connector for LoopbackConnector {
    fn name(&self) -> &str {
        "loopback"
    }

    fn connect(
        &self,
        server_url: &str,
        application_name: &str,
        sink: EventSink,
    ) -> Result<Box<dyn ClientHandle>, ClientError> {
        if server_url.trim().is_empty() {
            return Err(ClientError::Rejected("server URL is empty".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ClientError::Rejected("loopback needs a tokio runtime".into()))?;

        info!(
            "Loopback connecting to {} as \"{}\" (generation {})",
            server_url,
            application_name,
            sink.generation()
        );

        let (tx, rx) = unbounded_channel();
        // The client announces itself before anything else.
        tx.send(Inbound::Command(Command::Startup))
            .map_err(|_| ClientError::Closed)?;

        let counterpart = Counterpart::new(application_name, self.config.clone(), sink);
        runtime.spawn(counterpart.run(rx));

        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx.clone());
        Ok(Box::new(LoopbackHandle { tx: Some(tx) }))
    }
}

struct LoopbackHandle {
    tx: Option<UnboundedSender<Inbound>>,
}

impl ClientHandle for LoopbackHandle {
    fn send(&mut self, command: Command) -> Result<(), ClientError> {
        let tx = self.tx.as_ref().ok_or(ClientError::Closed)?;
        tx.send(Inbound::Command(command))
            .map_err(|_| ClientError::Closed)
    }

    fn disconnect(&mut self) {
        if let Some(tx) = self.tx.take() {
            // Counterpart may already be gone after a remote close.
            let _ = tx.send(Inbound::Disconnect);
        }
    }
}

/// Lets the operator act as the remote side.
#[derive(Clone)]
pub struct RemoteControl {
    slot: Slot,
}

impl RemoteControl {
    fn send(&self, inbound: Inbound) -> Result<(), ClientError> {
        let tx = current(&self.slot).ok_or(ClientError::Closed)?;
        tx.send(inbound).map_err(|_| ClientError::Closed)
    }

    /// Invoke `name` with `params` on the current connection.
    pub fn invoke(&self, name: &str, params: Value) -> Result<(), ClientError> {
        self.send(Inbound::RemoteInvoke {
            name: name.to_string(),
            params,
        })
    }

    /// Close the current connection from the remote side.
    pub fn close(&self, reason: &str) -> Result<(), ClientError> {
        self.send(Inbound::RemoteClose {
            reason: reason.to_string(),
        })
    }

    /// Forget every registered action and ask the game to register them again.
    pub fn reregister_all(&self) -> Result<(), ClientError> {
        self.send(Inbound::RemoteReregisterAll)
    }

    pub fn shutdown(&self, kind: ShutdownKind) -> Result<(), ClientError> {
        self.send(Inbound::RemoteShutdown(kind))
    }
}

struct Counterpart {
    game: String,
    config: CounterpartConfig,
    sink: EventSink,
    actions: Vec<ActionDescriptor>,
    /// Invocations sent and not yet answered.
    pending_ids: HashSet<String>,
    active_force: Option<ForceRequest>,
    /// The invocation answering `active_force`, if one is out.
    force_id: Option<String>,
}

impl Counterpart {
    fn new(game: &str, config: CounterpartConfig, sink: EventSink) -> Self {
        Self {
            game: game.to_string(),
            config,
            sink,
            actions: Vec::new(),
            pending_ids: HashSet::new(),
            active_force: None,
            force_id: None,
        }
    }

    async fn run(mut self, mut rx: UnboundedReceiver<Inbound>) {
        self.pause().await;
        if !self.sink.emit(ClientEvent::Ready) {
            return;
        }

        while let Some(inbound) = rx.recv().await {
            match inbound {
                Inbound::Command(command) => self.on_command(command).await,
                Inbound::RemoteInvoke { name, params } => self.remote_invoke(name, params).await,
                Inbound::RemoteReregisterAll => self.reregister_all().await,
                Inbound::RemoteShutdown(kind) => {
                    self.notice(
                        NoticeLevel::Warning,
                        format!("{} is not officially supported.", kind.command()),
                    );
                    self.pause().await;
                    self.sink.emit(ClientEvent::Shutdown(kind));
                }
                Inbound::Disconnect => {
                    info!("Loopback connection closed by client (generation {})", self.sink.generation());
                    self.sink.emit(ClientEvent::Closed { reason: None });
                    return;
                }
                Inbound::RemoteClose { reason } => {
                    info!("Loopback connection closed by remote: {}", reason);
                    self.pause().await;
                    self.sink.emit(ClientEvent::Closed {
                        reason: Some(reason),
                    });
                    return;
                }
            }
        }
        debug!("Loopback handle dropped (generation {})", self.sink.generation());
    }

    async fn pause(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Info => info!("[{}] {}", self.game, message),
            NoticeLevel::Warning => warn!("[{}] {}", self.game, message),
            NoticeLevel::Error => log::error!("[{}] {}", self.game, message),
        }
        self.sink.emit(ClientEvent::Notice { level, message });
    }

    async fn on_command(&mut self, command: Command) {
        debug!("Loopback received: {}", command.to_wire(&self.game));
        match command {
            Command::Startup => {
                self.actions.clear();
                self.pending_ids.clear();
                self.clear_force();
                self.notice(NoticeLevel::Info, format!("startup: {}", self.game));
            }
            Command::Context { message, silent } => {
                let tag = if silent { "context (silent)" } else { "context" };
                self.notice(NoticeLevel::Info, format!("{tag}: {message}"));
            }
            Command::RegisterActions { actions } => {
                for action in actions {
                    self.register(action);
                }
            }
            Command::UnregisterActions { action_names } => {
                if action_names.is_empty() {
                    self.notice(NoticeLevel::Warning, "actions/unregister with no action names.");
                }
                for name in action_names {
                    let before = self.actions.len();
                    self.actions.retain(|a| a.name != name);
                    if self.actions.len() == before {
                        self.notice(NoticeLevel::Info, format!("Action \"{name}\" does not exist."));
                    } else {
                        self.notice(NoticeLevel::Info, format!("Action unregistered: {name}"));
                    }
                }
            }
            Command::ForceActions(request) => self.on_force(request).await,
            Command::ActionResult { id, success, message } => {
                self.on_result(id, success, message).await
            }
            Command::ShutdownReady => {
                self.notice(NoticeLevel::Info, "Game reports it is ready to shut down.");
            }
        }
    }

    fn clear_force(&mut self) {
        self.active_force = None;
        self.force_id = None;
    }

    async fn reregister_all(&mut self) {
        self.actions.clear();
        self.clear_force();
        self.notice(
            NoticeLevel::Warning,
            "actions/reregister_all is not officially supported.",
        );
        self.pause().await;
        self.sink.emit(ClientEvent::ReregisterAll);
    }

    /// An operator invocation of a forced action counts as the answer to the force.
    async fn remote_invoke(&mut self, name: String, params: Value) {
        let answers_force = self.force_id.is_none()
            && self
                .active_force
                .as_ref()
                .is_some_and(|f| f.action_names.contains(&name));
        if let Some(id) = self.invoke(&name, params).await
            && answers_force
        {
            self.force_id = Some(id);
        }
    }

    fn register(&mut self, action: ActionDescriptor) {
        for problem in schema::name_problems(&action.name) {
            self.notice(NoticeLevel::Warning, problem);
        }
        if let Some(ref s) = action.schema {
            if !s.is_object() {
                self.notice(
                    NoticeLevel::Error,
                    format!("Invalid schema for action \"{}\": not an object.", action.name),
                );
                return;
            }
            let keys = schema::unsupported_keys(s);
            if !keys.is_empty() {
                self.notice(
                    NoticeLevel::Warning,
                    format!("Disallowed keys in schema: {}", keys.join(", ")),
                );
            }
        }

        let name = action.name.clone();
        match self.actions.iter_mut().find(|a| a.name == name) {
            Some(existing) => {
                *existing = action;
                self.notice(NoticeLevel::Info, format!("Action re-registered: {name}"));
            }
            None => {
                self.actions.push(action);
                self.notice(NoticeLevel::Info, format!("Action registered: {name}"));
            }
        }
    }

    fn missing(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|n| !self.actions.iter().any(|a| &a.name == *n))
            .cloned()
            .collect()
    }

    async fn on_force(&mut self, request: ForceRequest) {
        if !self.pending_ids.is_empty() {
            self.notice(
                NoticeLevel::Warning,
                "Received actions/force while waiting for action/result.",
            );
        }
        if let Some(ref state) = request.state {
            self.notice(NoticeLevel::Info, format!("state: {state}"));
        }
        self.notice(NoticeLevel::Info, format!("query: {}", request.query));

        self.clear_force();
        if self.config.ignore_forces {
            self.notice(NoticeLevel::Info, "Forced action ignored.");
            return;
        }

        let missing = self.missing(&request.action_names);
        if !missing.is_empty() || request.action_names.is_empty() {
            self.notice(
                NoticeLevel::Warning,
                format!(
                    "actions/force with invalid actions received. Discarding. Invalid actions: {}",
                    missing.join(", ")
                ),
            );
            return;
        }

        self.active_force = Some(request);
        if self.config.auto_answer {
            self.answer_force().await;
        }
    }

    async fn answer_force(&mut self) {
        let Some(request) = self.active_force.as_ref() else {
            return;
        };
        let Some(action) = request
            .action_names
            .iter()
            .find_map(|n| self.actions.iter().find(|a| &a.name == n))
        else {
            return;
        };

        let params = match self.config.canned_params.get(&action.name) {
            Some(params) => params.clone(),
            None => action.schema.as_ref().map(schema::sample).unwrap_or(Value::Null),
        };
        let name = action.name.clone();
        self.notice(NoticeLevel::Info, format!("Automatically answering forced action: {name}"));
        self.force_id = self.invoke(&name, params).await;
    }

    /// Send an invocation. Returns its id, or `None` when `name` is not registered.
    async fn invoke(&mut self, name: &str, params: Value) -> Option<String> {
        if !self.actions.iter().any(|a| a.name == name) {
            self.notice(
                NoticeLevel::Warning,
                format!("Action \"{name}\" is not registered; not invoking."),
            );
            return None;
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.pending_ids.insert(id.clone());
        self.pause().await;
        debug!("Loopback invoking {} (id={})", name, id);
        self.sink.emit(ClientEvent::Invocation(ActionInvocation {
            id: id.clone(),
            name: name.to_string(),
            params,
        }));
        Some(id)
    }

    async fn on_result(&mut self, id: String, success: bool, message: Option<String>) {
        if !self.pending_ids.remove(&id) {
            if self.pending_ids.is_empty() {
                self.notice(NoticeLevel::Warning, format!("Unexpected action/result (id {id})."));
            } else {
                let mut expected: Vec<&str> = self.pending_ids.iter().map(String::as_str).collect();
                expected.sort_unstable();
                self.notice(
                    NoticeLevel::Warning,
                    format!(
                        "Received action ID \"{id}\" does not match any expected action ID: {}",
                        expected.join(", ")
                    ),
                );
            }
        }
        let answers_force = self.force_id.as_deref() == Some(id.as_str());
        if answers_force {
            self.force_id = None;
        }

        let outcome = if success { "success" } else { "failure" };
        match message {
            Some(ref msg) => self.notice(NoticeLevel::Info, format!("Action result indicates {outcome}: {msg}")),
            None if success => self.notice(NoticeLevel::Info, "Action result indicates success."),
            None => self.notice(NoticeLevel::Warning, "Failed action result contains no message."),
        }

        if !answers_force {
            return;
        }
        if success {
            self.active_force = None;
            return;
        }
        let Some(request) = self.active_force.clone() else {
            return;
        };
        let missing = self.missing(&request.action_names);
        if !missing.is_empty() {
            self.notice(
                NoticeLevel::Warning,
                format!(
                    "Actions have been unregistered before retrying the forced action. Retry aborted. Invalid actions: {}",
                    missing.join(", ")
                ),
            );
            self.active_force = None;
            return;
        }
        self.notice(NoticeLevel::Info, "Retrying forced action.");
        if self.config.auto_answer {
            self.answer_force().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::mpsc::{self, Receiver};

    use crate::client::Envelope;

    const WAIT: Duration = Duration::from_secs(2);

    /// Next non-notice event.
    fn next_event(rx: &Receiver<Envelope>) -> ClientEvent {
        loop {
            let envelope = rx.recv_timeout(WAIT).expect("event within timeout");
            if !matches!(envelope.event, ClientEvent::Notice { .. }) {
                return envelope.event;
            }
        }
    }

    /// Waits for a notice containing `needle`.
    fn expect_notice(rx: &Receiver<Envelope>, needle: &str) -> NoticeLevel {
        loop {
            let envelope = rx.recv_timeout(WAIT).expect("notice within timeout");
            if let ClientEvent::Notice { level, message } = envelope.event
                && message.contains(needle)
            {
                return level;
            }
        }
    }

    /// Notices up to and including the first one containing `needle`.
    fn notices_until(rx: &Receiver<Envelope>, needle: &str) -> Vec<String> {
        let mut seen = Vec::new();
        loop {
            let envelope = rx.recv_timeout(WAIT).expect("notice within timeout");
            if let ClientEvent::Notice { message, .. } = envelope.event {
                let done = message.contains(needle);
                seen.push(message);
                if done {
                    return seen;
                }
            }
        }
    }

    fn connect(config: CounterpartConfig) -> (LoopbackConnector, Box<dyn ClientHandle>, Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel();
        let connector = LoopbackConnector::new(config);
        let handle = connector
            .connect("ws://localhost:8000", "Test", EventSink::new(1, tx))
            .unwrap();
        (connector, handle, rx)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ready_then_startup() {
        let (_connector, _handle, rx) = connect(CounterpartConfig::default());
        assert_eq!(rx.recv_timeout(WAIT).unwrap().event, ClientEvent::Ready);
        expect_notice(&rx, "startup: Test");
    }

    #[test]
    fn test_connect_without_runtime_is_rejected() {
        let (tx, _rx) = mpsc::channel();
        let connector = LoopbackConnector::new(CounterpartConfig::default());
        let result = connector.connect("ws://localhost:8000", "Test", EventSink::new(1, tx));
        assert!(matches!(result, Err(ClientError::Rejected(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_url_is_rejected() {
        let (tx, _rx) = mpsc::channel();
        let connector = LoopbackConnector::new(CounterpartConfig::default());
        let result = connector.connect("  ", "Test", EventSink::new(1, tx));
        assert!(matches!(result, Err(ClientError::Rejected(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_auto_answer_uses_canned_params() {
        let mut canned = HashMap::new();
        canned.insert("set_name".to_string(), json!({ "name": "Bob", "color": "#445566" }));
        let (_connector, mut handle, rx) = connect(CounterpartConfig {
            auto_answer: true,
            canned_params: canned,
            ..Default::default()
        });
        assert_eq!(next_event(&rx), ClientEvent::Ready);

        handle
            .send(Command::RegisterActions {
                actions: vec![ActionDescriptor::new("set_name", "Set your name")],
            })
            .unwrap();
        handle
            .send(Command::ForceActions(ForceRequest::new("Name?", vec!["set_name".into()])))
            .unwrap();

        match next_event(&rx) {
            ClientEvent::Invocation(inv) => {
                assert_eq!(inv.name, "set_name");
                assert_eq!(inv.params, json!({ "name": "Bob", "color": "#445566" }));
            }
            other => panic!("Expected invocation, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_auto_answer_samples_schema() {
        let (_connector, mut handle, rx) = connect(CounterpartConfig {
            auto_answer: true,
            ..Default::default()
        });
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        handle
            .send(Command::RegisterActions {
                actions: vec![ActionDescriptor::new("say", "Say").with_schema(json!({
                    "type": "object",
                    "properties": { "message": { "type": "string" } }
                }))],
            })
            .unwrap();
        handle
            .send(Command::ForceActions(ForceRequest::new("Talk", vec!["say".into()])))
            .unwrap();
        match next_event(&rx) {
            ClientEvent::Invocation(inv) => assert_eq!(inv.params, json!({ "message": "" })),
            other => panic!("Expected invocation, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_force_with_unknown_action_is_discarded() {
        let (_connector, mut handle, rx) = connect(CounterpartConfig {
            auto_answer: true,
            ..Default::default()
        });
        handle
            .send(Command::ForceActions(ForceRequest::new("Go", vec!["ghost".into()])))
            .unwrap();
        let level = expect_notice(&rx, "Invalid actions: ghost");
        assert_eq!(level, NoticeLevel::Warning);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_register_twice_replaces() {
        let (connector, mut handle, rx) = connect(CounterpartConfig::default());
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        for description in ["first", "second"] {
            handle
                .send(Command::RegisterActions {
                    actions: vec![ActionDescriptor::new("foo", description)],
                })
                .unwrap();
        }
        expect_notice(&rx, "Action re-registered: foo");

        connector.remote().invoke("foo", Value::Null).unwrap();
        match next_event(&rx) {
            ClientEvent::Invocation(inv) => assert_eq!(inv.name, "foo"),
            other => panic!("Expected invocation, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unregister_unknown_is_harmless() {
        let (_connector, mut handle, rx) = connect(CounterpartConfig::default());
        handle
            .send(Command::UnregisterActions {
                action_names: vec!["nope".into()],
            })
            .unwrap();
        assert_eq!(expect_notice(&rx, "does not exist"), NoticeLevel::Info);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remote_invoke_of_unregistered_action_is_refused() {
        let (connector, _handle, rx) = connect(CounterpartConfig::default());
        connector.remote().invoke("set_name", Value::Null).unwrap();
        assert_eq!(expect_notice(&rx, "not registered"), NoticeLevel::Warning);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_result_retries_force() {
        let (_connector, mut handle, rx) = connect(CounterpartConfig {
            auto_answer: true,
            ..Default::default()
        });
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        handle
            .send(Command::RegisterActions {
                actions: vec![ActionDescriptor::new("pick", "Pick")],
            })
            .unwrap();
        handle
            .send(Command::ForceActions(ForceRequest::new("Pick", vec!["pick".into()])))
            .unwrap();
        let ClientEvent::Invocation(first) = next_event(&rx) else {
            panic!("Expected invocation");
        };
        handle
            .send(Command::ActionResult {
                id: first.id.clone(),
                success: false,
                message: Some("try again".into()),
            })
            .unwrap();
        let ClientEvent::Invocation(second) = next_event(&rx) else {
            panic!("Expected retried invocation");
        };
        assert_eq!(second.name, "pick");
        assert_ne!(second.id, first.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_manual_invoke_during_force_keeps_both_ids() {
        let (connector, mut handle, rx) = connect(CounterpartConfig {
            auto_answer: true,
            ..Default::default()
        });
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        handle
            .send(Command::RegisterActions {
                actions: vec![ActionDescriptor::new("pick", "Pick"), ActionDescriptor::new("wave", "Wave")],
            })
            .unwrap();
        handle
            .send(Command::ForceActions(ForceRequest::new("Pick", vec!["pick".into()])))
            .unwrap();
        let ClientEvent::Invocation(forced) = next_event(&rx) else {
            panic!("Expected forced invocation");
        };
        connector.remote().invoke("wave", Value::Null).unwrap();
        let ClientEvent::Invocation(manual) = next_event(&rx) else {
            panic!("Expected manual invocation");
        };
        assert_eq!(manual.name, "wave");

        for id in [&forced.id, &manual.id] {
            handle
                .send(Command::ActionResult { id: id.clone(), success: true, message: None })
                .unwrap();
        }
        let mut seen = notices_until(&rx, "Action result indicates success.");
        seen.extend(notices_until(&rx, "Action result indicates success."));
        assert!(seen.iter().all(|m| !m.contains("does not match")), "{seen:?}");
        assert!(seen.iter().all(|m| !m.contains("Unexpected")), "{seen:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_manual_invoke_does_not_retry_force() {
        let (connector, mut handle, rx) = connect(CounterpartConfig {
            auto_answer: true,
            ..Default::default()
        });
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        handle
            .send(Command::RegisterActions {
                actions: vec![ActionDescriptor::new("pick", "Pick"), ActionDescriptor::new("wave", "Wave")],
            })
            .unwrap();
        handle
            .send(Command::ForceActions(ForceRequest::new("Pick", vec!["pick".into()])))
            .unwrap();
        let ClientEvent::Invocation(_forced) = next_event(&rx) else {
            panic!("Expected forced invocation");
        };
        connector.remote().invoke("wave", Value::Null).unwrap();
        let ClientEvent::Invocation(manual) = next_event(&rx) else {
            panic!("Expected manual invocation");
        };
        handle
            .send(Command::ActionResult {
                id: manual.id,
                success: false,
                message: Some("no".into()),
            })
            .unwrap();
        let seen = notices_until(&rx, "Action result indicates failure: no");
        assert!(seen.iter().all(|m| !m.contains("Retrying")));
        // Nothing else is invoked.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reregister_all_clears_actions() {
        let (connector, mut handle, rx) = connect(CounterpartConfig::default());
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        handle
            .send(Command::RegisterActions {
                actions: vec![ActionDescriptor::new("wave", "Wave")],
            })
            .unwrap();
        expect_notice(&rx, "Action registered: wave");

        connector.remote().reregister_all().unwrap();
        assert_eq!(next_event(&rx), ClientEvent::ReregisterAll);
        connector.remote().invoke("wave", Value::Null).unwrap();
        assert_eq!(expect_notice(&rx, "not registered"), NoticeLevel::Warning);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_request_and_ready() {
        let (connector, mut handle, rx) = connect(CounterpartConfig::default());
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        connector.remote().shutdown(ShutdownKind::Immediate).unwrap();
        assert_eq!(next_event(&rx), ClientEvent::Shutdown(ShutdownKind::Immediate));

        handle.send(Command::ShutdownReady).unwrap();
        assert_eq!(expect_notice(&rx, "ready to shut down"), NoticeLevel::Info);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unexpected_result_warns() {
        let (_connector, mut handle, rx) = connect(CounterpartConfig::default());
        handle
            .send(Command::ActionResult {
                id: "random_id".into(),
                success: true,
                message: None,
            })
            .unwrap();
        assert_eq!(expect_notice(&rx, "Unexpected action/result"), NoticeLevel::Warning);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_emits_closed_and_handle_reports_closed() {
        let (_connector, mut handle, rx) = connect(CounterpartConfig::default());
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        handle.disconnect();
        handle.disconnect();
        assert_eq!(next_event(&rx), ClientEvent::Closed { reason: None });
        assert_eq!(handle.send(Command::Startup), Err(ClientError::Closed));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remote_close_carries_reason() {
        let (connector, _handle, rx) = connect(CounterpartConfig::default());
        assert_eq!(next_event(&rx), ClientEvent::Ready);
        connector.remote().close("server shutting down").unwrap();
        assert_eq!(
            next_event(&rx),
            ClientEvent::Closed {
                reason: Some("server shutting down".into())
            }
        );
    }

    #[test]
    fn test_remote_without_connection_is_closed() {
        let connector = LoopbackConnector::new(CounterpartConfig::default());
        assert_eq!(
            connector.remote().invoke("x", Value::Null),
            Err(ClientError::Closed)
        );
    }
}
