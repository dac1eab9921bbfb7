//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::PageKind;
use crate::client::{
    ActionInvocation, ClientError, ClientEvent, ClientHandle, Command, Connector, Envelope,
    EventSink,
};
use crate::core::action::{Action, update};
use crate::core::config::ResolvedConfig;
use crate::core::session::Session;
use crate::core::state::App;

/// One observed interaction with the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect { url: String, game: String, generation: u64 },
    Send { generation: u64, command: Command },
    Disconnect { generation: u64 },
}

/// Shared record of every call made through a [`RecordingConnector`].
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn disconnects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Disconnect { .. }))
            .count()
    }

    pub fn contexts(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::Context { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn results(&self) -> Vec<(String, bool, Option<String>)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                Command::ActionResult { id, success, message } => Some((id, success, message)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A connector that records calls instead of talking to anything.
pub struct RecordingConnector {
    pub log: CallLog,
}

impl Connector for RecordingConnector {
    fn name(&self) -> &str {
        "recording"
    }

    fn connect(
        &self,
        server_url: &str,
        application_name: &str,
        sink: EventSink,
    ) -> Result<Box<dyn ClientHandle>, ClientError> {
        if server_url.is_empty() {
            return Err(ClientError::Rejected("server URL is empty".into()));
        }
        self.log.push(Call::Connect {
            url: server_url.to_string(),
            game: application_name.to_string(),
            generation: sink.generation(),
        });
        Ok(Box::new(RecordingHandle {
            generation: sink.generation(),
            log: self.log.clone(),
            open: true,
        }))
    }
}

struct RecordingHandle {
    generation: u64,
    log: CallLog,
    open: bool,
}

impl ClientHandle for RecordingHandle {
    fn send(&mut self, command: Command) -> Result<(), ClientError> {
        if !self.open {
            return Err(ClientError::Closed);
        }
        self.log.push(Call::Send {
            generation: self.generation,
            command,
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.open {
            self.open = false;
            self.log.push(Call::Disconnect {
                generation: self.generation,
            });
        }
    }
}

/// A session over a recording connector.
pub fn test_session() -> (Session, CallLog, Receiver<Envelope>) {
    let log = CallLog::default();
    let (tx, rx) = mpsc::channel();
    let connector = Arc::new(RecordingConnector { log: log.clone() });
    (Session::new(connector, tx), log, rx)
}

pub fn test_config() -> ResolvedConfig {
    ResolvedConfig {
        server_url: "ws://localhost:8000".to_string(),
        game_name: "Chat".to_string(),
        ..ResolvedConfig::default()
    }
}

/// Creates a test App for `kind` over a recording connector.
pub fn test_app(kind: PageKind) -> (App, CallLog, Receiver<Envelope>) {
    test_app_with(kind, &test_config())
}

/// [`test_app`] with a caller-supplied config.
pub fn test_app_with(kind: PageKind, config: &ResolvedConfig) -> (App, CallLog, Receiver<Envelope>) {
    let log = CallLog::default();
    let (tx, rx) = mpsc::channel();
    let connector = Arc::new(RecordingConnector { log: log.clone() });
    let app = App::new(kind, config, connector, tx, None);
    (app, log, rx)
}

/// Deliver `event` as if the current connection produced it.
pub fn deliver(app: &mut App, event: ClientEvent) {
    let envelope = Envelope {
        generation: app.session.generation(),
        event,
    };
    update(app, Action::Client(envelope));
}

pub fn ready(app: &mut App) {
    deliver(app, ClientEvent::Ready);
}

pub fn invoke(app: &mut App, id: &str, name: &str, params: Value) {
    deliver(
        app,
        ClientEvent::Invocation(ActionInvocation {
            id: id.to_string(),
            name: name.to_string(),
            params,
        }),
    );
}
