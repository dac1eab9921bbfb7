use std::fmt;
use std::sync::mpsc::Sender;

use log::debug;

use super::types::{ClientEvent, Command, Envelope};

/// Errors surfaced by a client handle.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The connection is gone; the command was not delivered.
    Closed,
    /// The client refused the command (bad URL, malformed payload, ...).
    Rejected(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Closed => write!(f, "connection closed"),
            ClientError::Rejected(msg) => write!(f, "rejected: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// Where a client delivers its events.
///
/// Each sink carries the generation of the connection it was created for,
/// so the event loop can drop events from a handle that has since been
/// replaced.
#[derive(Clone, Debug)]
pub struct EventSink {
    generation: u64,
    tx: Sender<Envelope>,
}

impl EventSink {
    pub fn new(generation: u64, tx: Sender<Envelope>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event. Returns false once the receiving side is gone.
    pub fn emit(&self, event: ClientEvent) -> bool {
        let envelope = Envelope {
            generation: self.generation,
            event,
        };
        if self.tx.send(envelope).is_err() {
            debug!("Event sink for generation {} has no receiver", self.generation);
            return false;
        }
        true
    }
}

/// An active connection to the remote counterpart.
pub trait ClientHandle: Send {
    /// Queue a command for the remote side.
    fn send(&mut self, command: Command) -> Result<(), ClientError>;

    /// Close the connection. Must be safe to call on an already-closed handle.
    fn disconnect(&mut self);
}

/// Creates client handles.
///
/// `connect` returns immediately; [`ClientEvent::Ready`] is delivered on the
/// sink once the connection is usable.
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    fn connect(
        &self,
        server_url: &str,
        application_name: &str,
        sink: EventSink,
    ) -> Result<Box<dyn ClientHandle>, ClientError>;
}
