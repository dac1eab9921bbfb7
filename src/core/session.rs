//! # Client Session
//!
//! Owns the (at most one) client handle for the running page.
//!
//! ```text
//!                connect()              Ready
//!  Disconnected ──────────▶ Connecting ──────▶ Connected
//!       ▲                        │                 │
//!       └──── disconnect() / Closed ───────────────┘
//! ```
//!
//! Every outgoing operation goes through one guard: unless the session is
//! `Connected`, the call is a logged no-op. Pages never check a flag
//! themselves and never see a client error.
//!
//! Each connection gets a new generation number. Events from an older
//! generation are dropped in [`Session::accept`], so callbacks that were
//! already in flight when a handle was replaced are harmless.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use log::{debug, info, warn};

use crate::client::{
    ActionDescriptor, ActionInvocation, ClientError, ClientEvent, ClientHandle, Command,
    Connector, Envelope, EventSink, ForceRequest, NoticeLevel, ShutdownKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Disconnected => "disconnected",
            Phase::Connecting => "connecting",
            Phase::Connected => "connected",
        }
    }
}

/// A client event that survived generation filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// First `Ready` of the current connection.
    Ready,
    Invocation(ActionInvocation),
    /// The current connection closed while the session considered it open.
    Closed { reason: Option<String> },
    Notice { level: NoticeLevel, message: String },
    /// Remote side forgot every action; the session has already re-sent its set.
    Reregistered { count: usize },
    Shutdown(ShutdownKind),
}

pub struct Session {
    connector: Arc<dyn Connector>,
    events: Sender<Envelope>,
    handle: Option<Box<dyn ClientHandle>>,
    generation: u64,
    phase: Phase,
    game: String,
    /// Invocation ids delivered but not yet answered.
    pending: HashSet<String>,
    /// What this session has asked the client to register, last write wins.
    registered: Vec<ActionDescriptor>,
}

impl Session {
    pub fn new(connector: Arc<dyn Connector>, events: Sender<Envelope>) -> Self {
        Self {
            connector,
            events,
            handle: None,
            generation: 0,
            phase: Phase::Disconnected,
            game: String::new(),
            pending: HashSet::new(),
            registered: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == Phase::Connected
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connector_name(&self) -> &str {
        self.connector.name()
    }

    pub fn registered(&self) -> &[ActionDescriptor] {
        &self.registered
    }

    pub fn pending_invocations(&self) -> usize {
        self.pending.len()
    }

    /// Open a new connection, closing the current one first.
    pub fn connect(&mut self, server_url: &str, application_name: &str) -> Result<(), ClientError> {
        if self.handle.is_some() {
            info!("Replacing existing connection (generation {})", self.generation);
            self.disconnect();
        }

        self.generation += 1;
        let sink = EventSink::new(self.generation, self.events.clone());
        let handle = self.connector.connect(server_url, application_name, sink)?;

        info!(
            "Connecting to {} as \"{}\" via {} (generation {})",
            server_url,
            application_name,
            self.connector.name(),
            self.generation
        );
        self.handle = Some(handle);
        self.phase = Phase::Connecting;
        self.game = application_name.to_string();
        self.pending.clear();
        self.registered.clear();
        Ok(())
    }

    /// Close the current connection. Returns false when there was none.
    pub fn disconnect(&mut self) -> bool {
        let Some(mut handle) = self.handle.take() else {
            debug!("disconnect() with no active connection");
            return false;
        };
        handle.disconnect();
        self.reset();
        info!("Disconnected (generation {})", self.generation);
        true
    }

    fn reset(&mut self) {
        self.phase = Phase::Disconnected;
        if !self.pending.is_empty() {
            warn!("{} invocation(s) left unanswered at disconnect", self.pending.len());
        }
        self.pending.clear();
        self.registered.clear();
    }

    /// Filter an incoming envelope against the current connection.
    pub fn accept(&mut self, envelope: Envelope) -> Option<SessionEvent> {
        let orphaned = self.handle.is_none() && !matches!(envelope.event, ClientEvent::Notice { .. });
        if envelope.generation != self.generation || orphaned {
            debug!(
                "Dropping event from generation {} (current {}): {:?}",
                envelope.generation, self.generation, envelope.event
            );
            return None;
        }

        match envelope.event {
            ClientEvent::Ready => {
                if self.phase != Phase::Connecting {
                    debug!("Duplicate ready for generation {}", self.generation);
                    return None;
                }
                self.phase = Phase::Connected;
                info!("Connection ready (generation {})", self.generation);
                Some(SessionEvent::Ready)
            }
            ClientEvent::Invocation(invocation) => {
                if self.phase != Phase::Connected {
                    warn!("Invocation {} arrived before ready; ignoring", invocation.name);
                    return None;
                }
                if !self.pending.insert(invocation.id.clone()) {
                    warn!("Invocation id {} delivered twice", invocation.id);
                }
                debug!("Invocation received: {} (id={})", invocation.name, invocation.id);
                Some(SessionEvent::Invocation(invocation))
            }
            ClientEvent::Closed { reason } => {
                if let Some(mut handle) = self.handle.take() {
                    handle.disconnect();
                }
                if self.phase == Phase::Disconnected {
                    return None;
                }
                self.reset();
                info!(
                    "Connection closed (generation {}): {}",
                    self.generation,
                    reason.as_deref().unwrap_or("no reason given")
                );
                Some(SessionEvent::Closed { reason })
            }
            ClientEvent::Notice { level, message } => Some(SessionEvent::Notice { level, message }),
            ClientEvent::ReregisterAll => {
                if self.phase != Phase::Connected {
                    debug!("actions/reregister_all before ready; ignoring");
                    return None;
                }
                let count = self.registered.len();
                if count > 0 {
                    let actions = self.registered.clone();
                    info!("Re-registering {} action(s)", count);
                    self.send(Command::RegisterActions { actions });
                }
                Some(SessionEvent::Reregistered { count })
            }
            ClientEvent::Shutdown(kind) => {
                if self.phase != Phase::Connected {
                    debug!("{} before ready; ignoring", kind.command());
                    return None;
                }
                info!("Remote side requested {:?}", kind);
                Some(SessionEvent::Shutdown(kind))
            }
        }
    }

    /// The single guard every outgoing operation passes through.
    fn send(&mut self, command: Command) -> bool {
        if self.phase != Phase::Connected {
            debug!("Dropping {} while {}", command.label(), self.phase.label());
            return false;
        }
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        debug!("Sending {}", command.to_wire(&self.game));
        match handle.send(command) {
            Ok(()) => true,
            Err(e) => {
                warn!("Client refused command: {}", e);
                false
            }
        }
    }

    pub fn send_context(&mut self, message: &str, silent: bool) -> bool {
        self.send(Command::Context {
            message: message.to_string(),
            silent,
        })
    }

    pub fn register_actions(&mut self, actions: Vec<ActionDescriptor>) -> bool {
        let mirror = actions.clone();
        if !self.send(Command::RegisterActions { actions }) {
            return false;
        }
        for action in mirror {
            match self.registered.iter_mut().find(|a| a.name == action.name) {
                Some(existing) => *existing = action,
                None => self.registered.push(action),
            }
        }
        true
    }

    pub fn unregister_actions(&mut self, names: Vec<String>) -> bool {
        let removed = names.clone();
        if !self.send(Command::UnregisterActions {
            action_names: names,
        }) {
            return false;
        }
        self.registered.retain(|a| !removed.contains(&a.name));
        true
    }

    pub fn force_actions(&mut self, request: ForceRequest) -> bool {
        self.send(Command::ForceActions(request))
    }

    /// Answer an invocation. Logs when `id` is not pending (answered twice or never
    /// delivered) but sends regardless.
    pub fn send_action_result(&mut self, id: &str, success: bool, message: Option<String>) -> bool {
        if !self.pending.remove(id) && self.is_connected() {
            warn!("Sending result for invocation {} which is not pending", id);
        }
        self.send(Command::ActionResult {
            id: id.to_string(),
            success,
            message,
        })
    }

    /// Tell the remote side the game can be closed now.
    pub fn send_shutdown_ready(&mut self) -> bool {
        self.send(Command::ShutdownReady)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains(id)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.disconnect();
        }
    }
}
