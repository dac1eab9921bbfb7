//! # Client Boundary
//!
//! The game-integration client is an external collaborator. This module
//! defines the shape it must expose ([`Connector`], [`ClientHandle`]) and the
//! values that cross the boundary, plus the in-process [`LoopbackConnector`]
//! used when no real client is plugged in.

pub mod handle;
pub mod loopback;
pub mod schema;
pub mod types;

pub use handle::{ClientError, ClientHandle, Connector, EventSink};
pub use loopback::{CounterpartConfig, LoopbackConnector, RemoteControl};
pub use types::{
    ActionDescriptor, ActionInvocation, ClientEvent, Command, Envelope, ForceRequest, NoticeLevel,
    ShutdownKind,
};
