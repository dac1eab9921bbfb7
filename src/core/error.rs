use std::fmt;

use crate::client::ClientError;

/// Errors a page handler can surface to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// A user-typed schema is not valid JSON. Nothing was registered.
    InvalidSchema(String),
    /// Invocation or form parameters did not match what the handler expects.
    InvalidParams(String),
    /// A form id the active page does not know.
    UnknownForm(String),
    /// The client refused to connect.
    Client(ClientError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::InvalidSchema(msg) => write!(f, "invalid schema: {msg}"),
            HarnessError::InvalidParams(msg) => write!(f, "invalid parameters: {msg}"),
            HarnessError::UnknownForm(id) => write!(f, "unknown form: {id}"),
            HarnessError::Client(e) => write!(f, "client error: {e}"),
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<ClientError> for HarnessError {
    fn from(e: ClientError) -> Self {
        HarnessError::Client(e)
    }
}
