//! # Built-in Actions
//!
//! The chat room offers two actions to the remote side. Each one is a type
//! implementing [`ChatAction`]; its schema is derived from the argument
//! struct, so the parameter contract and the parser cannot drift apart.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{ActionDescriptor, schema};
use crate::core::error::HarnessError;

pub trait ChatAction {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    type Args: DeserializeOwned + JsonSchema;

    /// Descriptor with the normalized schema of `Args`.
    fn descriptor() -> ActionDescriptor {
        let root = schemars::schema_for!(Self::Args);
        let descriptor = ActionDescriptor::new(Self::NAME, Self::DESCRIPTION);
        match serde_json::to_value(root) {
            Ok(value) => descriptor.with_schema(schema::normalize(value)),
            Err(e) => {
                log::warn!("Could not serialize schema for {}: {}", Self::NAME, e);
                descriptor
            }
        }
    }

    fn parse(params: &Value) -> Result<Self::Args, HarnessError> {
        Self::Args::deserialize(params).map_err(|e| HarnessError::InvalidParams(e.to_string()))
    }
}

/// Bootstrap action: the remote side picks its display name and color.
pub struct SetName;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetNameArgs {
    pub name: String,
    pub color: String,
}

impl ChatAction for SetName {
    const NAME: &'static str = "set_name";
    const DESCRIPTION: &'static str = "Set the name and text color of the name that will be shown in chat when you send a message. The color must be in a CSS-compatible format.";
    type Args = SetNameArgs;
}

pub struct SendChatMessage;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SendChatMessageArgs {
    pub message: String,
}

impl ChatAction for SendChatMessage {
    const NAME: &'static str = "send_chat_message";
    const DESCRIPTION: &'static str = "Send a message in chat.";
    type Args = SendChatMessageArgs;
}

/// Descriptors registered when the chat room connects.
pub fn chat_actions() -> Vec<ActionDescriptor> {
    vec![SetName::descriptor(), SendChatMessage::descriptor()]
}
