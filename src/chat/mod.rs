//! Chat message model
//!
//! Raw messages as the host hands them out, and the two structural shapes
//! their searchable content can take:
//! - a flat `content` string
//! - an ordered list of parts, some of which carry text
//!
//! Unknown fields are kept verbatim so rewriting a message never drops
//! host data it does not understand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator used when joining text parts into one searchable string
pub const PART_SEPARATOR: &str = "\n";

/// A chat message as stored by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Speaker tag (user, assistant, system, ...)
    #[serde(default)]
    pub role: String,

    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Flat payload; only searched when it is a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,

    /// Multi-part payload; takes precedence over `content` when it is an array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Value>,

    /// Fields this tool does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One part of a multi-part message, kept as raw JSON.
///
/// Any value is accepted; only an object with a string `text` field
/// counts as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagePart(Value);

impl MessagePart {
    /// Create a text-bearing part
    pub fn text(text: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("text".to_string(), Value::String(text.into()));
        Self(Value::Object(fields))
    }

    /// Text of this part, if it is non-empty
    pub fn text_payload(&self) -> Option<&str> {
        self.0
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Copy of this part with its text swapped out; other fields are kept
    pub fn with_text(&self, text: String) -> Self {
        let mut part = self.clone();
        if let Value::Object(fields) = &mut part.0 {
            fields.insert("text".to_string(), Value::String(text));
        }
        part
    }
}

/// Structural shape of a message's searchable content
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Flat string
    Plain(String),
    /// Ordered parts; only text-bearing parts are searched or rewritten
    Parts(Vec<MessagePart>),
}

impl MessageContent {
    /// Text used for matching and display.
    ///
    /// Parts are joined with [`PART_SEPARATOR`]; parts without text are skipped.
    pub fn combined_text(&self) -> String {
        match self {
            MessageContent::Plain(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(MessagePart::text_payload)
                .collect::<Vec<_>>()
                .join(PART_SEPARATOR),
        }
    }
}

impl RawMessage {
    /// Create a flat-text message
    pub fn plain(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(Value::String(content.into())),
            ..Default::default()
        }
    }

    /// Create a multi-part message
    pub fn with_parts(role: impl Into<String>, parts: Vec<MessagePart>) -> Self {
        Self {
            role: role.into(),
            parts: Some(parts_value(parts)),
            ..Default::default()
        }
    }

    /// Name shown in result headers, falling back to the role
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.role)
    }

    /// Flat text payload, if `content` is a string
    pub fn content_text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }

    /// Extract the structural shape, or `None` if the message has no text payload.
    ///
    /// `parts` counts only when it is an array and `content` only when it is
    /// a string; anything else (tool results, nested objects) is not text.
    pub fn content_shape(&self) -> Option<MessageContent> {
        if let Some(Value::Array(parts)) = &self.parts {
            return Some(MessageContent::Parts(
                parts.iter().cloned().map(MessagePart).collect(),
            ));
        }
        self.content_text()
            .map(|text| MessageContent::Plain(text.to_string()))
    }

    /// Write a (rewritten) shape back into this message
    pub fn set_content(&mut self, content: MessageContent) {
        match content {
            MessageContent::Plain(text) => self.content = Some(Value::String(text)),
            MessageContent::Parts(parts) => self.parts = Some(parts_value(parts)),
        }
    }
}

fn parts_value(parts: Vec<MessagePart>) -> Value {
    Value::Array(parts.into_iter().map(|part| part.0).collect())
}
