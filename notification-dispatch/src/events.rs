use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message kinds a case thread can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Audio,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MessageType::Text => write!(f, "text"),
            MessageType::Audio => write!(f, "audio"),
        }
    }
}

/// Event emitted when a message is posted to a case thread
///
/// Produced by the web layer after its write commits; this crate only
/// consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreated {
    pub message_id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Text content; empty for audio messages
    #[serde(default)]
    pub content: String,
    pub case_name: String,
    pub created_at: DateTime<Utc>,
}
