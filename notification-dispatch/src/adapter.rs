use std::collections::BTreeMap;

use caseline_fcm_shared::{NotificationRequest, NotificationTarget};

use crate::events::{MessageCreated, MessageType};

/// Broadcast topic every staff device subscribes to
///
/// Single-tenant deployment: all notifications fan out to one topic, with
/// no per-case or per-recipient targeting. Known limitation.
pub const BROADCAST_TOPIC: &str = "teachers";

/// Characters of message text carried into the notification body
const BODY_PREVIEW_CHARS: usize = 50;

const AUDIO_BODY: &str = "Audio message received.";

/// Builds the notification request for a newly created case message
pub fn notification_for_message(event: &MessageCreated) -> NotificationRequest {
    let body = match event.message_type {
        MessageType::Audio => AUDIO_BODY.to_string(),
        MessageType::Text => truncate_chars(&event.content, BODY_PREVIEW_CHARS),
    };

    let mut data = BTreeMap::new();
    data.insert("message_id".to_string(), event.message_id.to_string());

    NotificationRequest {
        target: NotificationTarget::Topic(BROADCAST_TOPIC.to_string()),
        title: format!("New Message in Case: {}", event.case_name),
        body,
        data,
    }
}

/// Hard prefix cut, no ellipsis, no word-boundary adjustment
fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
