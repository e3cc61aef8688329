use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::DispatchError;

/// Dispatch target: a broadcast topic or a single device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    Topic(String),
    DeviceToken(String),
}

impl NotificationTarget {
    /// Bare topic name with any `/topics/` routing prefix removed
    pub(crate) fn topic_name(name: &str) -> &str {
        name.strip_prefix("/topics/").unwrap_or(name)
    }

    /// Log-safe description: topics in full, device tokens truncated
    pub fn describe(&self) -> String {
        match self {
            NotificationTarget::Topic(name) => format!("topic:{}", Self::topic_name(name)),
            NotificationTarget::DeviceToken(token) => {
                format!("token:{}", token.chars().take(8).collect::<String>())
            }
        }
    }
}

/// A provider-agnostic notification request
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub target: NotificationTarget,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

/// Terminal state of a single dispatch attempt
#[derive(Debug)]
pub enum DispatchOutcome {
    Delivered,
    MockDelivered,
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DispatchOutcome::Failed(_))
    }
}

/// FCM Message Request
#[derive(Debug, Clone, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageContent,
}

/// FCM Message Content
///
/// Exactly one of `token` / `topic` is populated; the other is omitted
/// from the wire payload entirely.
#[derive(Debug, Clone, Serialize)]
pub struct FcmMessageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub notification: FcmNotification,
    pub data: BTreeMap<String, String>,
}

/// FCM Notification Payload
#[derive(Debug, Clone, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

impl FcmMessage {
    /// Builds the wire payload for a request. Pure, no I/O.
    pub fn build(request: &NotificationRequest) -> Self {
        let (token, topic) = match &request.target {
            NotificationTarget::DeviceToken(token) => (Some(token.clone()), None),
            NotificationTarget::Topic(name) => {
                (None, Some(NotificationTarget::topic_name(name).to_string()))
            }
        };

        Self {
            message: FcmMessageContent {
                token,
                topic,
                notification: FcmNotification {
                    title: request.title.clone(),
                    body: request.body.clone(),
                },
                data: request.data.clone(),
            },
        }
    }
}

/// FCM API Response
#[derive(Debug, Deserialize)]
pub struct FcmApiResponse {
    pub name: Option<String>,
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
}

/// OAuth2 Token Cache
#[derive(Debug, Clone)]
pub(crate) struct TokenCache {
    pub access_token: String,
    pub expires_at: i64,
}

/// JWT Claims for Google OAuth2
#[derive(Debug, Serialize)]
pub(crate) struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target: NotificationTarget) -> NotificationRequest {
        let mut data = BTreeMap::new();
        data.insert("message_id".to_string(), "42".to_string());
        NotificationRequest {
            target,
            title: "New Message in Case: Room 4".to_string(),
            body: "hello".to_string(),
            data,
        }
    }

    #[test]
    fn test_topic_payload_sets_only_topic() {
        let message = FcmMessage::build(&request(NotificationTarget::Topic(
            "teachers".to_string(),
        )));
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["message"]["topic"], "teachers");
        assert!(json["message"].get("token").is_none());
        assert_eq!(json["message"]["notification"]["title"], "New Message in Case: Room 4");
        assert_eq!(json["message"]["data"]["message_id"], "42");
    }

    #[test]
    fn test_token_payload_sets_only_token() {
        let message = FcmMessage::build(&request(NotificationTarget::DeviceToken(
            "registration-token-123".to_string(),
        )));
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["message"]["token"], "registration-token-123");
        assert!(json["message"].get("topic").is_none());
    }

    #[test]
    fn test_topic_routing_prefix_is_stripped() {
        let message = FcmMessage::build(&request(NotificationTarget::Topic(
            "/topics/teachers".to_string(),
        )));
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["message"]["topic"], "teachers");
    }

    #[test]
    fn test_describe_truncates_device_tokens() {
        let target = NotificationTarget::DeviceToken("abcdefghijklmnop".to_string());
        assert_eq!(target.describe(), "token:abcdefgh");

        let short = NotificationTarget::DeviceToken("abc".to_string());
        assert_eq!(short.describe(), "token:abc");

        let topic = NotificationTarget::Topic("/topics/teachers".to_string());
        assert_eq!(topic.describe(), "topic:teachers");
    }

    #[test]
    fn test_outcome_success_flags() {
        assert!(DispatchOutcome::Delivered.is_success());
        assert!(DispatchOutcome::MockDelivered.is_success());
        assert!(
            !DispatchOutcome::Failed(DispatchError::MissingConfiguration("FIREBASE_PROJECT_ID"))
                .is_success()
        );
    }
}
