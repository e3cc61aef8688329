use std::sync::Mutex;

use tracing::info;

use crate::models::FcmMessage;

/// A topic subscription the mock transport accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubscription {
    pub device_token: String,
    pub topic: String,
}

/// Delivery path for non-production endpoints
///
/// Records would-be deliveries instead of touching the network, so mock
/// environments work with no credentials and no project configured. This is
/// the one place payload contents are allowed into the logs.
#[derive(Debug, Default)]
pub struct MockTransport {
    deliveries: Mutex<Vec<FcmMessage>>,
    subscriptions: Mutex<Vec<RecordedSubscription>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliver(&self, message: FcmMessage) {
        info!(
            payload = %serde_json::to_string(&message)
                .unwrap_or_else(|_| "<unserializable>".to_string()),
            "mock FCM delivery"
        );
        self.deliveries
            .lock()
            .expect("mock delivery log poisoned")
            .push(message);
    }

    pub fn record_subscription(&self, device_token: &str, topic: &str) {
        info!(device_token, topic, "mock FCM topic subscription");
        self.subscriptions
            .lock()
            .expect("mock subscription log poisoned")
            .push(RecordedSubscription {
                device_token: device_token.to_string(),
                topic: topic.to_string(),
            });
    }

    /// Deliveries recorded so far, oldest first
    pub fn deliveries(&self) -> Vec<FcmMessage> {
        self.deliveries
            .lock()
            .expect("mock delivery log poisoned")
            .clone()
    }

    /// Subscriptions recorded so far, oldest first
    pub fn subscriptions(&self) -> Vec<RecordedSubscription> {
        self.subscriptions
            .lock()
            .expect("mock subscription log poisoned")
            .clone()
    }
}
