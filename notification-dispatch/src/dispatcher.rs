use std::sync::Arc;

use caseline_fcm_shared::{DispatchOutcome, FcmClient};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapter::notification_for_message;
use crate::events::MessageCreated;

/// Dispatches case-message notifications through the shared FCM client
///
/// The entry point the message-create flow calls once its write has
/// committed.
#[derive(Clone)]
pub struct NotificationDispatcher {
    client: Arc<FcmClient>,
}

impl NotificationDispatcher {
    pub fn new(client: Arc<FcmClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &FcmClient {
        &self.client
    }

    /// Sends the notification for a newly created message and returns the
    /// terminal outcome. At most one delivery attempt; retries belong to
    /// the job system that owns the event.
    pub async fn notify(&self, event: &MessageCreated) -> DispatchOutcome {
        let request = notification_for_message(event);
        let outcome = self.client.send(&request).await;

        match &outcome {
            DispatchOutcome::Delivered => info!(
                message_id = %event.message_id,
                message_type = %event.message_type,
                "case message notification delivered"
            ),
            DispatchOutcome::MockDelivered => info!(
                message_id = %event.message_id,
                "case message notification recorded by mock transport"
            ),
            DispatchOutcome::Failed(e) => warn!(
                message_id = %event.message_id,
                error = %e,
                "case message notification failed"
            ),
        }

        outcome
    }

    /// Fire-and-forget variant: delivery runs on its own task so the
    /// triggering request returns immediately. The handle can be awaited or
    /// dropped.
    pub fn notify_detached(&self, event: MessageCreated) -> JoinHandle<DispatchOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.notify(&event).await })
    }
}

#[cfg(test)]
mod tests {
    use caseline_fcm_shared::FcmConfig;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::events::MessageType;

    fn mock_dispatcher() -> NotificationDispatcher {
        let client = FcmClient::new(FcmConfig::new("https://fcm-mock.caseline.internal"));
        NotificationDispatcher::new(Arc::new(client))
    }

    fn sample_event() -> MessageCreated {
        MessageCreated {
            message_id: Uuid::new_v4(),
            message_type: MessageType::Text,
            content: "the projector in room 4 is broken again".to_string(),
            case_name: "Room 4".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_notify_records_through_mock_transport() {
        let dispatcher = mock_dispatcher();
        let event = sample_event();

        let outcome = dispatcher.notify(&event).await;
        assert!(matches!(outcome, DispatchOutcome::MockDelivered));

        let deliveries = dispatcher.client().mock_transport().deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].message.topic.as_deref(), Some("teachers"));
        assert_eq!(
            deliveries[0].message.notification.title,
            "New Message in Case: Room 4"
        );
        assert_eq!(
            deliveries[0].message.data.get("message_id"),
            Some(&event.message_id.to_string())
        );
    }

    #[tokio::test]
    async fn test_notify_detached_completes_on_its_own_task() {
        let dispatcher = mock_dispatcher();

        let outcome = dispatcher.notify_detached(sample_event()).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::MockDelivered));
        assert_eq!(dispatcher.client().mock_transport().deliveries().len(), 1);
    }
}
