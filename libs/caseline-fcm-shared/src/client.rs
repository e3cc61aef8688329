use std::time::Duration;

use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::auth::TokenProvider;
use crate::config::FcmConfig;
use crate::credentials::CredentialStore;
use crate::errors::DispatchError;
use crate::mock::MockTransport;
use crate::models::{
    DispatchOutcome, FcmApiResponse, FcmMessage, NotificationRequest, NotificationTarget,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Firebase Cloud Messaging client
///
/// Routes notifications to the FCM v1 send API, or to the mock transport
/// when the configured endpoint designates a non-production environment.
/// Credentials are loaded lazily on the first real delivery and cached for
/// the life of the client; a failed load is not cached.
pub struct FcmClient {
    config: FcmConfig,
    http_client: Client,
    token_provider: OnceCell<TokenProvider>,
    mock: MockTransport,
}

impl FcmClient {
    pub fn new(config: FcmConfig) -> Self {
        let http_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("HTTP client construction failed");

        Self {
            config,
            http_client,
            token_provider: OnceCell::new(),
            mock: MockTransport::new(),
        }
    }

    /// Create a client configured from environment variables
    pub fn from_env() -> Self {
        Self::new(FcmConfig::from_env())
    }

    pub fn config(&self) -> &FcmConfig {
        &self.config
    }

    /// The mock delivery log. Only ever written on mock endpoints.
    pub fn mock_transport(&self) -> &MockTransport {
        &self.mock
    }

    /// Sends a notification and returns the terminal outcome
    ///
    /// The mock bypass is evaluated before configuration or credentials are
    /// touched, so non-production environments need no secrets. Errors are
    /// folded into `DispatchOutcome::Failed`, never panicked or rethrown.
    /// At most one delivery attempt per call.
    pub async fn send(&self, request: &NotificationRequest) -> DispatchOutcome {
        if self.config.is_mock_endpoint() {
            self.mock.deliver(FcmMessage::build(request));
            info!(to = %request.target.describe(), "mock FCM delivery recorded");
            return DispatchOutcome::MockDelivered;
        }

        match self.try_send(request).await {
            Ok(()) => {
                info!(to = %request.target.describe(), "FCM notification delivered");
                DispatchOutcome::Delivered
            }
            Err(e) => {
                error!(
                    to = %request.target.describe(),
                    error = %e,
                    "FCM notification failed"
                );
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn try_send(&self, request: &NotificationRequest) -> Result<(), DispatchError> {
        let project_id = self
            .config
            .project_id
            .as_deref()
            .ok_or(DispatchError::MissingConfiguration("FIREBASE_PROJECT_ID"))?;

        let token = self.token_provider().await?.access_token().await?;

        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.config.send_endpoint.trim_end_matches('/'),
            project_id
        );
        let payload = FcmMessage::build(request);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Delivery {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: FcmApiResponse =
            response.json().await.unwrap_or(FcmApiResponse { name: None });
        if let Some(name) = api_response.name {
            debug!(%name, "FCM accepted message");
        }

        Ok(())
    }

    /// Subscribes a device token to a topic via the instance-ID API
    ///
    /// True only when the provider acknowledged the subscription with a 2xx
    /// response; every failure is logged and reported as false. On mock
    /// endpoints the subscription is recorded and acknowledged locally.
    pub async fn subscribe_to_topic(&self, device_token: &str, topic: &str) -> bool {
        let topic = NotificationTarget::topic_name(topic);

        if self.config.is_mock_endpoint() {
            self.mock.record_subscription(device_token, topic);
            return true;
        }

        match self.try_subscribe(device_token, topic).await {
            Ok(()) => {
                info!(
                    topic,
                    device = %token_prefix(device_token),
                    "FCM topic subscription added"
                );
                true
            }
            Err(e) => {
                warn!(
                    topic,
                    device = %token_prefix(device_token),
                    error = %e,
                    "FCM topic subscription failed"
                );
                false
            }
        }
    }

    async fn try_subscribe(&self, device_token: &str, topic: &str) -> Result<(), DispatchError> {
        let token = self.token_provider().await?.access_token().await?;

        let url = format!(
            "{}/iid/v1:batchAdd",
            self.config.iid_endpoint.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "to": format!("/topics/{}", topic),
            "registration_tokens": [device_token],
        });

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("access_token_auth", "true")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Delivery {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn token_provider(&self) -> Result<&TokenProvider, DispatchError> {
        self.token_provider
            .get_or_try_init(|| async {
                let store = CredentialStore::new(self.config.credential_candidates());
                let credentials = store.load()?;
                Ok::<_, DispatchError>(TokenProvider::new(
                    credentials,
                    self.http_client.clone(),
                ))
            })
            .await
    }
}

/// First characters of a device token, for log lines
fn token_prefix(token: &str) -> String {
    token.chars().take(8).collect()
}
