/// Caseline FCM Shared Library
///
/// This library provides the Firebase Cloud Messaging (FCM) client used to
/// push case-thread notifications to staff devices.
///
/// It handles:
/// - Service account credential loading and validation
/// - OAuth2 token generation and caching with automatic refresh
/// - Topic and device-token message delivery via the FCM v1 API
/// - Topic subscriptions through the instance-ID API
/// - A mock delivery path for non-production environments
pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod mock;
pub mod models;

#[cfg(test)]
pub(crate) mod testutil;

pub use auth::TokenProvider;
pub use client::FcmClient;
pub use config::FcmConfig;
pub use credentials::{CredentialStore, ServiceAccountKey};
pub use errors::{AuthError, CredentialError, DispatchError};
pub use mock::{MockTransport, RecordedSubscription};
pub use models::{DispatchOutcome, FcmMessage, NotificationRequest, NotificationTarget};
