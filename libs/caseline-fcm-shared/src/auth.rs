use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::credentials::ServiceAccountKey;
use crate::errors::AuthError;
use crate::models::{GoogleTokenResponse, JwtClaims, TokenCache};

/// OAuth2 scope for the FCM v1 API. Fixed, not configurable.
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A cached token is treated as expired this many seconds early
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Exchanges service account credentials for short-lived bearer tokens at
/// the Google OAuth2 token endpoint, caching each token until near expiry.
///
/// Concurrent callers share a cached token; a refresh is performed by
/// exactly one caller while the rest wait for its result. No retries here,
/// retry policy belongs to the dispatch caller.
pub struct TokenProvider {
    credentials: ServiceAccountKey,
    http_client: Client,
    cache: RwLock<Option<TokenCache>>,
    refresh_lock: Mutex<()>,
}

impl TokenProvider {
    pub fn new(credentials: ServiceAccountKey, http_client: Client) -> Self {
        Self {
            credentials,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns a bearer token for the messaging scope, refreshing when the
    /// cached one is missing or inside the expiry margin.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let (access_token, expires_at) = self.exchange().await?;
        *self.cache.write().await = Some(TokenCache {
            access_token: access_token.clone(),
            expires_at,
        });

        Ok(access_token)
    }

    async fn cached_token(&self) -> Option<String> {
        let cache = self.cache.read().await;
        cache.as_ref().and_then(|cached| {
            if cached.expires_at > Utc::now().timestamp() + EXPIRY_MARGIN_SECS {
                Some(cached.access_token.clone())
            } else {
                None
            }
        })
    }

    /// One signed-assertion exchange against the token endpoint
    async fn exchange(&self) -> Result<(String, i64), AuthError> {
        let assertion = self.signed_assertion()?;

        let params = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        let expires_at = Utc::now().timestamp() + token_response.expires_in;
        info!(
            client_email = %self.credentials.client_email,
            expires_in = token_response.expires_in,
            "obtained fresh access token"
        );

        Ok((token_response.access_token, expires_at))
    }

    fn signed_assertion(&self) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            sub: self.credentials.client_email.clone(),
            scope: FIREBASE_MESSAGING_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.credentials.private_key_id.clone();

        let encoding_key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::testutil::{test_credentials, token_body};

    #[tokio::test]
    async fn test_valid_token_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("token-1", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TokenProvider::new(
            test_credentials(format!("{}/token", server.uri())),
            Client::new(),
        );

        assert_eq!(provider.access_token().await.unwrap(), "token-1");
        assert_eq!(provider.access_token().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_expired_token_triggers_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("token-2", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TokenProvider::new(
            test_credentials(format!("{}/token", server.uri())),
            Client::new(),
        );

        // Inside the 60s margin, so the next call must refresh.
        *provider.cache.write().await = Some(TokenCache {
            access_token: "stale".to_string(),
            expires_at: Utc::now().timestamp() + 30,
        });

        assert_eq!(provider.access_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("token-3", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TokenProvider::new(
            test_credentials(format!("{}/token", server.uri())),
            Client::new(),
        );

        let (first, second) =
            futures::future::join(provider.access_token(), provider.access_token()).await;

        assert_eq!(first.unwrap(), "token-3");
        assert_eq!(second.unwrap(), "token-3");
    }

    #[tokio::test]
    async fn test_token_endpoint_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
            .mount(&server)
            .await;

        let provider = TokenProvider::new(
            test_credentials(format!("{}/token", server.uri())),
            Client::new(),
        );

        match provider.access_token().await.unwrap_err() {
            AuthError::TokenEndpoint { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream broke");
            }
            other => panic!("expected TokenEndpoint, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_key_is_a_signing_error() {
        let mut credentials = test_credentials("https://oauth2.example.com/token".to_string());
        credentials.private_key = "not a pem key".to_string();

        let provider = TokenProvider::new(credentials, Client::new());

        assert!(matches!(
            provider.access_token().await.unwrap_err(),
            AuthError::Signing(_)
        ));
    }
}
