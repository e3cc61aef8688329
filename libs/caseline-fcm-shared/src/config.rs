use std::env;
use std::path::PathBuf;

/// Endpoints containing this marker route deliveries to the mock transport
const MOCK_ENDPOINT_MARKER: &str = "mock";

const DEFAULT_SEND_ENDPOINT: &str = "https://fcm.googleapis.com";
const DEFAULT_IID_ENDPOINT: &str = "https://iid.googleapis.com";
const DEFAULT_CREDENTIALS_PATH: &str = "storage/app/firebase_credentials.json";
const FALLBACK_CREDENTIALS_PATH: &str = "/etc/secrets/firebase_credentials.json";

/// FCM client configuration
///
/// `project_id` may be absent when the endpoint designates the mock
/// transport; real deliveries require it.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: Option<String>,
    pub send_endpoint: String,
    pub iid_endpoint: String,
    pub credentials_path: PathBuf,
}

impl FcmConfig {
    /// Creates a configuration for the given send endpoint
    pub fn new(send_endpoint: impl Into<String>) -> Self {
        Self {
            project_id: None,
            send_endpoint: send_endpoint.into(),
            iid_endpoint: DEFAULT_IID_ENDPOINT.to_string(),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
        }
    }

    /// Loads FCM config from environment variables
    pub fn from_env() -> Self {
        Self {
            project_id: env::var("FIREBASE_PROJECT_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            send_endpoint: env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_SEND_ENDPOINT.to_string()),
            iid_endpoint: env::var("FCM_IID_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_IID_ENDPOINT.to_string()),
            credentials_path: env::var("FIREBASE_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CREDENTIALS_PATH)),
        }
    }

    /// Set the Firebase project id
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Set the primary credential file location
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Set the instance-ID API endpoint
    pub fn with_iid_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.iid_endpoint = endpoint.into();
        self
    }

    /// True when the configured endpoint designates the mock transport
    pub fn is_mock_endpoint(&self) -> bool {
        self.send_endpoint.contains(MOCK_ENDPOINT_MARKER)
    }

    /// Candidate credential file locations, in search order
    pub fn credential_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.credentials_path.clone()];
        let fallback = PathBuf::from(FALLBACK_CREDENTIALS_PATH);
        if fallback != self.credentials_path {
            candidates.push(fallback);
        }
        candidates
    }
}
