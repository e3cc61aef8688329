use std::path::PathBuf;

use thiserror::Error;

/// Credential loading and validation errors
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("no credential file found, searched: {}", paths_list(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read credential file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file {path} is not valid JSON: {detail}")]
    Malformed { path: PathBuf, detail: String },

    #[error("credential file {path} is missing required field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
}

fn paths_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// OAuth2 token acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("token endpoint request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("token endpoint returned status {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("failed to parse token response: {0}")]
    MalformedResponse(String),
}

/// Terminal dispatch errors, surfaced through `DispatchOutcome::Failed`
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("send request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("delivery rejected with status {status}: {body}")]
    Delivery { status: u16, body: String },
}
