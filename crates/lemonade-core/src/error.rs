use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the inference server
#[derive(Debug, Error)]
pub enum ClientError {
    /// Host unreachable, DNS failure, timeout, or a malformed address
    #[error("Could not connect: {0}")]
    Connectivity(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server responded with status {status}{}", body_suffix(.body))]
    Protocol { status: StatusCode, body: String },

    /// The call succeeded but the body was not what we expected
    #[error("Unexpected response body: {0}")]
    ResponseShape(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Protocol { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::ResponseShape(err.to_string())
        } else {
            ClientError::Connectivity(err)
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::ResponseShape(err.to_string())
    }
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!("\n{}", body)
    }
}
