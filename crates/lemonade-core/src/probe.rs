//! Connection probing
//!
//! A probe walks an ordered list of read-only endpoints and stops at the first
//! one that answers with success. A `404 Not Found` falls through to the next
//! endpoint. Any other error status, or a network-level failure, ends the probe.

use std::fmt;
use tracing::{debug, info, warn};

use crate::client::LemonadeClient;
use crate::config::Endpoints;
use crate::error::ClientError;
use crate::state::ConnectionStatus;

const NOT_FOUND_HINT: &str = " (endpoint not found, check the Lemonade server URL and version)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEndpoint {
    /// Lists models; success also yields the model to target
    Models(String),
    /// Liveness only
    Health(String),
}

impl ProbeEndpoint {
    pub fn path(&self) -> &str {
        match self {
            ProbeEndpoint::Models(path) | ProbeEndpoint::Health(path) => path,
        }
    }
}

/// Models endpoint first, then health
pub fn probe_plan(endpoints: &Endpoints) -> Vec<ProbeEndpoint> {
    vec![
        ProbeEndpoint::Models(endpoints.models.clone()),
        ProbeEndpoint::Health(endpoints.health.clone()),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    NotFound,
    Status(String),
    Unreachable,
    Skipped,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Succeeded => write!(f, "ok"),
            AttemptOutcome::NotFound => write!(f, "404 Not Found"),
            AttemptOutcome::Status(status) => write!(f, "{}", status),
            AttemptOutcome::Unreachable => write!(f, "could not connect"),
            AttemptOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub path: String,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: ConnectionStatus,
    pub model: Option<String>,
    pub error_detail: Option<String>,
    pub attempts: Vec<Attempt>,
}

impl ProbeOutcome {
    /// Paths that were actually requested, in order
    pub fn attempted_paths(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| a.outcome != AttemptOutcome::Skipped)
            .map(|a| a.path.as_str())
            .collect()
    }
}

pub async fn probe_server(client: &LemonadeClient, plan: &[ProbeEndpoint]) -> ProbeOutcome {
    let mut attempts: Vec<Attempt> = Vec::with_capacity(plan.len());
    let mut last_error: Option<ClientError> = None;

    for endpoint in plan {
        let path = endpoint.path().to_string();
        match probe_endpoint(client, endpoint).await {
            Ok(model) => {
                info!(base_url = client.base_url(), %path, ?model, "probe succeeded");
                attempts.push(Attempt { path, outcome: AttemptOutcome::Succeeded });
                return ProbeOutcome {
                    status: ConnectionStatus::Connected,
                    model,
                    error_detail: None,
                    attempts,
                };
            }
            Err(err) if err.is_not_found() => {
                debug!(%path, "endpoint not found, trying next");
                attempts.push(Attempt { path, outcome: AttemptOutcome::NotFound });
                last_error = Some(err);
            }
            Err(err) => {
                warn!(%path, error = %err, "probe failed");
                let outcome = match &err {
                    ClientError::Protocol { status, .. } => AttemptOutcome::Status(status.to_string()),
                    _ => AttemptOutcome::Unreachable,
                };
                attempts.push(Attempt { path, outcome });
                last_error = Some(err);
                break;
            }
        }
    }

    for endpoint in &plan[attempts.len()..] {
        attempts.push(Attempt {
            path: endpoint.path().to_string(),
            outcome: AttemptOutcome::Skipped,
        });
    }

    let error_detail = failure_detail(last_error.as_ref(), &attempts);
    ProbeOutcome {
        status: ConnectionStatus::Failed,
        model: None,
        error_detail: Some(error_detail),
        attempts,
    }
}

async fn probe_endpoint(
    client: &LemonadeClient,
    endpoint: &ProbeEndpoint,
) -> Result<Option<String>, ClientError> {
    match endpoint {
        ProbeEndpoint::Models(path) => match client.list_models(path).await {
            Ok(models) => Ok(models.into_iter().next()),
            // Reachable and answering; we just cannot tell which model to use
            Err(ClientError::ResponseShape(reason)) => {
                warn!(%path, %reason, "could not parse model list");
                Ok(None)
            }
            Err(err) => Err(err),
        },
        ProbeEndpoint::Health(path) => client.check_health(path).await.map(|_| None),
    }
}

fn failure_detail(last_error: Option<&ClientError>, attempts: &[Attempt]) -> String {
    let mut detail = match last_error {
        Some(err) => {
            let mut text = err.to_string();
            if err.is_not_found() {
                text.push_str(NOT_FOUND_HINT);
            }
            text
        }
        None => "No probe endpoints configured".to_string(),
    };

    if !attempts.is_empty() {
        let tried: Vec<String> = attempts
            .iter()
            .map(|a| format!("{} ({})", a.path, a.outcome))
            .collect();
        detail.push_str("\nEndpoints: ");
        detail.push_str(&tried.join(", "));
    }

    detail
}
