//! Session controller
//!
//! Owns the server address, the connection status, the selected model and the
//! transcript. Network work runs on spawned tasks; their completions come back
//! as [`SessionEvent`]s which the owner feeds to [`SessionController::apply`]
//! one at a time, so state is only ever mutated from a single place.
//!
//! Probe results carry the generation of the address assignment that started
//! them and chat replies carry the conversation epoch. Anything superseded by a
//! later address change or reset is dropped on arrival.

use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::LemonadeClient;
use crate::config::{Config, DEFAULT_SERVER};
use crate::error::ClientError;
use crate::probe::{probe_plan, probe_server, ProbeOutcome};
use crate::state::{ChatMessage, ConnectionStatus, SessionPhase};

pub const NO_RESPONSE: &str = "No response.";
pub const NO_MODEL_WARNING: &str =
    "Connected, but the server has no models available. Load a model on the server and try again.";

const LOCALHOST: &str = "localhost";
const LOOPBACK_IP: &str = "127.0.0.1";

#[derive(Debug)]
pub enum SessionEvent {
    ProbeFinished { generation: u64, outcome: ProbeOutcome },
    ReplyReceived { epoch: u64, result: Result<String, ClientError> },
    ResetElapsed { epoch: u64 },
}

pub struct SessionController {
    config: Config,
    http: Client,

    address: String,
    address_draft: String,
    status: ConnectionStatus,
    selected_model: Option<String>,
    error_detail: Option<String>,

    transcript: Vec<ChatMessage>,
    pending: bool,
    reset_scheduled: bool,

    probe_generation: u64,
    epoch: u64,

    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionController {
    /// Create the controller and start probing the configured address.
    /// Must be called from within a Tokio runtime.
    pub fn new(config: Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let address = match config.server_address.trim() {
            "" => DEFAULT_SERVER.to_string(),
            configured => configured.to_string(),
        };

        let mut session = Self {
            config,
            http: Client::new(),
            address: String::new(),
            address_draft: address.clone(),
            status: ConnectionStatus::Unknown,
            selected_model: None,
            error_detail: None,
            transcript: Vec::new(),
            pending: false,
            reset_scheduled: false,
            probe_generation: 0,
            epoch: 0,
            tx,
            rx,
        };
        session.set_address(&address);
        session
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn address_draft(&self) -> &str {
        &self.address_draft
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::derive(self.status, self.selected_model.is_some())
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.as_deref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True once nothing is in flight: the probe resolved, no reply is
    /// outstanding and no reset is waiting to re-seed the transcript.
    pub fn is_settled(&self) -> bool {
        self.status != ConnectionStatus::Unknown && !self.pending && !self.reset_scheduled
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Address draft editing

    pub fn set_address_draft(&mut self, draft: impl Into<String>) {
        self.address_draft = draft.into();
    }

    pub fn address_draft_mut(&mut self) -> &mut String {
        &mut self.address_draft
    }

    /// Swap `localhost` and `127.0.0.1` in the draft
    pub fn toggle_loopback_host(&mut self) {
        self.address_draft = swap_loopback_host(&self.address_draft);
    }

    /// Replace the server address and start a fresh probe.
    /// Blank candidates are ignored.
    pub fn set_address(&mut self, candidate: &str) {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            warn!("ignoring empty server address");
            return;
        }

        self.address = candidate.to_string();
        self.address_draft = self.address.clone();
        self.status = ConnectionStatus::Unknown;
        self.selected_model = None;
        self.error_detail = None;

        // Replies and resets for the previous server no longer apply
        self.epoch += 1;
        self.pending = false;
        self.reset_scheduled = false;

        self.probe_generation += 1;
        let generation = self.probe_generation;
        info!(address = %self.address, generation, "probing server");

        let client = LemonadeClient::with_http(self.http.clone(), &self.address);
        let plan = probe_plan(&self.config.endpoints);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = probe_server(&client, &plan).await;
            let _ = tx.send(SessionEvent::ProbeFinished { generation, outcome });
        });
    }

    /// Resubmit whatever is currently in the address field
    pub fn retry(&mut self) {
        let draft = self.address_draft.clone();
        self.set_address(&draft);
    }

    /// Append the prompt and ask the server for a reply.
    /// Returns false when the prompt was not accepted.
    pub fn send_message(&mut self, prompt: &str) -> bool {
        if prompt.trim().is_empty() {
            return false;
        }
        if self.status != ConnectionStatus::Connected {
            debug!("not connected, dropping prompt");
            return false;
        }
        let Some(model) = self.selected_model.clone() else {
            debug!("no model selected, dropping prompt");
            return false;
        };
        if self.pending {
            debug!("request already pending, dropping prompt");
            return false;
        }

        self.transcript.push(ChatMessage::user(prompt));
        self.pending = true;

        let epoch = self.epoch;
        let client = LemonadeClient::with_http(self.http.clone(), &self.address);
        let path = self.config.endpoints.chat.clone();
        let prompt = prompt.to_string();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.chat(&path, &model, &prompt).await;
            let _ = tx.send(SessionEvent::ReplyReceived { epoch, result });
        });
        true
    }

    /// Clear the transcript and re-seed it after the configured delay
    pub fn reset_conversation(&mut self) {
        if self.status != ConnectionStatus::Connected {
            debug!("reset ignored while not connected");
            return;
        }

        self.epoch += 1;
        self.pending = false;
        self.transcript.clear();
        self.reset_scheduled = true;
        info!("conversation reset");

        let epoch = self.epoch;
        let delay = self.config.reset_delay();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionEvent::ResetElapsed { epoch });
        });
    }

    /// Wait for the next completion from a spawned task
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ProbeFinished { generation, outcome } => {
                if generation != self.probe_generation {
                    debug!(generation, current = self.probe_generation, "discarding stale probe");
                    return;
                }
                self.status = outcome.status;
                self.selected_model = outcome.model;
                self.error_detail = outcome.error_detail;
                info!(status = ?self.status, model = ?self.selected_model, "probe resolved");

                if self.status == ConnectionStatus::Connected {
                    self.initialize_conversation();
                }
            }
            SessionEvent::ReplyReceived { epoch, result } => {
                if epoch != self.epoch {
                    debug!(epoch, current = self.epoch, "discarding stale reply");
                    return;
                }
                self.pending = false;

                let content = match result {
                    Ok(content) => content,
                    Err(ClientError::ResponseShape(reason)) => {
                        warn!(%reason, "unexpected completion shape");
                        NO_RESPONSE.to_string()
                    }
                    Err(err) => {
                        warn!(error = %err, "chat request failed");
                        format!("Error: {}", err)
                    }
                };
                self.transcript.push(ChatMessage::assistant(content));
            }
            SessionEvent::ResetElapsed { epoch } => {
                if epoch != self.epoch {
                    return;
                }
                self.reset_scheduled = false;
                if self.status == ConnectionStatus::Connected {
                    self.initialize_conversation();
                }
            }
        }
    }

    /// Seed the transcript with the greeting exchange, or with a warning
    /// when there is no model to talk to.
    fn initialize_conversation(&mut self) {
        self.transcript.clear();

        if self.selected_model.is_some() {
            let greeting = self.config.greeting.clone();
            self.send_message(&greeting);
        } else {
            self.transcript.push(ChatMessage::assistant(NO_MODEL_WARNING));
        }
    }
}

/// `localhost` becomes `127.0.0.1`, otherwise `127.0.0.1` becomes `localhost`
pub fn swap_loopback_host(address: &str) -> String {
    if address.contains(LOCALHOST) {
        address.replacen(LOCALHOST, LOOPBACK_IP, 1)
    } else {
        address.replacen(LOOPBACK_IP, LOCALHOST, 1)
    }
}

/// The host `swap_loopback_host` would switch to
pub fn loopback_alternative(address: &str) -> &'static str {
    if address.contains(LOCALHOST) {
        LOOPBACK_IP
    } else {
        LOCALHOST
    }
}
