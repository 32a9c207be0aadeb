pub mod client;
pub mod config;
pub mod error;
pub mod probe;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use client::LemonadeClient;
pub use config::{Config, Endpoints};
pub use error::ClientError;
pub use probe::{probe_plan, probe_server, Attempt, AttemptOutcome, ProbeEndpoint, ProbeOutcome};
pub use session::{SessionController, SessionEvent};
pub use state::{ChatMessage, ChatRole, ConnectionStatus, SessionPhase};
