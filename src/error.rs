//! Error types for the swap orchestrator

use crate::wallet::Ledger;

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No {ledger} wallet configured for this swap")]
    MissingWallet { ledger: Ledger },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Cannot handle ledger action of type '{0}'")]
    UnsupportedActionKind(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Timeout waiting for {awaited}")]
    Timeout { awaited: String },

    #[error("Swap node reported a problem: {0}")]
    Remote(RemoteProblem),

    #[error("Unexpected HTTP status {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Check if the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrchestratorError::Timeout { .. })
    }

    pub(crate) fn timeout(awaited: impl Into<String>) -> Self {
        OrchestratorError::Timeout {
            awaited: awaited.into(),
        }
    }
}

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// A failed wallet call together with everything needed to replay it.
///
/// The message is the wrapped error's message so callers see the wallet's own
/// wording.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct WalletError {
    pub attempted_action: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
    pub call_params: serde_json::Value,
}

impl WalletError {
    pub fn new(
        attempted_action: impl Into<String>,
        source: anyhow::Error,
        call_params: serde_json::Value,
    ) -> Self {
        Self {
            attempted_action: attempted_action.into(),
            source: source.into(),
            call_params,
        }
    }
}

/// Problem document (RFC 7807) returned by the swap node on failure
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteProblem {
    #[serde(rename = "type", default)]
    pub problem_type: Option<String>,
    pub title: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl fmt::Display for RemoteProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(status) = self.status {
            write!(f, " ({})", status)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}
