//! Swap Orchestrator - drives hypermedia atomic-swap nodes to completion
//!
//! The orchestrator repeatedly asks an actor's swap node which action comes
//! next, executes it against the actor's wallets and waits until the swap's
//! event log confirms the step before moving on.

pub mod actor;
pub mod cnd;
pub mod config;
pub mod coordination;
pub mod error;
pub mod ledger;
pub mod network;
pub mod siren;
pub mod swap;
pub mod wallet;

pub use actor::Actor;
pub use cnd::{CndClient, SwapApi};
pub use config::Settings;
pub use error::{OrchestratorError, OrchestratorResult, RemoteProblem, WalletError};
pub use ledger::LedgerAction;
pub use swap::{next_expected_event, ActionKind, Role, Swap};
pub use wallet::{Ledger, Wallets};
