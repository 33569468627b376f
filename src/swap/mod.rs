//! Swap handles and the protocol vocabulary shared with the swap node

use crate::cnd::SwapApi;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::ledger::{self, LedgerAction};
use crate::siren::{self, Action, Entity};
use crate::wallet::Wallets;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Role an actor plays in a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Alice,
    Bob,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Alice => f.write_str("Alice"),
            Role::Bob => f.write_str("Bob"),
        }
    }
}

/// Ledger protocol of one leg of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerProtocol {
    Hbit,
    Halbit,
    Herc20,
}

impl fmt::Display for LedgerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LedgerProtocol::Hbit => "hbit",
            LedgerProtocol::Halbit => "halbit",
            LedgerProtocol::Herc20 => "herc20",
        };
        f.write_str(name)
    }
}

/// Names of the actions the swap node recommends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Init,
    Deploy,
    Fund,
    Redeem,
    Refund,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Init => "init",
            ActionKind::Deploy => "deploy",
            ActionKind::Fund => "fund",
            ActionKind::Redeem => "redeem",
            ActionKind::Refund => "refund",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(ActionKind::Init),
            "deploy" => Ok(ActionKind::Deploy),
            "fund" => Ok(ActionKind::Fund),
            "redeem" => Ok(ActionKind::Redeem),
            "refund" => Ok(ActionKind::Refund),
            other => Err(OrchestratorError::Config(format!(
                "unknown action '{}', expected one of init, deploy, fund, redeem, refund",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Deployed,
    Funded,
    Redeemed,
    Refunded,
}

/// A milestone the swap node appends to a swap's event log, e.g. `hbit_funded`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolEvent {
    pub protocol: LedgerProtocol,
    pub kind: EventKind,
}

impl fmt::Display for ProtocolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            EventKind::Deployed => "deployed",
            EventKind::Funded => "funded",
            EventKind::Redeemed => "redeemed",
            EventKind::Refunded => "refunded",
        };
        write!(f, "{}_{}", self.protocol, kind)
    }
}

/// Event that confirms `action` was executed by `role`.
///
/// Alice funds and refunds on the alpha ledger and redeems on the beta
/// ledger; Bob does the opposite. Only herc20 has a deploy step.
pub fn next_expected_event(
    role: Role,
    action: ActionKind,
    alpha: LedgerProtocol,
    beta: LedgerProtocol,
) -> Option<ProtocolEvent> {
    let (protocol, kind) = match (action, role) {
        (ActionKind::Init, _) => return None,
        (ActionKind::Deploy, _) => (LedgerProtocol::Herc20, EventKind::Deployed),
        (ActionKind::Fund, Role::Alice) => (alpha, EventKind::Funded),
        (ActionKind::Fund, Role::Bob) => (beta, EventKind::Funded),
        (ActionKind::Refund, Role::Alice) => (alpha, EventKind::Refunded),
        (ActionKind::Refund, Role::Bob) => (beta, EventKind::Refunded),
        (ActionKind::Redeem, Role::Alice) => (beta, EventKind::Redeemed),
        (ActionKind::Redeem, Role::Bob) => (alpha, EventKind::Redeemed),
    };

    Some(ProtocolEvent { protocol, kind })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerLeg {
    pub protocol: LedgerProtocol,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapEvent {
    pub name: String,
}

/// Properties of a swap resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapProperties {
    pub role: Role,
    pub alpha: LedgerLeg,
    pub beta: LedgerLeg,
    #[serde(default)]
    pub events: Vec<SwapEvent>,
}

impl SwapProperties {
    pub fn has_event(&self, event: &ProtocolEvent) -> bool {
        let name = event.to_string();
        self.events.iter().any(|e| e.name == name)
    }

    /// Event confirming `action` in this swap
    pub fn expected_event(&self, action: ActionKind) -> Option<ProtocolEvent> {
        next_expected_event(self.role, action, self.alpha.protocol, self.beta.protocol)
    }
}

pub type SwapEntity = Entity<SwapProperties>;

/// Handle to one swap on an actor's swap node.
///
/// Wallets are shared with the owning actor.
#[derive(Clone)]
pub struct Swap {
    href: String,
    role: Role,
    wallets: Wallets,
    api: Arc<dyn SwapApi>,
}

impl Swap {
    pub fn new(api: Arc<dyn SwapApi>, href: impl Into<String>, role: Role, wallets: Wallets) -> Self {
        Self {
            href: href.into(),
            role,
            wallets,
            api,
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn wallets(&self) -> &Wallets {
        &self.wallets
    }

    /// Current representation of the swap
    pub async fn fetch(&self) -> OrchestratorResult<SwapEntity> {
        self.api.fetch_swap(&self.href).await
    }

    /// The action currently recommended by the swap node, if any
    pub async fn next_action(&self) -> OrchestratorResult<Option<Action>> {
        let entity = self.fetch().await?;
        siren::resolve_next_action(&entity)
    }

    /// Execute `action` and carry out the ledger instruction it yields.
    ///
    /// Returns the ledger id produced by the wallet, or `None` when the node
    /// answered without a ledger instruction.
    pub async fn execute(&self, action: &Action) -> OrchestratorResult<Option<String>> {
        let response = self.api.execute_action(action, &self.wallets).await?;
        debug!(
            "Action '{}' on swap {} answered with status {}",
            action.name, self.href, response.status
        );

        match LedgerAction::from_response_body(&response.body)? {
            Some(ledger_action) => {
                info!(
                    "Action '{}' on swap {} requires {}",
                    action.name,
                    self.href,
                    ledger_action.kind()
                );
                ledger::dispatch(&ledger_action, &self.wallets).await.map(Some)
            }
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Swap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Swap")
            .field("href", &self.href)
            .field("role", &self.role)
            .field("wallets", &self.wallets)
            .finish()
    }
}
