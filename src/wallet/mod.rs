//! Wallet capabilities consumed by the orchestrator
//!
//! Wallet implementations live outside this crate. The orchestrator only needs:
//! - a Bitcoin wallet for sending, broadcasting and address/fee lookups
//! - an Ethereum wallet for contract deployment and calls
//! - a Lightning channel for payments and hold invoices

pub mod bitcoin;
pub mod ethereum;
pub mod lightning;

pub use self::bitcoin::{BitcoinNetwork, BitcoinWallet};
pub use self::ethereum::EthereumWallet;
pub use self::lightning::LightningChannel;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::siren::{Field, FieldValueResolver};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Ledgers an actor can hold a wallet for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ledger {
    Bitcoin,
    Ethereum,
    Lightning,
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ledger::Bitcoin => "bitcoin",
            Ledger::Ethereum => "ethereum",
            Ledger::Lightning => "lightning",
        };
        f.write_str(name)
    }
}

/// Registry of the wallets an actor brings to a swap.
///
/// Cloning shares the underlying wallets.
#[derive(Clone, Default)]
pub struct Wallets {
    bitcoin: Option<Arc<dyn BitcoinWallet>>,
    ethereum: Option<Arc<dyn EthereumWallet>>,
    lightning: Option<Arc<dyn LightningChannel>>,
}

impl Wallets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bitcoin(mut self, wallet: Arc<dyn BitcoinWallet>) -> Self {
        self.bitcoin = Some(wallet);
        self
    }

    pub fn with_ethereum(mut self, wallet: Arc<dyn EthereumWallet>) -> Self {
        self.ethereum = Some(wallet);
        self
    }

    pub fn with_lightning(mut self, channel: Arc<dyn LightningChannel>) -> Self {
        self.lightning = Some(channel);
        self
    }

    /// Install the channel opened for this actor
    pub fn set_lightning(&mut self, channel: Arc<dyn LightningChannel>) {
        self.lightning = Some(channel);
    }

    pub fn bitcoin(&self) -> OrchestratorResult<&Arc<dyn BitcoinWallet>> {
        self.bitcoin.as_ref().ok_or(OrchestratorError::MissingWallet {
            ledger: Ledger::Bitcoin,
        })
    }

    pub fn ethereum(&self) -> OrchestratorResult<&Arc<dyn EthereumWallet>> {
        self.ethereum.as_ref().ok_or(OrchestratorError::MissingWallet {
            ledger: Ledger::Ethereum,
        })
    }

    pub fn lightning(&self) -> OrchestratorResult<&Arc<dyn LightningChannel>> {
        self.lightning.as_ref().ok_or(OrchestratorError::MissingWallet {
            ledger: Ledger::Lightning,
        })
    }

    /// Ledgers with a configured wallet
    pub fn ledgers(&self) -> Vec<Ledger> {
        let mut ledgers = Vec::new();
        if self.bitcoin.is_some() {
            ledgers.push(Ledger::Bitcoin);
        }
        if self.ethereum.is_some() {
            ledgers.push(Ledger::Ethereum);
        }
        if self.lightning.is_some() {
            ledgers.push(Ledger::Lightning);
        }
        ledgers
    }
}

impl fmt::Debug for Wallets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallets")
            .field("ledgers", &self.ledgers())
            .finish()
    }
}

#[async_trait]
impl FieldValueResolver for Wallets {
    async fn resolve(&self, field: &Field) -> anyhow::Result<Option<String>> {
        let value = if field.has_class("bitcoin") && field.has_class("address") {
            Some(self.bitcoin()?.get_address().await?)
        } else if field.has_class("bitcoin") && field.has_class("feePerWU") {
            Some(self.bitcoin()?.get_fee())
        } else if field.has_class("ethereum") && field.has_class("address") {
            Some(format!("{:?}", self.ethereum()?.get_account()))
        } else {
            None
        };

        debug!("Resolved field '{}' to {:?}", field.name, value);
        Ok(value)
    }
}
