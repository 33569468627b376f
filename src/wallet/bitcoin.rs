//! Bitcoin wallet capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bitcoin network names as used by the swap node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitcoinNetwork {
    Main,
    Test,
    Regtest,
}

impl fmt::Display for BitcoinNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BitcoinNetwork::Main => "main",
            BitcoinNetwork::Test => "test",
            BitcoinNetwork::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

/// On-chain Bitcoin wallet.
///
/// Mutating calls carry the network the swap node expects; implementations
/// must refuse to act on any other network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BitcoinWallet: Send + Sync {
    async fn get_address(&self) -> anyhow::Result<String>;

    /// Balance in satoshis
    async fn get_balance(&self) -> anyhow::Result<u64>;

    /// Returns the id of the funding transaction
    async fn send_to_address(
        &self,
        address: &str,
        sats: u64,
        network: BitcoinNetwork,
    ) -> anyhow::Result<String>;

    /// Returns the id of the broadcast transaction
    async fn broadcast_transaction(
        &self,
        transaction_hex: &str,
        network: BitcoinNetwork,
    ) -> anyhow::Result<String>;

    /// Fee rate in satoshis per weight unit
    fn get_fee(&self) -> String;

    async fn mint(&self, sats: u64) -> anyhow::Result<()>;
}
