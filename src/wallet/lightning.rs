//! Lightning channel capability

use async_trait::async_trait;

/// One funded Lightning channel owned by an actor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LightningChannel: Send + Sync {
    /// Local balance of the channel in satoshis
    async fn get_balance(&self) -> anyhow::Result<u64>;

    /// Resolves once the payment is in flight
    async fn send_payment(
        &self,
        to_public_key: &str,
        sats: u64,
        secret_hash: &str,
        final_cltv_delta: u32,
    ) -> anyhow::Result<()>;

    /// Returns the payment request of the new hold invoice
    async fn add_hold_invoice(
        &self,
        sats: u64,
        secret_hash: &str,
        expiry: u32,
        cltv_expiry: u32,
    ) -> anyhow::Result<String>;

    async fn settle_invoice(&self, secret: &str) -> anyhow::Result<()>;

    /// Fails unless the underlying node is the one the swap node talks to
    async fn assert_lnd_details(
        &self,
        self_public_key: &str,
        chain: &str,
        network: &str,
    ) -> anyhow::Result<()>;
}
