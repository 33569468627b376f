//! Lightning channel negotiation between two actors' nodes

use crate::coordination::{poll_until, retry, PollSchedule};
use crate::error::{OrchestratorResult, WalletError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainInfo {
    pub chain: String,
    pub network: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeInfo {
    /// Hex-encoded compressed public key
    pub identity_pubkey: String,
    /// Whether the node has caught up with its chain backend
    #[serde(default)]
    pub synced_to_chain: bool,
    #[serde(default)]
    pub chains: Vec<ChainInfo>,
}

/// Funding outpoint of a channel as returned when opening it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPoint {
    /// Funding txid in internal (little-endian) byte order
    pub funding_txid_bytes: Vec<u8>,
    pub output_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Short channel id, decimal as lnd reports it
    pub chan_id: String,
    /// Funding outpoint as `txid:index`
    pub channel_point: String,
    /// Satoshis this side can send
    pub local_balance: u64,
    pub capacity: u64,
    pub active: bool,
}

/// A channel that is known to both parties
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelHandle {
    pub chan_id: String,
    pub channel_point: String,
    pub capacity: u64,
}

/// Channel management on a Lightning node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LightningNode: Send + Sync {
    async fn get_info(&self) -> anyhow::Result<NodeInfo>;

    async fn connect_peer(&self, pubkey: &str, host: &str) -> anyhow::Result<()>;

    /// Returns once the funding transaction is published
    async fn open_channel_sync(
        &self,
        node_pubkey: &str,
        local_funding_amount: u64,
    ) -> anyhow::Result<ChannelPoint>;

    async fn list_channels(&self) -> anyhow::Result<Vec<Channel>>;

    /// `host:port` other nodes reach this node on
    fn p2p_socket(&self) -> String;
}

/// Channel point in the `txid:index` form nodes list channels with
pub fn serialize_channel_point(point: &ChannelPoint) -> String {
    let mut txid = point.funding_txid_bytes.clone();
    txid.reverse();
    format!("{}:{}", hex::encode(txid), point.output_index)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub sync: PollSchedule,
    pub open_attempts: u32,
    pub open_retry_delay: Duration,
    pub listed: PollSchedule,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            sync: PollSchedule::unbounded(Duration::from_millis(500)),
            open_attempts: 5,
            open_retry_delay: Duration::from_millis(1000),
            listed: PollSchedule::bounded(Duration::from_millis(500), Duration::from_secs(5)),
        }
    }
}

/// Open a channel from `this` node to `other`, funded with `amount` sats
pub async fn open_channel(
    this: &dyn LightningNode,
    other: &dyn LightningNode,
    amount: u64,
    config: &ChannelConfig,
) -> OrchestratorResult<ChannelHandle> {
    let other_info = other
        .get_info()
        .await
        .map_err(|e| WalletError::new("get-info", e, json!({})))?;
    let pubkey = other_info.identity_pubkey.as_str();
    let host = other.p2p_socket();

    if let Err(e) = this.connect_peer(pubkey, &host).await {
        warn!("Could not connect to {}@{}, assuming already connected: {}", pubkey, host, e);
    }

    poll_until("both nodes to sync to chain", config.sync, move || async move {
        let (ours, theirs) = futures::try_join!(this.get_info(), other.get_info())
            .map_err(|e| WalletError::new("get-info", e, json!({})))?;
        Ok((ours.synced_to_chain && theirs.synced_to_chain).then_some(()))
    })
    .await?;

    let point = retry(
        "open channel",
        config.open_attempts,
        config.open_retry_delay,
        move || this.open_channel_sync(pubkey, amount),
    )
    .await
    .map_err(|e| {
        WalletError::new(
            "open-channel",
            e,
            json!({ "node_pubkey": pubkey, "local_funding_amount": amount }),
        )
    })?;

    let channel_point = serialize_channel_point(&point);
    info!("Channel funding published at {}", channel_point);

    let wanted = channel_point.as_str();
    let channel = poll_until(&format!("channel {}", wanted), config.listed, move || async move {
        let channels = this
            .list_channels()
            .await
            .map_err(|e| WalletError::new("list-channels", e, json!({})))?;
        Ok(channels.into_iter().find(|c| c.channel_point == wanted))
    })
    .await?;

    info!("Channel {} to {} is open", channel.chan_id, pubkey);
    Ok(ChannelHandle {
        chan_id: channel.chan_id,
        channel_point,
        capacity: channel.capacity,
    })
}
