//! Swap node peering

use crate::cnd::CndClient;
use crate::coordination::{poll_until, PollSchedule};
use crate::error::{OrchestratorError, OrchestratorResult};

use tracing::info;

/// Make `this` node dial `other` and wait until `other` shows up as a peer
pub async fn connect_peers(
    this: &CndClient,
    other: &CndClient,
    schedule: PollSchedule,
) -> OrchestratorResult<()> {
    let identity = other.identity().await?;
    let address = identity.listen_addresses.first().ok_or_else(|| {
        OrchestratorError::ProtocolViolation(format!(
            "node {} advertises no listen address",
            identity.id
        ))
    })?;

    this.dial(std::slice::from_ref(address)).await?;

    let id = identity.id.as_str();
    poll_until(&format!("peer {}", id), schedule, move || async move {
        let peers = this.peers().await?;
        Ok(peers.iter().any(|peer| peer.id == id).then_some(()))
    })
    .await?;

    info!("{} is connected to {}", this.base_url(), id);
    Ok(())
}
