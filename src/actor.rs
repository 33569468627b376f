//! A party to a swap: its swap node, wallets and optional Lightning node

use crate::cnd::{CndClient, SwapApi};
use crate::config::{OrchestratorConfig, Settings};
use crate::coordination::{poll_until, Synchronizer};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::network::{self, ChannelHandle, LightningNode, LndClient};
use crate::siren::Action;
use crate::swap::{ActionKind, Role, Swap};
use crate::wallet::{LightningChannel, Wallets};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Context of one actor
pub struct Actor {
    name: String,
    role: Role,
    cnd: Arc<CndClient>,
    wallets: Wallets,
    lightning: Option<Arc<dyn LightningNode>>,
    config: OrchestratorConfig,
}

impl Actor {
    pub fn new(
        name: impl Into<String>,
        role: Role,
        cnd: CndClient,
        wallets: Wallets,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            cnd: Arc::new(cnd),
            wallets,
            lightning: None,
            config,
        }
    }

    /// Build the actor `name` described in `settings`
    pub fn from_settings(name: &str, settings: &Settings, wallets: Wallets) -> anyhow::Result<Self> {
        let actor = settings.actor(name)?;
        let config = settings.orchestrator.clone();
        let cnd = CndClient::new(&actor.cnd_url, config.http_timeout())?;

        let lightning = match &actor.lnd {
            Some(lnd) => Some(Arc::new(LndClient::new(lnd, config.http_timeout())?) as Arc<dyn LightningNode>),
            None => None,
        };

        let mut actor = Self::new(name, actor.role, cnd, wallets, config);
        actor.lightning = lightning;
        Ok(actor)
    }

    pub fn with_lightning_node(mut self, node: Arc<dyn LightningNode>) -> Self {
        self.lightning = Some(node);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn cnd(&self) -> &CndClient {
        &self.cnd
    }

    pub fn wallets(&self) -> &Wallets {
        &self.wallets
    }

    /// Install the channel this actor pays and invoices through.
    ///
    /// Swaps handed out before this call keep the wallets they were created
    /// with.
    pub fn set_lightning_channel(&mut self, channel: Arc<dyn LightningChannel>) {
        self.wallets.set_lightning(channel);
    }

    fn lightning_node(&self) -> OrchestratorResult<&dyn LightningNode> {
        self.lightning.as_deref().ok_or_else(|| {
            OrchestratorError::Config(format!("Actor {} has no Lightning node configured", self.name))
        })
    }

    /// Handle to the swap at `href` on this actor's node
    pub fn swap(&self, href: impl Into<String>) -> Swap {
        let api: Arc<dyn SwapApi> = self.cnd.clone();
        Swap::new(api, href, self.role, self.wallets.clone())
    }

    /// Peer this actor's swap node with `other`'s
    pub async fn connect(&self, other: &Actor) -> OrchestratorResult<()> {
        info!("Connecting {} to {}", self.name, other.name);
        network::connect_peers(&self.cnd, &other.cnd, self.config.peers()).await
    }

    /// Open a channel to `other`, funded with `amount` sats from this actor
    pub async fn open_channel(&self, other: &Actor, amount: u64) -> OrchestratorResult<ChannelHandle> {
        info!("Opening {} sat channel from {} to {}", amount, self.name, other.name);
        network::open_channel(
            self.lightning_node()?,
            other.lightning_node()?,
            amount,
            &self.config.channel(),
        )
        .await
    }

    /// Wait until the swap node knows about at least one swap and return it
    pub async fn wait_for_swap(&self) -> OrchestratorResult<Swap> {
        let cnd = self.cnd.as_ref();
        let href = poll_until(
            &format!("a swap on {}", self.name),
            self.config.swaps(),
            move || async move { Ok(cnd.swap_hrefs().await?.into_iter().next()) },
        )
        .await?;

        debug!("{} found swap {}", self.name, href);
        Ok(self.swap(href))
    }

    /// Propose a swap by posting `body` to `path`
    pub async fn create_swap(&self, path: &str, body: &serde_json::Value) -> OrchestratorResult<Swap> {
        let href = self.cnd.create_swap(path, body).await?;
        info!("{} created swap {}", self.name, href);
        Ok(self.swap(href))
    }

    /// The action currently recommended for `swap`
    pub async fn next_action(&self, swap: &Swap) -> OrchestratorResult<Option<Action>> {
        swap.next_action().await
    }

    pub async fn wait_for_action_and_confirm(&self, swap: &Swap, action: ActionKind) -> OrchestratorResult<()> {
        Synchronizer::new(self.config.sync())
            .wait_for_action_and_confirm(swap, action)
            .await
    }

    pub async fn wait_for_event(&self, swap: &Swap, action: ActionKind) -> OrchestratorResult<()> {
        Synchronizer::new(self.config.sync())
            .wait_for_event(swap, action)
            .await
    }

    /// Log the full representation of `swap`
    pub async fn dump_state(&self, swap: &Swap) -> OrchestratorResult<serde_json::Value> {
        let entity = self.cnd.fetch_entity::<serde_json::Value>(swap.href()).await?;
        let state = serde_json::to_value(&entity)?;
        debug!("[{}] state of {}: {}", self.name, swap.href(), state);
        Ok(state)
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("cnd", &self.cnd.base_url().as_str())
            .field("wallets", &self.wallets)
            .field("lightning", &self.lightning.is_some())
            .finish()
    }
}
