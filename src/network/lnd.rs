//! lnd REST client

use super::channel::{Channel, ChannelPoint, LightningNode, NodeInfo};
use crate::config::LndConfig;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Certificate, Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

pub struct LndClient {
    http: Client,
    rest_url: Url,
    macaroon: String,
    p2p_socket: String,
}

#[derive(Serialize)]
struct LightningAddress<'a> {
    pubkey: &'a str,
    host: &'a str,
}

#[derive(Serialize)]
struct ConnectPeerRequest<'a> {
    addr: LightningAddress<'a>,
    perm: bool,
}

#[derive(Serialize)]
struct OpenChannelRequest<'a> {
    node_pubkey_string: &'a str,
    // int64 travels as a string in lnd's JSON mapping
    local_funding_amount: String,
}

#[derive(Deserialize)]
struct ChannelPointResponse {
    funding_txid_bytes: String,
    #[serde(default)]
    output_index: u32,
}

#[derive(Deserialize)]
struct ListChannelsResponse {
    #[serde(default)]
    channels: Vec<ActiveChannel>,
}

#[derive(Deserialize)]
struct ActiveChannel {
    #[serde(default)]
    active: bool,
    chan_id: String,
    channel_point: String,
    #[serde(default)]
    local_balance: String,
    #[serde(default)]
    capacity: String,
}

fn parse_sats(field: &str, value: &str) -> Result<u64> {
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .with_context(|| format!("Invalid {} '{}' from lnd", field, value))
}

impl TryFrom<ChannelPointResponse> for ChannelPoint {
    type Error = anyhow::Error;

    fn try_from(response: ChannelPointResponse) -> Result<Self> {
        let funding_txid_bytes = BASE64
            .decode(&response.funding_txid_bytes)
            .context("Invalid funding txid from lnd")?;

        Ok(ChannelPoint {
            funding_txid_bytes,
            output_index: response.output_index,
        })
    }
}

impl TryFrom<ActiveChannel> for Channel {
    type Error = anyhow::Error;

    fn try_from(channel: ActiveChannel) -> Result<Self> {
        Ok(Channel {
            local_balance: parse_sats("local_balance", &channel.local_balance)?,
            capacity: parse_sats("capacity", &channel.capacity)?,
            chan_id: channel.chan_id,
            channel_point: channel.channel_point,
            active: channel.active,
        })
    }
}

impl LndClient {
    /// Connect to the node described by `config`, reading its credentials
    pub fn new(config: &LndConfig, timeout: Duration) -> Result<Self> {
        let rest_url = Url::parse(&config.rest_url)
            .with_context(|| format!("Invalid lnd REST URL: {}", config.rest_url))?;

        let macaroon = std::fs::read(&config.macaroon_path)
            .with_context(|| format!("Failed to read macaroon: {:?}", config.macaroon_path))?;

        let mut builder = Client::builder().timeout(timeout);
        if let Some(cert_path) = &config.tls_cert_path {
            let pem = std::fs::read(cert_path)
                .with_context(|| format!("Failed to read TLS certificate: {:?}", cert_path))?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        Ok(Self {
            http: builder.build()?,
            rest_url,
            macaroon: hex::encode(macaroon),
            p2p_socket: config.p2p_socket.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.rest_url.join(path)?;
        let response = self
            .http
            .get(url)
            .header(MACAROON_HEADER, &self.macaroon)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.rest_url.join(path)?;
        let response = self
            .http
            .post(url)
            .header(MACAROON_HEADER, &self.macaroon)
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(anyhow!("lnd answered {} on {}: {}", status, url.path(), body));
        }
        debug!("lnd {} -> {}", url.path(), body);

        serde_json::from_str(&body).with_context(|| format!("Unexpected lnd response on {}", url.path()))
    }
}

#[async_trait]
impl LightningNode for LndClient {
    async fn get_info(&self) -> Result<NodeInfo> {
        self.get("/v1/getinfo").await
    }

    async fn connect_peer(&self, pubkey: &str, host: &str) -> Result<()> {
        let request = ConnectPeerRequest {
            addr: LightningAddress { pubkey, host },
            perm: false,
        };
        let _: serde_json::Value = self.post("/v1/peers", &request).await?;
        Ok(())
    }

    async fn open_channel_sync(&self, node_pubkey: &str, local_funding_amount: u64) -> Result<ChannelPoint> {
        let request = OpenChannelRequest {
            node_pubkey_string: node_pubkey,
            local_funding_amount: local_funding_amount.to_string(),
        };
        let response: ChannelPointResponse = self.post("/v1/channels", &request).await?;
        response.try_into()
    }

    async fn list_channels(&self) -> Result<Vec<Channel>> {
        let response: ListChannelsResponse = self.get("/v1/channels").await?;
        response.channels.into_iter().map(Channel::try_from).collect()
    }

    fn p2p_socket(&self) -> String {
        self.p2p_socket.clone()
    }
}
