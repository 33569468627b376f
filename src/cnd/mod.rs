//! HTTP client for a swap node (cnd)

pub mod action;

pub use action::{build_action_request, resolve_fields, ActionResponse};

use crate::error::{OrchestratorError, OrchestratorResult, RemoteProblem};
use crate::siren::{Action, Entity, FieldValueResolver};
use crate::swap::SwapEntity;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Read and act on swaps held by a swap node
#[async_trait]
pub trait SwapApi: Send + Sync {
    async fn fetch_swap(&self, href: &str) -> OrchestratorResult<SwapEntity>;

    async fn execute_action(
        &self,
        action: &Action,
        resolver: &dyn FieldValueResolver,
    ) -> OrchestratorResult<ActionResponse>;
}

/// Identity of a swap node as returned by `GET /`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeIdentity {
    pub id: String,
    #[serde(default)]
    pub listen_addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Peer {
    pub id: String,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PeersResponse {
    #[serde(default)]
    peers: Vec<Peer>,
}

#[derive(Debug, Serialize)]
struct DialRequest<'a> {
    addresses: &'a [String],
}

/// Client for one swap node's REST API
#[derive(Debug, Clone)]
pub struct CndClient {
    http: Client,
    base_url: Url,
}

impl CndClient {
    pub fn new(base_url: &str, timeout: Duration) -> OrchestratorResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            OrchestratorError::Config(format!("Invalid swap node URL '{}': {}", base_url, e))
        })?;
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a link relative to the node's base URL
    pub fn url(&self, href: &str) -> OrchestratorResult<Url> {
        self.base_url.join(href).map_err(|e| {
            OrchestratorError::ProtocolViolation(format!("invalid href '{}': {}", href, e))
        })
    }

    /// Fetch any Siren entity from the node
    pub async fn fetch_entity<P: DeserializeOwned>(&self, href: &str) -> OrchestratorResult<Entity<P>> {
        self.get_json(href).await
    }

    /// Node identity and the addresses it listens on
    pub async fn identity(&self) -> OrchestratorResult<NodeIdentity> {
        self.get_json("/").await
    }

    /// Ask the node to dial another node
    pub async fn dial(&self, addresses: &[String]) -> OrchestratorResult<()> {
        let url = self.url("/dial")?;
        debug!("Dialing {:?} from {}", addresses, self.base_url);

        let response = self
            .http
            .post(url)
            .json(&DialRequest { addresses })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Peers the node is currently connected to
    pub async fn peers(&self) -> OrchestratorResult<Vec<Peer>> {
        let response: PeersResponse = self.get_json("/peers").await?;
        Ok(response.peers)
    }

    /// Links to every swap the node knows about
    pub async fn swap_hrefs(&self) -> OrchestratorResult<Vec<String>> {
        let swaps: Entity = self.get_json("/swaps").await?;
        Ok(swaps.entities.into_iter().filter_map(|e| e.href).collect())
    }

    /// Post a new swap and return the link to it
    pub async fn create_swap(&self, path: &str, body: &serde_json::Value) -> OrchestratorResult<String> {
        let url = self.url(path)?;
        let response = self.http.post(url).json(body).send().await?;
        let response = check_status(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                OrchestratorError::ProtocolViolation(format!(
                    "swap created at {} without a Location header",
                    path
                ))
            })?;

        debug!("Swap created at {}", location);
        Ok(location.to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, href: &str) -> OrchestratorResult<T> {
        let url = self.url(href)?;
        let response = check_status(self.http.get(url).send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SwapApi for CndClient {
    async fn fetch_swap(&self, href: &str) -> OrchestratorResult<SwapEntity> {
        self.get_json(href).await
    }

    async fn execute_action(
        &self,
        action: &Action,
        resolver: &dyn FieldValueResolver,
    ) -> OrchestratorResult<ActionResponse> {
        let values = resolve_fields(action, resolver).await?;
        let request = build_action_request(&self.http, self.url(&action.href)?, action, &values)?;

        let response = check_status(self.http.execute(request).await?).await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        Ok(ActionResponse { status, body })
    }
}

/// Map a non-2xx response to an error, preferring the node's problem document
async fn check_status(response: Response) -> OrchestratorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await?;
    warn!("{} answered {}: {}", url, status, body);

    match serde_json::from_str::<RemoteProblem>(&body) {
        Ok(problem) => Err(OrchestratorError::Remote(problem)),
        Err(_) => Err(OrchestratorError::Http { status, body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_resolve_against_the_node() {
        let client = CndClient::new("http://127.0.0.1:8000", Duration::from_secs(5)).unwrap();

        assert_eq!(
            client.url("/swaps/abc").unwrap().as_str(),
            "http://127.0.0.1:8000/swaps/abc"
        );
        assert_eq!(
            client.url("http://10.0.0.2:8000/swaps/abc").unwrap().as_str(),
            "http://10.0.0.2:8000/swaps/abc"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let error = CndClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(error, OrchestratorError::Config(_)));
    }

    #[test]
    fn identity_and_peers_deserialize() {
        let identity: NodeIdentity = serde_json::from_str(
            r#"{"id":"QmXfGiwNESAFWUvDVJ4NLaKYYVopYdV5HbpDSgz5TSypkb","listen_addresses":["/ip4/127.0.0.1/tcp/9939"]}"#,
        )
        .unwrap();
        assert_eq!(identity.listen_addresses.len(), 1);

        let peers: PeersResponse = serde_json::from_str(r#"{"peers":[{"id":"Qm1","endpoints":[]}]}"#).unwrap();
        assert_eq!(peers.peers[0].id, "Qm1");
    }

    /// Node that answers with an error status and hangs up mid-body
    async fn truncating_node() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\n{\"title\"")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", address)
    }

    #[tokio::test]
    async fn unreadable_error_body_is_a_transport_error() {
        let client = CndClient::new(&truncating_node().await, Duration::from_secs(5)).unwrap();

        let error = client.identity().await.unwrap_err();

        assert!(matches!(error, OrchestratorError::Transport(_)), "got {:?}", error);
    }
}
