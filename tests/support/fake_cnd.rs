use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One scripted swap step: the action offered, what executing it answers and
/// the event it appends
#[derive(Clone)]
pub struct Step {
    pub action: Value,
    pub response: Value,
    pub emits: &'static str,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub action: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Default)]
pub struct NodeState {
    pub id: String,
    pub role: &'static str,
    pub alpha: &'static str,
    pub beta: &'static str,
    pub script: Vec<Step>,
    pub stage: usize,
    pub events: Vec<String>,
    pub swaps: Vec<String>,
    pub requests: Vec<RecordedRequest>,
    pub dialed: Vec<String>,
    pub peer_on_dial: Option<String>,
    pub peers: Vec<String>,
}

impl NodeState {
    pub fn swap(role: &'static str, alpha: &'static str, beta: &'static str, script: Vec<Step>) -> Self {
        Self {
            id: format!("Qm{}", role),
            role,
            alpha,
            beta,
            script,
            swaps: vec!["/swaps/abc".to_string()],
            ..Self::default()
        }
    }
}

pub type Shared = Arc<Mutex<NodeState>>;

/// Serve `state` on a random local port, returning the base URL
pub async fn spawn(state: NodeState) -> (String, Shared) {
    let shared = Arc::new(Mutex::new(state));

    let app = Router::new()
        .route("/", get(identity))
        .route("/dial", post(dial))
        .route("/peers", get(peers))
        .route("/swaps", get(list_swaps).post(create_swap))
        .route("/swaps/:id", get(swap))
        .route("/swaps/:id/:action", any(execute))
        .with_state(shared.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), shared)
}

fn problem(status: StatusCode, title: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/problem+json")],
        Json(json!({ "type": "about:blank", "title": title, "status": status.as_u16() })),
    )
        .into_response()
}

async fn identity(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(json!({
        "id": state.id,
        "listen_addresses": [format!("/ip4/127.0.0.1/tcp/99{:02}", state.id.len())]
    }))
}

async fn dial(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let mut state = state.lock().unwrap();
    for address in body["addresses"].as_array().into_iter().flatten() {
        state.dialed.push(address.as_str().unwrap_or_default().to_string());
    }
    if let Some(peer) = state.peer_on_dial.clone() {
        state.peers.push(peer);
    }
    StatusCode::OK
}

async fn peers(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let peers: Vec<Value> = state
        .peers
        .iter()
        .map(|id| json!({ "id": id, "endpoints": ["/ip4/127.0.0.1/tcp/9939"] }))
        .collect();
    Json(json!({ "peers": peers }))
}

async fn list_swaps(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock().unwrap();
    let entities: Vec<Value> = state
        .swaps
        .iter()
        .map(|href| json!({ "class": ["swap"], "rel": ["item"], "href": href }))
        .collect();
    Json(json!({ "class": ["swaps"], "properties": {}, "entities": entities }))
}

async fn create_swap(State(state): State<Shared>, Json(_body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.swaps.push("/swaps/abc".to_string());
    (StatusCode::CREATED, [(header::LOCATION, "/swaps/abc")]).into_response()
}

async fn swap(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock().unwrap();
    if !state.swaps.contains(&format!("/swaps/{}", id)) {
        return problem(StatusCode::NOT_FOUND, "Swap not found.");
    }

    let actions: Vec<Value> = state
        .script
        .get(state.stage)
        .map(|step| step.action.clone())
        .into_iter()
        .collect();
    let events: Vec<Value> = state.events.iter().map(|name| json!({ "name": name })).collect();

    Json(json!({
        "class": ["swap"],
        "properties": {
            "id": id,
            "role": state.role,
            "alpha": { "protocol": state.alpha },
            "beta": { "protocol": state.beta },
            "events": events
        },
        "actions": actions
    }))
    .into_response()
}

async fn execute(
    State(state): State<Shared>,
    Path((_id, action)): Path<(String, String)>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method,
        action: action.clone(),
        query,
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.to_vec(),
    });

    let step = match state.script.get(state.stage) {
        Some(step) if step.action["name"] == action.as_str() => step.clone(),
        _ => return problem(StatusCode::BAD_REQUEST, "Action not available."),
    };

    state.stage += 1;
    state.events.push(step.emits.to_string());
    Json(step.response).into_response()
}
