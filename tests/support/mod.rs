#![allow(dead_code)]

pub mod fake_cnd;
pub mod wallets;

use std::time::Duration;
use swap_orchestrator::config::OrchestratorConfig;
use swap_orchestrator::{Actor, CndClient, Role, Wallets};

/// Timings short enough for tests against a local fake node
pub fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig {
        action_poll_interval_ms: 20,
        action_timeout_secs: 5,
        event_poll_interval_ms: 20,
        event_timeout_secs: 5,
        peer_poll_interval_ms: 20,
        peer_timeout_secs: 5,
        swap_timeout_secs: 5,
        http_timeout_secs: 5,
        ..OrchestratorConfig::default()
    }
}

pub fn actor(name: &str, role: Role, base_url: &str, wallets: Wallets) -> Actor {
    let cnd = CndClient::new(base_url, Duration::from_secs(5)).unwrap();
    Actor::new(name, role, cnd, wallets, fast_config())
}
