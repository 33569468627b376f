//! Configuration management for the swap orchestrator
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::coordination::{PollSchedule, SyncConfig};
use crate::network::ChannelConfig;
use crate::swap::Role;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "SWAP_ORCHESTRATOR_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex");
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    pub actors: HashMap<String, ActorConfig>,
}

/// Timing of every wait the orchestrator performs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub action_poll_interval_ms: u64,
    pub action_timeout_secs: u64,
    pub event_poll_interval_ms: u64,
    pub event_timeout_secs: u64,
    pub peer_poll_interval_ms: u64,
    pub peer_timeout_secs: u64,
    pub swap_timeout_secs: u64,
    pub chain_sync_poll_interval_ms: u64,
    pub channel_poll_interval_ms: u64,
    pub channel_timeout_secs: u64,
    pub channel_open_attempts: u32,
    pub channel_retry_delay_ms: u64,
    pub http_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            action_poll_interval_ms: 1000,
            action_timeout_secs: 20,
            event_poll_interval_ms: 500,
            event_timeout_secs: 30,
            peer_poll_interval_ms: 500,
            peer_timeout_secs: 10,
            swap_timeout_secs: 10,
            chain_sync_poll_interval_ms: 500,
            channel_poll_interval_ms: 500,
            channel_timeout_secs: 5,
            channel_open_attempts: 5,
            channel_retry_delay_ms: 1000,
            http_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorConfig {
    /// Role the actor plays in every swap it creates
    pub role: Role,
    /// Base URL of the actor's swap node HTTP API
    pub cnd_url: String,
    /// Lightning node, required only for channel-backed swaps
    pub lnd: Option<LndConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LndConfig {
    pub rest_url: String,
    /// Admin macaroon, sent hex-encoded on every request
    pub macaroon_path: PathBuf,
    /// Self-signed certificate to trust in addition to the system roots
    pub tls_cert_path: Option<PathBuf>,
    /// `host:port` the node accepts peer connections on
    pub p2p_socket: String,
}

impl OrchestratorConfig {
    pub fn sync(&self) -> SyncConfig {
        SyncConfig {
            action: PollSchedule::bounded(
                Duration::from_millis(self.action_poll_interval_ms),
                Duration::from_secs(self.action_timeout_secs),
            ),
            event: PollSchedule::bounded(
                Duration::from_millis(self.event_poll_interval_ms),
                Duration::from_secs(self.event_timeout_secs),
            ),
        }
    }

    pub fn peers(&self) -> PollSchedule {
        PollSchedule::bounded(
            Duration::from_millis(self.peer_poll_interval_ms),
            Duration::from_secs(self.peer_timeout_secs),
        )
    }

    /// Waiting for a swap to show up polls at the peer interval
    pub fn swaps(&self) -> PollSchedule {
        PollSchedule::bounded(
            Duration::from_millis(self.peer_poll_interval_ms),
            Duration::from_secs(self.swap_timeout_secs),
        )
    }

    pub fn channel(&self) -> ChannelConfig {
        ChannelConfig {
            sync: PollSchedule::unbounded(Duration::from_millis(self.chain_sync_poll_interval_ms)),
            open_attempts: self.channel_open_attempts,
            open_retry_delay: Duration::from_millis(self.channel_retry_delay_ms),
            listed: PollSchedule::bounded(
                Duration::from_millis(self.channel_poll_interval_ms),
                Duration::from_secs(self.channel_timeout_secs),
            ),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Settings {
    /// Load settings from the file named by `SWAP_ORCHESTRATOR_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.actors.is_empty() {
            anyhow::bail!("At least one actor must be configured");
        }

        for (name, actor) in &self.actors {
            Url::parse(&actor.cnd_url)
                .with_context(|| format!("Actor {} has an invalid cnd_url", name))?;

            if let Some(lnd) = &actor.lnd {
                Url::parse(&lnd.rest_url)
                    .with_context(|| format!("Actor {} has an invalid lnd rest_url", name))?;
            }
        }

        if self.orchestrator.channel_open_attempts == 0 {
            anyhow::bail!("channel_open_attempts must be at least 1");
        }

        Ok(())
    }

    /// Configuration of a named actor
    pub fn actor(&self, name: &str) -> Result<&ActorConfig> {
        self.actors
            .get(name)
            .with_context(|| format!("No actor named '{}' in configuration", name))
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    ENV_VAR
        .replace_all(input, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_ACTORS: &str = r#"
        [orchestrator]
        action_timeout_secs = 5

        [actors.alice]
        role = "Alice"
        cnd_url = "http://127.0.0.1:8000"

        [actors.bob]
        role = "Bob"
        cnd_url = "http://127.0.0.1:8001"

        [actors.bob.lnd]
        rest_url = "https://127.0.0.1:8081"
        macaroon_path = "/tmp/bob/admin.macaroon"
        p2p_socket = "127.0.0.1:9736"
    "#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("SWAP_ORCHESTRATOR_TEST_PORT", "8123");
        let input = "cnd_url = \"http://127.0.0.1:${SWAP_ORCHESTRATOR_TEST_PORT}/\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "cnd_url = \"http://127.0.0.1:8123/\"");
    }

    #[test]
    fn unset_variables_become_empty() {
        let result = substitute_env_vars("path = \"${SWAP_ORCHESTRATOR_SURELY_UNSET}/lnd\"");
        assert_eq!(result, "path = \"/lnd\"");
    }

    #[test]
    fn parses_actors_and_defaults_timings() {
        let settings = Settings::parse(TWO_ACTORS).unwrap();

        assert_eq!(settings.actor("alice").unwrap().role, Role::Alice);
        assert!(settings.actor("alice").unwrap().lnd.is_none());
        assert_eq!(
            settings.actor("bob").unwrap().lnd.as_ref().unwrap().p2p_socket,
            "127.0.0.1:9736"
        );

        let sync = settings.orchestrator.sync();
        assert_eq!(sync.action.timeout, Some(Duration::from_secs(5)));
        assert_eq!(sync.action.interval, Duration::from_millis(1000));
        assert_eq!(sync.event.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.orchestrator.channel().open_attempts, 5);
        assert_eq!(settings.orchestrator.channel().sync.timeout, None);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_ACTORS.as_bytes()).unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.actors.len(), 2);
    }

    #[test]
    fn rejects_configuration_without_actors() {
        let error = Settings::parse("actors = {}").unwrap_err();
        assert!(error.to_string().contains("At least one actor"));
    }

    #[test]
    fn rejects_invalid_urls() {
        let error = Settings::parse(
            r#"
            [actors.alice]
            role = "Alice"
            cnd_url = "localhost without scheme"
            "#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("invalid cnd_url"));
    }

    #[test]
    fn unknown_actor_is_an_error() {
        let settings = Settings::parse(TWO_ACTORS).unwrap();
        assert!(settings.actor("charlie").is_err());
    }
}
