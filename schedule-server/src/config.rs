//! Server configuration.
//!
//! Every setting comes from an environment variable with a default, so the
//! server starts with no configuration at all.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ingest::RefreshConfig;
use crate::vstp::StompConfig;

pub const DEFAULT_FEED_FILENAME: &str = "schedule.json";
pub const DEFAULT_STOMP_URL: &str = "publicdatafeeds.networkrail.co.uk:61618";
pub const DEFAULT_LISTEN_ON: &str = "127.0.0.1:3333";

/// Error building configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address {value:?}: {message}")]
    InvalidListenAddress { value: String, message: String },
}

/// Settings for the whole server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Full-snapshot feed loaded at startup and on `/refresh`
    pub feed_path: PathBuf,

    /// Where the store is persisted between runs, if anywhere
    pub snapshot_path: Option<PathBuf>,

    /// Broker `host:port`; `None` disables the real-time consumer
    pub stomp_url: Option<String>,

    pub stomp_login: String,
    pub stomp_password: String,

    pub listen_on: SocketAddr,

    /// Delete schedules that ended before today after each refresh
    pub evict_expired: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            feed_path: PathBuf::from(DEFAULT_FEED_FILENAME),
            snapshot_path: None,
            stomp_url: Some(DEFAULT_STOMP_URL.to_string()),
            stomp_login: String::new(),
            stomp_password: String::new(),
            listen_on: SocketAddr::from(([127, 0, 0, 1], 3333)),
            evict_expired: false,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("SCHEDULE_FEED_FILENAME")
            && !path.is_empty()
        {
            config.feed_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SCHEDULE_SNAPSHOT")
            && !path.is_empty()
        {
            config.snapshot_path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup("STOMP_URL") {
            config.stomp_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(login) = lookup("STOMP_LOGIN") {
            config.stomp_login = login;
        }
        if let Some(password) = lookup("STOMP_PASSWORD") {
            config.stomp_password = password;
        }
        if let Some(value) = lookup("LISTEN_ON") {
            config.listen_on = parse_listen_address(&value)?;
        }
        if let Some(value) = lookup("DELETE_EXPIRED_SCHEDULES_ON_REFRESH") {
            config.evict_expired = value.trim().eq_ignore_ascii_case("yes");
        }

        Ok(config)
    }

    pub fn with_feed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.feed_path = path.into();
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_stomp_url(mut self, url: Option<String>) -> Self {
        self.stomp_url = url;
        self
    }

    pub fn with_listen_on(mut self, addr: SocketAddr) -> Self {
        self.listen_on = addr;
        self
    }

    pub fn with_evict_expired(mut self, evict: bool) -> Self {
        self.evict_expired = evict;
        self
    }

    /// Refresh settings derived from this configuration.
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig::default().with_evict_expired(self.evict_expired)
    }

    /// Broker settings, or `None` when the consumer is disabled.
    pub fn stomp_config(&self) -> Option<StompConfig> {
        let url = self.stomp_url.as_ref()?;
        Some(StompConfig::new(url).with_credentials(&self.stomp_login, &self.stomp_password))
    }
}

fn parse_listen_address(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::InvalidListenAddress {
            value: value.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_with_empty_environment() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.feed_path, PathBuf::from("schedule.json"));
        assert_eq!(config.listen_on.to_string(), DEFAULT_LISTEN_ON);
        assert_eq!(config.stomp_url.as_deref(), Some(DEFAULT_STOMP_URL));
        assert!(config.snapshot_path.is_none());
        assert!(!config.evict_expired);
    }

    #[test]
    fn reads_every_variable() {
        let config = from_vars(&[
            ("SCHEDULE_FEED_FILENAME", "/data/full.ndjson"),
            ("SCHEDULE_SNAPSHOT", "/data/store.json"),
            ("STOMP_URL", "localhost:61613"),
            ("STOMP_LOGIN", "user"),
            ("STOMP_PASSWORD", "secret"),
            ("LISTEN_ON", "0.0.0.0:8080"),
            ("DELETE_EXPIRED_SCHEDULES_ON_REFRESH", "yes"),
        ])
        .unwrap();

        assert_eq!(config.feed_path, PathBuf::from("/data/full.ndjson"));
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/data/store.json")));
        assert_eq!(config.stomp_url.as_deref(), Some("localhost:61613"));
        assert_eq!(config.stomp_login, "user");
        assert_eq!(config.stomp_password, "secret");
        assert_eq!(config.listen_on, "0.0.0.0:8080".parse().unwrap());
        assert!(config.evict_expired);
        assert!(config.refresh_config().evict_expired);
    }

    #[test]
    fn empty_stomp_url_disables_consumer() {
        let config = from_vars(&[("STOMP_URL", "")]).unwrap();
        assert!(config.stomp_url.is_none());
        assert!(config.stomp_config().is_none());
    }

    #[test]
    fn eviction_needs_yes() {
        for (value, expected) in [("yes", true), ("YES", true), ("no", false), ("true", false), ("", false)] {
            let config = from_vars(&[("DELETE_EXPIRED_SCHEDULES_ON_REFRESH", value)]).unwrap();
            assert_eq!(config.evict_expired, expected, "value {value:?}");
        }
    }

    #[test]
    fn bad_listen_address() {
        let err = from_vars(&[("LISTEN_ON", "not-an-address")]).unwrap_err();
        assert!(err.to_string().starts_with("invalid listen address \"not-an-address\""));
    }

    #[test]
    fn builders_override() {
        let config = ServerConfig::default()
            .with_feed_path("other.json")
            .with_snapshot_path("snap.json")
            .with_stomp_url(None)
            .with_evict_expired(true);
        assert_eq!(config.feed_path, PathBuf::from("other.json"));
        assert_eq!(config.snapshot_path, Some(PathBuf::from("snap.json")));
        assert!(config.stomp_config().is_none());
        assert!(config.evict_expired);
    }
}
