//! Exporter Configuration
//!
//! Configurable parameters for the network exporter.
//! Defaults follow the directory service's rate expectations: a sub-second
//! poll with the P-Rep list refreshed every 60 cycles.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Known ICON networks with preset directory endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Zicon,
}

impl Network {
    /// Preset directory (JSON-RPC) endpoint for this network
    pub fn directory_endpoint(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://ctz.solidwallet.io/api/v3",
            Network::Zicon => "https://zicon.net.solidwallet.io/api/v3",
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "zicon" => Ok(Network::Zicon),
            other => anyhow::bail!("unknown network {:?} (expected mainnet or zicon)", other),
        }
    }
}

/// Main configuration for the exporter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    // === Network selection ===

    /// Which network's directory service to query
    pub network: Network,

    /// Directory endpoint override; the network preset is used when unset
    pub directory_endpoint: Option<String>,

    // === Exporter surface ===

    /// Address to expose metrics on
    pub exporter_address: String,

    /// Port to expose metrics on
    pub exporter_port: u16,

    // === Timing ===

    /// Interval between polling cycles (seconds)
    pub poll_interval_secs: f64,

    /// Per-node status request timeout (seconds)
    pub poll_timeout_secs: f64,

    // === Window ===

    /// Number of cycle snapshots retained for rate derivation
    pub retention: usize,

    /// Cycles between P-Rep list refreshes
    pub refresh_prep_list_cycles: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            directory_endpoint: None,

            exporter_address: "0.0.0.0".to_string(),
            exporter_port: 6100,

            poll_interval_secs: 0.5,
            poll_timeout_secs: 0.5,

            retention: 5,
            refresh_prep_list_cycles: 60,
        }
    }
}

impl ExporterConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Builder-style methods for CLI overrides

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn with_directory_endpoint(mut self, endpoint: Option<String>) -> Self {
        if endpoint.is_some() {
            self.directory_endpoint = endpoint;
        }
        self
    }

    pub fn with_exporter_port(mut self, port: u16) -> Self {
        self.exporter_port = port;
        self
    }

    pub fn with_exporter_address(mut self, address: String) -> Self {
        self.exporter_address = address;
        self
    }

    /// Resolved directory endpoint (override or network preset)
    pub fn resolved_directory_endpoint(&self) -> &str {
        self.directory_endpoint
            .as_deref()
            .unwrap_or_else(|| self.network.directory_endpoint())
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    /// Per-node request timeout as a [`Duration`]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.poll_timeout_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs <= 0.0 {
            anyhow::bail!(
                "poll_interval_secs ({}) must be positive",
                self.poll_interval_secs
            );
        }

        if self.poll_timeout_secs <= 0.0 {
            anyhow::bail!(
                "poll_timeout_secs ({}) must be positive",
                self.poll_timeout_secs
            );
        }

        if self.retention < 2 {
            anyhow::bail!(
                "retention ({}) must be at least 2 to derive rates",
                self.retention
            );
        }

        if self.refresh_prep_list_cycles == 0 {
            anyhow::bail!("refresh_prep_list_cycles must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExporterConfig::default();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.exporter_port, 6100);
        assert_eq!(config.retention, 5);
        assert_eq!(config.refresh_prep_list_cycles, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ExporterConfig::default();
        assert!(config.validate().is_ok());

        // Invalid: window too small for a rate
        config.retention = 1;
        assert!(config.validate().is_err());

        config = ExporterConfig::default();
        config.poll_interval_secs = 0.0;
        assert!(config.validate().is_err());

        config = ExporterConfig::default();
        config.refresh_prep_list_cycles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_methods() {
        let config = ExporterConfig::default()
            .with_network(Network::Zicon)
            .with_exporter_port(9100)
            .with_exporter_address("127.0.0.1".to_string());

        assert_eq!(config.network, Network::Zicon);
        assert_eq!(config.exporter_port, 9100);
        assert_eq!(config.exporter_address, "127.0.0.1");
    }

    #[test]
    fn test_directory_endpoint_resolution() {
        let config = ExporterConfig::default();
        assert_eq!(
            config.resolved_directory_endpoint(),
            "https://ctz.solidwallet.io/api/v3"
        );

        let config = config
            .with_network(Network::Zicon)
            .with_directory_endpoint(Some("http://localhost:9000/api/v3".to_string()));
        assert_eq!(
            config.resolved_directory_endpoint(),
            "http://localhost:9000/api/v3"
        );

        // None override must not clear a previous endpoint
        let config = config.with_directory_endpoint(None);
        assert_eq!(
            config.resolved_directory_endpoint(),
            "http://localhost:9000/api/v3"
        );
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("zicon".parse::<Network>().unwrap(), Network::Zicon);
        assert!("testnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exporter.toml");

        let config = ExporterConfig::default().with_network(Network::Zicon);
        config.save(&path).unwrap();

        let loaded = ExporterConfig::load(&path).unwrap();
        assert_eq!(loaded.network, Network::Zicon);
        assert_eq!(loaded.retention, config.retention);
    }
}
