//! Panel configuration - built by the host app, the CLI, or loaded from disk

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PanelError, Result};
use crate::wallet::fee::{validate_exit_fee_rate, FeeTier, DEFAULT_TX_VBYTES};

pub const ENV_POLL_INTERVAL: &str = "ARKPANEL_POLL_INTERVAL_SECS";
pub const ENV_FEE_RATE: &str = "ARKPANEL_FEE_RATE";
pub const ENV_EXIT_FEE_RATE: &str = "ARKPANEL_EXIT_FEE_RATE";
pub const ENV_PORT: &str = "ARKPANEL_PORT";
pub const ENV_STATE: &str = "ARKPANEL_STATE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub app: String,
    /// Balance refresh period in seconds
    pub poll_interval_secs: u64,
    /// Withdrawal fee rate (sat/vB) used when a request omits one
    pub fee_rate: u64,
    /// Emergency exit fee rate (sat/vB), 1-25
    pub exit_fee_rate: u64,
    /// Assumed transaction size for fee estimates
    pub tx_vbytes: u64,
    pub port: u16,
    /// JSON seed for the in-memory backend
    pub state_path: Option<PathBuf>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            app: "arkpanel".into(),
            poll_interval_secs: 30,
            fee_rate: FeeTier::Standard.rate(),
            exit_fee_rate: FeeTier::Standard.rate(),
            tx_vbytes: DEFAULT_TX_VBYTES,
            port: 3000,
            state_path: None,
        }
    }
}

impl PanelConfig {
    pub fn new(app: impl Into<String>) -> Self { Self { app: app.into(), ..Default::default() } }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll_interval_secs = interval.as_secs().max(1); self }
    pub fn with_fee_tier(mut self, tier: FeeTier) -> Self { self.fee_rate = tier.rate(); self }
    pub fn with_fee_rate(mut self, rate: u64) -> Self { self.fee_rate = rate; self }
    pub fn with_exit_fee_rate(mut self, rate: u64) -> Self { self.exit_fee_rate = rate; self }
    pub fn with_tx_vbytes(mut self, vbytes: u64) -> Self { self.tx_vbytes = vbytes; self }
    pub fn with_port(mut self, port: u16) -> Self { self.port = port; self }
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self { self.state_path = Some(path.into()); self }

    pub fn poll_interval(&self) -> Duration { Duration::from_secs(self.poll_interval_secs.max(1)) }

    /// `<config_dir>/arkpanel/config.json`
    pub fn default_path() -> Option<PathBuf> { dirs::config_dir().map(|d| d.join("arkpanel").join("config.json")) }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PanelError::Config(format!("read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| PanelError::Config(format!("parse {}: {e}", path.display())))?;
        config.validate()
    }

    /// Defaults, then the default config file if present, then environment overrides.
    pub fn from_env() -> Result<Self> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };
        base.overlay_env()
    }

    pub fn overlay_env(mut self) -> Result<Self> {
        if let Some(secs) = env_parse::<u64>(ENV_POLL_INTERVAL)? { self.poll_interval_secs = secs; }
        if let Some(rate) = env_parse::<u64>(ENV_FEE_RATE)? { self.fee_rate = rate; }
        if let Some(rate) = env_parse::<u64>(ENV_EXIT_FEE_RATE)? { self.exit_fee_rate = rate; }
        if let Some(port) = env_parse::<u16>(ENV_PORT)? { self.port = port; }
        if let Ok(path) = std::env::var(ENV_STATE) {
            if !path.trim().is_empty() { self.state_path = Some(PathBuf::from(path)); }
        }
        self.validate()
    }

    pub fn validate(self) -> Result<Self> {
        if self.poll_interval_secs == 0 {
            return Err(PanelError::Config("poll_interval_secs must be at least 1".into()));
        }
        if self.tx_vbytes == 0 {
            return Err(PanelError::Config("tx_vbytes must be positive".into()));
        }
        validate_exit_fee_rate(self.exit_fee_rate)
            .map_err(|_| PanelError::Config(format!("exit_fee_rate {} outside 1-25", self.exit_fee_rate)))?;
        Ok(self)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PanelError::Config(format!("{key}: cannot parse '{value}'"))),
        _ => Ok(None),
    }
}

/// Load `KEY=value` lines from a `.env` file without overriding the environment.
pub fn load_dotenv(path: &Path) {
    let Ok(contents) = std::fs::read_to_string(path) else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && std::env::var(key.trim()).is_err() {
                std::env::set_var(key.trim(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_tier() {
        let config = PanelConfig::default();
        assert_eq!(config.fee_rate, 5);
        assert_eq!(config.exit_fee_rate, 5);
        assert_eq!(config.tx_vbytes, 225);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn builder_chains() {
        let config = PanelConfig::new("demo")
            .with_fee_tier(FeeTier::Priority)
            .with_poll_interval(Duration::from_millis(10))
            .with_port(8080);
        assert_eq!(config.app, "demo");
        assert_eq!(config.fee_rate, 15);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn rejects_exit_fee_rate_out_of_range() {
        assert!(matches!(PanelConfig::default().with_exit_fee_rate(30).validate(), Err(PanelError::Config(_))));
    }

    #[test]
    fn loads_partial_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"fee_rate": 15, "port": 4000}"#).unwrap();
        let config = PanelConfig::load(&path).unwrap();
        assert_eq!(config.fee_rate, 15);
        assert_eq!(config.port, 4000);
        assert_eq!(config.poll_interval_secs, 30);
    }

    #[test]
    fn bad_file_is_config_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(PanelConfig::load(&path), Err(PanelError::Config(_))));
    }
}
