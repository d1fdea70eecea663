use crate::domain::alerts::SlowThresholdFormula;
use anyhow::{Context, ensure};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
            user_agent: concat!("levelwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub history_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            history_dir: PathBuf::from("data/history"),
            settings_path: PathBuf::from("data/settings.toml"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_secs: u64,
    pub statistics_window_size: usize,
    pub max_level: u32,
    pub chart_max_items: usize,
    pub slow_threshold_formula: SlowThresholdFormula,
    /// Wrap the displayed time-in-level past this many seconds; 0 disables.
    pub display_ceiling_secs: u64,
    pub default_slow_threshold_secs: i64,
    /// Character to start monitoring at boot.
    pub character: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            statistics_window_size: 12,
            max_level: 400,
            chart_max_items: 10,
            slow_threshold_formula: SlowThresholdFormula::Adaptive,
            display_ceiling_secs: 86_400,
            default_slow_threshold_secs: 180,
            character: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let monitor = &self.monitor;
        ensure!(monitor.poll_interval_secs >= 1, "monitor.poll_interval_secs must be at least 1");
        ensure!(
            monitor.statistics_window_size >= 1,
            "monitor.statistics_window_size must be at least 1"
        );
        ensure!(monitor.max_level >= 1, "monitor.max_level must be at least 1");
        ensure!(
            monitor.default_slow_threshold_secs >= 0,
            "monitor.default_slow_threshold_secs must not be negative"
        );
        ensure!(!self.source.base_url.is_empty(), "source.base_url must be set");

        let bind_addr = self.server.bind_addr()?;
        let base_url = reqwest::Url::parse(&self.source.base_url)
            .with_context(|| format!("Invalid source.base_url {}", self.source.base_url))?;
        ensure!(
            !points_at(&base_url, bind_addr),
            "source.base_url {} points at this server's own address {}",
            self.source.base_url,
            bind_addr
        );
        Ok(())
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("Invalid server.bind_addr {}", self.bind_addr))
    }
}

/// Whether `url` would reach a server listening on `addr` from this host.
fn points_at(url: &reqwest::Url, addr: SocketAddr) -> bool {
    if url.port_or_known_default() != Some(addr.port()) {
        return false;
    }
    let bind_ip = addr.ip().to_string();
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            let local_host = host
                .parse::<IpAddr>()
                .is_ok_and(|ip| ip.is_loopback() || ip.is_unspecified());
            let local_bind = addr.ip().is_unspecified() || addr.ip().is_loopback();
            host == bind_ip || (local_host && local_bind)
        }
        None => false,
    }
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from("config/levelwatch")
}

/// Load `<path>.{toml,json,...}` if present, overridden by `LEVELWATCH__*`
/// environment variables.
pub fn load_config_from(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("LEVELWATCH")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
