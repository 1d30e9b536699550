use anyhow::Context;
use serde::Deserialize;

/// One backend entry in the pool
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend base URL; the path it carries is the forwarding prefix,
    /// so it normally ends with "/"
    pub url: String,

    /// Optional backend name for logging
    #[serde(default)]
    pub name: Option<String>,
}

/// Resource monitor settings (off unless enabled)
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between samples
    #[serde(default = "default_monitor_interval")]
    pub interval_secs: u64,

    /// File the monitor appends its log lines to
    #[serde(default = "default_monitor_log_path")]
    pub log_path: String,

    /// Process RSS above this many MB triggers the alert stub
    #[serde(default = "default_alert_rss_mb")]
    pub alert_rss_mb: f64,
}

fn default_monitor_interval() -> u64 {
    1800
}

fn default_monitor_log_path() -> String {
    "loadbalancer_log.txt".to_string()
}

fn default_alert_rss_mb() -> f64 {
    1024.0
}

/// Periodic URL availability checker settings (off unless enabled)
#[derive(Debug, Clone, Deserialize)]
pub struct UrlCheckConfig {
    #[serde(default)]
    pub enabled: bool,

    /// URL fetched on every check
    pub url: String,

    /// Seconds between checks
    #[serde(default = "default_monitor_interval")]
    pub interval_secs: u64,

    /// File the checker appends its log lines to
    #[serde(default = "default_url_check_log_path")]
    pub log_path: String,

    /// Responses larger than this many bytes trigger the alert stub
    #[serde(default = "default_alert_size_bytes")]
    pub alert_size_bytes: usize,
}

fn default_url_check_log_path() -> String {
    "NetworkLoadBalancerLog.txt".to_string()
}

fn default_alert_size_bytes() -> usize {
    1_000_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the proxy listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Fixed, ordered backend pool; must be non-empty
    pub backends: Vec<BackendConfig>,

    #[serde(default)]
    pub monitor: Option<MonitorConfig>,

    #[serde(default)]
    pub url_check: Option<UrlCheckConfig>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Load configuration, preferring a YAML file.
    ///
    /// The file path comes from the `CONFIG` env var (default
    /// `config.yaml`). When no file exists, falls back to the `LISTEN`
    /// and `BACKENDS` (comma-separated URLs) env vars.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let config = if std::path::Path::new(&path).exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path))?;
            Self::from_yaml(&contents)?
        } else {
            Self::from_env()?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(contents).context("failed to parse config file")
    }

    fn from_env() -> anyhow::Result<Self> {
        let listen_addr = std::env::var("LISTEN").unwrap_or_else(|_| default_listen_addr());

        let backends = std::env::var("BACKENDS")
            .context("no config file found and BACKENDS env var is not set")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|url| BackendConfig {
                url: url.to_string(),
                name: None,
            })
            .collect();

        Ok(Self {
            listen_addr,
            backends,
            monitor: None,
            url_check: None,
        })
    }

    /// Startup validation: serving must not begin with a bad pool.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backends.is_empty() {
            anyhow::bail!("backend pool is empty, at least one backend is required");
        }

        for backend in &self.backends {
            let parsed = url::Url::parse(&backend.url)
                .with_context(|| format!("invalid backend URL: {}", backend.url))?;
            if parsed.host_str().is_none() {
                anyhow::bail!("backend URL has no host: {}", backend.url);
            }
        }

        Ok(())
    }
}
