use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use topstories_core::DEFAULT_HN_API_BASE;

#[derive(Parser, Debug)]
#[command(name = "topstories")]
#[command(version, about = "Curated Hacker News top stories with semi-fresh stats")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server and the refresh scheduler (default)
    Serve,
    /// Run one refresh now, ignoring the rate limit
    Refresh,
    /// Print the current top-stories view as JSON
    Show,
    /// Drop expired keys from the data file
    Sweep,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, global = true, env = "TOPSTORIES_HTTP_ADDR", default_value = "0.0.0.0:8787")]
    pub http_addr: SocketAddr,

    /// Data directory
    #[arg(long, global = true, env = "TOPSTORIES_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Keep all state in memory instead of the data file
    #[arg(long, global = true, env = "TOPSTORIES_IN_MEMORY", default_value = "false")]
    pub in_memory: bool,

    /// Hacker News API base URL
    #[arg(long, global = true, env = "TOPSTORIES_HN_API_BASE", default_value = DEFAULT_HN_API_BASE)]
    pub hn_api_base: String,

    /// Timeout for upstream API requests, in seconds
    #[arg(long, global = true, env = "TOPSTORIES_HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Scheduled refresh interval in seconds (0 disables the scheduler)
    #[arg(long, global = true, env = "TOPSTORIES_REFRESH_INTERVAL_SECS", default_value = "600")]
    pub refresh_interval_secs: u64,

    /// Expired-key sweep interval in seconds (0 disables the sweeper)
    #[arg(long, global = true, env = "TOPSTORIES_SWEEP_INTERVAL_SECS", default_value = "3600")]
    pub sweep_interval_secs: u64,

    /// How long to wait for background cache writes on shutdown, in seconds
    #[arg(long, global = true, env = "TOPSTORIES_SHUTDOWN_GRACE_SECS", default_value = "10")]
    pub shutdown_grace_secs: u64,

    /// healthchecks.io check ID for the scheduled refresh
    #[arg(long, global = true, env = "HEALTHCHECK_IO_ID")]
    pub healthcheck_id: Option<String>,

    /// healthchecks.io ping base URL
    #[arg(long, global = true, env = "TOPSTORIES_HEALTHCHECK_BASE", default_value = "https://hc-ping.com")]
    pub healthcheck_base: String,
}

impl Config {
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("topstories.redb")
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.http_timeout_secs == 0 {
            anyhow::bail!("--http-timeout-secs must be greater than zero");
        }
        if let Some(id) = &self.healthcheck_id {
            if id.trim().is_empty() {
                anyhow::bail!("--healthcheck-id must not be blank");
            }
        }
        if !self.in_memory && !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8787)),
            data_dir: PathBuf::from("./data"),
            in_memory: false,
            hn_api_base: DEFAULT_HN_API_BASE.to_string(),
            http_timeout_secs: 10,
            refresh_interval_secs: 600,
            sweep_interval_secs: 3600,
            shutdown_grace_secs: 10,
            healthcheck_id: None,
            healthcheck_base: "https://hc-ping.com".to_string(),
        }
    }
}
