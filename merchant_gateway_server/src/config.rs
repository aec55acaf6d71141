use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use log::*;
use merchant_gateway_engine::{DEFAULT_CALLBACK_TIMEOUT, DEFAULT_RETRY_DELAY};
use mpg_common::env_flag;
use thiserror::Error;

const DEFAULT_MPG_HOST: &str = "127.0.0.1";
const DEFAULT_MPG_PORT: u16 = 8380;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/merchant_gateway.db";
const DEFAULT_GATEWAYS_FILE: &str = "gateways.toml";

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("'{0}' is not a gateway backend. Use 'config' or 'db'")]
    InvalidBackend(String),
    #[error("Could not load gateways from {0}. {1}")]
    GatewaysFile(String, String),
}

/// Where gateway definitions and keychain counters are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GatewayBackendKind {
    /// A TOML gateways file, with one keychain counter file per gateway.
    #[default]
    Config,
    /// The `gateways` table of the server database.
    Database,
}

impl FromStr for GatewayBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "config" | "file" => Ok(Self::Config),
            "db" | "database" | "sqlite" => Ok(Self::Database),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl Display for GatewayBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Database => write!(f, "db"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Apply pending database migrations at start-up.
    pub run_migrations: bool,
    pub gateway_backend: GatewayBackendKind,
    /// The gateway definitions, when `gateway_backend` is `Config`.
    pub gateways_file: PathBuf,
    /// Overrides the keychain counter directory. `None` uses `MPG_KEYCHAIN_DIR` or the per-user default.
    pub keychain_dir: Option<PathBuf>,
    /// The fixed pause between callback attempts.
    pub callback_retry_delay: Duration,
    /// The time limit for a single callback request.
    pub callback_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MPG_HOST.to_string(),
            port: DEFAULT_MPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            run_migrations: true,
            gateway_backend: GatewayBackendKind::default(),
            gateways_file: PathBuf::from(DEFAULT_GATEWAYS_FILE),
            keychain_dir: None,
            callback_retry_delay: DEFAULT_RETRY_DELAY,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MPG_HOST").ok().unwrap_or_else(|| DEFAULT_MPG_HOST.into());
        let port = env::var("MPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MPG_PORT. {e} Using the default, {DEFAULT_MPG_PORT}, instead."
                    );
                    DEFAULT_MPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MPG_PORT);
        let database_url = env::var("MPG_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ MPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let run_migrations = env_flag("MPG_RUN_MIGRATIONS", true);
        let gateway_backend = env::var("MPG_GATEWAY_BACKEND")
            .map(|s| {
                s.parse::<GatewayBackendKind>().unwrap_or_else(|e| {
                    error!("🪛️ {e}. Falling back to the config file backend.");
                    GatewayBackendKind::Config
                })
            })
            .unwrap_or_default();
        let gateways_file =
            env::var("MPG_GATEWAYS_FILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_GATEWAYS_FILE));
        let keychain_dir = env::var("MPG_KEYCHAIN_DIR").ok().map(PathBuf::from);
        let callback_retry_delay = seconds_from_env("MPG_CALLBACK_RETRY_DELAY_SECS", DEFAULT_RETRY_DELAY);
        let callback_timeout = seconds_from_env("MPG_CALLBACK_TIMEOUT_SECS", DEFAULT_CALLBACK_TIMEOUT);
        Self {
            host,
            port,
            database_url,
            run_migrations,
            gateway_backend,
            gateways_file,
            keychain_dir,
            callback_retry_delay,
            callback_timeout,
        }
    }
}

fn seconds_from_env(name: &str, default: Duration) -> Duration {
    env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {} s.", default.as_secs()))
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for {name}. {e}. Using {} s.", default.as_secs()))
        })
        .ok()
        .unwrap_or(default)
}
