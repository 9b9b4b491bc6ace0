//! Service configuration.
//!
//! Loaded from (in order of precedence):
//! 1. Environment variables (`DEVBOOK_*`, e.g. `DEVBOOK_JWT_SECRET`)
//! 2. `devbook.toml` in the working directory
//! 3. Default values

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "devbook.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the libmdbx environment.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Shared secret for verifying `x-auth-token` JWTs.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_jwt_secret() -> String {
    "change-me".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            jwt_secret: default_jwt_secret(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("DEVBOOK_"))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
