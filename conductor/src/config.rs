use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::baton::{SessionConfig, DEFAULT_CHANNEL_CAPACITY};

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to
    pub listen_addr: SocketAddr,
    /// Root data directory; pid and http files are written here
    pub data_dir: PathBuf,
    /// Directory scores are resolved against
    pub scores_dir: PathBuf,
    /// Capacity of each worker's event channel
    pub channel_capacity: usize,
    /// Per-call deadline for delivering one event to a worker
    pub delivery_timeout: Duration,
    /// Pace events by score time
    pub realtime: bool,
    /// Deadline for handling one API request
    pub request_timeout: Duration,
    /// Maximum accepted request body
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir = PathBuf::from(env_str("CONDUCTOR_DATA_DIR", "./conductor"));
        let scores_dir = std::env::var("CONDUCTOR_SCORES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("scores"));

        let channel_capacity = env_parse("CONDUCTOR_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY)?;
        if channel_capacity == 0 {
            anyhow::bail!("CONDUCTOR_CHANNEL_CAPACITY must be at least 1");
        }

        Ok(Self {
            listen_addr: env_parse("CONDUCTOR_LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?,
            data_dir,
            scores_dir,
            channel_capacity,
            delivery_timeout: Duration::from_millis(env_parse(
                "CONDUCTOR_DELIVERY_TIMEOUT_MS",
                5000,
            )?),
            realtime: env_bool("CONDUCTOR_REALTIME", true)?,
            request_timeout: Duration::from_secs(env_parse("CONDUCTOR_REQUEST_TIMEOUT_SECS", 15)?),
            max_body_bytes: env_parse("CONDUCTOR_MAX_BODY_BYTES", 10 * 1024 * 1024)?,
        })
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            channel_capacity: self.channel_capacity,
            delivery_timeout: self.delivery_timeout,
            realtime: self.realtime,
        }
    }
}

pub fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

/// Accepts `1/0`, `true/false`, `yes/no`, `on/off` (case-insensitive).
pub fn env_bool(key: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(key) {
        Ok(val) => parse_bool(&val)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse env var {key}={val}: expected a boolean")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
