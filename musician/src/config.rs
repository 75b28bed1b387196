use std::net::SocketAddr;
use std::time::Duration;

use conductor::config::{env_parse, env_str};
use shared_types::WorkerId;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to
    pub listen_addr: SocketAddr,
    /// Address the conductor should deliver to
    pub advertise_addr: String,
    /// Base URL of the conductor
    pub conductor_addr: String,
    /// Stable id for this process; random when unset
    pub id: WorkerId,
    /// Delay between registration attempts
    pub register_retry: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let id = match std::env::var("MUSICIAN_ID") {
            Ok(raw) => raw
                .parse::<WorkerId>()
                .map_err(|e| anyhow::anyhow!("Failed to parse env var MUSICIAN_ID={raw}: {e}"))?,
            Err(_) => WorkerId::random(),
        };

        Ok(Self {
            listen_addr: env_parse("MUSICIAN_LISTEN_ADDR", SocketAddr::from(([127, 0, 0, 1], 8090)))?,
            advertise_addr: env_str("MUSICIAN_ADVERTISE_ADDR", "http://localhost:8090"),
            conductor_addr: env_str("MUSICIAN_CONDUCTOR_ADDR", "http://localhost:8080"),
            id,
            register_retry: Duration::from_millis(env_parse("MUSICIAN_REGISTER_RETRY_MS", 1000)?),
        })
    }
}
