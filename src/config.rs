use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::Context;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";

/// Environment-driven configuration, resolved once at startup so a missing
/// admin password fails the boot instead of the first login attempt.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub admin_password: String,
    pub data_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let bind_addr = env::var("LIVESYNC_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("LIVESYNC_ADDR is not a valid socket address")?;

        let admin_password =
            env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD environment variable not set")?;

        let data_path = env::var("LIVESYNC_DATA").ok().map(PathBuf::from);

        Ok(Self {
            bind_addr,
            admin_password,
            data_path,
        })
    }
}
