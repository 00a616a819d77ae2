use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Server settings, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match get("MURMUR_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("MURMUR_PORT is not a port number: {:?}", raw))?,
            None => 4000,
        };

        Ok(Self {
            host: get("MURMUR_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("MURMUR_DB_PATH").unwrap_or_else(|| "murmur.db".into()).into(),
            upload_dir: get("MURMUR_UPLOAD_DIR").unwrap_or_else(|| "./uploads".into()).into(),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}
