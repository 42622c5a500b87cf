// src/config.rs
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read once at startup from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub data_dir: PathBuf,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://markup_ledger.db".to_string());
        let session_secret = std::env::var("SESSION_SECRET")
            .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;

        Ok(Self {
            database_url,
            host: parse_var("HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_var("PORT", 3000)?,
            session_secret,
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", 24)?,
            cookie_secure: parse_var("COOKIE_SECURE", false)?,
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }

    pub fn backups_dir(&self, user_id: i64) -> PathBuf {
        self.data_dir.join("backups").join(format!("user_{user_id}"))
    }

    pub fn uploads_root(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn uploads_dir(&self, user_id: i64) -> PathBuf {
        self.uploads_root().join(format!("user_{user_id}"))
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_hours * 60 * 60
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(default),
    }
}
