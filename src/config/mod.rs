//! Configuration module for the portal backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::portal::quota::{QuotaPolicy, FREE_FILE_LIMIT, FREE_PROJECT_LIMIT};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key the identity gateway presents on every request
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Public base URL used to build invite redemption links
    pub public_url: String,
    /// Plan limits for owners without an active subscription
    pub quota: QuotaPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("PORTAL_API_PSK").ok();

        let db_path = env::var("PORTAL_DB_PATH")
            .unwrap_or_else(|_| "./data/portal.sqlite".to_string())
            .into();

        let bind_addr = env::var("PORTAL_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid PORTAL_BIND_ADDR format");

        let log_level = env::var("PORTAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let public_url = env::var("PORTAL_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let quota = QuotaPolicy {
            max_free_files: limit_from_env("PORTAL_FREE_FILE_LIMIT", FREE_FILE_LIMIT),
            max_free_projects: limit_from_env("PORTAL_FREE_PROJECT_LIMIT", FREE_PROJECT_LIMIT),
        };

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            public_url,
            quota,
        }
    }

    /// Redemption link for an invite token.
    pub fn invite_url(&self, token: &str) -> String {
        format!("{}/portal/invite/{}", self.public_url, token)
    }
}

fn limit_from_env(key: &str, default: i64) -> i64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
