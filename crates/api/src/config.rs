use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_BIND: &str = "0.0.0.0:5001";
const DEFAULT_ORIGIN: &str = "http://localhost:5001";
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX: usize = 60;

/// Server settings, read from `HERVIVAL_*` environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    /// Key rate limiting on `X-Forwarded-For` instead of the peer address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            allowed_origins: vec![DEFAULT_ORIGIN.to_string()],
            rate_limit_window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECONDS),
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            trust_forwarded_for: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let bind = env::var("HERVIVAL_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        bind.parse::<std::net::SocketAddr>()
            .with_context(|| format!("HERVIVAL_BIND must be a socket address, got {bind}"))?;

        Ok(Self {
            bind,
            allowed_origins: parse_origins(env::var("HERVIVAL_ALLOWED_ORIGINS").ok().as_deref()),
            rate_limit_window: Duration::from_secs(env_or(
                "HERVIVAL_RATE_LIMIT_WINDOW_SECONDS",
                DEFAULT_RATE_LIMIT_WINDOW_SECONDS,
            )),
            rate_limit_max: env_or("HERVIVAL_RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX),
            trust_forwarded_for: env_or("HERVIVAL_TRUST_FORWARDED_FOR", false),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    let origins = raw
        .unwrap_or_default()
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        vec![DEFAULT_ORIGIN.to_string()]
    } else {
        origins
    }
}
