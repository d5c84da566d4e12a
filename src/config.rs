use std::time::Duration;

use crate::error::{AppError, Result};

pub const JUPITER_API_URL: &str = "https://lite-api.jup.ag";
pub const DEXSCREENER_API_URL: &str = "https://api.dexscreener.com";

/// Mint address of the token shown on the landing page.
pub const TOKEN_ADDRESS: &str = "FmQ7v2QUqXVVtAXkngBh3Mwx7s3mKT55nQ5Z673dURYS";

/// Returned when neither price source yields a usable value.
/// Kept at two fractional digits like every other price we emit.
pub const DEFAULT_PRICE: &str = "0.90";

/// Revalidation hint (seconds) attached to price responses for intermediaries.
pub const PRICE_REVALIDATE_SECS: u64 = 30;

/// Cancellation deadline for the outbound waitlist POST (seconds).
pub const RELAY_TIMEOUT_SECS: u64 = 30;

/// Upstream bodies are truncated to this many chars before logging.
pub const LOG_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api_port: u16,
    /// Google Apps Script web app URL (GOOGLE_SCRIPT_URL). None disables the relay.
    pub script_url: Option<String>,
    /// Token queried by the price resolver (TOKEN_ADDRESS)
    pub token_address: String,
    pub jupiter_api_url: String,
    pub dexscreener_api_url: String,
    pub relay_timeout: Duration,
    /// Allowed browser origin (CORS_ALLOW_ORIGIN). "*" allows any.
    pub cors_allow_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            script_url: non_empty(std::env::var("GOOGLE_SCRIPT_URL").ok()),
            token_address: std::env::var("TOKEN_ADDRESS")
                .unwrap_or_else(|_| TOKEN_ADDRESS.to_string()),
            jupiter_api_url: trim_base(
                std::env::var("JUPITER_API_URL").unwrap_or_else(|_| JUPITER_API_URL.to_string()),
            ),
            dexscreener_api_url: trim_base(
                std::env::var("DEXSCREENER_API_URL")
                    .unwrap_or_else(|_| DEXSCREENER_API_URL.to_string()),
            ),
            relay_timeout: Duration::from_secs(
                std::env::var("RELAY_TIMEOUT_SECS")
                    .unwrap_or_else(|_| RELAY_TIMEOUT_SECS.to_string())
                    .parse::<u64>()
                    .map_err(|_| {
                        AppError::Config("RELAY_TIMEOUT_SECS must be a whole number of seconds".to_string())
                    })?,
            ),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            api_port: 3000,
            script_url: None,
            token_address: TOKEN_ADDRESS.to_string(),
            jupiter_api_url: JUPITER_API_URL.to_string(),
            dexscreener_api_url: DEXSCREENER_API_URL.to_string(),
            relay_timeout: Duration::from_secs(RELAY_TIMEOUT_SECS),
            cors_allow_origin: "*".to_string(),
        }
    }
}

/// Blank values count as unset so `GOOGLE_SCRIPT_URL=` in a .env behaves like a missing key.
fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
