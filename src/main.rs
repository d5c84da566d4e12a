mod api;
mod config;
mod error;
mod fetcher;
mod relay;
mod types;
mod validation;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{cors_layer, router, ApiState};
use crate::config::Config;
use crate::error::Result;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let state = ApiState::new(&cfg)?;

    if state.relay.is_configured() {
        info!("Waitlist relay ready (timeout {:?})", cfg.relay_timeout);
    } else {
        warn!("GOOGLE_SCRIPT_URL not set; POST /api/waitlist will answer 500 until it is configured.");
    }
    info!(
        "Price resolver: token={} jupiter={} dexscreener={}",
        cfg.token_address, cfg.jupiter_api_url, cfg.dexscreener_api_url
    );

    let app = router(state, cors_layer(&cfg.cors_allow_origin)?);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
