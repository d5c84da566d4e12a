//! Waitlist relay: browser JSON in, form-encoded POST to the Google Apps
//! Script web app out, one attempt per request.

pub mod classifier;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::latency::{LatencyStats, Upstream};
use crate::config::{Config, LOG_SNIPPET_CHARS};
use crate::error::RelayError;
use crate::types::WaitlistSubmission;
use crate::validation::is_valid_solana_address;

use self::classifier::{classify_error_status, interpret_success_body};

pub struct WaitlistRelay {
    client: reqwest::Client,
    script_url: Option<String>,
    timeout: Duration,
    latency: Arc<LatencyStats>,
}

impl WaitlistRelay {
    pub fn new(client: reqwest::Client, cfg: &Config, latency: Arc<LatencyStats>) -> Self {
        Self {
            client,
            script_url: cfg.script_url.clone(),
            timeout: cfg.relay_timeout,
            latency,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.script_url.is_some()
    }

    /// Validate, forward and interpret one submission.
    /// Returns the destination's payload on success.
    pub async fn submit(&self, raw_body: &[u8]) -> Result<Value, RelayError> {
        let submission = WaitlistSubmission::from_body(raw_body).ok_or_else(|| {
            warn!("[waitlist] rejected submission without solanaAddress");
            RelayError::MissingAddress
        })?;

        // Format is gated in the browser; the server only notes mismatches.
        if !is_valid_solana_address(&submission.solana_address) {
            warn!(
                address = %submission.solana_address,
                "[waitlist] forwarding address that is not a well-formed Solana address"
            );
        }

        let Some(script_url) = self.script_url.as_deref() else {
            error!("[waitlist] GOOGLE_SCRIPT_URL is not set in environment variables");
            return Err(RelayError::NotConfigured);
        };

        info!("[waitlist] sending signup to Google Script");
        let resp = self.send(script_url, &submission).await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(
                status = status.as_u16(),
                "[waitlist] Google Script error: {}",
                snippet(&body)
            );
            return Err(classify_error_status(status.as_u16(), &body));
        }

        let text = resp.text().await.map_err(|e| {
            error!("[waitlist] failed to read response: {e}");
            RelayError::UnreadableBody
        })?;

        match interpret_success_body(&text) {
            Ok(data) => {
                info!("[waitlist] success, response: {}", snippet(&data.to_string()));
                Ok(data)
            }
            Err(e) => {
                error!("[waitlist] Google Script rejected signup: {e}; body: {}", snippet(&text));
                Err(e)
            }
        }
    }

    /// The only suspension point. Dropping the future on deadline abandons the
    /// request; the script may still have appended the row.
    async fn send(
        &self,
        script_url: &str,
        submission: &WaitlistSubmission,
    ) -> Result<reqwest::Response, RelayError> {
        let started = Instant::now();
        let request = self.client.post(script_url).form(submission).send();
        let result = tokio::time::timeout(self.timeout, request).await;
        self.latency.record(Upstream::Relay, started.elapsed());

        match result {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(e)) => {
                let cause = error_chain(&e.without_url());
                error!("[waitlist] fetch error: {cause}");
                Err(RelayError::Network(cause))
            }
            Err(_) => {
                error!("[waitlist] request timeout after {:?}", self.timeout);
                Err(RelayError::Timeout)
            }
        }
    }
}

/// reqwest's own message is only "error sending request"; the reason
/// (refused, DNS, TLS) lives further down the source chain.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut parts = vec![e.to_string()];
    let mut source = e.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !parts.iter().any(|p| p == &text) {
            parts.push(text);
        }
        source = inner.source();
    }
    parts.join(": ")
}

fn snippet(s: &str) -> &str {
    match s.char_indices().nth(LOG_SNIPPET_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_char_safe() {
        let long = "é".repeat(LOG_SNIPPET_CHARS + 10);
        assert_eq!(snippet(&long).chars().count(), LOG_SNIPPET_CHARS);
        assert_eq!(snippet("short"), "short");
    }

    #[derive(Debug)]
    struct Layer(&'static str, Option<Box<Layer>>);

    impl std::fmt::Display for Layer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.1.as_deref().map(|l| l as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn error_chain_includes_every_cause() {
        let err = Layer(
            "error sending request",
            Some(Box::new(Layer(
                "client error (Connect)",
                Some(Box::new(Layer("Connection refused (os error 111)", None))),
            ))),
        );
        assert_eq!(
            error_chain(&err),
            "error sending request: client error (Connect): Connection refused (os error 111)"
        );
        assert_eq!(error_chain(&Layer("timed out", None)), "timed out");
    }

    #[tokio::test]
    async fn unconfigured_relay_refuses_valid_submission() {
        let relay = WaitlistRelay::new(
            reqwest::Client::new(),
            &Config::default(),
            Arc::new(LatencyStats::new()),
        );
        assert!(!relay.is_configured());

        let body = br#"{"solanaAddress":"So11111111111111111111111111111111111111112"}"#;
        assert_eq!(relay.submit(body).await, Err(RelayError::NotConfigured));
    }

    #[tokio::test]
    async fn missing_address_checked_before_configuration() {
        let relay = WaitlistRelay::new(
            reqwest::Client::new(),
            &Config::default(),
            Arc::new(LatencyStats::new()),
        );
        assert_eq!(
            relay.submit(br#"{"solanaAddress":""}"#).await,
            Err(RelayError::MissingAddress)
        );
    }
}
