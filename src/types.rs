use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Body of `GET /api/token-price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResult {
    /// USD price, always two fractional digits.
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_24h: Option<f64>,
}

impl PriceResult {
    pub fn from_usd(usd: f64, price_change_24h: Option<f64>) -> Self {
        Self {
            price: format!("{usd:.2}"),
            price_change_24h,
        }
    }
}

/// Which step of the resolver produced the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Jupiter,
    DexScreener,
    Fallback,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PriceSource::Jupiter => "jupiter",
            PriceSource::DexScreener => "dexscreener",
            PriceSource::Fallback => "fallback",
        };
        write!(f, "{s}")
    }
}

/// Jupiter price v3 entry, keyed by mint in the response object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JupiterPriceEntry {
    pub usd_price: Option<f64>,
    /// Read loosely; a mistyped change never decides whether the price is used.
    #[serde(default)]
    pub price_change_24h: Option<Value>,
}

/// DexScreener `/latest/dex/tokens/{mint}` response. Pairs stay untyped so a
/// malformed entry past the first one cannot fail the lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct DexTokenResponse {
    #[serde(default)]
    pub pairs: Option<Vec<Value>>,
}

// ---------------------------------------------------------------------------
// Waitlist
// ---------------------------------------------------------------------------

/// A submission after the presence check, fields already trimmed for forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitlistSubmission {
    #[serde(rename = "solanaAddress")]
    pub solana_address: String,
    pub email: String,
}

impl WaitlistSubmission {
    /// Lenient read of the browser payload. Anything that is not a JSON object
    /// counts as an empty submission. Only presence and type of `solanaAddress`
    /// are checked here.
    pub fn from_body(raw: &[u8]) -> Option<Self> {
        let body: Value = serde_json::from_slice(raw).unwrap_or(Value::Null);
        let address = body.get("solanaAddress")?.as_str()?;
        if address.is_empty() {
            return None;
        }
        let email = body
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Some(Self {
            solana_address: address.trim().to_string(),
            email: email.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_formats_to_two_decimals() {
        assert_eq!(PriceResult::from_usd(1.0, None).price, "1.00");
        assert_eq!(PriceResult::from_usd(0.123456, None).price, "0.12");
        assert_eq!(PriceResult::from_usd(12.5, None).price, "12.50");
    }

    #[test]
    fn change_field_omitted_when_absent() {
        let json = serde_json::to_value(PriceResult::from_usd(2.0, None)).unwrap();
        assert_eq!(json, serde_json::json!({ "price": "2.00" }));

        let json = serde_json::to_value(PriceResult::from_usd(2.0, Some(-3.25))).unwrap();
        assert_eq!(json, serde_json::json!({ "price": "2.00", "priceChange24h": -3.25 }));
    }

    #[test]
    fn submission_trims_fields() {
        let raw = br#"{"solanaAddress":"  So11111111111111111111111111111111111111112 ","email":" a@b.io "}"#;
        let sub = WaitlistSubmission::from_body(raw).unwrap();
        assert_eq!(sub.solana_address, "So11111111111111111111111111111111111111112");
        assert_eq!(sub.email, "a@b.io");
    }

    #[test]
    fn submission_missing_email_is_empty() {
        let raw = br#"{"solanaAddress":"abc"}"#;
        let sub = WaitlistSubmission::from_body(raw).unwrap();
        assert_eq!(sub.email, "");
    }

    #[test]
    fn submission_rejects_missing_or_non_string_address() {
        assert!(WaitlistSubmission::from_body(br#"{"solanaAddress":""}"#).is_none());
        assert!(WaitlistSubmission::from_body(br#"{"solanaAddress":42}"#).is_none());
        assert!(WaitlistSubmission::from_body(br#"{"email":"a@b.io"}"#).is_none());
        assert!(WaitlistSubmission::from_body(b"not json").is_none());
        assert!(WaitlistSubmission::from_body(b"").is_none());
        assert!(WaitlistSubmission::from_body(b"[1,2]").is_none());
    }

    #[test]
    fn whitespace_only_address_passes_presence_check() {
        let sub = WaitlistSubmission::from_body(br#"{"solanaAddress":"   "}"#).unwrap();
        assert_eq!(sub.solana_address, "");
    }
}
