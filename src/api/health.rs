//! Shared counters for the /health endpoint.
//! Updated by the price resolver and the waitlist relay.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

use crate::types::PriceSource;

#[derive(Default)]
pub struct HealthState {
    /// True when GOOGLE_SCRIPT_URL was present at startup.
    pub relay_configured: AtomicBool,
    pub price_jupiter: AtomicU64,
    pub price_dexscreener: AtomicU64,
    pub price_fallback: AtomicU64,
    pub relay_accepted: AtomicU64,
    pub relay_rejected: AtomicU64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub relay_configured: bool,
    pub price: PriceCounts,
    pub relay: RelayCounts,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PriceCounts {
    pub jupiter: u64,
    pub dexscreener: u64,
    pub fallback: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RelayCounts {
    pub accepted: u64,
    pub rejected: u64,
}

impl HealthState {
    pub fn new(relay_configured: bool) -> Self {
        let state = Self::default();
        state.relay_configured.store(relay_configured, Ordering::Relaxed);
        state
    }

    pub fn record_price(&self, source: PriceSource) {
        let counter = match source {
            PriceSource::Jupiter => &self.price_jupiter,
            PriceSource::DexScreener => &self.price_dexscreener,
            PriceSource::Fallback => &self.price_fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relay(&self, accepted: bool) {
        if accepted {
            self.relay_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.relay_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: "ok",
            relay_configured: self.relay_configured.load(Ordering::Relaxed),
            price: PriceCounts {
                jupiter: self.price_jupiter.load(Ordering::Relaxed),
                dexscreener: self.price_dexscreener.load(Ordering::Relaxed),
                fallback: self.price_fallback.load(Ordering::Relaxed),
            },
            relay: RelayCounts {
                accepted: self.relay_accepted.load(Ordering::Relaxed),
                rejected: self.relay_rejected.load(Ordering::Relaxed),
            },
        }
    }
}
