//! Upstream call latency, one histogram per collaborator.
//! The resolver and relay record, `/stats/latency` reads.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// Jupiter and DexScreener calls
    PriceSource,
    /// The Google Script POST
    Relay,
}

/// Values stored in microseconds, 1us to 100s, 3 significant figures.
pub struct LatencyStats {
    price: Mutex<Histogram<u64>>,
    relay: Mutex<Histogram<u64>>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LatencyReport {
    pub price_sources: LatencySummary,
    pub relay: LatencySummary,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            price: Mutex::new(new_histogram()),
            relay: Mutex::new(new_histogram()),
        }
    }

    pub fn record(&self, upstream: Upstream, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        if let Ok(mut h) = self.histogram(upstream).lock() {
            // saturating: anything past 100s is clamped instead of dropped
            h.saturating_record(us.max(1));
        }
    }

    pub fn report(&self) -> LatencyReport {
        LatencyReport {
            price_sources: self.summary(Upstream::PriceSource),
            relay: self.summary(Upstream::Relay),
        }
    }

    fn summary(&self, upstream: Upstream) -> LatencySummary {
        let empty = LatencySummary { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None };
        let Ok(h) = self.histogram(upstream).lock() else {
            return empty;
        };
        if h.len() == 0 {
            return empty;
        }
        let ms = |q: f64| Some(h.value_at_quantile(q) as f64 / 1000.0);
        LatencySummary {
            samples: h.len(),
            p50_ms: ms(0.5),
            p95_ms: ms(0.95),
            p99_ms: ms(0.99),
        }
    }

    fn histogram(&self, upstream: Upstream) -> &Mutex<Histogram<u64>> {
        match upstream {
            Upstream::PriceSource => &self.price,
            Upstream::Relay => &self.relay,
        }
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

fn new_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(1, 100_000_000, 3).expect("valid histogram bounds")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_percentiles() {
        let stats = LatencyStats::new();
        let report = stats.report();
        assert_eq!(report.relay.samples, 0);
        assert!(report.relay.p50_ms.is_none());
        assert!(report.price_sources.p99_ms.is_none());
    }

    #[test]
    fn records_go_to_their_own_histogram() {
        let stats = LatencyStats::new();
        stats.record(Upstream::Relay, Duration::from_millis(120));
        stats.record(Upstream::Relay, Duration::from_millis(80));
        stats.record(Upstream::PriceSource, Duration::from_millis(15));

        let report = stats.report();
        assert_eq!(report.relay.samples, 2);
        assert_eq!(report.price_sources.samples, 1);

        let p50 = report.price_sources.p50_ms.unwrap();
        assert!((p50 - 15.0).abs() < 0.1, "p50 was {p50}");
    }
}
