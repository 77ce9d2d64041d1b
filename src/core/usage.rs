//! Token usage accounting and cost estimation

use std::sync::Mutex;

use serde::Serialize;

use crate::config::{ModelTier, RateSettings};

/// Cumulative tokens per model tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenCounts {
    pub cheap: u64,
    pub premium: u64,
}

impl TokenCounts {
    pub fn get(&self, tier: ModelTier) -> u64 {
        match tier {
            ModelTier::Cheap => self.cheap,
            ModelTier::Premium => self.premium,
        }
    }

    fn slot(&mut self, tier: ModelTier) -> &mut u64 {
        match tier {
            ModelTier::Cheap => &mut self.cheap,
            ModelTier::Premium => &mut self.premium,
        }
    }
}

/// Usage ledger for one pipeline run.
///
/// Counters start at zero and only ever grow. The lock lets concurrent
/// fan-out requests share a `&UsageLedger`.
#[derive(Debug, Default)]
pub struct UsageLedger {
    counts: Mutex<TokenCounts>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tier: ModelTier, tokens: u64) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let slot = counts.slot(tier);
        *slot = slot.saturating_add(tokens);
    }

    pub fn snapshot(&self) -> TokenCounts {
        *self.counts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Approximate dollar cost of the recorded usage
pub fn estimate_cost(counts: &TokenCounts, rates: &RateSettings) -> f64 {
    ModelTier::ALL
        .iter()
        .map(|&tier| counts.get(tier) as f64 * rates.per_token(tier))
        .sum()
}

/// Render a dollar amount as `$X.XX`
pub fn format_cost(dollars: f64) -> String {
    format!("${:.2}", dollars)
}
