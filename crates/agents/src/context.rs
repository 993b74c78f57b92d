//! Read-only per-tick market snapshot.
//!
//! The engine builds exactly one `MarketState` per tick and every agent
//! decides against it, so within-tick ordering among agents carries no
//! informational advantage. Agents must not (and cannot) mutate it.

use std::collections::BTreeMap;

use news::NewsEvent;
use types::{CrossEffect, Symbol, Tick, Timestamp};

/// Frozen view of the market handed to every agent's `decide`.
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    pub current_time: Timestamp,
    pub tick: Tick,
    /// Wall-clock weight of this tick; participation probabilities and
    /// decay rates scale by it.
    pub tick_scale: f64,
    pub global_sentiment: f64,
    pub interest_rate: f64,
    /// Last traded/reported price per symbol.
    pub prices: BTreeMap<Symbol, f64>,
    /// Model fundamental value per symbol.
    pub fundamentals: BTreeMap<Symbol, f64>,
    /// Bounded price history per symbol, oldest first.
    pub price_history: BTreeMap<Symbol, Vec<f64>>,
    pub daily_volumes: BTreeMap<Symbol, u64>,
    pub industries: BTreeMap<Symbol, String>,
    /// Configured spillover coefficients between instruments.
    pub cross_effects: BTreeMap<Symbol, Vec<CrossEffect>>,
    /// News applied this tick plus the trailing ring.
    pub recent_news: Vec<NewsEvent>,
}

impl MarketState {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// The `i`-th symbol in deterministic (sorted) order.
    pub fn nth_symbol(&self, i: usize) -> Option<&Symbol> {
        self.prices.keys().nth(i)
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn fundamental(&self, symbol: &str) -> Option<f64> {
        self.fundamentals.get(symbol).copied()
    }

    pub fn history(&self, symbol: &str) -> &[f64] {
        self.price_history
            .get(symbol)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn industry_of(&self, symbol: &str) -> &str {
        self.industries.get(symbol).map(|s| s.as_str()).unwrap_or("")
    }
}
