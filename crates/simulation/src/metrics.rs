//! Serializable views and aggregate metrics exposed to external callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use types::{AgentKind, AgentTypeStats, Symbol};

/// Aggregate diagnostics for a run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimulationMetrics {
    pub total_ticks: u64,
    pub total_trades: u64,
    pub total_orders: u64,
    /// Mean bid/ask spread across instruments with a two-sided book.
    pub avg_spread: f64,
    /// One-period return per symbol.
    pub returns: BTreeMap<Symbol, f64>,
    /// Order/fill statistics per strategy kind.
    pub agent_stats: BTreeMap<AgentKind, AgentTypeStats>,
}

/// One instrument's externally visible state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentView {
    pub symbol: Symbol,
    pub name: String,
    pub industry: String,
    pub price: f64,
    pub fundamental: f64,
    pub daily_volume: u64,
    /// One-period return.
    pub ret: f64,
    /// Rolling volatility estimate.
    pub volatility: f64,
    pub market_cap: f64,
    pub circuit_broken: bool,
    /// Bounded price history, oldest first.
    pub history: Vec<f64>,
}

/// Aggregate view of one strategy kind's population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub kind: AgentKind,
    pub count: usize,
    pub total_cash: f64,
    pub total_portfolio_value: f64,
    pub avg_sentiment: f64,
    pub stats: AgentTypeStats,
}

/// Populate progress pollable by external callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PopulateProgress {
    pub target_days: u32,
    pub current_day: u32,
}

/// Controller run state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateView {
    pub running: bool,
    pub paused: bool,
    pub populating: bool,
    pub current_tick: u64,
    pub sim_time: u64,
    pub sim_date: String,
    pub populate: PopulateProgress,
}
