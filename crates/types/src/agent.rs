//! Agent parameter and diagnostic types.

use crate::money::Cash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of trading strategies in the population.
///
/// Trades are tagged with the kind of both counterparties so external
/// callers can attribute flow without any back-reference to the agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    Fundamental,
    Momentum,
    MeanReversion,
    Noise,
    MarketMaker,
    CrossAsset,
    Rebalance,
    Event,
    /// Manual orders submitted through the API (agent id 0).
    External,
}

impl AgentKind {
    /// All strategy kinds that can appear in a configured population.
    pub const STRATEGIES: [AgentKind; 8] = [
        AgentKind::Fundamental,
        AgentKind::Momentum,
        AgentKind::MeanReversion,
        AgentKind::Noise,
        AgentKind::MarketMaker,
        AgentKind::CrossAsset,
        AgentKind::Rebalance,
        AgentKind::Event,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgentKind::Fundamental => "Fundamental",
            AgentKind::Momentum => "Momentum",
            AgentKind::MeanReversion => "MeanReversion",
            AgentKind::Noise => "Noise",
            AgentKind::MarketMaker => "MarketMaker",
            AgentKind::CrossAsset => "CrossAsset",
            AgentKind::Rebalance => "Rebalance",
            AgentKind::Event => "Event",
            AgentKind::External => "External",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Behavioral parameters sampled once at agent creation.
///
/// Immutable for the agent's lifetime; heterogeneity across the population
/// comes entirely from these draws plus per-strategy sampled constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    /// Higher aversion shrinks position sizes and widens signal thresholds.
    pub risk_aversion: f64,
    /// Scales per-tick participation probability.
    pub reaction_speed: f64,
    /// Scales belief updates from news.
    pub news_weight: f64,
    /// Baseline confidence in the agent's own signal.
    pub confidence: f64,
    /// Nominal holding horizon in ticks.
    pub time_horizon: u32,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            risk_aversion: 1.0,
            reaction_speed: 1.0,
            news_weight: 1.0,
            confidence: 0.5,
            time_horizon: 20,
        }
    }
}

/// Per-strategy-kind order and fill statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentTypeStats {
    pub orders_placed: u64,
    pub buy_orders: u64,
    pub sell_orders: u64,
    pub fills: u64,
    pub volume_traded: u64,
    pub cash_spent: Cash,
    pub cash_received: Cash,
}
