//! Portfolio rebalancing toward a target allocation.
//!
//! Targets an equal capital-weighted slice of total value per instrument
//! and trades the instrument with the largest deviation once it exceeds the
//! rebalance threshold.

use rand::Rng;

use types::{AgentKind, Order, OrderSide};

use crate::config::RebalanceConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::traits::Agent;

pub struct RebalanceTrader {
    core: AgentCore,
    config: RebalanceConfig,
    /// Fraction of total value targeted as inventory across instruments.
    target_ratio: f64,
    /// Deviation fraction that triggers a rebalancing trade.
    threshold: f64,
}

impl RebalanceTrader {
    pub fn new(mut core: AgentCore, config: RebalanceConfig) -> Self {
        let target_ratio =
            config.target_ratio_base + core.rng().random_range(0.0..config.target_ratio_range);
        let threshold =
            config.threshold_base + config.threshold_risk_scale * core.params().risk_aversion;
        Self {
            core,
            config,
            target_ratio,
            threshold,
        }
    }
}

impl Agent for RebalanceTrader {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Rebalance
    }

    fn decide(&mut self, state: &MarketState) -> Option<Order> {
        if !self
            .core
            .passes_reaction_gate(self.config.reaction_mult, state.tick_scale)
            || state.is_empty()
        {
            return None;
        }

        let total_value = self.core.total_value(state);
        if total_value <= 0.0 {
            return None;
        }
        let per_symbol_target = total_value * self.target_ratio / state.len() as f64;

        // Find the instrument furthest from its target slice.
        let mut best: Option<(&str, f64, f64)> = None;
        for (symbol, &price) in &state.prices {
            let position_value = self.core.position(symbol) as f64 * price;
            let deviation = (position_value - per_symbol_target) / total_value;
            if best.is_none_or(|(_, _, d)| deviation.abs() > d.abs()) {
                best = Some((symbol, price, deviation));
            }
        }

        let (symbol, price, deviation) = best?;
        if deviation.abs() < self.threshold || price <= 0.0 {
            return None;
        }
        let symbol = symbol.to_string();

        let confidence = (deviation.abs() / 0.1).min(1.0);
        let size = self.core.order_size(price, confidence);

        if deviation < 0.0 {
            // Underweight: buy toward target.
            if size > 0 && self.core.can_buy(size, price) {
                let offset = self.core.rng().random_range(0.0..self.config.limit_offset_max);
                return Some(self.core.make_limit(
                    &symbol,
                    OrderSide::Buy,
                    price * (1.0 + offset),
                    size,
                ));
            }
        } else {
            let size = size.min(self.core.max_sellable(&symbol));
            if size > 0 {
                let offset = self.core.rng().random_range(0.0..self.config.limit_offset_max);
                return Some(self.core.make_limit(
                    &symbol,
                    OrderSide::Sell,
                    price * (1.0 - offset),
                    size,
                ));
            }
        }

        None
    }
}
