//! Cross-instrument propagation trading.
//!
//! Watches for a detected move in a source instrument since the last
//! observed price and trades related instruments scaled by the configured
//! spillover coefficient, front-running the expected knock-on move.

use std::collections::HashMap;

use rand::Rng;

use types::{AgentKind, Order, OrderSide, Symbol};

use crate::config::CrossAssetConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::traits::Agent;

pub struct CrossAssetTrader {
    core: AgentCore,
    config: CrossAssetConfig,
    /// Source move required before acting; widens with risk aversion.
    threshold: f64,
    /// Prices seen on the previous acting tick, per symbol.
    last_prices: HashMap<Symbol, f64>,
}

impl CrossAssetTrader {
    pub fn new(core: AgentCore, config: CrossAssetConfig) -> Self {
        let threshold =
            config.threshold_base + config.threshold_risk_scale * core.params().risk_aversion;
        Self {
            core,
            config,
            threshold,
            last_prices: HashMap::new(),
        }
    }

    fn detect_change(&self, symbol: &str, current: f64) -> f64 {
        match self.last_prices.get(symbol) {
            Some(&last) if last > 0.0 => (current - last) / last,
            _ => 0.0,
        }
    }
}

impl Agent for CrossAssetTrader {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::CrossAsset
    }

    fn decide(&mut self, state: &MarketState) -> Option<Order> {
        if !self
            .core
            .passes_reaction_gate(self.config.reaction_mult, state.tick_scale)
        {
            return None;
        }
        if state.is_empty() || state.cross_effects.is_empty() {
            return None;
        }

        // Detect source moves against the previously seen prices, then
        // refresh the reference for the next round.
        let changes: Vec<(Symbol, f64)> = state
            .cross_effects
            .keys()
            .filter_map(|symbol| {
                let price = state.price(symbol)?;
                Some((symbol.clone(), self.detect_change(symbol, price)))
            })
            .collect();
        for (symbol, &price) in &state.prices {
            self.last_prices.insert(symbol.clone(), price);
        }

        for (source, change) in changes {
            if change.abs() <= self.threshold {
                continue;
            }
            let Some(effects) = state.cross_effects.get(&source) else {
                continue;
            };

            for effect in effects {
                let Some(target_price) = state.price(&effect.target) else {
                    continue;
                };
                let expected = change * effect.coefficient * self.config.effect_weight;

                if expected > 0.01 {
                    let confidence = (expected / 0.05).min(1.0);
                    let size = self.core.order_size(target_price, confidence);
                    if size > 0 && self.core.can_buy(size, target_price) {
                        let offset =
                            self.core.rng().random_range(0.0..self.config.limit_offset_max);
                        return Some(self.core.make_limit(
                            &effect.target,
                            OrderSide::Buy,
                            target_price * (1.0 + offset),
                            size,
                        ));
                    }
                } else if expected < -0.01 {
                    let sellable = self.core.max_sellable(&effect.target);
                    let confidence = (expected.abs() / 0.05).min(1.0);
                    let size = sellable.min(self.core.order_size(target_price, confidence));
                    if size > 0 {
                        let offset =
                            self.core.rng().random_range(0.0..self.config.limit_offset_max);
                        return Some(self.core.make_limit(
                            &effect.target,
                            OrderSide::Sell,
                            target_price * (1.0 - offset),
                            size,
                        ));
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use types::{AgentId, AgentParams, Cash, CrossEffect};

    fn trader() -> CrossAssetTrader {
        let params = AgentParams {
            reaction_speed: 100.0,
            ..Default::default()
        };
        let core = AgentCore::new(
            AgentId(1),
            Cash::from_float(100_000.0),
            params,
            BehaviorConfig::default(),
            31,
        );
        CrossAssetTrader::new(core, CrossAssetConfig::default())
    }

    fn state(oil: f64, steel: f64) -> MarketState {
        let mut state = MarketState {
            tick_scale: 1.0,
            ..Default::default()
        };
        state.prices.insert("OILC".to_string(), oil);
        state.prices.insert("STLW".to_string(), steel);
        state.fundamentals.insert("OILC".to_string(), oil);
        state.fundamentals.insert("STLW".to_string(), steel);
        state.cross_effects.insert(
            "OILC".to_string(),
            vec![CrossEffect {
                target: "STLW".to_string(),
                coefficient: 0.5,
            }],
        );
        state
    }

    #[test]
    fn test_source_spike_buys_target() {
        let mut trader = trader();
        // First observation establishes the reference prices.
        assert!(trader.decide(&state(75.0, 120.0)).is_none());

        // Oil jumps 20%: expected steel spillover = 0.2 * 0.5 * 0.3 = 3%.
        let order = trader.decide(&state(90.0, 120.0)).unwrap();
        assert_eq!(order.symbol, "STLW");
        assert_eq!(order.side, OrderSide::Buy);
    }

    #[test]
    fn test_source_crash_sells_target() {
        let mut trader = trader();
        assert!(trader.decide(&state(75.0, 120.0)).is_none());

        let order = trader.decide(&state(60.0, 120.0)).unwrap();
        assert_eq!(order.symbol, "STLW");
        assert_eq!(order.side, OrderSide::Sell);
    }

    #[test]
    fn test_small_move_ignored() {
        let mut trader = trader();
        assert!(trader.decide(&state(75.0, 120.0)).is_none());
        // 1% move is inside the threshold.
        assert!(trader.decide(&state(75.75, 120.0)).is_none());
    }
}
