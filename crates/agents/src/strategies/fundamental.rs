//! Value trading against a noisy fundamental estimate.
//!
//! Each agent estimates fair value as the model fundamental perturbed by
//! personal noise and biased by its combined sentiment. A relative
//! mispricing beyond the agent's threshold triggers a limit order toward
//! the estimate; sells are long-only.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use types::{AgentKind, Order, OrderSide};

use crate::config::FundamentalConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::traits::Agent;

pub struct FundamentalTrader {
    core: AgentCore,
    config: FundamentalConfig,
    /// Mispricing fraction required before trading; widens with risk aversion.
    threshold: f64,
    /// Personal estimation noise.
    noise_std: f64,
}

impl FundamentalTrader {
    pub fn new(mut core: AgentCore, config: FundamentalConfig) -> Self {
        let threshold =
            config.threshold_base + config.threshold_risk_scale * core.params().risk_aversion;
        let noise_std =
            config.noise_std_base + config.noise_std_range * core.rng().random_range(0.0..1.0);
        Self {
            core,
            config,
            threshold,
            noise_std,
        }
    }
}

impl Agent for FundamentalTrader {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Fundamental
    }

    fn decide(&mut self, state: &MarketState) -> Option<Order> {
        if !self
            .core
            .passes_reaction_gate(self.config.reaction_mult, state.tick_scale)
            || state.is_empty()
        {
            return None;
        }

        let idx = self.core.rng().random_range(0..state.len());
        let symbol = state.nth_symbol(idx)?.clone();
        let price = state.price(&symbol)?;
        if price <= 0.0 {
            return None;
        }
        let fundamental = state.fundamental(&symbol)?;

        let noise = Normal::new(0.0, self.noise_std)
            .ok()?
            .sample(self.core.rng());
        let sentiment = self
            .core
            .combined_sentiment(&symbol, state.industry_of(&symbol));
        let estimate =
            fundamental * (1.0 + noise) * (1.0 + sentiment * self.config.sentiment_impact);

        let mispricing = (estimate - price) / price;

        if mispricing > self.threshold {
            let confidence = (mispricing.abs() / 0.1).min(1.0);
            let size = self.core.order_size(price, confidence);
            if size > 0 && self.core.can_buy(size, price) {
                let offset = self.core.rng().random_range(0.0..self.config.limit_offset_max);
                return Some(self.core.make_limit(
                    &symbol,
                    OrderSide::Buy,
                    price * (1.0 + offset),
                    size,
                ));
            }
        } else if mispricing < -self.threshold {
            let position = self.core.position(&symbol);
            if position > 0 {
                let confidence = (mispricing.abs() / 0.1).min(1.0);
                let size = (position as u64).min(self.core.order_size(price, confidence));
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
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use types::{AgentId, AgentParams, Cash};

    fn state_with(symbol: &str, price: f64, fundamental: f64) -> MarketState {
        let mut state = MarketState {
            tick_scale: 1.0,
            ..Default::default()
        };
        state.prices.insert(symbol.to_string(), price);
        state.fundamentals.insert(symbol.to_string(), fundamental);
        state
            .industries
            .insert(symbol.to_string(), "Technology".to_string());
        state
    }

    fn trader(seed: u64) -> FundamentalTrader {
        let params = AgentParams {
            reaction_speed: 100.0, // always passes the gate
            ..Default::default()
        };
        let core = AgentCore::new(
            AgentId(1),
            Cash::from_float(100_000.0),
            params,
            BehaviorConfig::default(),
            seed,
        );
        FundamentalTrader::new(core, FundamentalConfig::default())
    }

    #[test]
    fn test_buys_deep_undervaluation() {
        // Fundamental is 50% above price: buys regardless of estimate noise.
        let state = state_with("NTX", 100.0, 150.0);
        let mut bought = false;
        let mut trader = trader(9);
        for _ in 0..50 {
            if let Some(order) = trader.decide(&state) {
                assert_eq!(order.side, OrderSide::Buy);
                bought = true;
                break;
            }
        }
        assert!(bought);
    }

    #[test]
    fn test_no_sell_without_position() {
        // Fundamental far below price, but the trader holds nothing.
        let state = state_with("NTX", 100.0, 50.0);
        let mut trader = trader(9);
        for _ in 0..50 {
            assert!(trader.decide(&state).is_none());
        }
    }

    #[test]
    fn test_fair_price_rarely_trades() {
        let state = state_with("NTX", 100.0, 100.0);
        let mut trader = trader(9);
        let trades = (0..200).filter(|_| trader.decide(&state).is_some()).count();
        // Noise occasionally pushes the estimate over the threshold, but
        // a fairly priced instrument should mostly be left alone.
        assert!(trades < 100, "traded {trades} times at fair value");
    }
}
