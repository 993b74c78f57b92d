//! Z-score mean reversion against a rolling price window.
//!
//! Sells when the price is rich relative to its rolling mean (long-only),
//! buys when cheap. Sentiment shifts the z-score so a well-liked instrument
//! reads less stretched on the upside.

use rand::Rng;

use types::{AgentKind, Order, OrderSide};

use crate::config::MeanReversionConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::strategies::mean_std;
use crate::traits::Agent;

pub struct MeanReversionTrader {
    core: AgentCore,
    config: MeanReversionConfig,
    lookback: usize,
    z_threshold: f64,
}

impl MeanReversionTrader {
    pub fn new(mut core: AgentCore, config: MeanReversionConfig) -> Self {
        let lookback =
            (config.lookback_min + core.rng().random_range(0..=config.lookback_range)) as usize;
        let z_threshold =
            config.z_threshold_min + core.rng().random_range(0.0..config.z_threshold_range);
        Self {
            core,
            config,
            lookback,
            z_threshold,
        }
    }
}

impl Agent for MeanReversionTrader {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::MeanReversion
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
        let history = state.history(&symbol);
        if history.len() < self.lookback {
            return None;
        }
        let price = state.price(&symbol)?;

        let (mean, std) = mean_std(history, self.lookback);
        if std <= 0.0 {
            return None;
        }

        let mut z = (price - mean) / std;
        let symbol_bias = self.core.sentiment().symbol_bias(&symbol);
        z += symbol_bias * self.config.sentiment_symbol_weight
            + self.core.global_sentiment_bias() * self.config.sentiment_global_weight;

        if z > self.z_threshold {
            // Rich: unwind longs only.
            let position = self.core.position(&symbol);
            if position > 0 {
                let confidence = ((z.abs() - self.z_threshold) / 2.0).min(1.0);
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
        } else if z < -self.z_threshold {
            let confidence = ((z.abs() - self.z_threshold) / 2.0).min(1.0);
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
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use types::{AgentId, AgentParams, Cash};

    fn trader() -> MeanReversionTrader {
        let params = AgentParams {
            reaction_speed: 100.0,
            ..Default::default()
        };
        let core = AgentCore::new(
            AgentId(1),
            Cash::from_float(100_000.0),
            params,
            BehaviorConfig::default(),
            17,
        );
        MeanReversionTrader::new(core, MeanReversionConfig::default())
    }

    fn state_with_history(history: Vec<f64>, last: f64) -> MarketState {
        let mut state = MarketState {
            tick_scale: 1.0,
            ..Default::default()
        };
        state.prices.insert("NTX".to_string(), last);
        state.fundamentals.insert("NTX".to_string(), last);
        state.price_history.insert("NTX".to_string(), history);
        state
            .industries
            .insert("NTX".to_string(), "Technology".to_string());
        state
    }

    #[test]
    fn test_buys_deep_dip() {
        let mut history: Vec<f64> = (0..50).map(|i| 100.0 + (i % 5) as f64).collect();
        history.push(60.0); // far below the rolling mean
        let state = state_with_history(history, 60.0);

        let mut trader = trader();
        let order = (0..20).find_map(|_| trader.decide(&state)).unwrap();
        assert_eq!(order.side, OrderSide::Buy);
    }

    #[test]
    fn test_spike_without_position_sits_out() {
        let mut history: Vec<f64> = (0..50).map(|i| 100.0 + (i % 5) as f64).collect();
        history.push(160.0);
        let state = state_with_history(history, 160.0);

        let mut trader = trader();
        for _ in 0..20 {
            assert!(trader.decide(&state).is_none());
        }
    }

    #[test]
    fn test_flat_series_sits_out() {
        let state = state_with_history(vec![100.0; 60], 100.0);
        let mut trader = trader();
        for _ in 0..20 {
            assert!(trader.decide(&state).is_none());
        }
    }
}
