//! Moving-average crossover momentum.
//!
//! A short SMA above the long SMA (normalized by the long) is the trend
//! signal, shifted by sentiment. Sells may run the position short up to the
//! shared bound.

use rand::Rng;

use types::{AgentKind, Order, OrderSide};

use crate::config::MomentumConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::strategies::sma;
use crate::traits::Agent;

pub struct MomentumTrader {
    core: AgentCore,
    config: MomentumConfig,
    short_period: usize,
    long_period: usize,
}

impl MomentumTrader {
    pub fn new(mut core: AgentCore, config: MomentumConfig) -> Self {
        let short_period = (config.short_period_min
            + core.rng().random_range(0..=config.short_period_range))
            as usize;
        let long_period = short_period
            + (config.long_offset_min + core.rng().random_range(0..=config.long_offset_range))
                as usize;
        Self {
            core,
            config,
            short_period,
            long_period,
        }
    }
}

impl Agent for MomentumTrader {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Momentum
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
        if history.len() < self.long_period {
            return None;
        }
        let price = state.price(&symbol)?;

        let short_ma = sma(history, self.short_period);
        let long_ma = sma(history, self.long_period);
        if short_ma <= 0.0 || long_ma <= 0.0 {
            return None;
        }

        let mut signal = (short_ma - long_ma) / long_ma;
        let sentiment = self
            .core
            .combined_sentiment(&symbol, state.industry_of(&symbol));
        signal += sentiment * self.config.sentiment_symbol_weight
            + self.core.global_sentiment_bias() * self.config.sentiment_global_weight;

        let threshold = self.config.signal_threshold_risk_scale * self.core.params().risk_aversion;
        let confidence = (signal.abs() / 0.02).min(1.0);

        if signal > threshold {
            let size = self.core.order_size(price, confidence);
            if size > 0 && self.core.can_buy(size, price) {
                let offset = self
                    .core
                    .rng()
                    .random_range(self.config.limit_offset_min..self.config.limit_offset_max);
                return Some(self.core.make_limit(
                    &symbol,
                    OrderSide::Buy,
                    price * (1.0 + offset),
                    size,
                ));
            }
        } else if signal < -threshold {
            let sellable = self.core.max_sellable(&symbol);
            let size = sellable.min(self.core.order_size(price, confidence));
            if size > 0 {
                let offset = self
                    .core
                    .rng()
                    .random_range(self.config.limit_offset_min..self.config.limit_offset_max);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use types::{AgentId, AgentParams, Cash};

    fn trader() -> MomentumTrader {
        let params = AgentParams {
            reaction_speed: 100.0,
            ..Default::default()
        };
        let core = AgentCore::new(
            AgentId(1),
            Cash::from_float(100_000.0),
            params,
            BehaviorConfig::default(),
            5,
        );
        MomentumTrader::new(core, MomentumConfig::default())
    }

    fn trending_state(up: bool) -> MarketState {
        let mut state = MarketState {
            tick_scale: 1.0,
            ..Default::default()
        };
        let history: Vec<f64> = (0..60)
            .map(|i| {
                if up {
                    100.0 + i as f64
                } else {
                    160.0 - i as f64
                }
            })
            .collect();
        let last = *history.last().unwrap();
        state.prices.insert("NTX".to_string(), last);
        state.fundamentals.insert("NTX".to_string(), last);
        state.price_history.insert("NTX".to_string(), history);
        state
            .industries
            .insert("NTX".to_string(), "Technology".to_string());
        state
    }

    #[test]
    fn test_uptrend_buys() {
        let mut trader = trader();
        let state = trending_state(true);
        let order = (0..20).find_map(|_| trader.decide(&state)).unwrap();
        assert_eq!(order.side, OrderSide::Buy);
    }

    #[test]
    fn test_downtrend_sells_short() {
        let mut trader = trader();
        let state = trending_state(false);
        let order = (0..20).find_map(|_| trader.decide(&state)).unwrap();
        // No position held: the sell draws on short capacity.
        assert_eq!(order.side, OrderSide::Sell);
    }

    #[test]
    fn test_short_history_sits_out() {
        let mut trader = trader();
        let mut state = trending_state(true);
        state
            .price_history
            .insert("NTX".to_string(), vec![100.0, 101.0]);
        assert!(trader.decide(&state).is_none());
    }
}
