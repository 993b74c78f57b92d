//! Sentiment-weighted random trading.
//!
//! Noise traders fire on a per-tick probability amplified by how agitated
//! they are, pick a random instrument, and buy or sell with a bias drawn
//! from their sentiment plus fresh noise. They overreact to headlines (own
//! belief update) and forget quickly (own decay rates).

use rand::Rng;
use rand_distr::{Distribution, Normal};

use news::{NewsEvent, NewsSentiment};
use types::{AgentKind, Order, OrderSide, OrderType, Price};

use crate::config::NoiseConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::traits::Agent;

pub struct NoiseTrader {
    core: AgentCore,
    config: NoiseConfig,
    trade_probability: f64,
    sentiment_sensitivity: f64,
}

impl NoiseTrader {
    pub fn new(mut core: AgentCore, config: NoiseConfig) -> Self {
        let trade_probability =
            config.trade_prob_min + core.rng().random_range(0.0..config.trade_prob_range);
        let sentiment_sensitivity = core
            .rng()
            .random_range(config.sentiment_sensitivity_min..config.sentiment_sensitivity_max);
        let core = core.with_decay(config.sentiment_decay);
        Self {
            core,
            config,
            trade_probability,
            sentiment_sensitivity,
        }
    }
}

impl Agent for NoiseTrader {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Noise
    }

    /// Overreaction: all news lands on the global bias, amplified by the
    /// agent's personal sensitivity, regardless of its target.
    fn update_beliefs(&mut self, news: &NewsEvent) {
        let impact = news.magnitude
            * self.core.params().news_weight
            * self.sentiment_sensitivity
            * self.config.overreaction_mult;
        match news.sentiment {
            NewsSentiment::Positive => self.core.sentiment_mut().nudge_global(impact),
            NewsSentiment::Negative => self.core.sentiment_mut().nudge_global(-impact),
            NewsSentiment::Neutral => {}
        }
    }

    fn decide(&mut self, state: &MarketState) -> Option<Order> {
        let bias = self.core.global_sentiment_bias();
        let effective_prob = self.trade_probability * (1.0 + bias.abs()) * state.tick_scale;
        if self.core.rng().random_range(0.0..1.0) > effective_prob || state.is_empty() {
            return None;
        }

        let idx = self.core.rng().random_range(0..state.len());
        let symbol = state.nth_symbol(idx)?.clone();
        let price = state.price(&symbol)?;
        if price <= 0.0 {
            return None;
        }

        let noise = Normal::new(0.0, self.config.buy_bias_noise_std)
            .ok()?
            .sample(self.core.rng());
        let buy_prob = 0.5 + bias * self.config.buy_bias_sentiment_weight + noise;
        let should_buy = self.core.rng().random_range(0.0..1.0) < buy_prob;

        let confidence = self
            .core
            .rng()
            .random_range(self.config.confidence_min..self.config.confidence_max);

        if should_buy {
            let size = self.core.order_size(price, confidence);
            if size > 0 && self.core.can_buy(size, price) {
                let offset = self
                    .core
                    .rng()
                    .random_range(self.config.limit_offset_min..self.config.limit_offset_max);
                return Some(self.order(&symbol, OrderSide::Buy, price * (1.0 + offset), size));
            }
        } else {
            let position = self.core.position(&symbol);
            if position > 0 {
                let size = (position as u64).min(self.core.order_size(price, confidence));
                if size > 0 {
                    let offset = self
                        .core
                        .rng()
                        .random_range(self.config.limit_offset_min..self.config.limit_offset_max);
                    return Some(self.order(&symbol, OrderSide::Sell, price * (1.0 - offset), size));
                }
            }
        }

        None
    }
}

impl NoiseTrader {
    /// Mix market and limit orders per the configured probability.
    fn order(&mut self, symbol: &str, side: OrderSide, limit_price: f64, size: u64) -> Order {
        let use_market = self
            .core
            .rng()
            .random_range(0.0..1.0)
            < self.config.market_order_prob;
        let order_type = if use_market {
            OrderType::Market
        } else {
            OrderType::Limit {
                price: Price::from_float(limit_price.max(0.0001)),
            }
        };
        self.core.make_order(symbol, side, order_type, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use news::NewsCategory;
    use types::{AgentId, AgentParams, Cash};

    fn trader(seed: u64) -> NoiseTrader {
        let core = AgentCore::new(
            AgentId(1),
            Cash::from_float(100_000.0),
            AgentParams::default(),
            BehaviorConfig::default(),
            seed,
        );
        NoiseTrader::new(core, NoiseConfig::default())
    }

    fn one_symbol_state() -> MarketState {
        let mut state = MarketState {
            tick_scale: 1.0,
            ..Default::default()
        };
        state.prices.insert("NTX".to_string(), 100.0);
        state.fundamentals.insert("NTX".to_string(), 100.0);
        state
            .industries
            .insert("NTX".to_string(), "Technology".to_string());
        state
    }

    #[test]
    fn test_trades_sometimes_and_mixes_order_types() {
        let state = one_symbol_state();
        let mut trader = trader(3);
        let mut orders = Vec::new();
        for _ in 0..5_000 {
            if let Some(order) = trader.decide(&state) {
                orders.push(order);
            }
        }
        // Trade probability is 5-15% per tick and only buys go through
        // with an empty portfolio, so roughly an eighth participate.
        assert!(orders.len() > 60, "only {} orders", orders.len());
        assert!(orders.len() < 1_500, "{} orders", orders.len());
        let markets = orders
            .iter()
            .filter(|o| o.order_type == OrderType::Market)
            .count();
        assert!(markets > 0, "no market orders among {}", orders.len());
    }

    #[test]
    fn test_overreaction_to_news() {
        let mut plain = trader(3);
        let mut noisy = trader(3);
        let news = NewsEvent {
            category: NewsCategory::Global,
            sentiment: NewsSentiment::Positive,
            magnitude: 0.5,
            industry: String::new(),
            symbol: String::new(),
            subcategory: String::new(),
            headline: String::new(),
            timestamp: 0,
        };
        plain.core_mut().update_beliefs(&news);
        noisy.update_beliefs(&news);
        // Same seed: the only difference is the override's sensitivity scale.
        assert!(noisy.sentiment_bias() <= plain.sentiment_bias());
        assert!(noisy.sentiment_bias() > 0.0);
    }

    #[test]
    fn test_sentiment_decays_fast() {
        let mut trader = trader(3);
        let news = NewsEvent {
            category: NewsCategory::Global,
            sentiment: NewsSentiment::Negative,
            magnitude: 1.0,
            industry: String::new(),
            symbol: String::new(),
            subcategory: String::new(),
            headline: String::new(),
            timestamp: 0,
        };
        trader.update_beliefs(&news);
        let initial = trader.sentiment_bias().abs();
        for _ in 0..50 {
            trader.decay_sentiment(1.0);
        }
        assert!(trader.sentiment_bias().abs() < initial * 0.5);
    }
}
