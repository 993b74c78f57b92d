//! Continuous two-sided market making.
//!
//! Quotes both sides of every instrument around a mid blended slightly
//! toward the fundamental. The spread widens with estimated volatility and
//! with how agitated the maker is; quotes skew away from accumulated
//! inventory, with the skew clamped to the half-spread so neither side can
//! cross the blended mid. `decide` returns one of the generated quotes per
//! tick.

use rand::Rng;

use types::{AgentKind, Order, OrderSide};

use crate::config::MarketMakerConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::traits::Agent;

pub struct MarketMaker {
    core: AgentCore,
    config: MarketMakerConfig,
    base_spread: f64,
    inventory_skew: f64,
    max_inventory: i64,
}

impl MarketMaker {
    pub fn new(mut core: AgentCore, config: MarketMakerConfig) -> Self {
        let base_spread = core
            .rng()
            .random_range(config.base_spread_min..config.base_spread_max);
        let inventory_skew = core
            .rng()
            .random_range(config.inventory_skew_min..config.inventory_skew_max);
        let max_inventory = core
            .rng()
            .random_range(config.max_inventory_min..=config.max_inventory_max);
        Self {
            core,
            config,
            base_spread,
            inventory_skew,
            max_inventory,
        }
    }

    /// Rolling volatility proxy: root mean square of the last 20 returns.
    fn estimate_volatility(history: &[f64]) -> f64 {
        if history.len() <= 20 {
            return 0.02;
        }
        let tail = &history[history.len() - 21..];
        let mut sum_sq = 0.0;
        for pair in tail.windows(2) {
            if pair[0] > 0.0 {
                let ret = (pair[1] - pair[0]) / pair[0];
                sum_sq += ret * ret;
            }
        }
        (sum_sq / 20.0).sqrt()
    }

    /// Generate bid/ask quotes for every quotable instrument.
    pub fn quote_market(&mut self, state: &MarketState) -> Vec<Order> {
        let mut orders = Vec::new();

        for (symbol, &price) in &state.prices {
            if price <= 0.0 {
                continue;
            }

            let volatility = Self::estimate_volatility(state.history(symbol));
            let mut spread =
                self.base_spread * (1.0 + volatility * self.config.volatility_spread_mult);
            spread *= 1.0
                + self.core.global_sentiment_bias().abs() * self.config.sentiment_spread_mult;

            // Blend the quoting mid toward the fundamental so fundamental
            // moves transmit into market prices.
            let fundamental = state.fundamental(symbol).unwrap_or(price);
            let fw = self.config.fundamental_weight;
            let mid = if fundamental > 0.0 {
                price * (1.0 - fw) + fundamental * fw
            } else {
                price
            };
            let half_spread = spread * mid / 2.0;

            let inventory = self.core.position(symbol);
            let clamped_inventory = inventory.clamp(-self.max_inventory, self.max_inventory);
            let skew_shift =
                (clamped_inventory as f64 * self.inventory_skew * mid).clamp(-half_spread, half_spread);

            let bid_price = (mid - half_spread - skew_shift).max(0.01);
            let ask_price = (mid + half_spread - skew_shift).max(bid_price + 0.01);

            let base_size =
                ((self.core.cash().to_float() * self.config.quote_capital_fraction / price) as u64)
                    .max(1);

            if inventory < self.max_inventory && self.core.can_buy(base_size, bid_price) {
                orders.push(
                    self.core
                        .make_limit(symbol, OrderSide::Buy, bid_price, base_size),
                );
            }
            // Symmetric liquidity: the ask may run inventory short.
            if inventory > -self.max_inventory {
                orders.push(
                    self.core
                        .make_limit(symbol, OrderSide::Sell, ask_price, base_size),
                );
            }
        }

        orders
    }
}

impl Agent for MarketMaker {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::MarketMaker
    }

    fn decide(&mut self, state: &MarketState) -> Option<Order> {
        let quotes = self.quote_market(state);
        if quotes.is_empty() {
            return None;
        }
        let pick = self.core.rng().random_range(0..quotes.len());
        quotes.into_iter().nth(pick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use types::{AgentId, AgentParams, Cash, OrderType};

    fn maker() -> MarketMaker {
        let core = AgentCore::new(
            AgentId(1),
            Cash::from_float(1_000_000.0),
            AgentParams::default(),
            BehaviorConfig::default(),
            23,
        );
        MarketMaker::new(core, MarketMakerConfig::default())
    }

    fn state() -> MarketState {
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

    fn limit_price(order: &Order) -> f64 {
        match order.order_type {
            OrderType::Limit { price } => price.to_float(),
            OrderType::Market => panic!("market makers only quote limits"),
        }
    }

    #[test]
    fn test_quotes_both_sides() {
        let mut maker = maker();
        let quotes = maker.quote_market(&state());
        assert_eq!(quotes.len(), 2);

        let bid = quotes.iter().find(|o| o.side == OrderSide::Buy).unwrap();
        let ask = quotes.iter().find(|o| o.side == OrderSide::Sell).unwrap();
        assert!(limit_price(bid) < 100.0);
        assert!(limit_price(ask) > 100.0);
    }

    #[test]
    fn test_long_inventory_skews_quotes_down() {
        let mut neutral = maker();
        let mut long = maker();
        long.core_mut().seed_inventory("NTX", 1_000, 100.0);

        let state = state();
        let nq = neutral.quote_market(&state);
        let lq = long.quote_market(&state);

        let n_ask = nq.iter().find(|o| o.side == OrderSide::Sell).unwrap();
        let l_ask = lq.iter().find(|o| o.side == OrderSide::Sell).unwrap();
        // Long inventory lowers the ask to shed position.
        assert!(limit_price(l_ask) < limit_price(n_ask));
    }

    #[test]
    fn test_skew_never_crosses_mid() {
        let mut maker = maker();
        // Inventory far beyond the max still cannot push the ask below mid.
        maker.core_mut().seed_inventory("NTX", 100_000, 100.0);
        let quotes = maker.quote_market(&state());
        for quote in quotes {
            match quote.side {
                OrderSide::Buy => assert!(limit_price(&quote) <= 100.0 + 1e-9),
                OrderSide::Sell => assert!(limit_price(&quote) >= 100.0 - 1e-9),
            }
        }
    }

    #[test]
    fn test_volatility_widens_spread() {
        let mut calm = maker();
        let mut stressed = maker();

        let calm_state = state();
        let mut wild_state = state();
        let mut history: Vec<f64> = Vec::new();
        let mut p = 100.0;
        for i in 0..40 {
            p *= if i % 2 == 0 { 1.08 } else { 0.93 };
            history.push(p);
        }
        wild_state.price_history.insert("NTX".to_string(), history);

        let calm_quotes = calm.quote_market(&calm_state);
        let wild_quotes = stressed.quote_market(&wild_state);

        let spread = |quotes: &[Order]| {
            let bid = quotes.iter().find(|o| o.side == OrderSide::Buy).unwrap();
            let ask = quotes.iter().find(|o| o.side == OrderSide::Sell).unwrap();
            limit_price(ask) - limit_price(bid)
        };
        assert!(spread(&wild_quotes) > spread(&calm_quotes));
    }

    #[test]
    fn test_decide_returns_one_quote() {
        let mut maker = maker();
        let order = maker.decide(&state()).unwrap();
        assert!(matches!(order.order_type, OrderType::Limit { .. }));
    }
}
