//! Shared agent bookkeeping.
//!
//! Every strategy embeds an `AgentCore` holding cash, portfolio, sampled
//! parameters, layered sentiment and a deterministic RNG stream. The core
//! implements the sizing rule and risk gates common to all strategies so
//! concrete agents only contribute their signal.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use news::NewsEvent;
use types::{
    AgentId, AgentParams, Cash, Order, OrderSide, OrderType, Position, Price, Quantity, Symbol,
    Trade,
};

use crate::config::BehaviorConfig;
use crate::context::MarketState;
use crate::sentiment::{SentimentDecay, SentimentState};

/// Cash, portfolio, sentiment and sizing shared by all strategies.
#[derive(Debug)]
pub struct AgentCore {
    id: AgentId,
    cash: Cash,
    initial_cash: Cash,
    params: AgentParams,
    behavior: BehaviorConfig,
    decay: SentimentDecay,
    portfolio: BTreeMap<Symbol, Position>,
    sentiment: SentimentState,
    rng: StdRng,
}

impl AgentCore {
    pub fn new(id: AgentId, cash: Cash, params: AgentParams, behavior: BehaviorConfig, seed: u64) -> Self {
        let decay = behavior.sentiment_decay;
        Self {
            id,
            cash,
            initial_cash: cash,
            params,
            behavior,
            decay,
            portfolio: BTreeMap::new(),
            sentiment: SentimentState::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Override the per-layer decay rates (noise traders shed faster).
    pub fn with_decay(mut self, decay: SentimentDecay) -> Self {
        self.decay = decay;
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn cash(&self) -> Cash {
        self.cash
    }

    pub fn params(&self) -> &AgentParams {
        &self.params
    }

    pub fn portfolio(&self) -> &BTreeMap<Symbol, Position> {
        &self.portfolio
    }

    pub fn sentiment(&self) -> &SentimentState {
        &self.sentiment
    }

    pub fn sentiment_mut(&mut self) -> &mut SentimentState {
        &mut self.sentiment
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn set_behavior(&mut self, behavior: BehaviorConfig) {
        self.decay = behavior.sentiment_decay;
        self.behavior = behavior;
    }

    // ------------------------------------------------------------------
    // Participation
    // ------------------------------------------------------------------

    /// Per-tick participation gate: `reaction_speed × strategy multiplier ×
    /// tick_scale` caps the probability of acting this tick.
    pub fn passes_reaction_gate(&mut self, strategy_mult: f64, tick_scale: f64) -> bool {
        let p = self.params.reaction_speed * strategy_mult * tick_scale;
        self.rng.random_range(0.0..1.0) < p
    }

    // ------------------------------------------------------------------
    // Sentiment
    // ------------------------------------------------------------------

    pub fn update_beliefs(&mut self, news: &NewsEvent) {
        self.sentiment.apply(news, self.params.news_weight);
    }

    pub fn decay_sentiment(&mut self, tick_scale: f64) {
        let decay = self.decay;
        self.sentiment.decay(tick_scale, &decay);
    }

    pub fn combined_sentiment(&self, symbol: &str, industry: &str) -> f64 {
        self.sentiment.combined(symbol, industry)
    }

    pub fn global_sentiment_bias(&self) -> f64 {
        self.sentiment.global_bias()
    }

    // ------------------------------------------------------------------
    // Portfolio
    // ------------------------------------------------------------------

    /// Signed position in a symbol (negative = short).
    pub fn position(&self, symbol: &str) -> i64 {
        self.portfolio.get(symbol).map(|p| p.quantity).unwrap_or(0)
    }

    /// Mark-to-market value of all holdings.
    pub fn portfolio_value(&self, state: &MarketState) -> f64 {
        self.portfolio
            .iter()
            .filter_map(|(symbol, pos)| state.price(symbol).map(|p| pos.quantity as f64 * p))
            .sum()
    }

    /// Cash plus mark-to-market holdings.
    pub fn total_value(&self, state: &MarketState) -> f64 {
        self.cash.to_float() + self.portfolio_value(state)
    }

    /// Buys must leave a reserve fraction of initial cash untouched.
    pub fn can_buy(&self, quantity: u64, price: f64) -> bool {
        let cost = price * quantity as f64;
        let reserve = self.initial_cash.to_float() * self.behavior.cash_reserve;
        self.cash.to_float() >= cost + reserve
    }

    /// How much the agent may sell: the long position plus the allowed
    /// short magnitude. Never negative.
    pub fn max_sellable(&self, symbol: &str) -> u64 {
        (self.position(symbol) + self.behavior.max_short).max(0) as u64
    }

    /// Size an order from available capital, risk aversion and confidence.
    pub fn order_size(&self, price: f64, confidence: f64) -> u64 {
        if price <= 0.0 || self.cash.raw() <= 0 {
            return 0;
        }

        let capital_fraction = self.behavior.capital_fraction / self.params.risk_aversion;
        let size_factor = (capital_fraction * confidence).min(0.05);
        let max_spend = self.cash.to_float() * size_factor;
        let size = (max_spend / price) as u64;

        size.clamp(1, self.behavior.max_order_size)
    }

    /// Bookkeeping for a fill this agent participated in.
    ///
    /// Buys recompute the weighted-average cost; sells release quantity and
    /// drop the entry when it returns to exactly zero. Negative quantities
    /// (shorts) are retained with their sign.
    pub fn on_fill(&mut self, trade: &Trade) {
        let value = trade.value();
        let quantity = trade.quantity.raw() as i64;

        if trade.buyer_id == self.id {
            self.cash -= value;
            let pos = self.portfolio.entry(trade.symbol.clone()).or_default();
            let total_cost = pos.avg_cost * pos.quantity as f64 + value.to_float();
            pos.quantity += quantity;
            pos.avg_cost = if pos.quantity > 0 {
                total_cost / pos.quantity as f64
            } else {
                0.0
            };
        } else if trade.seller_id == self.id {
            self.cash += value;
            let pos = self.portfolio.entry(trade.symbol.clone()).or_default();
            pos.quantity -= quantity;
            if pos.quantity == 0 {
                self.portfolio.remove(&trade.symbol);
            }
        }
    }

    /// Bootstrap inventory without a cash transfer (market maker seeding).
    pub fn seed_inventory(&mut self, symbol: &str, quantity: i64, price: f64) {
        let pos = self.portfolio.entry(symbol.to_string()).or_default();
        pos.quantity += quantity;
        pos.avg_cost = price;
    }

    /// Build an order carrying this agent's id; the engine stamps id/time.
    pub fn make_order(
        &self,
        symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        quantity: u64,
    ) -> Order {
        Order {
            id: types::OrderId(0),
            agent_id: self.id,
            symbol: symbol.to_string(),
            side,
            order_type,
            quantity: Quantity(quantity),
            timestamp: 0,
        }
    }

    /// Convenience: limit order at an f64 price.
    pub fn make_limit(&self, symbol: &str, side: OrderSide, price: f64, quantity: u64) -> Order {
        self.make_order(
            symbol,
            side,
            OrderType::Limit {
                price: Price::from_float(price.max(0.0001)),
            },
            quantity,
        )
    }
}
