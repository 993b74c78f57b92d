//! The `Agent` trait.

use news::NewsEvent;
use types::{AgentId, AgentKind, Cash, Order, Trade};

use crate::config::BehaviorConfig;
use crate::context::MarketState;
use crate::core::AgentCore;

/// Contract every trading strategy implements.
///
/// Agents only ever *propose* orders through [`Agent::decide`] and *observe*
/// fills through [`Agent::on_fill`]; the engine is the sole writer of market
/// state. Default method bodies delegate to the embedded [`AgentCore`], so a
/// strategy normally implements just `core`/`core_mut`, `kind` and `decide`.
///
/// `Send + Sync` because the engine lives behind a reader-writer lock:
/// concurrent readers take `&Engine` across threads.
pub trait Agent: Send + Sync {
    /// Shared bookkeeping state.
    fn core(&self) -> &AgentCore;

    /// Mutable access to the shared state.
    fn core_mut(&mut self) -> &mut AgentCore;

    /// Which strategy this agent runs (diagnostics and trade tagging).
    fn kind(&self) -> AgentKind;

    /// Per-tick decision against the frozen snapshot. `None` means the
    /// agent sits out this tick; soft failures (insufficient cash, nothing
    /// to sell) are expressed the same way, never as errors.
    fn decide(&mut self, state: &MarketState) -> Option<Order>;

    /// Called for every trade this agent participated in.
    fn on_fill(&mut self, trade: &Trade) {
        self.core_mut().on_fill(trade);
    }

    /// Called for every news event, before any decisions this tick.
    fn update_beliefs(&mut self, news: &NewsEvent) {
        self.core_mut().update_beliefs(news);
    }

    /// Geometric sentiment decay, scaled by the tick's wall-clock weight.
    fn decay_sentiment(&mut self, tick_scale: f64) {
        self.core_mut().decay_sentiment(tick_scale);
    }

    /// Hot-update shared behavior constants without rebuilding the agent.
    fn set_behavior(&mut self, behavior: BehaviorConfig) {
        self.core_mut().set_behavior(behavior);
    }

    fn id(&self) -> AgentId {
        self.core().id()
    }

    fn cash(&self) -> Cash {
        self.core().cash()
    }

    fn sentiment_bias(&self) -> f64 {
        self.core().global_sentiment_bias()
    }

    fn portfolio_value(&self, state: &MarketState) -> f64 {
        self.core().portfolio_value(state)
    }
}
