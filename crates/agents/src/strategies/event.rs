//! News-reactive trading.
//!
//! Fires only on not-yet-processed events whose magnitude clears the
//! agent's reaction threshold, with a per-agent cooldown between trades.
//! Reactions are market orders in the direction of the headline; global
//! news without a target picks a random instrument.

use std::collections::VecDeque;

use rand::Rng;

use news::{NewsCategory, NewsSentiment};
use types::{AgentKind, Order, OrderSide, Timestamp};

use crate::config::EventConfig;
use crate::context::MarketState;
use crate::core::AgentCore;
use crate::traits::Agent;

pub struct EventTrader {
    core: AgentCore,
    config: EventConfig,
    reaction_threshold: f64,
    cooldown_ticks: u32,
    ticks_since_last_trade: u32,
    /// Dedup ring of already-processed events (timestamp, symbol).
    processed: VecDeque<(Timestamp, String)>,
}

impl EventTrader {
    pub fn new(mut core: AgentCore, config: EventConfig) -> Self {
        let reaction_threshold = config.reaction_threshold_base
            + config.reaction_threshold_risk_scale * core.params().risk_aversion;
        let cooldown_ticks =
            config.cooldown_base + core.rng().random_range(0..=config.cooldown_range);
        Self {
            core,
            config,
            reaction_threshold,
            cooldown_ticks,
            ticks_since_last_trade: cooldown_ticks,
            processed: VecDeque::new(),
        }
    }

    fn already_processed(&self, timestamp: Timestamp, symbol: &str) -> bool {
        self.processed
            .iter()
            .any(|(ts, sym)| *ts == timestamp && sym == symbol)
    }

    fn mark_processed(&mut self, timestamp: Timestamp, symbol: &str) {
        self.processed.push_back((timestamp, symbol.to_string()));
        if self.processed.len() > 20 {
            self.processed.pop_front();
        }
    }
}

impl Agent for EventTrader {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Event
    }

    fn decide(&mut self, state: &MarketState) -> Option<Order> {
        self.ticks_since_last_trade = self.ticks_since_last_trade.saturating_add(1);

        if !self
            .core
            .passes_reaction_gate(self.config.reaction_mult, state.tick_scale)
        {
            return None;
        }
        if self.ticks_since_last_trade < self.cooldown_ticks {
            return None;
        }
        if state.recent_news.is_empty() || state.is_empty() {
            return None;
        }

        for news in &state.recent_news {
            if self.already_processed(news.timestamp, &news.symbol) {
                continue;
            }
            let symbol_key = news.symbol.clone();
            self.mark_processed(news.timestamp, &symbol_key);

            if news.magnitude < self.reaction_threshold {
                continue;
            }

            // Untargeted global news moves a random instrument; other
            // untargeted categories are skipped.
            let symbol = if news.symbol.is_empty() {
                if news.category != NewsCategory::Global {
                    continue;
                }
                let idx = self.core.rng().random_range(0..state.len());
                state.nth_symbol(idx)?.clone()
            } else {
                news.symbol.clone()
            };

            let Some(price) = state.price(&symbol) else {
                continue;
            };
            let confidence = (news.magnitude / 0.1).min(1.0);

            if news.sentiment == NewsSentiment::Positive {
                let size = self.core.order_size(price, confidence);
                if size > 0 && self.core.can_buy(size, price) {
                    self.ticks_since_last_trade = 0;
                    return Some(self.core.make_order(
                        &symbol,
                        OrderSide::Buy,
                        types::OrderType::Market,
                        size,
                    ));
                }
            } else {
                let sellable = self.core.max_sellable(&symbol);
                let size = sellable.min(self.core.order_size(price, confidence));
                if size > 0 {
                    self.ticks_since_last_trade = 0;
                    return Some(self.core.make_order(
                        &symbol,
                        OrderSide::Sell,
                        types::OrderType::Market,
                        size,
                    ));
                }
            }
        }

        None
    }
}
