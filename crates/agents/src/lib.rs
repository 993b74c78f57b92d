//! Trading agents for the market simulation.
//!
//! Eight concrete strategies share a common [`AgentCore`] (cash, portfolio,
//! layered sentiment, sizing and risk gates) and differ only in their signal
//! and position-sizing logic. Agents propose at most one order per tick
//! through [`Agent::decide`] against a frozen [`MarketState`] snapshot and
//! observe their fills through [`Agent::on_fill`].

pub mod config;

mod context;
mod core;
mod factory;
mod sentiment;
mod strategies;
mod traits;

pub use config::AgentsConfig;
pub use context::MarketState;
pub use factory::build_population;
pub use self::core::AgentCore;
pub use sentiment::{SentimentDecay, SentimentState};
pub use strategies::{
    CrossAssetTrader, EventTrader, FundamentalTrader, MarketMaker, MeanReversionTrader,
    MomentumTrader, NoiseTrader, RebalanceTrader,
};
pub use traits::Agent;
