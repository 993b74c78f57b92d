//! Core types for the market simulation.
//!
//! This crate provides the data model shared across the simulation:
//! fixed-point monetary values, order and trade types, candle data,
//! and agent parameter/diagnostic types.

mod agent;
mod ids;
mod market;
mod money;
mod order;
mod trade;

pub use agent::{AgentKind, AgentParams, AgentTypeStats};
pub use ids::{AgentId, EXTERNAL_AGENT_ID, OrderId, Symbol, Tick, Timestamp, TradeId};
pub use market::{BookLevel, BookSnapshot, Candle, CrossEffect, Position};
pub use money::{Cash, PRICE_SCALE, Price, Quantity};
pub use order::{Order, OrderSide, OrderType};
pub use trade::Trade;
