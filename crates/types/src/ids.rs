//! Identifier newtypes and time aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order({})", self.0)
    }
}

/// Unique identifier for agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent({})", self.0)
    }
}

/// Unique identifier for trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trade({})", self.0)
    }
}

/// Agent id 0 is reserved for external/manual orders submitted through the API.
pub const EXTERNAL_AGENT_ID: AgentId = AgentId(0);

/// Instrument ticker symbol (e.g. "NTX", "OILC").
pub type Symbol = String;

/// Simulated wall-clock timestamp in milliseconds since epoch.
pub type Timestamp = u64;

/// Simulation tick number (discrete time step).
pub type Tick = u64;
