//! Trade type: the unit of state propagation.
//!
//! Trades are append-only. They carry numeric agent ids rather than any
//! reference back to the agents, so matching and bookkeeping never share
//! ownership.

use crate::agent::AgentKind;
use crate::ids::{AgentId, OrderId, Symbol, Tick, Timestamp};
use crate::money::{Cash, Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A completed trade between two orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Symbol traded.
    pub symbol: Symbol,
    /// Execution price (the resting order's price).
    pub price: Price,
    /// Quantity exchanged.
    pub quantity: Quantity,
    /// Buying agent (0 = external order).
    pub buyer_id: AgentId,
    /// Selling agent (0 = external order).
    pub seller_id: AgentId,
    /// Strategy kind of the buyer, tagged by the engine.
    pub buyer_kind: AgentKind,
    /// Strategy kind of the seller, tagged by the engine.
    pub seller_kind: AgentKind,
    /// Order that bought.
    pub buy_order_id: OrderId,
    /// Order that sold.
    pub sell_order_id: OrderId,
    /// Simulated time of execution.
    pub timestamp: Timestamp,
    /// Tick of execution.
    pub tick: Tick,
}

impl Trade {
    /// Total cash value of this trade.
    pub fn value(&self) -> Cash {
        self.price * self.quantity
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x {} ({} -> {})",
            self.symbol, self.quantity, self.price, self.seller_kind, self.buyer_kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_value() {
        let trade = Trade {
            symbol: "NTX".to_string(),
            price: Price::from_float(150.0),
            quantity: Quantity(100),
            buyer_id: AgentId(1),
            seller_id: AgentId(2),
            buyer_kind: AgentKind::Fundamental,
            seller_kind: AgentKind::MarketMaker,
            buy_order_id: OrderId(1),
            sell_order_id: OrderId(2),
            timestamp: 0,
            tick: 0,
        };
        assert_eq!(trade.value().to_float(), 15_000.0);
    }
}
