//! Order types for the simulation.

use crate::ids::{AgentId, OrderId, Symbol, Timestamp};
use crate::money::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the market the order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Type of order determining execution rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute immediately at the best available opposing price.
    Market,
    /// Execute at the specified price or better; rests if unmatched.
    Limit { price: Price },
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit { price } => write!(f, "LIMIT@{price}"),
        }
    }
}

/// A trading order submitted by an agent.
///
/// Quantity mutates only through partial fills inside the order book;
/// everything else is fixed once the order is stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier (0 until stamped by the engine).
    pub id: OrderId,
    /// Agent who submitted the order; 0 for external/manual orders.
    pub agent_id: AgentId,
    /// Symbol being traded.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: OrderSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Unfilled quantity remaining on the book.
    pub quantity: Quantity,
    /// Simulated time of submission; ties on price break by this field.
    pub timestamp: Timestamp,
}

impl Order {
    /// Create a new limit order (id and timestamp stamped at submission).
    pub fn limit(
        agent_id: AgentId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id: OrderId(0),
            agent_id,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit { price },
            quantity,
            timestamp: 0,
        }
    }

    /// Create a new market order.
    pub fn market(
        agent_id: AgentId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        quantity: Quantity,
    ) -> Self {
        Self {
            id: OrderId(0),
            agent_id,
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            timestamp: 0,
        }
    }

    /// Get the limit price if this is a limit order.
    pub fn limit_price(&self) -> Option<Price> {
        match self.order_type {
            OrderType::Limit { price } => Some(price),
            OrderType::Market => None,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_limit_order_creation() {
        let order = Order::limit(
            AgentId(3),
            "NTX",
            OrderSide::Buy,
            Price::from_float(150.0),
            Quantity(100),
        );
        assert_eq!(order.limit_price(), Some(Price::from_float(150.0)));
        assert_eq!(order.quantity, 100);
        assert!(order.is_buy());
    }

    #[test]
    fn test_market_order_has_no_limit_price() {
        let order = Order::market(AgentId(1), "OILC", OrderSide::Sell, Quantity(50));
        assert_eq!(order.limit_price(), None);
        assert!(order.is_sell());
    }

    #[test]
    fn test_side_serde_uppercase() {
        assert_eq!(serde_json::to_string(&OrderSide::Buy).unwrap(), "\"BUY\"");
        let side: OrderSide = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(side, OrderSide::Sell);
    }
}
