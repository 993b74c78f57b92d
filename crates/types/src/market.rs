//! Market data types: candles, book snapshots, positions, cross effects.

use crate::ids::{Symbol, Timestamp};
use crate::money::Price;
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single time period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Candle {
    /// Start of the candle period (simulated epoch ms).
    pub time: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
}

impl Candle {
    pub fn is_valid(&self) -> bool {
        self.time > 0 && self.open.is_positive()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// A single aggregated price level in an order book snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub quantity: u64,
    pub order_count: usize,
}

/// Depth-limited, read-only view of an order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    /// Bid levels, best (highest) first.
    pub bids: Vec<BookLevel>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<BookLevel>,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub spread: Option<Price>,
    pub mid_price: Option<Price>,
}

/// A holding in an agent's portfolio.
///
/// Quantity is signed: negative means short. Average cost is recomputed on
/// every buy fill with weighted-average cost basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub quantity: i64,
    pub avg_cost: f64,
}

/// Directed price spillover from one instrument to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossEffect {
    pub target: Symbol,
    /// Expected fraction of the source move transmitted to the target.
    pub coefficient: f64,
}
