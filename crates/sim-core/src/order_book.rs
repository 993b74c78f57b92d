//! Price-time-priority order book.
//!
//! Limit orders rest in `BTreeMap`-indexed price levels; within a level,
//! orders queue FIFO so equal prices fill in submission order. Market orders
//! queue separately and are executed first on every matching pass.
//!
//! The central invariant: after [`OrderBook::match_orders`] returns, the book
//! is never crossed (best bid < best ask, or a side is empty).

use std::collections::{BTreeMap, HashMap, VecDeque};

use types::{
    AgentId, AgentKind, Order, OrderId, OrderSide, OrderType, Price, Quantity, Tick, Timestamp,
    Trade,
};

use crate::error::{Result, SimCoreError};

/// A price level holding resting orders at a single price, FIFO.
#[derive(Debug, Clone, Default)]
struct PriceLevel {
    total_quantity: u64,
    orders: VecDeque<Order>,
}

impl PriceLevel {
    fn push(&mut self, order: Order) {
        self.total_quantity += order.quantity.raw();
        self.orders.push_back(order);
    }

    fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Front-of-level order info copied out to avoid holding borrows while
/// mutating both sides of the book.
#[derive(Debug, Clone, Copy)]
struct RestingOrder {
    id: OrderId,
    agent_id: AgentId,
    timestamp: Timestamp,
    quantity: Quantity,
}

/// Order book for a single instrument.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: String,
    /// Bids indexed by price; best bid is the last key.
    bids: BTreeMap<Price, PriceLevel>,
    /// Asks indexed by price; best ask is the first key.
    asks: BTreeMap<Price, PriceLevel>,
    /// Pending market orders, drained on every matching pass.
    market_queue: VecDeque<Order>,
    /// Resting-order lookup for cancellation.
    order_index: HashMap<OrderId, (OrderSide, Price)>,
    /// Resting orders older than this (sim ms) expire before matching.
    max_order_age_ms: Timestamp,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            market_queue: VecDeque::new(),
            order_index: HashMap::new(),
            // Two simulated days.
            max_order_age_ms: 172_800_000,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn set_max_order_age_ms(&mut self, ms: Timestamp) {
        self.max_order_age_ms = ms;
    }

    /// Queue an order. Limit orders rest in their side's price level;
    /// market orders wait for the next matching pass.
    pub fn add_order(&mut self, order: Order) -> Result<()> {
        if order.quantity.is_zero() {
            return Err(SimCoreError::ZeroQuantity);
        }

        match order.order_type {
            OrderType::Market => {
                self.market_queue.push_back(order);
                Ok(())
            }
            OrderType::Limit { price } => {
                if !price.is_positive() {
                    return Err(SimCoreError::InvalidPrice);
                }
                self.order_index.insert(order.id, (order.side, price));
                let side = match order.side {
                    OrderSide::Buy => &mut self.bids,
                    OrderSide::Sell => &mut self.asks,
                };
                side.entry(price).or_default().push(order);
                Ok(())
            }
        }
    }

    /// Remove a resting limit order by id.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<Order> {
        let (side, price) = self
            .order_index
            .remove(&order_id)
            .ok_or(SimCoreError::OrderNotFound(order_id))?;

        let book_side = match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };

        if let Some(level) = book_side.get_mut(&price)
            && let Some(pos) = level.orders.iter().position(|o| o.id == order_id)
        {
            let order = level.orders.remove(pos).expect("position just found");
            level.total_quantity = level.total_quantity.saturating_sub(order.quantity.raw());
            if level.is_empty() {
                book_side.remove(&price);
            }
            return Ok(order);
        }

        Err(SimCoreError::OrderNotFound(order_id))
    }

    /// One matching pass: expire stale orders, execute pending market
    /// orders, then uncross the book while best bid >= best ask.
    ///
    /// Trades execute at the resting (earlier-submitted) order's price and
    /// carry placeholder agent kinds; the engine tags the real kinds.
    pub fn match_orders(&mut self, now: Timestamp, tick: Tick) -> Vec<Trade> {
        let mut trades = Vec::new();

        self.expire_orders(now);

        // Market orders execute first, oldest submission first.
        let mut pending: Vec<Order> = self.market_queue.drain(..).collect();
        pending.sort_by_key(|o| (o.timestamp, o.id));
        for mut order in pending {
            self.execute_market(&mut order, now, tick, &mut trades);
            // Unfillable remainder is dropped; market orders never rest.
        }

        // Uncross resting limit orders.
        loop {
            let Some(bid_price) = self.best_bid() else { break };
            let Some(ask_price) = self.best_ask() else { break };
            if bid_price < ask_price {
                break;
            }

            let bid = self.front(OrderSide::Buy, bid_price);
            let ask = self.front(OrderSide::Sell, ask_price);
            let (Some(bid), Some(ask)) = (bid, ask) else {
                break;
            };

            let quantity = bid.quantity.min(ask.quantity);
            // The earlier order was resting; the trade prints at its price.
            let exec_price = if bid.timestamp <= ask.timestamp {
                bid_price
            } else {
                ask_price
            };

            trades.push(Trade {
                symbol: self.symbol.clone(),
                price: exec_price,
                quantity,
                buyer_id: bid.agent_id,
                seller_id: ask.agent_id,
                buyer_kind: AgentKind::External,
                seller_kind: AgentKind::External,
                buy_order_id: bid.id,
                sell_order_id: ask.id,
                timestamp: now,
                tick,
            });

            self.reduce_front(OrderSide::Buy, bid_price, quantity);
            self.reduce_front(OrderSide::Sell, ask_price, quantity);
        }

        trades
    }

    /// Execute a market order against the opposing side at successive best
    /// prices until filled or the side empties.
    fn execute_market(
        &mut self,
        order: &mut Order,
        now: Timestamp,
        tick: Tick,
        trades: &mut Vec<Trade>,
    ) {
        while !order.quantity.is_zero() {
            let best = match order.side {
                OrderSide::Buy => self.best_ask(),
                OrderSide::Sell => self.best_bid(),
            };
            let Some(best_price) = best else { break };
            let Some(resting) = self.front(order.side.opposite(), best_price) else {
                break;
            };

            let quantity = order.quantity.min(resting.quantity);
            let (buyer_id, seller_id, buy_order_id, sell_order_id) = match order.side {
                OrderSide::Buy => (order.agent_id, resting.agent_id, order.id, resting.id),
                OrderSide::Sell => (resting.agent_id, order.agent_id, resting.id, order.id),
            };

            trades.push(Trade {
                symbol: self.symbol.clone(),
                price: best_price,
                quantity,
                buyer_id,
                seller_id,
                buyer_kind: AgentKind::External,
                seller_kind: AgentKind::External,
                buy_order_id,
                sell_order_id,
                timestamp: now,
                tick,
            });

            self.reduce_front(order.side.opposite(), best_price, quantity);
            order.quantity -= quantity;
        }
    }

    /// Copy out the front order of a level.
    fn front(&self, side: OrderSide, price: Price) -> Option<RestingOrder> {
        let book_side = match side {
            OrderSide::Buy => &self.bids,
            OrderSide::Sell => &self.asks,
        };
        book_side
            .get(&price)
            .and_then(|level| level.orders.front())
            .map(|o| RestingOrder {
                id: o.id,
                agent_id: o.agent_id,
                timestamp: o.timestamp,
                quantity: o.quantity,
            })
    }

    /// Reduce the front order of a level by `quantity`, popping it when
    /// fully filled and cleaning up empty levels.
    fn reduce_front(&mut self, side: OrderSide, price: Price, quantity: Quantity) {
        let book_side = match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };

        let mut filled_id = None;
        if let Some(level) = book_side.get_mut(&price) {
            if let Some(front) = level.orders.front_mut() {
                front.quantity = front.quantity.saturating_sub(quantity);
                if front.quantity.is_zero() {
                    filled_id = Some(front.id);
                    level.orders.pop_front();
                }
            }
            level.total_quantity = level.total_quantity.saturating_sub(quantity.raw());
            if level.is_empty() {
                book_side.remove(&price);
            }
        }

        if let Some(id) = filled_id {
            self.order_index.remove(&id);
        }
    }

    /// Drop resting orders older than the configured max age.
    fn expire_orders(&mut self, now: Timestamp) {
        let max_age = self.max_order_age_ms;
        Self::expire_side(&mut self.bids, &mut self.order_index, now, max_age);
        Self::expire_side(&mut self.asks, &mut self.order_index, now, max_age);
    }

    fn expire_side(
        side: &mut BTreeMap<Price, PriceLevel>,
        index: &mut HashMap<OrderId, (OrderSide, Price)>,
        now: Timestamp,
        max_age: Timestamp,
    ) {
        let mut empty_levels = Vec::new();
        for (price, level) in side.iter_mut() {
            level.orders.retain(|o| {
                let expired = now.saturating_sub(o.timestamp) > max_age;
                if expired {
                    index.remove(&o.id);
                }
                !expired
            });
            level.total_quantity = level.orders.iter().map(|o| o.quantity.raw()).sum();
            if level.is_empty() {
                empty_levels.push(*price);
            }
        }
        for price in empty_levels {
            side.remove(&price);
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price((bid.raw() + ask.raw()) / 2)),
            (Some(bid), None) => Some(bid),
            (None, Some(ask)) => Some(ask),
            (None, None) => None,
        }
    }

    /// Aggregate resting quantity per price level up to `depth` levels.
    pub fn snapshot(&self, depth: usize) -> types::BookSnapshot {
        let bids: Vec<types::BookLevel> = self
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| types::BookLevel {
                price: *price,
                quantity: level.total_quantity,
                order_count: level.orders.len(),
            })
            .collect();

        let asks: Vec<types::BookLevel> = self
            .asks
            .iter()
            .take(depth)
            .map(|(price, level)| types::BookLevel {
                price: *price,
                quantity: level.total_quantity,
                order_count: level.orders.len(),
            })
            .collect();

        types::BookSnapshot {
            symbol: self.symbol.clone(),
            bids,
            asks,
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            spread: self.spread(),
            mid_price: self.mid_price(),
        }
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    pub fn resting_orders(&self) -> usize {
        self.order_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty() && self.market_queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.market_queue.clear();
        self.order_index.clear();
    }
}
