//! Streaming OHLCV aggregation.
//!
//! Rolls tick-level prices into candles per symbol and interval. Each
//! (symbol, interval) pair keeps the currently-open bar plus a bounded ring
//! of completed bars.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use types::{Candle, Price, Symbol, Timestamp};

const MAX_CANDLES: usize = 10_000;

const MS_PER_MINUTE: Timestamp = 60_000;
const MS_PER_HOUR: Timestamp = 3_600_000;
const MS_PER_DAY: Timestamp = 86_400_000;

/// Supported candle intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CandleInterval {
    M1,
    M5,
    M15,
    H1,
    D1,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 5] = [
        CandleInterval::M1,
        CandleInterval::M5,
        CandleInterval::M15,
        CandleInterval::H1,
        CandleInterval::D1,
    ];

    pub fn duration_ms(self) -> Timestamp {
        match self {
            CandleInterval::M1 => MS_PER_MINUTE,
            CandleInterval::M5 => 5 * MS_PER_MINUTE,
            CandleInterval::M15 => 15 * MS_PER_MINUTE,
            CandleInterval::H1 => MS_PER_HOUR,
            CandleInterval::D1 => MS_PER_DAY,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CandleInterval::M1 => "1m",
            CandleInterval::M5 => "5m",
            CandleInterval::M15 => "15m",
            CandleInterval::H1 => "1h",
            CandleInterval::D1 => "1d",
        }
    }

    /// Parse a label like "5m" or "1d". Unknown labels fall back to daily.
    pub fn parse(label: &str) -> Self {
        match label {
            "1m" => CandleInterval::M1,
            "5m" => CandleInterval::M5,
            "15m" => CandleInterval::M15,
            "1h" => CandleInterval::H1,
            _ => CandleInterval::D1,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CandleState {
    current: Candle,
    completed: VecDeque<Candle>,
    has_data: bool,
}

impl CandleState {
    fn open_bar(&mut self, boundary: Timestamp, price: Price, volume: f64) {
        self.current = Candle {
            time: boundary,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        };
        self.has_data = true;
    }

    fn close_bar(&mut self) {
        if self.has_data && self.current.open.is_positive() {
            self.completed.push_back(self.current);
            while self.completed.len() > MAX_CANDLES {
                self.completed.pop_front();
            }
        }
    }
}

/// Per-symbol, per-interval OHLCV rollup with bounded memory.
#[derive(Debug, Clone, Default)]
pub struct CandleAggregator {
    data: BTreeMap<Symbol, HashMap<CandleInterval, CandleState>>,
}

impl CandleAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol for tracking across all intervals.
    pub fn add_symbol(&mut self, symbol: impl Into<Symbol>) {
        let states = self.data.entry(symbol.into()).or_default();
        for interval in CandleInterval::ALL {
            states.entry(interval).or_default();
        }
    }

    /// Feed one price observation with incremental volume.
    ///
    /// Same interval boundary updates the open bar; a later boundary closes
    /// it into the ring and opens a fresh one.
    pub fn on_tick(&mut self, symbol: &str, price: Price, volume: f64, sim_time: Timestamp) {
        let Some(states) = self.data.get_mut(symbol) else {
            return;
        };

        for (interval, state) in states.iter_mut() {
            let boundary = (sim_time / interval.duration_ms()) * interval.duration_ms();

            if !state.has_data {
                state.open_bar(boundary, price, volume);
            } else if boundary > state.current.time {
                state.close_bar();
                state.open_bar(boundary, price, volume);
            } else {
                state.current.high = state.current.high.max(price);
                state.current.low = state.current.low.min(price);
                state.current.close = price;
                state.current.volume += volume;
            }
        }
    }

    /// Completed candles in chronological order, filtered by `since` and
    /// capped at `limit` most recent bars.
    pub fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        since: Timestamp,
        limit: usize,
    ) -> Vec<Candle> {
        let Some(state) = self.data.get(symbol).and_then(|s| s.get(&interval)) else {
            return Vec::new();
        };

        let mut result: Vec<Candle> = state
            .completed
            .iter()
            .rev()
            .take_while(|c| since == 0 || c.time >= since)
            .take(limit)
            .copied()
            .collect();
        result.reverse();
        result
    }

    /// Bulk fetch: completed candles for every symbol since a time cursor.
    pub fn all_candles(
        &self,
        interval: CandleInterval,
        since: Timestamp,
    ) -> BTreeMap<Symbol, Vec<Candle>> {
        self.data
            .keys()
            .map(|symbol| {
                (
                    symbol.clone(),
                    self.candles(symbol, interval, since, MAX_CANDLES),
                )
            })
            .collect()
    }

    /// The currently-open (incomplete) bar.
    pub fn current_candle(&self, symbol: &str, interval: CandleInterval) -> Option<Candle> {
        self.data
            .get(symbol)
            .and_then(|s| s.get(&interval))
            .filter(|s| s.has_data)
            .map(|s| s.current)
    }

    pub fn candle_count(&self, symbol: &str, interval: CandleInterval) -> usize {
        self.data
            .get(symbol)
            .and_then(|s| s.get(&interval))
            .map(|s| s.completed.len())
            .unwrap_or(0)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.data.keys()
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_labels_roundtrip() {
        for interval in CandleInterval::ALL {
            assert_eq!(CandleInterval::parse(interval.label()), interval);
        }
    }

    #[test]
    fn test_first_tick_opens_bar() {
        let mut agg = CandleAggregator::new();
        agg.add_symbol("NTX");
        agg.on_tick("NTX", Price::from_float(100.0), 10.0, 30_000);

        let bar = agg.current_candle("NTX", CandleInterval::M1).unwrap();
        assert_eq!(bar.time, 0); // boundary of the first minute
        assert_eq!(bar.open, Price::from_float(100.0));
        assert_eq!(bar.volume, 10.0);
        assert_eq!(agg.candle_count("NTX", CandleInterval::M1), 0);
    }

    #[test]
    fn test_same_period_updates_ohlcv() {
        let mut agg = CandleAggregator::new();
        agg.add_symbol("NTX");
        agg.on_tick("NTX", Price::from_float(100.0), 10.0, 1_000);
        agg.on_tick("NTX", Price::from_float(105.0), 5.0, 20_000);
        agg.on_tick("NTX", Price::from_float(98.0), 5.0, 40_000);

        let bar = agg.current_candle("NTX", CandleInterval::M1).unwrap();
        assert_eq!(bar.open, Price::from_float(100.0));
        assert_eq!(bar.high, Price::from_float(105.0));
        assert_eq!(bar.low, Price::from_float(98.0));
        assert_eq!(bar.close, Price::from_float(98.0));
        assert_eq!(bar.volume, 20.0);
    }

    #[test]
    fn test_boundary_rolls_bar() {
        let mut agg = CandleAggregator::new();
        agg.add_symbol("NTX");
        agg.on_tick("NTX", Price::from_float(100.0), 10.0, 30_000);
        agg.on_tick("NTX", Price::from_float(101.0), 10.0, 70_000); // next minute

        assert_eq!(agg.candle_count("NTX", CandleInterval::M1), 1);
        let completed = agg.candles("NTX", CandleInterval::M1, 0, 10);
        assert_eq!(completed[0].close, Price::from_float(100.0));

        let open = agg.current_candle("NTX", CandleInterval::M1).unwrap();
        assert_eq!(open.time, 60_000);
        assert_eq!(open.open, Price::from_float(101.0));
    }

    #[test]
    fn test_since_cursor_and_limit() {
        let mut agg = CandleAggregator::new();
        agg.add_symbol("NTX");
        // One tick per minute for ten minutes.
        for i in 0..10u64 {
            agg.on_tick("NTX", Price::from_float(100.0 + i as f64), 1.0, i * 60_000 + 1);
        }
        assert_eq!(agg.candle_count("NTX", CandleInterval::M1), 9);

        let since = 5 * 60_000;
        let recent = agg.candles("NTX", CandleInterval::M1, since, 100);
        assert!(recent.iter().all(|c| c.time >= since));
        assert_eq!(recent.len(), 4);

        let limited = agg.candles("NTX", CandleInterval::M1, 0, 3);
        assert_eq!(limited.len(), 3);
        // Chronological order, most recent three.
        assert!(limited[0].time < limited[2].time);
    }

    #[test]
    fn test_bulk_fetch_covers_all_symbols() {
        let mut agg = CandleAggregator::new();
        agg.add_symbol("NTX");
        agg.add_symbol("OILC");
        for i in 0..3u64 {
            agg.on_tick("NTX", Price::from_float(50.0), 1.0, i * 60_000 + 1);
            agg.on_tick("OILC", Price::from_float(75.0), 1.0, i * 60_000 + 1);
        }

        let all = agg.all_candles(CandleInterval::M1, 0);
        assert_eq!(all.len(), 2);
        assert!(!all["NTX"].is_empty());
        assert!(!all["OILC"].is_empty());
    }

    #[test]
    fn test_unknown_symbol_ignored() {
        let mut agg = CandleAggregator::new();
        agg.on_tick("MISSING", Price::from_float(1.0), 1.0, 0);
        assert!(agg.candles("MISSING", CandleInterval::M1, 0, 10).is_empty());
    }
}
