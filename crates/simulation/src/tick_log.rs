//! Bounded per-tick price/volume history with CSV export.
//!
//! One record per instrument per tick, capped at a configurable total so a
//! long-running simulation cannot grow without bound. Export writes a
//! durable CSV archive for external tooling.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::SimulationError;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickRecord {
    pub tick: u64,
    pub price: f64,
    pub volume: f64,
}

/// Per-symbol tick history ring.
#[derive(Debug, Default)]
pub struct TickLog {
    max_ticks: usize,
    current_tick: u64,
    records: BTreeMap<String, Vec<TickRecord>>,
}

impl TickLog {
    pub fn new(max_ticks: usize) -> Self {
        Self {
            max_ticks,
            current_tick: 0,
            records: BTreeMap::new(),
        }
    }

    pub fn add_symbol(&mut self, symbol: &str) {
        self.records.entry(symbol.to_string()).or_default();
    }

    pub fn record(&mut self, symbol: &str, price: f64, volume: f64) {
        let Some(records) = self.records.get_mut(symbol) else {
            return;
        };
        records.push(TickRecord {
            tick: self.current_tick,
            price,
            volume,
        });
        if records.len() > self.max_ticks {
            let excess = records.len() - self.max_ticks;
            records.drain(..excess);
        }
    }

    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    pub fn tick_count(&self) -> usize {
        self.records.values().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.current_tick = 0;
        for records in self.records.values_mut() {
            records.clear();
        }
    }

    /// Write the history as CSV: `symbol,tick,price,volume` rows.
    /// `max_ticks = 0` exports everything retained.
    pub fn export_csv(&self, path: &Path, max_ticks: usize) -> Result<u64, SimulationError> {
        let mut writer =
            csv::Writer::from_path(path).map_err(|e| SimulationError::Export(e.to_string()))?;
        writer
            .write_record(["symbol", "tick", "price", "volume"])
            .map_err(|e| SimulationError::Export(e.to_string()))?;

        let mut rows = 0u64;
        for (symbol, records) in &self.records {
            let start = if max_ticks > 0 {
                records.len().saturating_sub(max_ticks)
            } else {
                0
            };
            for record in &records[start..] {
                writer
                    .write_record([
                        symbol.as_str(),
                        &record.tick.to_string(),
                        &format!("{:.4}", record.price),
                        &format!("{:.1}", record.volume),
                    ])
                    .map_err(|e| SimulationError::Export(e.to_string()))?;
                rows += 1;
            }
        }
        writer
            .flush()
            .map_err(|e| SimulationError::Export(e.to_string()))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_bound() {
        let mut log = TickLog::new(10);
        log.add_symbol("NTX");
        for i in 0..25 {
            log.record("NTX", 100.0 + i as f64, 1.0);
            log.advance_tick();
        }
        assert_eq!(log.tick_count(), 10);
    }

    #[test]
    fn test_unknown_symbol_ignored() {
        let mut log = TickLog::new(10);
        log.record("MISSING", 1.0, 1.0);
        assert_eq!(log.tick_count(), 0);
    }

    #[test]
    fn test_export_csv() {
        let mut log = TickLog::new(100);
        log.add_symbol("NTX");
        log.add_symbol("OILC");
        for i in 0..5 {
            log.record("NTX", 100.0 + i as f64, 10.0);
            log.record("OILC", 75.0, 5.0);
            log.advance_tick();
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticks.csv");
        let rows = log.export_csv(&path, 0).unwrap();
        assert_eq!(rows, 10);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("symbol,tick,price,volume"));
        assert!(contents.contains("NTX,0,100.0000,10.0"));
    }

    #[test]
    fn test_export_respects_max_ticks() {
        let mut log = TickLog::new(100);
        log.add_symbol("NTX");
        for i in 0..20 {
            log.record("NTX", i as f64, 0.0);
            log.advance_tick();
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tail.csv");
        assert_eq!(log.export_csv(&path, 5).unwrap(), 5);
    }
}
