//! Simulated calendar clock.
//!
//! Maps discrete simulation ticks to simulated wall-clock time. The number
//! of ticks per simulated day is configurable so that the same engine can
//! run fine-grained for live play and coarse for fast historical population.
//!
//! `tick_scale` is the wall-clock weight of one tick relative to a reference
//! granularity. Per-tick probabilities and decay rates are multiplied by it
//! so that expected per-day behavior is invariant under tick-rate changes.

use chrono::{DateTime, NaiveDate};

use crate::error::{Result, SimCoreError};
use types::Timestamp;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Simulated time source with configurable ticks-per-day granularity.
#[derive(Debug, Clone)]
pub struct SimClock {
    start_time_ms: Timestamp,
    sim_time_ms: Timestamp,
    ticks_per_day: u32,
    reference_ticks_per_day: u32,
    tick_in_day: u32,
    total_ticks: u64,
    rolled_day: bool,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            start_time_ms: 0,
            sim_time_ms: 0,
            ticks_per_day: 72_000,
            reference_ticks_per_day: 72_000,
            tick_in_day: 0,
            total_ticks: 0,
            rolled_day: false,
        }
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to a start date (ISO `YYYY-MM-DD`, market open 09:30 UTC) and
    /// tick granularity.
    pub fn initialize(&mut self, start_date: &str, ticks_per_day: u32) -> Result<()> {
        let start = Self::parse_date(start_date)?;
        self.start_time_ms = start;
        self.sim_time_ms = start;
        self.ticks_per_day = ticks_per_day.max(1);
        self.tick_in_day = 0;
        self.total_ticks = 0;
        self.rolled_day = false;
        Ok(())
    }

    /// Advance by one tick, returning the new simulated timestamp.
    pub fn tick(&mut self) -> Timestamp {
        self.total_ticks += 1;
        self.tick_in_day += 1;
        self.rolled_day = self.tick_in_day >= self.ticks_per_day;
        if self.rolled_day {
            self.tick_in_day = 0;
        }
        self.sim_time_ms += self.sim_ms_per_tick() as Timestamp;
        self.sim_time_ms
    }

    /// Current simulated time as epoch milliseconds.
    pub fn sim_time(&self) -> Timestamp {
        self.sim_time_ms
    }

    /// True when the most recent `tick()` rolled over into a new day.
    pub fn is_new_day(&self) -> bool {
        self.rolled_day && self.total_ticks > 0
    }

    pub fn ticks_per_day(&self) -> u32 {
        self.ticks_per_day
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Simulated milliseconds that elapse per tick.
    pub fn sim_ms_per_tick(&self) -> f64 {
        MS_PER_DAY / self.ticks_per_day as f64
    }

    /// Wall-clock weight of one tick: reference granularity over current.
    ///
    /// Equals 1.0 when running at the reference granularity; greater when
    /// ticks are coarser (each tick represents more simulated time).
    pub fn tick_scale(&self) -> f64 {
        self.reference_ticks_per_day as f64 / self.ticks_per_day as f64
    }

    /// Set simulated time directly (restore path).
    pub fn set_sim_time(&mut self, ms: Timestamp) {
        self.sim_time_ms = ms;
    }

    /// Switch tick granularity (populate/live transitions).
    pub fn set_ticks_per_day(&mut self, ticks_per_day: u32) {
        self.ticks_per_day = ticks_per_day.max(1);
        self.tick_in_day = 0;
    }

    /// Set the reference granularity that `tick_scale` is measured against.
    pub fn set_reference_ticks_per_day(&mut self, ticks_per_day: u32) {
        self.reference_ticks_per_day = ticks_per_day.max(1);
    }

    /// Parse an ISO date string to epoch milliseconds at 09:30 UTC.
    pub fn parse_date(date: &str) -> Result<Timestamp> {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| SimCoreError::InvalidDate(date.to_string()))?;
        let open = parsed
            .and_hms_opt(9, 30, 0)
            .ok_or_else(|| SimCoreError::InvalidDate(date.to_string()))?;
        Ok(open.and_utc().timestamp_millis() as Timestamp)
    }

    /// Format epoch milliseconds as `YYYY-MM-DD`.
    pub fn format_date(ms: Timestamp) -> String {
        DateTime::from_timestamp_millis(ms as i64)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "invalid".to_string())
    }

    /// Format epoch milliseconds as a full ISO datetime.
    pub fn format_datetime(ms: Timestamp) -> String {
        DateTime::from_timestamp_millis(ms as i64)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| "invalid".to_string())
    }

    /// Current simulated date as `YYYY-MM-DD`.
    pub fn current_date(&self) -> String {
        Self::format_date(self.sim_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let ms = SimClock::parse_date("2025-01-01").unwrap();
        assert_eq!(SimClock::format_date(ms), "2025-01-01");
        assert_eq!(SimClock::format_datetime(ms), "2025-01-01T09:30:00Z");
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(matches!(
            SimClock::parse_date("not-a-date"),
            Err(SimCoreError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_tick_advances_time() {
        let mut clock = SimClock::new();
        clock.initialize("2025-01-01", 1440).unwrap();
        let start = clock.sim_time();
        clock.tick();
        // 1440 ticks/day -> one tick is one simulated minute.
        assert_eq!(clock.sim_time() - start, 60_000);
        assert_eq!(clock.total_ticks(), 1);
    }

    #[test]
    fn test_day_rollover() {
        let mut clock = SimClock::new();
        clock.initialize("2025-01-01", 4).unwrap();
        for _ in 0..3 {
            clock.tick();
            assert!(!clock.is_new_day());
        }
        clock.tick();
        assert!(clock.is_new_day());
        clock.tick();
        assert!(!clock.is_new_day());
    }

    #[test]
    fn test_populate_advances_requested_days() {
        let mut clock = SimClock::new();
        clock.initialize("2025-01-01", 576).unwrap();
        for _ in 0..5 * 576 {
            clock.tick();
        }
        assert_eq!(clock.current_date(), "2025-01-06");
    }

    #[test]
    fn test_tick_scale() {
        let mut clock = SimClock::new();
        clock.initialize("2025-01-01", 1440).unwrap();
        clock.set_reference_ticks_per_day(1440);
        assert!((clock.tick_scale() - 1.0).abs() < 1e-12);

        // Finer live granularity: each tick carries less weight.
        clock.set_ticks_per_day(72_000);
        assert!((clock.tick_scale() - 0.02).abs() < 1e-12);
    }
}
