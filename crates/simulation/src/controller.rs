//! Controller: owns the engine behind a reader-writer lock and drives it.
//!
//! One dedicated background thread runs the tick loop, taking the exclusive
//! lock for exactly one tick at a time. External readers take the shared
//! lock; external writers take the exclusive lock for their single
//! operation. Pause/stop are cooperative atomics checked once per loop
//! iteration, so an in-flight tick always completes. `populate` and
//! `reinitialize` are long-running exclusive operations; populate runs on
//! its own detached thread and is polled through atomic progress counters.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use news::{NewsCategory, NewsEvent, NewsSentiment};
use sim_core::{CandleInterval, SimClock};
use types::{BookSnapshot, Candle, OrderSide, OrderType, Symbol, Trade};

use crate::config::SimConfig;
use crate::engine::{Engine, ExternalOrderReport};
use crate::error::SimulationError;
use crate::metrics::{
    AgentSummary, InstrumentView, PopulateProgress, SimulationMetrics, StateView,
};
use crate::tick_log::TickLog;

const TICK_LOG_CAPACITY: usize = 1_000_000;

/// External checkpoint used to re-seed clock position and prices.
///
/// Candle history is intentionally untouched; the collaborator that owns
/// durable storage reconstructs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreSnapshot {
    /// ISO date to reposition the clock at.
    pub date: String,
    /// Total tick counter to resume from.
    #[serde(default)]
    pub tick: u64,
    /// Price per symbol; unknown symbols are ignored.
    pub prices: BTreeMap<Symbol, f64>,
}

/// Thread-safe owner of the simulation.
pub struct Controller {
    engine: RwLock<Engine>,
    config: RwLock<SimConfig>,
    tick_log: Mutex<TickLog>,

    running: AtomicBool,
    paused: AtomicBool,
    populating: AtomicBool,
    current_tick: AtomicU64,
    populate_target_days: AtomicU32,
    populate_current_day: AtomicU32,
    tick_rate_ms: AtomicU64,

    loop_handle: Mutex<Option<thread::JoinHandle<()>>>,
    /// Self-handle for spawning the loop and populate threads.
    self_ref: Weak<Controller>,
}

impl Controller {
    /// Build a stopped controller with a freshly initialized engine.
    pub fn new(config: SimConfig) -> Result<Arc<Self>, SimulationError> {
        let engine = Engine::new(config.clone())?;
        let mut tick_log = TickLog::new(TICK_LOG_CAPACITY);
        for spec in &config.instruments {
            tick_log.add_symbol(&spec.symbol);
        }
        let tick_rate_ms = config.tick_rate_ms;

        Ok(Arc::new_cyclic(|self_ref| Self {
            engine: RwLock::new(engine),
            config: RwLock::new(config),
            tick_log: Mutex::new(tick_log),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            populating: AtomicBool::new(false),
            current_tick: AtomicU64::new(0),
            populate_target_days: AtomicU32::new(0),
            populate_current_day: AtomicU32::new(0),
            tick_rate_ms: AtomicU64::new(tick_rate_ms),
            loop_handle: Mutex::new(None),
            self_ref: self_ref.clone(),
        }))
    }

    // ------------------------------------------------------------------
    // Run state
    // ------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_populating(&self) -> bool {
        self.populating.load(Ordering::SeqCst)
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::SeqCst)
    }

    /// Spawn the live tick loop. No-op when already running.
    pub fn start(&self) {
        let Some(controller) = self.self_ref.upgrade() else {
            return;
        };
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.paused.store(false, Ordering::SeqCst);

        let handle = thread::spawn(move || controller.run_loop());
        *self.loop_handle.lock() = Some(handle);
        info!("simulation started");
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("simulation paused");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        info!("simulation resumed");
    }

    /// Clear the running flag and join the loop thread.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.loop_handle.lock().take() {
            let _ = handle.join();
        }
        info!("simulation stopped");
    }

    /// The background tick loop. Exclusive lock held for exactly one tick
    /// per iteration; pause and stop are checked between ticks only.
    ///
    /// A panic escaping a tick halts the loop and leaves the last tick's
    /// state in place; partially applied ticks are not rolled back.
    fn run_loop(self: Arc<Self>) {
        let max_ticks = self.config.read().max_ticks;
        while self.running.load(Ordering::SeqCst) {
            if !self.paused.load(Ordering::SeqCst) {
                let result =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.tick_once()));
                if result.is_err() {
                    warn!("tick loop halted by panic; state frozen at last tick");
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
                if max_ticks > 0 && self.current_tick.load(Ordering::SeqCst) >= max_ticks {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
            thread::sleep(Duration::from_millis(self.tick_rate_ms.load(Ordering::SeqCst)));
        }
    }

    /// One tick under the exclusive lock, plus tick-log recording.
    fn tick_once(&self) {
        let mut engine = self.engine.write();
        engine.tick();
        self.record_tick(&engine);
        self.current_tick.fetch_add(1, Ordering::SeqCst);
    }

    fn record_tick(&self, engine: &Engine) {
        let mut log = self.tick_log.lock();
        for instrument in engine.instruments() {
            log.record(
                instrument.symbol(),
                instrument.price().to_float(),
                instrument.daily_volume() as f64,
            );
        }
        log.advance_tick();
    }

    /// Run `count` ticks synchronously under one exclusive lock.
    pub fn step(&self, count: u32) -> Result<(), SimulationError> {
        if self.is_populating() {
            return Err(SimulationError::Rejected(
                "cannot step while populating".to_string(),
            ));
        }
        let mut engine = self.engine.write();
        for _ in 0..count {
            engine.tick();
            self.record_tick(&engine);
            self.current_tick.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Populate
    // ------------------------------------------------------------------

    /// Fast-forward the simulation through `days` simulated days at coarse
    /// tick granularity, then restore live granularity.
    ///
    /// Rejected while live or while another populate is in flight; the call
    /// returns immediately and progress is polled via [`Controller::state`].
    pub fn populate(&self, days: u32, start_date: &str) -> Result<(), SimulationError> {
        if self.is_running() {
            return Err(SimulationError::Rejected(
                "cannot populate while the simulation is running".to_string(),
            ));
        }
        // Validate the date before committing any state.
        SimClock::parse_date(start_date)?;

        let Some(controller) = self.self_ref.upgrade() else {
            return Err(SimulationError::Rejected(
                "controller is shutting down".to_string(),
            ));
        };
        if self.populating.swap(true, Ordering::SeqCst) {
            return Err(SimulationError::Rejected(
                "populate already in progress".to_string(),
            ));
        }

        self.populate_target_days.store(days, Ordering::SeqCst);
        self.populate_current_day.store(0, Ordering::SeqCst);

        let start_date = start_date.to_string();
        thread::spawn(move || {
            controller.run_populate(days, &start_date);
        });
        Ok(())
    }

    fn run_populate(&self, days: u32, start_date: &str) {
        info!(days, start_date, "populate starting");
        let config = self.config.read().clone();
        let mut engine = self.engine.write();

        let fine_days = config.populate_fine_days.min(days);
        let coarse_days = days - fine_days;

        let clock = engine.clock_mut();
        if clock.initialize(start_date, config.populate_ticks_per_day).is_err() {
            // Date was validated up front; this is unreachable in practice.
            warn!(start_date, "populate aborted: invalid start date");
            self.populating.store(false, Ordering::SeqCst);
            return;
        }
        clock.set_reference_ticks_per_day(config.populate_ticks_per_day);

        // Phase 1: bulk history at coarse granularity.
        for day in 0..coarse_days {
            self.populate_day(&mut engine, config.populate_ticks_per_day);
            self.populate_current_day.store(day + 1, Ordering::SeqCst);
        }

        // Phase 2: recent history at finer granularity.
        if fine_days > 0 {
            let clock = engine.clock_mut();
            clock.set_ticks_per_day(config.populate_fine_ticks_per_day);
            clock.set_reference_ticks_per_day(config.populate_fine_ticks_per_day);
            for day in 0..fine_days {
                self.populate_day(&mut engine, config.populate_fine_ticks_per_day);
                self.populate_current_day
                    .store(coarse_days + day + 1, Ordering::SeqCst);
            }
        }

        // Back to live granularity.
        let clock = engine.clock_mut();
        clock.set_ticks_per_day(config.ticks_per_day);
        clock.set_reference_ticks_per_day(config.reference_ticks_per_day);

        let date = engine.clock().current_date();
        drop(engine);

        self.populating.store(false, Ordering::SeqCst);
        self.populate_target_days.store(0, Ordering::SeqCst);
        info!(date, "populate complete");
    }

    fn populate_day(&self, engine: &mut Engine, ticks: u32) {
        for _ in 0..ticks {
            engine.tick();
            self.record_tick(engine);
            self.current_tick.fetch_add(1, Ordering::SeqCst);
        }
    }

    // ------------------------------------------------------------------
    // Reinitialize / restore / reset
    // ------------------------------------------------------------------

    /// Cold reload: rebuild instruments, books and agents from the current
    /// configuration. Required when population sizes or the instrument set
    /// change.
    pub fn reinitialize(&self) -> Result<(), SimulationError> {
        if self.is_populating() {
            return Err(SimulationError::Rejected(
                "cannot reinitialize while populating".to_string(),
            ));
        }
        let config = self.config.read().clone();
        let fresh = Engine::new(config.clone())?;

        let mut engine = self.engine.write();
        *engine = fresh;
        drop(engine);

        let mut log = self.tick_log.lock();
        log.clear();
        for spec in &config.instruments {
            log.add_symbol(&spec.symbol);
        }
        self.current_tick.store(0, Ordering::SeqCst);
        info!("engine reinitialized");
        Ok(())
    }

    /// Stop the loop and rebuild everything from configuration.
    pub fn reset(&self) -> Result<(), SimulationError> {
        self.stop();
        self.reinitialize()
    }

    /// Re-seed clock position and instrument prices from an external
    /// checkpoint. Candle history is not touched.
    pub fn restore(&self, snapshot: &RestoreSnapshot) -> Result<(), SimulationError> {
        let time = SimClock::parse_date(&snapshot.date)?;

        let mut engine = self.engine.write();
        engine.clock_mut().set_sim_time(time);
        for instrument in engine.instruments_mut() {
            if let Some(&price) = snapshot.prices.get(instrument.symbol()) {
                instrument.restore_price(price);
            }
        }
        drop(engine);

        if snapshot.tick > 0 {
            self.current_tick.store(snapshot.tick, Ordering::SeqCst);
        }
        info!(date = %snapshot.date, "state restored from snapshot");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn config(&self) -> SimConfig {
        self.config.read().clone()
    }

    /// Hot merge-patch: numeric parameters apply to the live engine without
    /// rebuilding it. Structural changes still need [`Controller::reinitialize`].
    pub fn patch_config(&self, patch: &Value) -> Result<(), SimulationError> {
        let merged = self.config.read().merge_patch(patch)?;
        self.tick_rate_ms.store(merged.tick_rate_ms, Ordering::SeqCst);
        self.engine.write().apply_config(&merged);
        *self.config.write() = merged;
        info!("configuration patched (hot)");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Write operations forwarded to the engine
    // ------------------------------------------------------------------

    pub fn submit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        quantity: u64,
    ) -> Result<ExternalOrderReport, SimulationError> {
        self.engine
            .write()
            .submit_external_order(symbol, side, order_type, quantity)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn inject_news(
        &self,
        category: NewsCategory,
        sentiment: NewsSentiment,
        magnitude: f64,
        symbol: Option<&str>,
        industry: Option<&str>,
        headline: &str,
    ) -> Result<(), SimulationError> {
        self.engine
            .write()
            .inject_news(category, sentiment, magnitude, symbol, industry, headline)
    }

    /// Export the tick history to a CSV archive.
    pub fn export_ticks(&self, path: &Path, max_ticks: usize) -> Result<u64, SimulationError> {
        self.tick_log.lock().export_csv(path, max_ticks)
    }

    // ------------------------------------------------------------------
    // Read surface (shared lock)
    // ------------------------------------------------------------------

    /// Run-state snapshot. Atomics only while populating, so this stays
    /// responsive during long populate runs.
    pub fn state(&self) -> StateView {
        let (sim_time, sim_date) = if self.is_populating() {
            (0, "populating".to_string())
        } else {
            let engine = self.engine.read();
            (engine.clock().sim_time(), engine.clock().current_date())
        };

        StateView {
            running: self.is_running(),
            paused: self.is_paused(),
            populating: self.is_populating(),
            current_tick: self.current_tick(),
            sim_time,
            sim_date,
            populate: PopulateProgress {
                target_days: self.populate_target_days.load(Ordering::SeqCst),
                current_day: self.populate_current_day.load(Ordering::SeqCst),
            },
        }
    }

    pub fn instruments(&self) -> Vec<InstrumentView> {
        self.engine.read().instrument_views()
    }

    pub fn agent_summaries(&self) -> Vec<AgentSummary> {
        self.engine.read().agent_summaries()
    }

    pub fn metrics(&self) -> SimulationMetrics {
        self.engine.read().metrics()
    }

    pub fn order_book(&self, symbol: &str, depth: usize) -> Result<BookSnapshot, SimulationError> {
        self.engine
            .read()
            .book(symbol)
            .map(|book| book.snapshot(depth))
            .ok_or_else(|| SimulationError::UnknownSymbol(symbol.to_string()))
    }

    pub fn recent_trades(&self, limit: usize) -> Vec<Trade> {
        self.engine.read().recent_trades(limit)
    }

    pub fn recent_news(&self, count: usize) -> Vec<NewsEvent> {
        self.engine.read().news().recent(count)
    }

    pub fn news_history(&self) -> Vec<NewsEvent> {
        self.engine.read().news().history().to_vec()
    }

    pub fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        since: u64,
        limit: usize,
    ) -> Result<Vec<Candle>, SimulationError> {
        let engine = self.engine.read();
        if engine.instrument(symbol).is_none() {
            return Err(SimulationError::UnknownSymbol(symbol.to_string()));
        }
        Ok(engine.candles().candles(symbol, interval, since, limit))
    }

    pub fn candles_bulk(
        &self,
        interval: CandleInterval,
        since: u64,
    ) -> BTreeMap<Symbol, Vec<Candle>> {
        self.engine.read().candles().all_candles(interval, since)
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.loop_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SimConfig {
        SimConfig {
            ticks_per_day: 1_440,
            reference_ticks_per_day: 1_440,
            populate_ticks_per_day: 288,
            populate_fine_ticks_per_day: 576,
            populate_fine_days: 2,
            tick_rate_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_step_advances_ticks() {
        let controller = Controller::new(test_config()).unwrap();
        assert_eq!(controller.current_tick(), 0);
        controller.step(10).unwrap();
        assert_eq!(controller.current_tick(), 10);
    }

    #[test]
    fn test_start_pause_stop() {
        let controller = Controller::new(test_config()).unwrap();
        controller.start();
        assert!(controller.is_running());

        // The loop makes progress.
        let mut progressed = false;
        for _ in 0..100 {
            std::thread::sleep(Duration::from_millis(5));
            if controller.current_tick() > 0 {
                progressed = true;
                break;
            }
        }
        assert!(progressed, "tick loop made no progress");

        controller.pause();
        let at_pause = controller.current_tick();
        std::thread::sleep(Duration::from_millis(30));
        // Cooperative pause: at most one in-flight tick completes after.
        assert!(controller.current_tick() <= at_pause + 1);

        controller.stop();
        assert!(!controller.is_running());
    }

    #[test]
    fn test_populate_advances_exactly_requested_days() {
        let controller = Controller::new(test_config()).unwrap();
        controller.populate(5, "2025-01-01").unwrap();

        // Poll until the background populate finishes.
        for _ in 0..600 {
            if !controller.is_populating() {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(!controller.is_populating(), "populate never finished");

        let state = controller.state();
        assert_eq!(state.sim_date, "2025-01-06");
        assert_eq!(state.populate.current_day, 5);

        // Every instrument has candle history at every interval.
        for view in controller.instruments() {
            for interval in [CandleInterval::M15, CandleInterval::H1, CandleInterval::D1] {
                let candles = controller
                    .candles(&view.symbol, interval, 0, 10_000)
                    .unwrap();
                assert!(
                    !candles.is_empty(),
                    "no {} candles for {}",
                    interval.label(),
                    view.symbol
                );
            }
        }
    }

    #[test]
    fn test_populate_rejected_while_populating() {
        let controller = Controller::new(test_config()).unwrap();
        controller.populate(30, "2025-01-01").unwrap();
        let tick_before = controller.current_tick();

        // Second call must be rejected without altering populate state.
        let result = controller.populate(5, "2030-01-01");
        assert!(matches!(result, Err(SimulationError::Rejected(_))));
        assert!(controller.is_populating() || controller.current_tick() > tick_before);

        while controller.is_populating() {
            std::thread::sleep(Duration::from_millis(20));
        }
        // The original request's day count won, not the rejected one's.
        assert_eq!(controller.state().populate.current_day, 30);
    }

    #[test]
    fn test_populate_rejected_while_running() {
        let controller = Controller::new(test_config()).unwrap();
        controller.start();
        let result = controller.populate(5, "2025-01-01");
        assert!(matches!(result, Err(SimulationError::Rejected(_))));
        controller.stop();
    }

    #[test]
    fn test_populate_invalid_date_rejected_without_state_change() {
        let controller = Controller::new(test_config()).unwrap();
        let before = controller.current_tick();
        assert!(controller.populate(5, "not-a-date").is_err());
        assert!(!controller.is_populating());
        assert_eq!(controller.current_tick(), before);
    }

    #[test]
    fn test_restore_reseeds_clock_and_prices() {
        let controller = Controller::new(test_config()).unwrap();
        controller.step(50).unwrap();

        let snapshot = RestoreSnapshot {
            date: "2025-06-15".to_string(),
            tick: 999,
            prices: BTreeMap::from([("NTX".to_string(), 123.0)]),
        };
        controller.restore(&snapshot).unwrap();

        let state = controller.state();
        assert_eq!(state.sim_date, "2025-06-15");
        assert_eq!(state.current_tick, 999);

        let ntx = controller
            .instruments()
            .into_iter()
            .find(|v| v.symbol == "NTX")
            .unwrap();
        assert!((ntx.price - 123.0).abs() < 1e-9);
    }

    #[test]
    fn test_reinitialize_resets_tick_counter() {
        let controller = Controller::new(test_config()).unwrap();
        controller.step(20).unwrap();
        assert_eq!(controller.current_tick(), 20);

        controller.reinitialize().unwrap();
        assert_eq!(controller.current_tick(), 0);
        assert_eq!(controller.metrics().total_ticks, 0);
    }

    #[test]
    fn test_patch_config_hot_updates() {
        let controller = Controller::new(test_config()).unwrap();
        let patch = serde_json::json!({ "news": { "lambda": 0.7 } });
        controller.patch_config(&patch).unwrap();
        assert!((controller.config().news.lambda - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_manual_sell_without_inventory_returns_zero_fill() {
        let controller = Controller::new(test_config()).unwrap();
        // Fresh book: nothing to match against.
        let report = controller
            .submit_order("NTX", OrderSide::Sell, OrderType::Market, 100)
            .unwrap();
        assert_eq!(report.filled, 0);
    }

    #[test]
    fn test_order_book_snapshot_unknown_symbol() {
        let controller = Controller::new(test_config()).unwrap();
        assert!(matches!(
            controller.order_book("FAKE", 5),
            Err(SimulationError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_concurrent_readers_during_live_run() {
        let controller = Controller::new(test_config()).unwrap();
        controller.start();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let reader = Arc::clone(&controller);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    let _ = reader.state();
                    let _ = reader.instruments();
                    let _ = reader.metrics();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        controller.stop();
    }
}
