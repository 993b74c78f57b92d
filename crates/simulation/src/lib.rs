//! Engine and controller for the market simulation.
//!
//! [`Engine`] owns the instruments, order books, agent population, news
//! generator and macro environment and advances them one tick at a time.
//! [`Controller`] owns the engine behind a reader-writer lock, drives it on
//! a background thread, and exposes the thread-safe read/write surface
//! consumed by the API layer.

mod config;
mod controller;
mod engine;
mod error;
mod metrics;
mod tick_log;

pub use config::{EngineConfig, SimConfig};
pub use controller::{Controller, RestoreSnapshot};
pub use engine::{Engine, ExternalOrderReport, ExternalOrderStatus};
pub use error::SimulationError;
pub use metrics::{AgentSummary, InstrumentView, PopulateProgress, SimulationMetrics, StateView};
pub use tick_log::TickLog;
