//! Simulation configuration tree.
//!
//! One serde-backed struct covers every tunable: clock granularity, the
//! instrument set, fundamental dynamics, news/macro tuning and the agent
//! population. It is passed at construction time; hot updates go through a
//! JSON merge-patch that rebuilds the tree and pushes numeric parameters
//! into live components, while structural changes (instrument set,
//! population counts) require a full reinitialize.

use agents::AgentsConfig;
use news::{MacroConfig, NewsConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sim_core::{InstrumentSpec, PriceDynamics};

use crate::error::SimulationError;

/// Fundamental-update and diagnostics tuning owned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annual drift of fundamentals, spread over 252 trading days.
    pub annual_growth_rate: f64,
    /// Std of the per-tick random company shock.
    pub company_shock_std: f64,
    /// Scale applied to accumulated company news shocks.
    pub news_to_fundamental_scale: f64,
    /// Scale applied to accumulated industry news shocks.
    pub industry_shock_scale: f64,
    /// Per-tick geometric decay of the industry shock accumulator.
    pub industry_shock_decay: f64,
    /// Per-tick geometric decay of the company shock accumulator.
    pub company_shock_decay: f64,
    /// Resting orders older than this many sim milliseconds expire.
    pub order_expiry_ms: u64,
    /// Book levels returned in snapshots by default.
    pub snapshot_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            annual_growth_rate: 0.08,
            company_shock_std: 0.0002,
            news_to_fundamental_scale: 0.005,
            industry_shock_scale: 0.005,
            industry_shock_decay: 0.95,
            company_shock_decay: 0.90,
            order_expiry_ms: 172_800_000,
            snapshot_depth: 10,
        }
    }
}

/// Root configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed; every stochastic component derives its stream from it.
    pub seed: u64,
    /// ISO start date for the simulated calendar.
    pub start_date: String,
    /// Wall-clock delay between live ticks.
    pub tick_rate_ms: u64,
    /// Live tick granularity.
    pub ticks_per_day: u32,
    /// Granularity that defines tick weight 1.0.
    pub reference_ticks_per_day: u32,
    /// Coarse granularity for the bulk populate phase.
    pub populate_ticks_per_day: u32,
    /// Finer granularity for the populate tail.
    pub populate_fine_ticks_per_day: u32,
    /// How many trailing populate days run at the finer granularity.
    pub populate_fine_days: u32,
    /// Stop the live loop after this many ticks (0 = run forever).
    pub max_ticks: u64,
    pub instruments: Vec<InstrumentSpec>,
    pub dynamics: PriceDynamics,
    pub engine: EngineConfig,
    pub news: NewsConfig,
    #[serde(rename = "macro")]
    pub macro_env: MacroConfig,
    pub agents: AgentsConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_date: "2025-01-01".to_string(),
            tick_rate_ms: 50,
            ticks_per_day: 72_000,
            reference_ticks_per_day: 1_440,
            populate_ticks_per_day: 576,
            populate_fine_ticks_per_day: 1_440,
            populate_fine_days: 7,
            max_ticks: 0,
            instruments: default_instruments(),
            dynamics: PriceDynamics::default(),
            engine: EngineConfig::default(),
            news: NewsConfig::default(),
            macro_env: MacroConfig::default(),
            agents: AgentsConfig::default(),
        }
    }
}

impl SimConfig {
    /// Apply an RFC 7396-style JSON merge-patch and re-validate.
    pub fn merge_patch(&self, patch: &Value) -> Result<SimConfig, SimulationError> {
        let mut doc = serde_json::to_value(self)
            .map_err(|e| SimulationError::Config(e.to_string()))?;
        merge_values(&mut doc, patch);
        let merged: SimConfig =
            serde_json::from_value(doc).map_err(|e| SimulationError::Config(e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }

    /// Structural sanity checks before a config is accepted.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.instruments.is_empty() {
            return Err(SimulationError::Config(
                "at least one instrument is required".to_string(),
            ));
        }
        if self.ticks_per_day == 0 || self.populate_ticks_per_day == 0 {
            return Err(SimulationError::Config(
                "ticks_per_day must be positive".to_string(),
            ));
        }
        for spec in &self.instruments {
            if spec.initial_price <= 0.0 {
                return Err(SimulationError::Config(format!(
                    "instrument {} has non-positive initial price",
                    spec.symbol
                )));
            }
        }
        Ok(())
    }
}

/// Deep JSON merge: objects merge recursively, everything else replaces.
fn merge_values(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_values(existing, patch_value),
                    None => {
                        target_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

fn default_instruments() -> Vec<InstrumentSpec> {
    fn spec(
        symbol: &str,
        name: &str,
        industry: &str,
        price: f64,
        volatility: f64,
        shares: u64,
        effects: &[(&str, f64)],
    ) -> InstrumentSpec {
        InstrumentSpec {
            symbol: symbol.to_string(),
            name: name.to_string(),
            industry: industry.to_string(),
            initial_price: price,
            volatility,
            shares_outstanding: shares,
            cross_effects: effects
                .iter()
                .map(|(target, coefficient)| (target.to_string(), *coefficient))
                .collect(),
        }
    }

    vec![
        spec(
            "NTX",
            "Northern Technologies",
            "Technology",
            150.0,
            0.025,
            2_000_000,
            &[("VLTC", 0.25)],
        ),
        spec(
            "VLTC",
            "Voltaic Semiconductors",
            "Technology",
            85.0,
            0.03,
            1_500_000,
            &[("NTX", 0.30)],
        ),
        spec(
            "OILC",
            "Oceanic Oil",
            "Energy",
            75.0,
            0.02,
            5_000_000,
            &[("STLW", 0.25), ("HLNE", 0.15)],
        ),
        spec(
            "STLW",
            "Steelworks United",
            "Industrials",
            120.0,
            0.018,
            1_200_000,
            &[("OILC", 0.20)],
        ),
        spec(
            "HLNE",
            "Helios Energy",
            "Energy",
            45.0,
            0.028,
            3_000_000,
            &[("OILC", 0.10)],
        ),
        spec(
            "GRNF",
            "Greenfield Foods",
            "Agriculture",
            40.0,
            0.015,
            2_500_000,
            &[],
        ),
    ]
}
