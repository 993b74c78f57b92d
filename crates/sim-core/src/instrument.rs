//! Tradable instrument state.
//!
//! Holds the traded price, the model fundamental value, the bounded price
//! history ring, the daily circuit breaker, and volume counters. Only the
//! engine mutates an instrument; agents observe it through per-tick
//! snapshots.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use types::Price;

const MAX_HISTORY: usize = 1_000;

/// Static description of an instrument, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: String,
    pub name: String,
    pub industry: String,
    pub initial_price: f64,
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    #[serde(default = "default_shares_outstanding")]
    pub shares_outstanding: u64,
    /// Directed spillover coefficients onto other symbols.
    #[serde(default)]
    pub cross_effects: HashMap<String, f64>,
}

fn default_volatility() -> f64 {
    0.02
}

fn default_shares_outstanding() -> u64 {
    1_000_000
}

/// Tunable price-update behavior shared by all instruments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceDynamics {
    /// Base blend fraction toward a trade price.
    pub impact_base: f64,
    /// Trade quantity at which impact reaches half its quantity saturation.
    pub impact_liquidity_scale: f64,
    /// How strongly the rolling volatility estimate amplifies impact.
    pub impact_vol_mult: f64,
    /// Hard cap on the blend fraction for a single trade.
    pub impact_max: f64,
    /// Absolute price floor.
    pub price_floor: f64,
    /// Max fractional move from the day-open price before the breaker trips.
    pub max_daily_move: f64,
    /// Max per-tick magnitude of the total fundamental shock.
    pub fundamental_shock_clamp: f64,
}

impl Default for PriceDynamics {
    fn default() -> Self {
        Self {
            impact_base: 0.5,
            impact_liquidity_scale: 200.0,
            impact_vol_mult: 4.0,
            impact_max: 0.9,
            price_floor: 0.01,
            max_daily_move: 0.15,
            fundamental_shock_clamp: 0.05,
        }
    }
}

/// Mutable market state of a single tradable instrument.
#[derive(Debug, Clone)]
pub struct Instrument {
    symbol: String,
    name: String,
    industry: String,
    price: Price,
    fundamental: f64,
    base_volatility: f64,
    shares_outstanding: u64,
    daily_volume: u64,
    /// Volume traded since the engine last drained it into the candle feed.
    tick_volume: u64,
    history: VecDeque<f64>,
    liquidity: f64,
    dynamics: PriceDynamics,
    day_open: Price,
    circuit_broken: bool,
}

impl Instrument {
    pub fn from_spec(spec: &InstrumentSpec, dynamics: PriceDynamics) -> Self {
        let price = Price::from_float(spec.initial_price);
        let mut history = VecDeque::with_capacity(MAX_HISTORY);
        history.push_back(spec.initial_price);
        Self {
            symbol: spec.symbol.clone(),
            name: spec.name.clone(),
            industry: spec.industry.clone(),
            price,
            fundamental: spec.initial_price,
            base_volatility: spec.volatility,
            shares_outstanding: spec.shares_outstanding,
            daily_volume: 0,
            tick_volume: 0,
            history,
            liquidity: 1.0,
            dynamics,
            day_open: price,
            circuit_broken: false,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn fundamental(&self) -> f64 {
        self.fundamental
    }

    pub fn set_fundamental(&mut self, value: f64) {
        self.fundamental = value.max(self.dynamics.price_floor);
    }

    pub fn daily_volume(&self) -> u64 {
        self.daily_volume
    }

    pub fn shares_outstanding(&self) -> u64 {
        self.shares_outstanding
    }

    pub fn market_cap(&self) -> f64 {
        self.price.to_float() * self.shares_outstanding as f64
    }

    pub fn liquidity(&self) -> f64 {
        self.liquidity
    }

    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    pub fn is_circuit_broken(&self) -> bool {
        self.circuit_broken
    }

    pub fn day_open(&self) -> Price {
        self.day_open
    }

    pub fn dynamics(&self) -> &PriceDynamics {
        &self.dynamics
    }

    pub fn set_dynamics(&mut self, dynamics: PriceDynamics) {
        self.dynamics = dynamics;
    }

    // ------------------------------------------------------------------
    // Day lifecycle
    // ------------------------------------------------------------------

    pub fn mark_day_open(&mut self) {
        self.day_open = self.price;
    }

    pub fn reset_circuit_breaker(&mut self) {
        self.circuit_broken = false;
    }

    pub fn reset_daily_volume(&mut self) {
        self.daily_volume = 0;
    }

    pub fn add_volume(&mut self, quantity: u64) {
        self.daily_volume += quantity;
        self.tick_volume += quantity;
    }

    /// Volume traded since the last call; reset on read. The engine drains
    /// this once per tick into the candle aggregator.
    pub fn take_tick_volume(&mut self) -> u64 {
        std::mem::take(&mut self.tick_volume)
    }

    // ------------------------------------------------------------------
    // Price updates
    // ------------------------------------------------------------------

    /// Set the price subject to the floor and the daily circuit breaker.
    pub fn set_price(&mut self, value: f64) {
        let mut price = value.max(self.dynamics.price_floor);

        let open = self.day_open.to_float();
        if open > 0.0 && self.dynamics.max_daily_move > 0.0 {
            let move_from_open = (price - open) / open;
            if move_from_open.abs() > self.dynamics.max_daily_move {
                self.circuit_broken = true;
                price = open * (1.0 + move_from_open.signum() * self.dynamics.max_daily_move);
            }
        }

        self.price = Price::from_float(price);
        self.history.push_back(price);
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }

        self.liquidity = (self.daily_volume as f64 / (self.shares_outstanding as f64 * 0.01))
            .clamp(0.1, 2.0);
    }

    /// Dampened price impact: blend part of the way from the current price
    /// toward the trade price.
    ///
    /// The blend fraction grows with trade quantity (saturating in units of
    /// the liquidity scale) and with the rolling volatility estimate, so a
    /// single small trade in a quiet market barely moves the print while a
    /// large trade in a volatile one moves it most of the way. Halted while
    /// the circuit breaker is tripped.
    pub fn apply_trade_price(&mut self, trade_price: Price, quantity: u64) {
        if !trade_price.is_positive() || self.circuit_broken {
            return;
        }

        let d = &self.dynamics;
        let qty_saturation = quantity as f64 / (quantity as f64 + d.impact_liquidity_scale);
        let vol = self.volatility_estimate(20);
        let alpha =
            (d.impact_base * (0.5 + qty_saturation) * (1.0 + vol * d.impact_vol_mult))
                .clamp(0.0, d.impact_max);

        let current = self.price.to_float();
        let blended = current * (1.0 - alpha) + trade_price.to_float() * alpha;
        self.set_price(blended);
    }

    /// Re-seed the price from an external checkpoint: becomes the new day
    /// open, clears the breaker, and restarts history from this point.
    pub fn restore_price(&mut self, value: f64) {
        let value = value.max(self.dynamics.price_floor);
        self.price = Price::from_float(value);
        self.fundamental = value;
        self.day_open = self.price;
        self.circuit_broken = false;
        self.history.push_back(value);
        if self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    /// Evolve the fundamental value from accumulated shocks.
    ///
    /// The total shock is clamped before the exponential so one pathological
    /// tick cannot send the fundamental to infinity.
    pub fn update_fundamental(
        &mut self,
        global_shock: f64,
        industry_shock: f64,
        company_shock: f64,
        growth_per_tick: f64,
    ) {
        let total = (growth_per_tick + global_shock + industry_shock + company_shock)
            .clamp(-self.dynamics.fundamental_shock_clamp, self.dynamics.fundamental_shock_clamp);
        self.fundamental = (self.fundamental * total.exp()).max(self.dynamics.price_floor);
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    /// Simple return over the last `periods` history entries.
    pub fn ret(&self, periods: usize) -> f64 {
        if self.history.len() < periods + 1 {
            return 0.0;
        }
        let old = self.history[self.history.len() - periods - 1];
        if old <= 0.0 {
            return 0.0;
        }
        (self.price.to_float() - old) / old
    }

    /// Standard deviation of simple returns over the history tail.
    /// Falls back to the configured base volatility with short history.
    pub fn volatility_estimate(&self, periods: usize) -> f64 {
        if self.history.len() < periods + 1 {
            return self.base_volatility;
        }

        let start = self.history.len() - periods - 1;
        let mut returns = Vec::with_capacity(periods);
        for i in start..self.history.len() - 1 {
            if self.history[i] > 0.0 {
                returns.push((self.history[i + 1] - self.history[i]) / self.history[i]);
            }
        }
        if returns.is_empty() {
            return self.base_volatility;
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance =
            returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / returns.len() as f64;
        variance.sqrt()
    }

    /// Fundamental minus price: positive means the instrument looks cheap.
    pub fn mispricing(&self) -> f64 {
        self.fundamental - self.price.to_float()
    }
}
