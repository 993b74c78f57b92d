//! Agent configuration: population counts, parameter distributions, shared
//! behavior constants, and per-strategy tuning.
//!
//! Everything here is plain serde data passed at construction time; agents
//! never reach for global state.

use serde::{Deserialize, Serialize};

use crate::sentiment::SentimentDecay;

/// How many agents of each strategy to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub fundamental: u32,
    pub momentum: u32,
    pub mean_reversion: u32,
    pub noise: u32,
    pub market_maker: u32,
    pub cross_asset: u32,
    pub rebalance: u32,
    pub event: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            fundamental: 15,
            momentum: 12,
            mean_reversion: 10,
            noise: 25,
            market_maker: 4,
            cross_asset: 6,
            rebalance: 6,
            event: 8,
        }
    }
}

impl PopulationConfig {
    pub fn total(&self) -> u32 {
        self.fundamental
            + self.momentum
            + self.mean_reversion
            + self.noise
            + self.market_maker
            + self.cross_asset
            + self.rebalance
            + self.event
    }
}

/// Distributions the per-agent [`types::AgentParams`] are sampled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub risk_aversion_mean: f64,
    pub risk_aversion_std: f64,
    pub risk_aversion_min: f64,
    pub reaction_speed_lambda: f64,
    pub news_weight_min: f64,
    pub news_weight_max: f64,
    pub confidence_min: f64,
    pub confidence_max: f64,
    pub time_horizon_mu: f64,
    pub time_horizon_sigma: f64,
    pub mean_cash: f64,
    pub std_cash: f64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            risk_aversion_mean: 1.0,
            risk_aversion_std: 0.3,
            risk_aversion_min: 0.1,
            reaction_speed_lambda: 1.0,
            news_weight_min: 0.5,
            news_weight_max: 1.5,
            confidence_min: 0.3,
            confidence_max: 1.0,
            time_horizon_mu: 3.0,
            time_horizon_sigma: 0.5,
            mean_cash: 100_000.0,
            std_cash: 30_000.0,
        }
    }
}

/// Behavior constants shared by every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Base fraction of cash committed per order, divided by risk aversion.
    pub capital_fraction: f64,
    /// Hard cap on single-order size in shares.
    pub max_order_size: u64,
    /// Fraction of initial cash that must stay untouched by buys.
    pub cash_reserve: f64,
    /// Max short magnitude beyond the current long position.
    pub max_short: i64,
    /// Per-layer geometric sentiment decay per reference tick.
    pub sentiment_decay: SentimentDecay,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            capital_fraction: 0.05,
            max_order_size: 500,
            cash_reserve: 0.10,
            max_short: 200,
            sentiment_decay: SentimentDecay::default(),
        }
    }
}

/// Fundamental/mispricing strategy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalConfig {
    pub threshold_base: f64,
    pub threshold_risk_scale: f64,
    pub noise_std_base: f64,
    pub noise_std_range: f64,
    pub reaction_mult: f64,
    pub sentiment_impact: f64,
    pub limit_offset_max: f64,
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        Self {
            threshold_base: 0.01,
            threshold_risk_scale: 0.02,
            noise_std_base: 0.005,
            noise_std_range: 0.01,
            reaction_mult: 0.3,
            sentiment_impact: 0.15,
            limit_offset_max: 0.005,
        }
    }
}

/// Moving-average crossover momentum tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub short_period_min: u32,
    pub short_period_range: u32,
    pub long_offset_min: u32,
    pub long_offset_range: u32,
    pub reaction_mult: f64,
    pub signal_threshold_risk_scale: f64,
    pub sentiment_symbol_weight: f64,
    pub sentiment_global_weight: f64,
    pub limit_offset_min: f64,
    pub limit_offset_max: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            short_period_min: 3,
            short_period_range: 4,
            long_offset_min: 10,
            long_offset_range: 15,
            reaction_mult: 0.25,
            signal_threshold_risk_scale: 0.001,
            sentiment_symbol_weight: 0.1,
            sentiment_global_weight: 0.05,
            limit_offset_min: 0.0005,
            limit_offset_max: 0.005,
        }
    }
}

/// Z-score mean reversion tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    pub lookback_min: u32,
    pub lookback_range: u32,
    pub z_threshold_min: f64,
    pub z_threshold_range: f64,
    pub reaction_mult: f64,
    pub sentiment_symbol_weight: f64,
    pub sentiment_global_weight: f64,
    pub limit_offset_max: f64,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            lookback_min: 20,
            lookback_range: 20,
            z_threshold_min: 1.5,
            z_threshold_range: 1.0,
            reaction_mult: 0.2,
            sentiment_symbol_weight: 0.2,
            sentiment_global_weight: 0.1,
            limit_offset_max: 0.005,
        }
    }
}

/// Noise trader tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub trade_prob_min: f64,
    pub trade_prob_range: f64,
    pub sentiment_sensitivity_min: f64,
    pub sentiment_sensitivity_max: f64,
    pub overreaction_mult: f64,
    pub market_order_prob: f64,
    pub limit_offset_min: f64,
    pub limit_offset_max: f64,
    pub confidence_min: f64,
    pub confidence_max: f64,
    pub buy_bias_sentiment_weight: f64,
    pub buy_bias_noise_std: f64,
    /// Noise traders shed beliefs faster than the shared defaults.
    pub sentiment_decay: SentimentDecay,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            trade_prob_min: 0.05,
            trade_prob_range: 0.10,
            sentiment_sensitivity_min: 0.3,
            sentiment_sensitivity_max: 0.8,
            overreaction_mult: 1.0,
            market_order_prob: 0.1,
            limit_offset_min: 0.001,
            limit_offset_max: 0.01,
            confidence_min: 0.2,
            confidence_max: 0.5,
            buy_bias_sentiment_weight: 0.3,
            buy_bias_noise_std: 0.1,
            sentiment_decay: SentimentDecay {
                global: 0.98,
                industry: 0.97,
                symbol: 0.95,
            },
        }
    }
}

/// Market maker tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMakerConfig {
    pub base_spread_min: f64,
    pub base_spread_max: f64,
    pub inventory_skew_min: f64,
    pub inventory_skew_max: f64,
    pub max_inventory_min: i64,
    pub max_inventory_max: i64,
    pub volatility_spread_mult: f64,
    pub sentiment_spread_mult: f64,
    pub quote_capital_fraction: f64,
    /// Blend weight of the fundamental into the quoting mid.
    pub fundamental_weight: f64,
    /// Shares of each instrument seeded at initialization.
    pub seed_inventory: u64,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            base_spread_min: 0.001,
            base_spread_max: 0.003,
            inventory_skew_min: 0.0005,
            inventory_skew_max: 0.0015,
            max_inventory_min: 500,
            max_inventory_max: 1500,
            volatility_spread_mult: 10.0,
            sentiment_spread_mult: 0.5,
            quote_capital_fraction: 0.02,
            fundamental_weight: 0.05,
            seed_inventory: 500,
        }
    }
}

/// Cross-instrument propagation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossAssetConfig {
    pub threshold_base: f64,
    pub threshold_risk_scale: f64,
    pub reaction_mult: f64,
    pub effect_weight: f64,
    pub limit_offset_max: f64,
}

impl Default for CrossAssetConfig {
    fn default() -> Self {
        Self {
            threshold_base: 0.02,
            threshold_risk_scale: 0.02,
            reaction_mult: 0.2,
            effect_weight: 0.3,
            limit_offset_max: 0.003,
        }
    }
}

/// Portfolio rebalancing tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    pub target_ratio_base: f64,
    pub target_ratio_range: f64,
    pub threshold_base: f64,
    pub threshold_risk_scale: f64,
    pub reaction_mult: f64,
    pub limit_offset_max: f64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            target_ratio_base: 0.1,
            target_ratio_range: 0.05,
            threshold_base: 0.02,
            threshold_risk_scale: 0.02,
            reaction_mult: 0.15,
            limit_offset_max: 0.002,
        }
    }
}

/// News-reactive strategy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub reaction_threshold_base: f64,
    pub reaction_threshold_risk_scale: f64,
    pub cooldown_base: u32,
    pub cooldown_range: u32,
    pub reaction_mult: f64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            reaction_threshold_base: 0.03,
            reaction_threshold_risk_scale: 0.02,
            cooldown_base: 10,
            cooldown_range: 20,
            reaction_mult: 0.5,
        }
    }
}

/// Everything needed to build and run the agent population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentsConfig {
    pub population: PopulationConfig,
    pub distributions: DistributionConfig,
    pub behavior: BehaviorConfig,
    pub fundamental: FundamentalConfig,
    pub momentum: MomentumConfig,
    pub mean_reversion: MeanReversionConfig,
    pub noise: NoiseConfig,
    pub market_maker: MarketMakerConfig,
    pub cross_asset: CrossAssetConfig,
    pub rebalance: RebalanceConfig,
    pub event: EventConfig,
}
