//! Configuration for news generation and the macro environment.

use serde::{Deserialize, Serialize};

/// News generator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Poisson arrival rate of events per tick at reference granularity.
    pub lambda: f64,
    /// Half-normal magnitude spread for global news.
    pub global_impact_std: f64,
    /// Half-normal magnitude spread for political news.
    pub political_impact_std: f64,
    /// Half-normal magnitude spread for industry news.
    pub industry_impact_std: f64,
    /// Half-normal magnitude spread for company news.
    pub company_impact_std: f64,
    /// Select target companies weighted by market cap instead of uniformly.
    pub cap_weighted_selection: bool,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            lambda: 0.1,
            global_impact_std: 0.02,
            political_impact_std: 0.025,
            industry_impact_std: 0.03,
            company_impact_std: 0.05,
            cap_weighted_selection: true,
        }
    }
}

/// Macro environment tuning: mean reversion rates, noise and news impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    pub sentiment_mean: f64,
    pub sentiment_reversion: f64,
    pub sentiment_noise_std: f64,
    pub volatility_mean: f64,
    pub volatility_reversion: f64,
    pub volatility_noise_std: f64,
    pub interest_rate_noise_std: f64,
    pub interest_rate_min: f64,
    pub interest_rate_max: f64,
    /// Sentiment shift multiplier for political news.
    pub political_sentiment_mult: f64,
    /// Sentiment shift multiplier for global news.
    pub global_sentiment_mult: f64,
    /// Volatility bump per unit magnitude of political news.
    pub political_vol_impact: f64,
    /// Volatility bump per unit magnitude of negative news.
    pub negative_vol_impact: f64,
    /// Weight of global sentiment in the derived per-tick global shock.
    pub shock_sentiment_weight: f64,
    /// Noise spread of the derived per-tick global shock.
    pub shock_noise_std: f64,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            sentiment_mean: 0.0,
            sentiment_reversion: 0.05,
            sentiment_noise_std: 0.01,
            volatility_mean: 0.2,
            volatility_reversion: 0.02,
            volatility_noise_std: 0.01,
            interest_rate_noise_std: 0.0001,
            interest_rate_min: 0.0,
            interest_rate_max: 0.15,
            political_sentiment_mult: 0.3,
            global_sentiment_mult: 0.5,
            political_vol_impact: 0.15,
            negative_vol_impact: 0.1,
            shock_sentiment_weight: 0.0003,
            shock_noise_std: 0.0003,
        }
    }
}
