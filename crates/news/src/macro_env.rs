//! Mean-reverting macro environment.
//!
//! Global sentiment and the volatility index follow Ornstein-Uhlenbeck-style
//! mean reversion; the interest rate random-walks within bounds. Global and
//! political news shift sentiment and volatility. A derived "global shock"
//! feeds every instrument's fundamental update each tick.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::config::MacroConfig;
use crate::events::{NewsCategory, NewsEvent, NewsSentiment};

/// Market-wide sentiment/volatility/interest-rate state.
pub struct MacroEnvironment {
    config: MacroConfig,
    rng: StdRng,

    global_sentiment: f64,
    volatility_index: f64,
    risk_index: f64,
    interest_rate: f64,
}

impl MacroEnvironment {
    pub fn new(config: MacroConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            global_sentiment: 0.0,
            volatility_index: 0.2,
            risk_index: 0.3,
            interest_rate: 0.05,
        }
    }

    pub fn config(&self) -> &MacroConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MacroConfig) {
        self.config = config;
    }

    pub fn global_sentiment(&self) -> f64 {
        self.global_sentiment
    }

    pub fn volatility_index(&self) -> f64 {
        self.volatility_index
    }

    pub fn risk_index(&self) -> f64 {
        self.risk_index
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    pub fn set_global_sentiment(&mut self, value: f64) {
        self.global_sentiment = value.clamp(-1.0, 1.0);
    }

    pub fn set_interest_rate(&mut self, value: f64) {
        self.interest_rate = value.clamp(self.config.interest_rate_min, self.config.interest_rate_max);
    }

    /// One tick of mean reversion, scaled so per-day drift is invariant
    /// under tick-rate changes (noise scales with sqrt of the weight).
    pub fn update(&mut self, tick_scale: f64) {
        let c = self.config.clone();
        let sqrt_scale = tick_scale.max(0.0).sqrt();

        let drift = c.sentiment_reversion * (c.sentiment_mean - self.global_sentiment) * tick_scale;
        self.global_sentiment =
            (self.global_sentiment + drift + self.noise(c.sentiment_noise_std * sqrt_scale))
                .clamp(-1.0, 1.0);

        let vol_drift =
            c.volatility_reversion * (c.volatility_mean - self.volatility_index) * tick_scale;
        self.volatility_index =
            (self.volatility_index + vol_drift + self.noise(c.volatility_noise_std * sqrt_scale))
                .clamp(0.05, 1.0);

        self.risk_index =
            (0.3 + 0.3 * self.volatility_index - 0.2 * self.global_sentiment).clamp(0.0, 1.0);

        self.interest_rate = (self.interest_rate
            + self.noise(c.interest_rate_noise_std * sqrt_scale))
        .clamp(c.interest_rate_min, c.interest_rate_max);
    }

    /// Apply a global or political news event; other categories are ignored.
    pub fn apply_news(&mut self, event: &NewsEvent) {
        if event.category != NewsCategory::Global && event.category != NewsCategory::Political {
            return;
        }

        let c = &self.config;
        let sentiment_mult = match event.category {
            NewsCategory::Political => c.political_sentiment_mult,
            _ => c.global_sentiment_mult,
        };

        self.global_sentiment =
            (self.global_sentiment + event.signed_impact() * sentiment_mult).clamp(-1.0, 1.0);

        if event.sentiment == NewsSentiment::Negative {
            self.volatility_index += event.magnitude * c.negative_vol_impact;
        }
        if event.category == NewsCategory::Political {
            self.volatility_index += event.magnitude * c.political_vol_impact;
        }
        self.volatility_index = self.volatility_index.clamp(0.05, 1.0);
    }

    /// Derived per-tick fundamental shock: sentiment-weighted plus noise.
    pub fn global_shock(&mut self, tick_scale: f64) -> f64 {
        let weight = self.config.shock_sentiment_weight;
        let noise_std = self.config.shock_noise_std;
        self.global_sentiment * weight * tick_scale
            + self.noise(noise_std * tick_scale.max(0.0).sqrt())
    }

    fn noise(&mut self, std: f64) -> f64 {
        if std <= 0.0 {
            return 0.0;
        }
        Normal::new(0.0, std)
            .map(|n| n.sample(&mut self.rng))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(category: NewsCategory, sentiment: NewsSentiment, magnitude: f64) -> NewsEvent {
        NewsEvent {
            category,
            sentiment,
            magnitude,
            industry: String::new(),
            symbol: String::new(),
            subcategory: String::new(),
            headline: String::new(),
            timestamp: 0,
        }
    }

    #[test]
    fn test_sentiment_stays_bounded() {
        let mut env = MacroEnvironment::new(MacroConfig::default(), 11);
        for _ in 0..10_000 {
            env.update(1.0);
            assert!(env.global_sentiment() >= -1.0 && env.global_sentiment() <= 1.0);
            assert!(env.volatility_index() >= 0.05 && env.volatility_index() <= 1.0);
            assert!(env.risk_index() >= 0.0 && env.risk_index() <= 1.0);
        }
    }

    #[test]
    fn test_sentiment_mean_reverts() {
        let config = MacroConfig {
            sentiment_noise_std: 0.0,
            ..Default::default()
        };
        let mut env = MacroEnvironment::new(config, 11);
        env.set_global_sentiment(0.8);
        for _ in 0..200 {
            env.update(1.0);
        }
        assert!(env.global_sentiment().abs() < 0.1);
    }

    #[test]
    fn test_positive_global_news_lifts_sentiment() {
        let mut env = MacroEnvironment::new(MacroConfig::default(), 11);
        let before = env.global_sentiment();
        env.apply_news(&event(NewsCategory::Global, NewsSentiment::Positive, 0.4));
        assert!(env.global_sentiment() > before);
    }

    #[test]
    fn test_political_news_bumps_volatility() {
        let mut env = MacroEnvironment::new(MacroConfig::default(), 11);
        let before = env.volatility_index();
        env.apply_news(&event(NewsCategory::Political, NewsSentiment::Negative, 0.5));
        assert!(env.volatility_index() > before);
    }

    #[test]
    fn test_company_news_ignored() {
        let mut env = MacroEnvironment::new(MacroConfig::default(), 11);
        let before = env.global_sentiment();
        env.apply_news(&event(NewsCategory::Company, NewsSentiment::Positive, 0.9));
        assert_eq!(env.global_sentiment(), before);
    }

    #[test]
    fn test_interest_rate_bounded() {
        let mut env = MacroEnvironment::new(MacroConfig::default(), 11);
        for _ in 0..10_000 {
            env.update(1.0);
        }
        let rate = env.interest_rate();
        assert!((0.0..=0.15).contains(&rate));
    }

    #[test]
    fn test_shock_tracks_sentiment() {
        let config = MacroConfig {
            shock_noise_std: 0.0,
            ..Default::default()
        };
        let mut env = MacroEnvironment::new(config, 11);
        env.set_global_sentiment(1.0);
        assert!(env.global_shock(1.0) > 0.0);
        env.set_global_sentiment(-1.0);
        assert!(env.global_shock(1.0) < 0.0);
    }
}
