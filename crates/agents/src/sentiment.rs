//! Layered belief state.
//!
//! Every agent carries a global sentiment bias plus per-industry and
//! per-symbol layers. News updates the targeted layer at full weight with
//! partial spillover to broader layers; all layers decay geometrically
//! toward zero each tick, scaled by the tick's wall-clock weight so the
//! per-day decay rate is invariant under tick-rate changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use news::{NewsCategory, NewsEvent};

/// Per-layer geometric decay rates per reference tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentDecay {
    pub global: f64,
    pub industry: f64,
    pub symbol: f64,
}

impl Default for SentimentDecay {
    fn default() -> Self {
        Self {
            global: 0.95,
            industry: 0.93,
            symbol: 0.90,
        }
    }
}

/// One agent's layered sentiment.
#[derive(Debug, Clone, Default)]
pub struct SentimentState {
    global: f64,
    industry: HashMap<String, f64>,
    symbol: HashMap<String, f64>,
}

impl SentimentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_bias(&self) -> f64 {
        self.global
    }

    pub fn industry_bias(&self, industry: &str) -> f64 {
        self.industry.get(industry).copied().unwrap_or(0.0)
    }

    pub fn symbol_bias(&self, symbol: &str) -> f64 {
        self.symbol.get(symbol).copied().unwrap_or(0.0)
    }

    /// Shift the global layer directly (overreacting strategies).
    pub fn nudge_global(&mut self, delta: f64) {
        self.global += delta;
    }

    /// Apply one news event, weighted by the agent's news sensitivity.
    ///
    /// Spillover: industry news leaks 30% into the global layer; company
    /// news leaks 20% into its industry and 10% into the global layer.
    /// Neutral news carries no sign and leaves beliefs untouched.
    pub fn apply(&mut self, news: &NewsEvent, news_weight: f64) {
        let impact = news.magnitude * news_weight * news.sentiment.sign();
        if impact == 0.0 {
            return;
        }

        match news.category {
            NewsCategory::Global | NewsCategory::Political => {
                self.global += impact;
            }
            NewsCategory::Industry => {
                if !news.industry.is_empty() {
                    *self.industry.entry(news.industry.clone()).or_default() += impact;
                }
                self.global += impact * 0.3;
            }
            NewsCategory::Company => {
                if !news.symbol.is_empty() {
                    *self.symbol.entry(news.symbol.clone()).or_default() += impact;
                }
                if !news.industry.is_empty() {
                    *self.industry.entry(news.industry.clone()).or_default() += impact * 0.2;
                }
                self.global += impact * 0.1;
            }
        }
    }

    /// Geometric decay of every layer, scaled by tick weight.
    pub fn decay(&mut self, tick_scale: f64, rates: &SentimentDecay) {
        let g = rates.global.powf(tick_scale);
        let i = rates.industry.powf(tick_scale);
        let s = rates.symbol.powf(tick_scale);

        self.global *= g;
        for value in self.industry.values_mut() {
            *value *= i;
        }
        for value in self.symbol.values_mut() {
            *value *= s;
        }
    }

    /// Combined view for one symbol: 30% global, 50% industry, full symbol.
    pub fn combined(&self, symbol: &str, industry: &str) -> f64 {
        self.global * 0.3 + self.industry_bias(industry) * 0.5 + self.symbol_bias(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news::NewsSentiment;

    fn company_news(symbol: &str, industry: &str, sentiment: NewsSentiment, mag: f64) -> NewsEvent {
        NewsEvent {
            category: NewsCategory::Company,
            sentiment,
            magnitude: mag,
            industry: industry.to_string(),
            symbol: symbol.to_string(),
            subcategory: String::new(),
            headline: String::new(),
            timestamp: 0,
        }
    }

    #[test]
    fn test_company_news_spillover() {
        let mut state = SentimentState::new();
        state.apply(
            &company_news("NTX", "Technology", NewsSentiment::Positive, 0.5),
            1.0,
        );

        assert!((state.symbol_bias("NTX") - 0.5).abs() < 1e-12);
        assert!((state.industry_bias("Technology") - 0.1).abs() < 1e-12);
        assert!((state.global_bias() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_news_is_inert() {
        let mut state = SentimentState::new();
        state.apply(
            &company_news("NTX", "Technology", NewsSentiment::Neutral, 0.5),
            1.0,
        );
        assert_eq!(state.symbol_bias("NTX"), 0.0);
    }

    #[test]
    fn test_geometric_decay_matches_closed_form() {
        let mut state = SentimentState::new();
        state.apply(
            &company_news("NTX", "Technology", NewsSentiment::Positive, 1.0),
            1.0,
        );

        let rates = SentimentDecay::default();
        for _ in 0..10 {
            state.decay(1.0, &rates);
        }

        // symbol layer decays at 0.90 per tick: 0.90^10.
        let expected = 0.90f64.powi(10);
        assert!((state.symbol_bias("NTX") - expected).abs() < 1e-9);
        // global spillover (0.1) decays at 0.95 per tick.
        let expected_global = 0.1 * 0.95f64.powi(10);
        assert!((state.global_bias() - expected_global).abs() < 1e-9);
    }

    #[test]
    fn test_decay_scales_with_tick_weight() {
        let mut fine = SentimentState::new();
        let mut coarse = SentimentState::new();
        let news = company_news("NTX", "Technology", NewsSentiment::Positive, 1.0);
        fine.apply(&news, 1.0);
        coarse.apply(&news, 1.0);

        let rates = SentimentDecay::default();
        // Ten fine ticks of weight 1 == one coarse tick of weight 10.
        for _ in 0..10 {
            fine.decay(1.0, &rates);
        }
        coarse.decay(10.0, &rates);

        assert!((fine.symbol_bias("NTX") - coarse.symbol_bias("NTX")).abs() < 1e-9);
    }

    #[test]
    fn test_combined_weighting() {
        let mut state = SentimentState::new();
        state.apply(
            &company_news("NTX", "Technology", NewsSentiment::Positive, 1.0),
            1.0,
        );
        // combined = 0.3*0.1 + 0.5*0.2 + 1.0 = 1.13
        assert!((state.combined("NTX", "Technology") - 1.13).abs() < 1e-9);
        // Unrelated symbol only sees the global leak.
        assert!((state.combined("OILC", "Energy") - 0.03).abs() < 1e-9);
    }
}
