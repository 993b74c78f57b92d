//! Stochastic news event generation.
//!
//! Event count per tick is `Poisson(lambda × tick_scale)`. Category comes
//! from fixed probability bands (15% global, 10% political, 40% industry,
//! 35% company); magnitude is half-normal with category-specific spread;
//! sentiment sign is drawn from category-specific probabilities. Externally
//! injected events bypass the random process and are emitted on the next
//! generate call.

use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Poisson};

use types::Timestamp;

use crate::config::NewsConfig;
use crate::events::{NewsCategory, NewsEvent, NewsSentiment};
use crate::headlines;

const MAX_RECENT: usize = 20;
const MAX_HISTORY: usize = 50_000;

/// Generates categorized news events on a deterministic seeded stream.
pub struct NewsGenerator {
    config: NewsConfig,
    rng: StdRng,

    /// Symbols eligible for company news, with their industry.
    symbol_industries: BTreeMap<String, String>,
    /// Display names for headline synthesis.
    symbol_names: BTreeMap<String, String>,
    /// Market caps for cap-weighted company selection.
    symbol_caps: BTreeMap<String, f64>,
    industries: Vec<String>,

    injected: Vec<NewsEvent>,
    recent: Vec<NewsEvent>,
    history: Vec<NewsEvent>,
}

impl NewsGenerator {
    pub fn new(config: NewsConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            symbol_industries: BTreeMap::new(),
            symbol_names: BTreeMap::new(),
            symbol_caps: BTreeMap::new(),
            industries: Vec::new(),
            injected: Vec::new(),
            recent: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: NewsConfig) {
        self.config = config;
    }

    /// Register a symbol as a company-news target.
    pub fn add_symbol(&mut self, symbol: &str, name: &str, industry: &str, market_cap: f64) {
        self.symbol_industries
            .insert(symbol.to_string(), industry.to_string());
        self.symbol_names.insert(symbol.to_string(), name.to_string());
        self.symbol_caps.insert(symbol.to_string(), market_cap);
        if !self.industries.iter().any(|i| i == industry) {
            self.industries.push(industry.to_string());
            self.industries.sort();
        }
    }

    /// Refresh a symbol's market cap for cap-weighted selection.
    pub fn set_market_cap(&mut self, symbol: &str, market_cap: f64) {
        if let Some(cap) = self.symbol_caps.get_mut(symbol) {
            *cap = market_cap;
        }
    }

    /// Generate this tick's events: injected first, then the Poisson draw.
    pub fn generate(&mut self, now: Timestamp, tick_scale: f64) -> Vec<NewsEvent> {
        let mut events: Vec<NewsEvent> = Vec::new();

        for mut event in self.injected.drain(..) {
            event.timestamp = now;
            events.push(event);
        }

        let rate = self.config.lambda * tick_scale;
        let count = if rate > 0.0 {
            Poisson::new(rate)
                .map(|p| p.sample(&mut self.rng) as u64)
                .unwrap_or(0)
        } else {
            0
        };

        for _ in 0..count {
            let r: f64 = self.rng.random_range(0.0..1.0);
            let event = if r < 0.15 {
                Some(self.generate_global(now))
            } else if r < 0.25 {
                Some(self.generate_political(now))
            } else if r < 0.60 {
                self.generate_industry(now)
            } else {
                self.generate_company(now)
            };
            if let Some(event) = event {
                events.push(event);
            }
        }

        for event in &events {
            self.history.push(event.clone());
        }
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }

        events
    }

    // ------------------------------------------------------------------
    // Injection
    // ------------------------------------------------------------------

    /// Queue an externally supplied event, bypassing the random process.
    pub fn inject(&mut self, event: NewsEvent) {
        self.injected.push(event);
    }

    pub fn inject_global(&mut self, sentiment: NewsSentiment, magnitude: f64, headline: &str) {
        let headline = if headline.is_empty() {
            headlines::headline(NewsCategory::Global, sentiment, "", "", 0)
        } else {
            headline.to_string()
        };
        self.injected.push(NewsEvent {
            category: NewsCategory::Global,
            sentiment,
            magnitude: magnitude.max(0.0),
            industry: String::new(),
            symbol: String::new(),
            subcategory: "injected".to_string(),
            headline,
            timestamp: 0,
        });
    }

    pub fn inject_industry(
        &mut self,
        industry: &str,
        sentiment: NewsSentiment,
        magnitude: f64,
        headline: &str,
    ) {
        let headline = if headline.is_empty() {
            headlines::headline(NewsCategory::Industry, sentiment, industry, "", 0)
        } else {
            headline.to_string()
        };
        self.injected.push(NewsEvent {
            category: NewsCategory::Industry,
            sentiment,
            magnitude: magnitude.max(0.0),
            industry: industry.to_string(),
            symbol: String::new(),
            subcategory: "injected".to_string(),
            headline,
            timestamp: 0,
        });
    }

    pub fn inject_company(
        &mut self,
        symbol: &str,
        sentiment: NewsSentiment,
        magnitude: f64,
        headline: &str,
    ) {
        let name = self.symbol_names.get(symbol).cloned().unwrap_or_default();
        let industry = self
            .symbol_industries
            .get(symbol)
            .cloned()
            .unwrap_or_default();
        let headline = if headline.is_empty() {
            headlines::headline(NewsCategory::Company, sentiment, symbol, &name, 0)
        } else {
            headline.to_string()
        };
        self.injected.push(NewsEvent {
            category: NewsCategory::Company,
            sentiment,
            magnitude: magnitude.max(0.0),
            industry,
            symbol: symbol.to_string(),
            subcategory: "injected".to_string(),
            headline,
            timestamp: 0,
        });
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    /// Push an applied event into the small recent ring (for streaming).
    pub fn add_to_recent(&mut self, event: NewsEvent) {
        self.recent.push(event);
        if self.recent.len() > MAX_RECENT {
            self.recent.remove(0);
        }
    }

    /// Most recent `count` applied events, oldest first.
    pub fn recent(&self, count: usize) -> Vec<NewsEvent> {
        let start = self.recent.len().saturating_sub(count);
        self.recent[start..].to_vec()
    }

    /// Full bounded event history for replay/export.
    pub fn history(&self) -> &[NewsEvent] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.recent.clear();
    }

    // ------------------------------------------------------------------
    // Category generators
    // ------------------------------------------------------------------

    fn half_normal(&mut self, std: f64) -> f64 {
        Normal::new(0.0, std.max(f64::MIN_POSITIVE))
            .map(|n| n.sample(&mut self.rng).abs())
            .unwrap_or(0.0)
    }

    fn generate_global(&mut self, now: Timestamp) -> NewsEvent {
        let r: f64 = self.rng.random_range(0.0..1.0);
        let sentiment = if r < 0.4 {
            NewsSentiment::Positive
        } else if r < 0.7 {
            NewsSentiment::Negative
        } else {
            NewsSentiment::Neutral
        };
        let magnitude = self.half_normal(self.config.global_impact_std);
        let pick = self.rng.random_range(0..usize::MAX);
        NewsEvent {
            category: NewsCategory::Global,
            sentiment,
            magnitude,
            industry: String::new(),
            symbol: String::new(),
            subcategory: "economic".to_string(),
            headline: headlines::headline(NewsCategory::Global, sentiment, "", "", pick),
            timestamp: now,
        }
    }

    fn generate_political(&mut self, now: Timestamp) -> NewsEvent {
        let r: f64 = self.rng.random_range(0.0..1.0);
        let sentiment = if r < 0.35 {
            NewsSentiment::Positive
        } else if r < 0.65 {
            NewsSentiment::Negative
        } else {
            NewsSentiment::Neutral
        };
        let magnitude = self.half_normal(self.config.political_impact_std);
        let pick = self.rng.random_range(0..usize::MAX);
        NewsEvent {
            category: NewsCategory::Political,
            sentiment,
            magnitude,
            industry: String::new(),
            symbol: String::new(),
            subcategory: "policy".to_string(),
            headline: headlines::headline(NewsCategory::Political, sentiment, "", "", pick),
            timestamp: now,
        }
    }

    fn generate_industry(&mut self, now: Timestamp) -> Option<NewsEvent> {
        if self.industries.is_empty() {
            return None;
        }
        let industry = self.industries[self.rng.random_range(0..self.industries.len())].clone();

        let r: f64 = self.rng.random_range(0.0..1.0);
        let sentiment = if r < 0.45 {
            NewsSentiment::Positive
        } else if r < 0.85 {
            NewsSentiment::Negative
        } else {
            NewsSentiment::Neutral
        };
        let magnitude = self.half_normal(self.config.industry_impact_std);

        Some(NewsEvent {
            headline: headlines::headline(NewsCategory::Industry, sentiment, &industry, "", 0),
            category: NewsCategory::Industry,
            sentiment,
            magnitude,
            industry,
            symbol: String::new(),
            subcategory: "sector".to_string(),
            timestamp: now,
        })
    }

    fn generate_company(&mut self, now: Timestamp) -> Option<NewsEvent> {
        let symbol = self.select_company()?;
        let name = self.symbol_names.get(&symbol).cloned().unwrap_or_default();
        let industry = self
            .symbol_industries
            .get(&symbol)
            .cloned()
            .unwrap_or_default();

        let r: f64 = self.rng.random_range(0.0..1.0);
        let sentiment = if r < 0.45 {
            NewsSentiment::Positive
        } else if r < 0.85 {
            NewsSentiment::Negative
        } else {
            NewsSentiment::Neutral
        };
        let magnitude = self.half_normal(self.config.company_impact_std);

        let subcategories = ["earnings", "product", "management", "legal"];
        let subcategory = subcategories[self.rng.random_range(0..subcategories.len())];

        Some(NewsEvent {
            headline: headlines::headline(NewsCategory::Company, sentiment, &symbol, &name, 0),
            category: NewsCategory::Company,
            sentiment,
            magnitude,
            industry,
            symbol,
            subcategory: subcategory.to_string(),
            timestamp: now,
        })
    }

    /// Pick a company, uniformly or market-cap weighted per config.
    fn select_company(&mut self) -> Option<String> {
        if self.symbol_industries.is_empty() {
            return None;
        }
        let symbols: Vec<&String> = self.symbol_industries.keys().collect();

        if self.config.cap_weighted_selection {
            let total: f64 = symbols
                .iter()
                .map(|s| self.symbol_caps.get(*s).copied().unwrap_or(1.0))
                .sum();
            if total > 0.0 {
                let mut target = self.rng.random_range(0.0..total);
                for symbol in &symbols {
                    let cap = self.symbol_caps.get(*symbol).copied().unwrap_or(1.0);
                    if target < cap {
                        return Some((*symbol).clone());
                    }
                    target -= cap;
                }
            }
        }

        let idx = self.rng.random_range(0..symbols.len());
        Some(symbols[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> NewsGenerator {
        let mut generator = NewsGenerator::new(NewsConfig::default(), 42);
        generator.add_symbol("NTX", "Northern Technologies", "Technology", 5e8);
        generator.add_symbol("OILC", "Oceanic Oil", "Energy", 2e9);
        generator.add_symbol("GRNF", "Greenfield Foods", "Agriculture", 1e8);
        generator
    }

    #[test]
    fn test_deterministic_given_seed() {
        let mut a = setup();
        let mut b = setup();
        for tick in 0..500u64 {
            let ea = a.generate(tick * 1_000, 1.0);
            let eb = b.generate(tick * 1_000, 1.0);
            assert_eq!(ea, eb, "divergence at tick {tick}");
        }
    }

    #[test]
    fn test_poisson_arrival_produces_events() {
        let mut generator = setup();
        let mut total = 0;
        for tick in 0..5_000u64 {
            total += generator.generate(tick * 1_000, 1.0).len();
        }
        // lambda = 0.1 over 5000 ticks: expect roughly 500 events.
        assert!(total > 300, "too few events: {total}");
        assert!(total < 800, "too many events: {total}");
    }

    #[test]
    fn test_tick_scale_scales_arrivals() {
        let mut coarse = setup();
        let mut fine = setup();
        let mut coarse_total = 0;
        let mut fine_total = 0;
        for tick in 0..2_000u64 {
            coarse_total += coarse.generate(tick, 10.0).len();
            fine_total += fine.generate(tick, 0.1).len();
        }
        assert!(coarse_total > 20 * fine_total.max(1) / 2, "coarse={coarse_total} fine={fine_total}");
    }

    #[test]
    fn test_magnitudes_nonnegative() {
        let mut generator = setup();
        for tick in 0..2_000u64 {
            for event in generator.generate(tick, 2.0) {
                assert!(event.magnitude >= 0.0);
                assert!(!event.headline.is_empty());
            }
        }
    }

    #[test]
    fn test_injection_bypasses_random_process() {
        let mut generator = NewsGenerator::new(
            NewsConfig {
                lambda: 0.0,
                ..Default::default()
            },
            7,
        );
        generator.inject_global(NewsSentiment::Negative, 0.5, "Flash crash drill");

        let events = generator.generate(123_456, 1.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, NewsCategory::Global);
        assert_eq!(events[0].timestamp, 123_456);
        assert_eq!(events[0].headline, "Flash crash drill");

        // Drained: the next call emits nothing.
        assert!(generator.generate(123_457, 1.0).is_empty());
    }

    #[test]
    fn test_company_injection_fills_industry() {
        let mut generator = setup();
        generator.inject_company("NTX", NewsSentiment::Positive, 0.3, "");
        let events = generator.generate(1, 0.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].symbol, "NTX");
        assert_eq!(events[0].industry, "Technology");
        assert!(!events[0].headline.is_empty());
    }

    #[test]
    fn test_recent_ring_is_bounded() {
        let mut generator = setup();
        for i in 0..50 {
            generator.add_to_recent(NewsEvent {
                category: NewsCategory::Global,
                sentiment: NewsSentiment::Neutral,
                magnitude: 0.0,
                industry: String::new(),
                symbol: String::new(),
                subcategory: String::new(),
                headline: format!("event {i}"),
                timestamp: i,
            });
        }
        let recent = generator.recent(100);
        assert_eq!(recent.len(), MAX_RECENT);
        assert_eq!(recent.last().unwrap().timestamp, 49);
    }

    #[test]
    fn test_history_accumulates() {
        let mut generator = setup();
        for tick in 0..3_000u64 {
            generator.generate(tick, 1.0);
        }
        assert!(!generator.history().is_empty());
        generator.clear_history();
        assert!(generator.history().is_empty());
    }
}
