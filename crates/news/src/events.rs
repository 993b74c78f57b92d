//! News event model.

use serde::{Deserialize, Serialize};
use std::fmt;
use types::{Symbol, Timestamp};

/// Scope of a news event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    /// Economy-wide news affecting global sentiment.
    Global,
    /// Policy/regulation news; weaker sentiment shift, stronger volatility.
    Political,
    /// News targeting one industry.
    Industry,
    /// News targeting one company.
    Company,
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsCategory::Global => write!(f, "global"),
            NewsCategory::Political => write!(f, "political"),
            NewsCategory::Industry => write!(f, "industry"),
            NewsCategory::Company => write!(f, "company"),
        }
    }
}

/// Direction of a news event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NewsSentiment {
    Positive,
    Negative,
    Neutral,
}

impl NewsSentiment {
    /// Sign used when news feeds sentiment: neutral contributes a sliver.
    pub fn sign(self) -> f64 {
        match self {
            NewsSentiment::Positive => 1.0,
            NewsSentiment::Negative => -1.0,
            NewsSentiment::Neutral => 0.0,
        }
    }
}

/// A market-moving event, consumed the tick it is generated and retained in
/// bounded recent/history buffers for external inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub category: NewsCategory,
    pub sentiment: NewsSentiment,
    /// Impact size, non-negative (half-normal draw).
    pub magnitude: f64,
    /// Targeted industry (industry news, or the target company's industry).
    #[serde(default)]
    pub industry: String,
    /// Targeted symbol (company news only).
    #[serde(default)]
    pub symbol: String,
    /// Free-form subcategory, e.g. "earnings", "regulation".
    #[serde(default)]
    pub subcategory: String,
    pub headline: String,
    pub timestamp: Timestamp,
}

impl NewsEvent {
    /// Signed impact: magnitude with the sentiment sign, neutral at a tenth.
    pub fn signed_impact(&self) -> f64 {
        match self.sentiment {
            NewsSentiment::Neutral => self.magnitude * 0.1,
            s => self.magnitude * s.sign(),
        }
    }

    /// The symbol this event targets, if any.
    pub fn target_symbol(&self) -> Option<&Symbol> {
        if self.category == NewsCategory::Company && !self.symbol.is_empty() {
            Some(&self.symbol)
        } else {
            None
        }
    }
}
