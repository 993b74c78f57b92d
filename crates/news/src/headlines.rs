//! Headline synthesis for generated news events.

use crate::events::{NewsCategory, NewsSentiment};

const POSITIVE_GLOBAL: &[&str] = &[
    "Global growth outlook brightens as output beats forecasts",
    "Manufacturing activity expands across major economies",
    "Consumer confidence climbs to a multi-year high",
    "Trade volumes surge as supply chains normalize",
    "Capital spending plans revised upward worldwide",
];

const NEGATIVE_GLOBAL: &[&str] = &[
    "Recession fears mount as leading indicators weaken",
    "Inflation print surprises to the upside, rattling markets",
    "Global trade tensions escalate, disrupting supply chains",
    "Credit conditions tighten across major economies",
    "Currency volatility spikes in emerging markets",
];

const NEUTRAL_GLOBAL: &[&str] = &[
    "Mixed economic signals keep markets cautious",
    "Central bank minutes show a divided outlook",
    "Markets trade sideways ahead of key data releases",
];

const POSITIVE_POLITICAL: &[&str] = &[
    "Tariffs lifted on key imports after trade deal",
    "Infrastructure bill passes, lifting industrial demand",
    "Government unveils subsidies for domestic producers",
    "Regulatory approval fast-tracked for major projects",
];

const NEGATIVE_POLITICAL: &[&str] = &[
    "New tariffs announced on a broad range of goods",
    "Political standoff threatens budget approval",
    "Stricter regulation proposed for key industries",
    "Sanctions widen, complicating cross-border trade",
];

const NEUTRAL_POLITICAL: &[&str] = &[
    "Committee hearings open on proposed market reforms",
    "Election outlook keeps policy direction uncertain",
];

/// Synthesize a plausible headline for a generated event.
pub(crate) fn headline(
    category: NewsCategory,
    sentiment: NewsSentiment,
    target: &str,
    display_name: &str,
    pick: usize,
) -> String {
    let name = if display_name.is_empty() { target } else { display_name };

    match category {
        NewsCategory::Global => pool_pick(
            match sentiment {
                NewsSentiment::Positive => POSITIVE_GLOBAL,
                NewsSentiment::Negative => NEGATIVE_GLOBAL,
                NewsSentiment::Neutral => NEUTRAL_GLOBAL,
            },
            pick,
        ),
        NewsCategory::Political => pool_pick(
            match sentiment {
                NewsSentiment::Positive => POSITIVE_POLITICAL,
                NewsSentiment::Negative => NEGATIVE_POLITICAL,
                NewsSentiment::Neutral => NEUTRAL_POLITICAL,
            },
            pick,
        ),
        NewsCategory::Industry => match sentiment {
            NewsSentiment::Positive => format!("{name} sector rallies on strong demand outlook"),
            NewsSentiment::Negative => format!("{name} sector slides on margin pressure"),
            NewsSentiment::Neutral => format!("{name} sector mixed as investors weigh outlook"),
        },
        NewsCategory::Company => match sentiment {
            NewsSentiment::Positive => format!("{name} beats expectations, shares set to open higher"),
            NewsSentiment::Negative => format!("{name} warns on outlook, shares under pressure"),
            NewsSentiment::Neutral => format!("{name} reports results in line with estimates"),
        },
    }
}

fn pool_pick(pool: &[&str], pick: usize) -> String {
    pool[pick % pool.len()].to_string()
}
