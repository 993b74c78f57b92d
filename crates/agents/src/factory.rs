//! Agent population construction.
//!
//! Samples per-agent parameters from the configured distributions and
//! builds the full strategy mix. Every stochastic component gets its own
//! RNG stream derived from the master seed and agent id, so the same
//! configuration and seed always produce an identical population.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, LogNormal, Normal};

use types::{AgentId, AgentParams, Cash};

use crate::config::{AgentsConfig, DistributionConfig};
use crate::core::AgentCore;
use crate::strategies::{
    CrossAssetTrader, EventTrader, FundamentalTrader, MarketMaker, MeanReversionTrader,
    MomentumTrader, NoiseTrader, RebalanceTrader,
};
use crate::traits::Agent;

/// Stream offset separating the factory's sampling RNG from agent streams.
const FACTORY_STREAM: u64 = 0xFAC7;

/// Sample one agent's immutable parameters.
fn sample_params(dist: &DistributionConfig, rng: &mut StdRng) -> AgentParams {
    let risk_aversion = Normal::new(dist.risk_aversion_mean, dist.risk_aversion_std)
        .map(|n| n.sample(rng))
        .unwrap_or(dist.risk_aversion_mean)
        .max(dist.risk_aversion_min);
    let reaction_speed = Exp::new(dist.reaction_speed_lambda)
        .map(|e| e.sample(rng))
        .unwrap_or(1.0);
    let news_weight = rng.random_range(dist.news_weight_min..dist.news_weight_max);
    let confidence = rng.random_range(dist.confidence_min..dist.confidence_max);
    let time_horizon = LogNormal::new(dist.time_horizon_mu, dist.time_horizon_sigma)
        .map(|l| l.sample(rng))
        .unwrap_or(20.0) as u32;

    AgentParams {
        risk_aversion,
        reaction_speed,
        news_weight,
        confidence,
        time_horizon,
    }
}

/// Sample a starting cash balance, floored at a livable minimum.
fn sample_cash(dist: &DistributionConfig, rng: &mut StdRng) -> Cash {
    let cash = Normal::new(dist.mean_cash, dist.std_cash)
        .map(|n| n.sample(rng))
        .unwrap_or(dist.mean_cash)
        .max(1_000.0);
    Cash::from_float(cash)
}

/// Build the configured population. Agent ids start at 1 (0 is reserved
/// for external orders).
pub fn build_population(config: &AgentsConfig, seed: u64) -> Vec<Box<dyn Agent>> {
    let mut rng = StdRng::seed_from_u64(seed ^ FACTORY_STREAM);
    let mut agents: Vec<Box<dyn Agent>> = Vec::with_capacity(config.population.total() as usize);
    let mut next_id = 1u64;

    let core = |rng: &mut StdRng, next_id: &mut u64| {
        let id = AgentId(*next_id);
        *next_id += 1;
        AgentCore::new(
            id,
            sample_cash(&config.distributions, rng),
            sample_params(&config.distributions, rng),
            config.behavior.clone(),
            seed.wrapping_add(id.0),
        )
    };

    for _ in 0..config.population.fundamental {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(FundamentalTrader::new(core, config.fundamental.clone())));
    }
    for _ in 0..config.population.momentum {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(MomentumTrader::new(core, config.momentum.clone())));
    }
    for _ in 0..config.population.mean_reversion {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(MeanReversionTrader::new(
            core,
            config.mean_reversion.clone(),
        )));
    }
    for _ in 0..config.population.noise {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(NoiseTrader::new(core, config.noise.clone())));
    }
    for _ in 0..config.population.market_maker {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(MarketMaker::new(core, config.market_maker.clone())));
    }
    for _ in 0..config.population.cross_asset {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(CrossAssetTrader::new(core, config.cross_asset.clone())));
    }
    for _ in 0..config.population.rebalance {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(RebalanceTrader::new(core, config.rebalance.clone())));
    }
    for _ in 0..config.population.event {
        let core = core(&mut rng, &mut next_id);
        agents.push(Box::new(EventTrader::new(core, config.event.clone())));
    }

    agents
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::AgentKind;

    #[test]
    fn test_population_counts() {
        let config = AgentsConfig::default();
        let agents = build_population(&config, 42);
        assert_eq!(agents.len(), config.population.total() as usize);

        let makers = agents
            .iter()
            .filter(|a| a.kind() == AgentKind::MarketMaker)
            .count();
        assert_eq!(makers, config.population.market_maker as usize);
    }

    #[test]
    fn test_ids_start_at_one_and_are_unique() {
        let agents = build_population(&AgentsConfig::default(), 42);
        let mut ids: Vec<u64> = agents.iter().map(|a| a.id().0).collect();
        ids.sort();
        assert_eq!(ids[0], 1);
        ids.dedup();
        assert_eq!(ids.len(), agents.len());
    }

    #[test]
    fn test_same_seed_same_population() {
        let a = build_population(&AgentsConfig::default(), 7);
        let b = build_population(&AgentsConfig::default(), 7);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.kind(), y.kind());
            assert_eq!(x.cash(), y.cash());
            assert_eq!(x.core().params(), y.core().params());
        }
    }

    #[test]
    fn test_cash_floor() {
        let config = AgentsConfig {
            distributions: DistributionConfig {
                mean_cash: 0.0,
                std_cash: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        for agent in build_population(&config, 1) {
            assert!(agent.cash() >= Cash::from_float(1_000.0));
        }
    }
}
