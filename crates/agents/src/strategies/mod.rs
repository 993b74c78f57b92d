//! The eight concrete trading strategies.

mod cross_asset;
mod event;
mod fundamental;
mod market_maker;
mod mean_reversion;
mod momentum;
mod noise;
mod rebalance;

pub use cross_asset::CrossAssetTrader;
pub use event::EventTrader;
pub use fundamental::FundamentalTrader;
pub use market_maker::MarketMaker;
pub use mean_reversion::MeanReversionTrader;
pub use momentum::MomentumTrader;
pub use noise::NoiseTrader;
pub use rebalance::RebalanceTrader;

/// Simple moving average over the last `period` entries.
pub(crate) fn sma(history: &[f64], period: usize) -> f64 {
    if period == 0 || history.len() < period {
        return 0.0;
    }
    history[history.len() - period..].iter().sum::<f64>() / period as f64
}

/// Mean and standard deviation over the last `period` entries.
pub(crate) fn mean_std(history: &[f64], period: usize) -> (f64, f64) {
    let mean = sma(history, period);
    if mean == 0.0 || history.len() < period {
        return (mean, 0.0);
    }
    let tail = &history[history.len() - period..];
    let variance = tail.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / period as f64;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let history = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(sma(&history, 2), 3.5);
        assert_eq!(sma(&history, 4), 2.5);
        assert_eq!(sma(&history, 5), 0.0);
    }

    #[test]
    fn test_mean_std() {
        let history = [2.0, 2.0, 2.0, 2.0];
        let (mean, std) = mean_std(&history, 4);
        assert_eq!(mean, 2.0);
        assert_eq!(std, 0.0);

        let (_, std) = mean_std(&[1.0, 3.0, 1.0, 3.0], 4);
        assert!(std > 0.9);
    }
}
