//! Error type for engine and controller operations.

use sim_core::SimCoreError;

/// Errors surfaced to external callers.
///
/// Soft trading failures (insufficient cash, nothing to sell) never appear
/// here; agents express those by not trading, and manual orders report an
/// unfilled status instead of erroring.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Core(#[from] SimCoreError),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("{0}")]
    Rejected(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("export failed: {0}")]
    Export(String),
}
