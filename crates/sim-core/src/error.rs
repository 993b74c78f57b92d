//! Error type for the simulation core.

use types::OrderId;

/// Errors from order book and clock operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimCoreError {
    #[error("order quantity must be positive")]
    ZeroQuantity,

    #[error("limit price must be positive")]
    InvalidPrice,

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, SimCoreError>;
