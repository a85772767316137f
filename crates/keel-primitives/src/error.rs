//! Common error type for primitives

use thiserror::Error;

use crate::address::AddressError;
use crate::hash::HashError;
use crate::hexnum::HexError;

/// Primitive parsing/conversion error
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Address error
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Hash error
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// Hex-quantity error
    #[error("hex error: {0}")]
    Hex(#[from] HexError),
}
