//! # keel-primitives
//!
//! Primitive types shared by the keel contract client.
//!
//! Provides the fixed-length [`Address`] and [`H256`] types used on the
//! JSON-RPC wire, hex-quantity parsing and formatting helpers, and the
//! keccak-256 hash used for function selectors.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
mod hexnum;
mod keccak;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{H256, HashError};
pub use hexnum::{
    format_quantity, format_u256, parse_hex_bytes, parse_hex_u128, parse_hex_u256, parse_hex_u64,
    HexError,
};
pub use keccak::keccak256;

// Re-export primitive-types for U256
pub use primitive_types::U256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_arithmetic() {
        let a = U256::from(7u64);
        let b = U256::from(5u64);
        assert_eq!(a + b, U256::from(12u64));
    }
}
