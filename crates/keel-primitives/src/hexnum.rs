//! Hex-quantity parsing and formatting
//!
//! JSON-RPC represents unsigned quantities as 0x-prefixed hex strings with
//! no leading zeros ("0x0" for zero), and byte strings as 0x-prefixed hex
//! of even length ("0x" for empty).

use primitive_types::U256;
use thiserror::Error;

/// Hex-quantity parsing error
#[derive(Debug, Clone, Error)]
#[error("invalid hex quantity: {0}")]
pub struct HexError(pub String);

/// Parse a 0x-hex quantity into a u64
pub fn parse_hex_u64(s: &str) -> Result<u64, HexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| HexError(e.to_string()))
}

/// Parse a 0x-hex quantity into a u128
pub fn parse_hex_u128(s: &str) -> Result<u128, HexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u128::from_str_radix(s, 16).map_err(|e| HexError(e.to_string()))
}

/// Parse a 0x-hex quantity into a U256
pub fn parse_hex_u256(s: &str) -> Result<U256, HexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() || s.len() > 64 {
        return Err(HexError(format!("quantity has {} hex digits", s.len())));
    }
    let padded = format!("{:0>64}", s);
    let bytes = hex::decode(&padded).map_err(|e| HexError(e.to_string()))?;
    Ok(U256::from_big_endian(&bytes))
}

/// Parse a 0x-hex byte string
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, HexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.is_empty() {
        return Ok(Vec::new());
    }
    hex::decode(s).map_err(|e| HexError(e.to_string()))
}

/// Format an unsigned quantity as a minimal 0x-hex string
pub fn format_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

/// Format a U256 as a minimal 0x-hex string
pub fn format_u256(value: &U256) -> String {
    format!("0x{:x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_hex_u64("0x1").unwrap(), 1);
        assert_eq!(parse_hex_u64("0x100").unwrap(), 256);
        assert_eq!(parse_hex_u64("ff").unwrap(), 255);
        assert!(parse_hex_u64("0xzz").is_err());
    }

    #[test]
    fn test_parse_u128() {
        assert_eq!(parse_hex_u128("0x3b9aca00").unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_parse_u256() {
        assert_eq!(
            parse_hex_u256("0xde0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert!(parse_hex_u256("0x").is_err());
    }

    #[test]
    fn test_parse_bytes() {
        assert_eq!(parse_hex_bytes("0x1234").unwrap(), vec![0x12, 0x34]);
        assert!(parse_hex_bytes("0x").unwrap().is_empty());
    }

    #[test]
    fn test_format_minimal() {
        assert_eq!(format_quantity(0), "0x0");
        assert_eq!(format_quantity(21000), "0x5208");
        assert_eq!(format_u256(&U256::from(256u64)), "0x100");
        assert_eq!(format_u256(&U256::zero()), "0x0");
    }

    #[test]
    fn test_quantity_round_trip() {
        let v = U256::from(1_000_000_000u64);
        assert_eq!(parse_hex_u256(&format_u256(&v)).unwrap(), v);
    }
}
