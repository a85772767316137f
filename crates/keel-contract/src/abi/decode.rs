//! ABI decoding

use keel_primitives::{Address, U256};

use super::types::{I256, ParamType, Token};
use crate::ContractError;

/// Decode values from ABI-encoded data according to their declared types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, ContractError> {
    let mut offset = 0;
    let mut tokens = Vec::with_capacity(types.len());

    for param_type in types {
        let (token, consumed) = decode_token(param_type, data, offset)?;
        tokens.push(token);
        offset += consumed;
    }

    Ok(tokens)
}

fn decode_token(
    param_type: &ParamType,
    data: &[u8],
    offset: usize,
) -> Result<(Token, usize), ContractError> {
    match param_type {
        ParamType::Address => {
            check_length(data, offset + 32)?;
            let mut addr_bytes = [0u8; 20];
            addr_bytes.copy_from_slice(&data[offset + 12..offset + 32]);
            Ok((Token::Address(Address::from_bytes(addr_bytes)), 32))
        }
        ParamType::Uint(_) => {
            check_length(data, offset + 32)?;
            let value = U256::from_big_endian(&data[offset..offset + 32]);
            Ok((Token::Uint(value), 32))
        }
        ParamType::Int(_) => {
            check_length(data, offset + 32)?;
            let bytes = &data[offset..offset + 32];

            let negative = bytes[0] & 0x80 != 0;
            let abs = if negative {
                // Undo two's complement: flip bits and add one
                let mut flipped = [0u8; 32];
                for i in 0..32 {
                    flipped[i] = !bytes[i];
                }
                let mut carry = 1u16;
                for i in (0..32).rev() {
                    let sum = (flipped[i] as u16) + carry;
                    flipped[i] = sum as u8;
                    carry = sum >> 8;
                }
                U256::from_big_endian(&flipped)
            } else {
                U256::from_big_endian(bytes)
            };

            Ok((Token::Int(I256::new(abs, negative)), 32))
        }
        ParamType::Bool => {
            check_length(data, offset + 32)?;
            Ok((Token::Bool(data[offset + 31] != 0), 32))
        }
        ParamType::FixedBytes(size) => {
            if *size == 0 || *size > 32 {
                return Err(ContractError::Decoding(format!(
                    "invalid bytes{} width",
                    size
                )));
            }
            check_length(data, offset + 32)?;
            Ok((Token::FixedBytes(data[offset..offset + *size].to_vec()), 32))
        }
        ParamType::Bytes => {
            let data_offset = read_offset(data, offset)?;
            let (bytes, _) = decode_bytes(data, data_offset)?;
            Ok((Token::Bytes(bytes), 32))
        }
        ParamType::String => {
            let data_offset = read_offset(data, offset)?;
            let (bytes, _) = decode_bytes(data, data_offset)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| ContractError::Decoding(format!("invalid UTF-8: {}", e)))?;
            Ok((Token::String(s), 32))
        }
        ParamType::Array(inner) => {
            let data_offset = read_offset(data, offset)?;
            let len = read_length(data, data_offset)?;

            let mut tokens = Vec::with_capacity(len);
            let mut inner_offset = data_offset + 32;

            for _ in 0..len {
                let (token, consumed) = decode_token(inner, data, inner_offset)?;
                tokens.push(token);
                inner_offset += consumed;
            }

            Ok((Token::Array(tokens), 32))
        }
        ParamType::FixedArray(inner, size) => {
            let mut tokens = Vec::with_capacity(*size);
            let mut inner_offset = offset;

            for _ in 0..*size {
                let (token, consumed) = decode_token(inner, data, inner_offset)?;
                tokens.push(token);
                inner_offset += consumed;
            }

            Ok((Token::FixedArray(tokens), inner_offset - offset))
        }
        ParamType::Tuple(types) => {
            let mut tokens = Vec::with_capacity(types.len());
            let mut inner_offset = offset;

            for inner_type in types {
                let (token, consumed) = decode_token(inner_type, data, inner_offset)?;
                tokens.push(token);
                inner_offset += consumed;
            }

            Ok((Token::Tuple(tokens), inner_offset - offset))
        }
    }
}

fn read_offset(data: &[u8], offset: usize) -> Result<usize, ContractError> {
    check_length(data, offset + 32)?;
    let value = U256::from_big_endian(&data[offset..offset + 32]);
    if value > U256::from(data.len()) {
        return Err(ContractError::Decoding(format!(
            "offset {} beyond data length {}",
            value,
            data.len()
        )));
    }
    Ok(value.as_usize())
}

/// Read a length word. Lengths count payload units still to come, so any
/// value beyond the remaining data is malformed; the bound also keeps the
/// word inside `usize` before conversion.
fn read_length(data: &[u8], offset: usize) -> Result<usize, ContractError> {
    check_length(data, offset + 32)?;
    let value = U256::from_big_endian(&data[offset..offset + 32]);
    if value > U256::from(data.len()) {
        return Err(ContractError::Decoding(format!(
            "length {} beyond data length {}",
            value,
            data.len()
        )));
    }
    Ok(value.as_usize())
}

fn decode_bytes(data: &[u8], offset: usize) -> Result<(Vec<u8>, usize), ContractError> {
    let len = read_length(data, offset)?;
    check_length(data, offset + 32 + len)?;
    let bytes = data[offset + 32..offset + 32 + len].to_vec();

    let padded_len = len.div_ceil(32) * 32;
    Ok((bytes, 32 + padded_len))
}

fn check_length(data: &[u8], required: usize) -> Result<(), ContractError> {
    if data.len() < required {
        return Err(ContractError::Decoding(format!(
            "insufficient data: need {} bytes, have {}",
            required,
            data.len()
        )));
    }
    Ok(())
}
