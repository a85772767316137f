//! ABI encoding
//!
//! Head/tail encoding per the Solidity ABI: static values inline in the
//! head, dynamic values as a head offset pointing into the tail. Encoding
//! is pure and deterministic; all coercion failures are caught up front by
//! [`Token::conforms`] so the byte-level encoder never has to guess.

use keel_primitives::{keccak256, U256};

use super::types::{ParamType, Token};
use crate::ContractError;

/// Encode values against their declared types.
///
/// Fails with [`ContractError::Encoding`] if the counts differ or any value
/// does not conform to its declared type.
pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, ContractError> {
    if types.len() != tokens.len() {
        return Err(ContractError::Encoding(format!(
            "expected {} values, got {}",
            types.len(),
            tokens.len()
        )));
    }
    for (token, ty) in tokens.iter().zip(types.iter()) {
        token.conforms(ty).map_err(ContractError::Encoding)?;
    }
    Ok(encode_params(types, tokens))
}

/// Encode a function call: 4-byte selector followed by encoded arguments.
pub fn encode_function_call(
    selector: [u8; 4],
    types: &[ParamType],
    tokens: &[Token],
) -> Result<Vec<u8>, ContractError> {
    let mut result = selector.to_vec();
    result.extend(encode(types, tokens)?);
    Ok(result)
}

/// Encode a deployment payload: contract bytecode followed by encoded
/// constructor arguments (nothing appended when the constructor has none).
pub fn encode_deploy(
    bytecode: &[u8],
    types: &[ParamType],
    tokens: &[Token],
) -> Result<Vec<u8>, ContractError> {
    let mut result = bytecode.to_vec();
    result.extend(encode(types, tokens)?);
    Ok(result)
}

/// Compute the function selector: first 4 bytes of keccak256(signature).
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

fn encode_params(types: &[ParamType], tokens: &[Token]) -> Vec<u8> {
    let head_size = types.iter().map(head_length).sum::<usize>();

    let mut head = Vec::new();
    let mut tail = Vec::new();

    for (param_type, token) in types.iter().zip(tokens.iter()) {
        if param_type.is_dynamic() {
            let offset = head_size + tail.len();
            head.extend(encode_u256(&U256::from(offset)));
            tail.extend(encode_token(param_type, token));
        } else {
            head.extend(encode_token(param_type, token));
        }
    }

    head.extend(tail);
    head
}

fn head_length(param_type: &ParamType) -> usize {
    match param_type {
        ParamType::FixedArray(inner, size) if !inner.is_dynamic() => head_length(inner) * size,
        ParamType::Tuple(types) if !types.iter().any(|t| t.is_dynamic()) => {
            types.iter().map(head_length).sum()
        }
        _ => 32,
    }
}

// Callers have already verified conformance; mismatches cannot occur here.
fn encode_token(param_type: &ParamType, token: &Token) -> Vec<u8> {
    match (param_type, token) {
        (ParamType::Address, Token::Address(addr)) => {
            let mut buf = [0u8; 32];
            buf[12..32].copy_from_slice(addr.as_bytes());
            buf.to_vec()
        }
        (ParamType::Uint(_), Token::Uint(value)) => encode_u256(value),
        (ParamType::Int(_), Token::Int(value)) => {
            if value.negative && !value.abs.is_zero() {
                // Two's complement: flip the magnitude and add one
                let abs_bytes = u256_to_bytes(&value.abs);
                let mut bytes = [0u8; 32];
                for i in 0..32 {
                    bytes[i] = !abs_bytes[i];
                }
                let mut carry = 1u16;
                for i in (0..32).rev() {
                    let sum = (bytes[i] as u16) + carry;
                    bytes[i] = sum as u8;
                    carry = sum >> 8;
                }
                bytes.to_vec()
            } else {
                encode_u256(&value.abs)
            }
        }
        (ParamType::Bool, Token::Bool(b)) => {
            let mut buf = [0u8; 32];
            buf[31] = u8::from(*b);
            buf.to_vec()
        }
        (ParamType::FixedBytes(size), Token::FixedBytes(data)) => {
            let mut buf = [0u8; 32];
            buf[..*size].copy_from_slice(&data[..*size]);
            buf.to_vec()
        }
        (ParamType::Bytes, Token::Bytes(data)) => encode_bytes(data),
        (ParamType::String, Token::String(s)) => encode_bytes(s.as_bytes()),
        (ParamType::Array(inner), Token::Array(tokens)) => {
            let mut result = encode_u256(&U256::from(tokens.len()));
            let inner_types: Vec<ParamType> = tokens.iter().map(|_| (**inner).clone()).collect();
            result.extend(encode_params(&inner_types, tokens));
            result
        }
        (ParamType::FixedArray(inner, _), Token::FixedArray(tokens)) => {
            let inner_types: Vec<ParamType> = tokens.iter().map(|_| (**inner).clone()).collect();
            encode_params(&inner_types, tokens)
        }
        (ParamType::Tuple(types), Token::Tuple(tokens)) => encode_params(types, tokens),
        _ => unreachable!("conformance checked before encoding"),
    }
}

fn u256_to_bytes(value: &U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

fn encode_u256(value: &U256) -> Vec<u8> {
    u256_to_bytes(value).to_vec()
}

fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut result = encode_u256(&U256::from(data.len()));

    let padded_len = data.len().div_ceil(32) * 32;
    let mut padded = vec![0u8; padded_len];
    padded[..data.len()].copy_from_slice(data);
    result.extend(padded);

    result
}

/// Parse a textual ABI type (e.g. "uint256", "address", "bytes32",
/// "uint256[]", "address[4]").
pub fn parse_type(s: &str) -> Result<ParamType, ContractError> {
    let s = s.trim();

    // Array suffixes bind last
    if let Some(open) = s.rfind('[') {
        let close = s
            .rfind(']')
            .ok_or_else(|| ContractError::Encoding(format!("unterminated array type: {}", s)))?;
        if close != s.len() - 1 {
            return Err(ContractError::Encoding(format!("malformed array type: {}", s)));
        }
        let inner = parse_type(&s[..open])?;
        let size_str = &s[open + 1..close];
        if size_str.is_empty() {
            return Ok(ParamType::Array(Box::new(inner)));
        }
        let size: usize = size_str
            .parse()
            .map_err(|_| ContractError::Encoding(format!("invalid array size: {}", size_str)))?;
        return Ok(ParamType::FixedArray(Box::new(inner), size));
    }

    match s {
        "address" => return Ok(ParamType::Address),
        "bool" => return Ok(ParamType::Bool),
        "string" => return Ok(ParamType::String),
        "bytes" => return Ok(ParamType::Bytes),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("uint") {
        let bits: usize = if rest.is_empty() {
            256
        } else {
            rest.parse()
                .map_err(|_| ContractError::Encoding(format!("invalid uint size: {}", rest)))?
        };
        return Ok(ParamType::Uint(bits));
    }

    if let Some(rest) = s.strip_prefix("int") {
        let bits: usize = if rest.is_empty() {
            256
        } else {
            rest.parse()
                .map_err(|_| ContractError::Encoding(format!("invalid int size: {}", rest)))?
        };
        return Ok(ParamType::Int(bits));
    }

    if let Some(rest) = s.strip_prefix("bytes") {
        if !rest.is_empty() {
            let size: usize = rest
                .parse()
                .map_err(|_| ContractError::Encoding(format!("invalid bytes size: {}", rest)))?;
            if size == 0 || size > 32 {
                return Err(ContractError::Encoding(format!("invalid bytes size: {}", size)));
            }
            return Ok(ParamType::FixedBytes(size));
        }
    }

    Err(ContractError::Encoding(format!("unknown type: {}", s)))
}
