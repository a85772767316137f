//! ABI value and type definitions

use keel_primitives::{Address, H256, U256};

/// A concrete ABI value supplied as an argument or decoded from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Address (20 bytes)
    Address(Address),
    /// Unsigned integer (8-256 bits)
    Uint(U256),
    /// Signed integer (8-256 bits)
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Dynamic bytes
    Bytes(Vec<u8>),
    /// Fixed-size bytes (1-32)
    FixedBytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Dynamic array
    Array(Vec<Token>),
    /// Fixed-size array
    FixedArray(Vec<Token>),
    /// Tuple (struct)
    Tuple(Vec<Token>),
}

/// Signed 256-bit integer in sign-magnitude form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I256 {
    /// Absolute value
    pub abs: U256,
    /// Sign (true if negative)
    pub negative: bool,
}

impl I256 {
    /// Create a new I256
    pub fn new(abs: U256, negative: bool) -> Self {
        Self { abs, negative }
    }

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        if value < 0 {
            Self {
                abs: U256::from(value.unsigned_abs()),
                negative: true,
            }
        } else {
            Self {
                abs: U256::from(value as u128),
                negative: false,
            }
        }
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }
}

/// Declared ABI parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Address
    Address,
    /// Unsigned integer with bit size (8, 16, ..., 256)
    Uint(usize),
    /// Signed integer with bit size
    Int(usize),
    /// Boolean
    Bool,
    /// Dynamic bytes
    Bytes,
    /// Fixed-size bytes (size 1-32)
    FixedBytes(usize),
    /// UTF-8 string
    String,
    /// Dynamic array
    Array(Box<ParamType>),
    /// Fixed-size array
    FixedArray(Box<ParamType>, usize),
    /// Tuple
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Whether values of this type use tail (variable-length) encoding
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(types) => types.iter().any(|t| t.is_dynamic()),
            _ => false,
        }
    }

    /// Canonical type name as used in function signatures
    pub fn canonical(&self) -> String {
        match self {
            ParamType::Address => "address".to_string(),
            ParamType::Uint(bits) => format!("uint{}", bits),
            ParamType::Int(bits) => format!("int{}", bits),
            ParamType::Bool => "bool".to_string(),
            ParamType::Bytes => "bytes".to_string(),
            ParamType::FixedBytes(size) => format!("bytes{}", size),
            ParamType::String => "string".to_string(),
            ParamType::Array(inner) => format!("{}[]", inner.canonical()),
            ParamType::FixedArray(inner, size) => format!("{}[{}]", inner.canonical(), size),
            ParamType::Tuple(types) => {
                let inner: Vec<String> = types.iter().map(|t| t.canonical()).collect();
                format!("({})", inner.join(","))
            }
        }
    }
}

impl Token {
    /// The declared type a token of this shape naturally has
    pub fn type_of(&self) -> ParamType {
        match self {
            Token::Address(_) => ParamType::Address,
            Token::Uint(_) => ParamType::Uint(256),
            Token::Int(_) => ParamType::Int(256),
            Token::Bool(_) => ParamType::Bool,
            Token::Bytes(_) => ParamType::Bytes,
            Token::FixedBytes(b) => ParamType::FixedBytes(b.len()),
            Token::String(_) => ParamType::String,
            Token::Array(tokens) => {
                let inner = tokens
                    .first()
                    .map(|t| t.type_of())
                    .unwrap_or(ParamType::Uint(256));
                ParamType::Array(Box::new(inner))
            }
            Token::FixedArray(tokens) => {
                let inner = tokens
                    .first()
                    .map(|t| t.type_of())
                    .unwrap_or(ParamType::Uint(256));
                ParamType::FixedArray(Box::new(inner), tokens.len())
            }
            Token::Tuple(tokens) => ParamType::Tuple(tokens.iter().map(|t| t.type_of()).collect()),
        }
    }

    /// Check that this value can be encoded as `declared`.
    ///
    /// Rejects oversized values for fixed-width integer types and
    /// wrong-length fixed bytes instead of truncating.
    pub fn conforms(&self, declared: &ParamType) -> Result<(), String> {
        match (self, declared) {
            (Token::Address(_), ParamType::Address) => Ok(()),
            (Token::Uint(value), ParamType::Uint(bits)) => {
                if *bits == 0 || *bits > 256 || bits % 8 != 0 {
                    return Err(format!("invalid uint width {}", bits));
                }
                if *bits < 256 && value.bits() > *bits {
                    return Err(format!(
                        "value {} does not fit in uint{}",
                        value, bits
                    ));
                }
                Ok(())
            }
            (Token::Int(value), ParamType::Int(bits)) => {
                if *bits == 0 || *bits > 256 || bits % 8 != 0 {
                    return Err(format!("invalid int width {}", bits));
                }
                // Two's complement range: [-2^(bits-1), 2^(bits-1) - 1]
                let magnitude_bits = value.abs.bits();
                let limit = bits - 1;
                let fits = if value.negative {
                    magnitude_bits < limit + 1
                        || (magnitude_bits == limit + 1 && value.abs == (U256::one() << limit))
                } else {
                    magnitude_bits <= limit
                };
                if *bits < 256 && !fits {
                    return Err(format!("value does not fit in int{}", bits));
                }
                Ok(())
            }
            (Token::Bool(_), ParamType::Bool) => Ok(()),
            (Token::Bytes(_), ParamType::Bytes) => Ok(()),
            (Token::FixedBytes(data), ParamType::FixedBytes(size)) => {
                if *size == 0 || *size > 32 {
                    return Err(format!("invalid bytes{} width", size));
                }
                if data.len() != *size {
                    return Err(format!(
                        "bytes{} value has {} bytes",
                        size,
                        data.len()
                    ));
                }
                Ok(())
            }
            (Token::String(_), ParamType::String) => Ok(()),
            (Token::Array(tokens), ParamType::Array(inner)) => {
                for token in tokens {
                    token.conforms(inner)?;
                }
                Ok(())
            }
            (Token::FixedArray(tokens), ParamType::FixedArray(inner, size)) => {
                if tokens.len() != *size {
                    return Err(format!(
                        "fixed array expects {} elements, got {}",
                        size,
                        tokens.len()
                    ));
                }
                for token in tokens {
                    token.conforms(inner)?;
                }
                Ok(())
            }
            (Token::Tuple(tokens), ParamType::Tuple(types)) => {
                if tokens.len() != types.len() {
                    return Err(format!(
                        "tuple expects {} components, got {}",
                        types.len(),
                        tokens.len()
                    ));
                }
                for (token, ty) in tokens.iter().zip(types.iter()) {
                    token.conforms(ty)?;
                }
                Ok(())
            }
            (token, declared) => Err(format!(
                "cannot coerce {} value to {}",
                token.type_of().canonical(),
                declared.canonical()
            )),
        }
    }

    /// Create a bytes32 token from a hash
    pub fn bytes32(data: H256) -> Self {
        Token::FixedBytes(data.as_bytes().to_vec())
    }
}
