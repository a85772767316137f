//! ABI model, encoding, and decoding
//!
//! The pieces for turning a method name plus concrete argument values into
//! call data, and raw response bytes back into values:
//!
//! - [`AbiModel`] resolves a name (and argument count) to descriptors,
//!   including overload disambiguation
//! - [`encode_function_call`] / [`encode_deploy`] produce call data
//! - [`decode`] turns response bytes back into [`Token`]s
//!
//! # Example
//!
//! ```rust
//! use keel_contract::abi::{encode, function_selector, ParamType, Token};
//! use keel_primitives::{Address, U256};
//!
//! let selector = function_selector("transfer(address,uint256)");
//! let data = encode(
//!     &[ParamType::Address, ParamType::Uint(256)],
//!     &[Token::Address(Address::ZERO), Token::Uint(U256::from(1000))],
//! )
//! .unwrap();
//! assert_eq!(selector, [0xa9, 0x05, 0x9c, 0xbb]);
//! assert_eq!(data.len(), 64);
//! ```

mod decode;
mod encode;
mod model;
mod types;

pub use decode::decode;
pub use encode::{encode, encode_deploy, encode_function_call, function_selector, parse_type};
pub use model::{
    AbiItemDescriptor, AbiItemKind, AbiModel, Param, RequestKind, Resolution, StateMutability,
};
pub use types::{I256, ParamType, Token};
