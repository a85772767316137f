//! Error taxonomy for contract invocation and confirmation tracking
//!
//! `ContractError` is `Clone` on purpose: a single terminal failure has to
//! reach up to three consumers (the user callback, the progress-event
//! channel, and the completion path of a [`crate::ResultHandle`]).

use std::time::Duration;

use keel_primitives::{AddressError, H256, HashError, HexError};
use thiserror::Error;

/// Errors produced by the contract client.
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    /// No descriptor with the given name exists in the ABI model
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Argument count matches no overload of the method
    #[error("arity mismatch for {name}: overloads accept {expected:?} arguments, got {got}")]
    ArityMismatch {
        /// Method name
        name: String,
        /// Arities the known overloads accept
        expected: Vec<usize>,
        /// Argument count supplied by the caller
        got: usize,
    },

    /// Two or more overloads share the supplied arity; the call must be
    /// disambiguated explicitly rather than picked arbitrarily
    #[error("ambiguous overload: {count} candidates for {name} take {arity} arguments")]
    AmbiguousOverload {
        /// Method name
        name: String,
        /// Arity shared by the candidates
        arity: usize,
        /// Number of candidates
        count: usize,
    },

    /// A value could not be coerced to its declared ABI type
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Response bytes could not be decoded against the declared outputs
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Malformed transaction options detected before any network I/O
    #[error("invalid transaction options: {0}")]
    Validation(String),

    /// Network-level failure (connection, malformed response body)
    #[error("transport error: {0}")]
    Transport(String),

    /// Error reported by the node inside a JSON-RPC response
    #[error("rpc error: {code} - {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Node-supplied message
        message: String,
    },

    /// The mined receipt carries a failure status
    #[error("transaction {0} reverted on-chain")]
    TransactionReverted(H256),

    /// The confirmation workflow gave up waiting
    #[error("transaction {hash} not confirmed within {timeout:?}")]
    ConfirmationTimeout {
        /// Transaction being tracked
        hash: H256,
        /// Configured bound on total wait time
        timeout: Duration,
    },

    /// The signer collaborator failed, or none is configured
    #[error("signing error: {0}")]
    Signing(String),
}

impl From<AddressError> for ContractError {
    fn from(e: AddressError) -> Self {
        ContractError::Validation(e.to_string())
    }
}

impl From<HashError> for ContractError {
    fn from(e: HashError) -> Self {
        ContractError::Decoding(e.to_string())
    }
}

impl From<HexError> for ContractError {
    fn from(e: HexError) -> Self {
        ContractError::Decoding(e.to_string())
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        ContractError::Decoding(e.to_string())
    }
}
