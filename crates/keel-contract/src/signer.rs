//! Signer interface
//!
//! Key storage and the signing primitives themselves live outside this
//! crate; the dispatcher only needs this trait. When a signer is attached,
//! transactions are signed locally and submitted through
//! `eth_sendRawTransaction` instead of delegating signing to the node.

use async_trait::async_trait;
use bytes::Bytes;
use keel_primitives::{Address, H256};

use crate::options::TransactionOptions;
use crate::ContractError;

/// A locally signed transaction ready for raw submission.
#[derive(Debug, Clone)]
pub struct SignedPayload {
    /// Serialized signed transaction
    pub raw_transaction: Bytes,
    /// Hash the transaction will be known by
    pub transaction_hash: H256,
}

/// Transaction and message signing collaborator.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The address this signer signs for.
    fn address(&self) -> Address;

    /// Sign a fully-populated transaction. All of `from`, `gas`,
    /// `gas_price`, and `nonce` are present by the time this is called;
    /// the dispatcher fills them first.
    async fn sign_transaction(
        &self,
        options: &TransactionOptions,
        chain_id: u64,
    ) -> Result<SignedPayload, ContractError>;

    /// Sign an arbitrary message for an address.
    async fn sign_message(&self, data: &[u8], address: &Address)
        -> Result<Bytes, ContractError>;
}
