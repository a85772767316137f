//! Transaction options: defaults mapping and validation
//!
//! Every invocation carries its own [`TransactionOptions`]; nothing here is
//! shared between calls. Presence is always an explicit `Option` check — a
//! caller-supplied zero is respected and never treated as absent.

use bytes::Bytes;
use keel_primitives::{Address, U256};

use crate::types::CallRequest;
use crate::ContractError;

/// Per-invocation transaction parameters.
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient; absent for deployment
    pub to: Option<Address>,
    /// Call data (selector + arguments, or deployment payload)
    pub data: Bytes,
    /// Value to transfer
    pub value: Option<U256>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Gas price; left absent to have the dispatcher fetch the network price
    pub gas_price: Option<u128>,
    /// Sender nonce; filled when signing locally
    pub nonce: Option<u64>,
}

impl TransactionOptions {
    /// Options targeting a contract address.
    pub fn to_address(address: Address) -> Self {
        Self {
            to: Some(address),
            ..Default::default()
        }
    }

    /// Set the sender.
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the value to transfer.
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the gas limit.
    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Set the gas price explicitly, suppressing the network lookup.
    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Set the nonce explicitly.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Wire form for `eth_call` / `eth_estimateGas` / `eth_sendTransaction`.
    pub fn to_request(&self) -> CallRequest {
        CallRequest {
            from: self.from,
            to: self.to,
            gas: self.gas,
            gas_price: self.gas_price,
            value: self.value,
            data: if self.data.is_empty() {
                None
            } else {
                Some(self.data.clone())
            },
            nonce: self.nonce,
        }
    }
}

/// Contract-level defaults merged into each invocation's options.
#[derive(Debug, Clone, Default)]
pub struct TransactionDefaults {
    /// Default sender
    pub from: Option<Address>,
    /// Default gas limit
    pub gas: Option<u64>,
    /// Default gas price
    pub gas_price: Option<u128>,
}

/// Fill absent options from contract-level defaults. Explicitly supplied
/// values always win.
pub fn apply_defaults(options: &mut TransactionOptions, defaults: &TransactionDefaults) {
    if options.from.is_none() {
        options.from = defaults.from;
    }
    if options.gas.is_none() {
        options.gas = defaults.gas;
    }
    if options.gas_price.is_none() {
        options.gas_price = defaults.gas_price;
    }
}

/// Validate options for a state-mutating submission.
///
/// Runs before any network I/O; a failure here never reaches the transport.
pub fn validate_for_send(options: &TransactionOptions) -> Result<(), ContractError> {
    if options.from.is_none() {
        return Err(ContractError::Validation(
            "sender address (`from`) required for transactions".into(),
        ));
    }
    if options.to.is_none() && options.data.is_empty() {
        return Err(ContractError::Validation(
            "transaction needs a recipient or deployment data".into(),
        ));
    }
    Ok(())
}

/// Validate options for a read-only call.
pub fn validate_for_call(options: &TransactionOptions) -> Result<(), ContractError> {
    if options.to.is_none() {
        return Err(ContractError::Validation(
            "call needs a target contract address".into(),
        ));
    }
    Ok(())
}
