//! Per-invocation RPC method descriptor
//!
//! An [`RpcMethodModel`] is built fresh for every invocation and never
//! shared: verb, parameters (already in wire form), the output types to
//! decode a response through, and an optional user callback. Keeping this
//! state per-call is what lets any number of invocations run concurrently
//! without interfering.

use serde_json::Value;

use crate::abi::{ParamType, Token};
use crate::types::BlockId;
use crate::ContractError;

/// The JSON-RPC verb an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcVerb {
    /// `eth_call`
    Call,
    /// `eth_sendTransaction`
    SendTransaction,
    /// `eth_sendRawTransaction`
    SendRawTransaction,
    /// `eth_estimateGas`
    EstimateGas,
    /// `eth_gasPrice`
    GasPrice,
    /// `eth_blockNumber`
    BlockNumber,
    /// `eth_getTransactionReceipt`
    GetTransactionReceipt,
    /// `eth_getTransactionCount`
    GetTransactionCount,
}

impl RpcVerb {
    /// Wire method name.
    pub fn method_name(&self) -> &'static str {
        match self {
            RpcVerb::Call => "eth_call",
            RpcVerb::SendTransaction => "eth_sendTransaction",
            RpcVerb::SendRawTransaction => "eth_sendRawTransaction",
            RpcVerb::EstimateGas => "eth_estimateGas",
            RpcVerb::GasPrice => "eth_gasPrice",
            RpcVerb::BlockNumber => "eth_blockNumber",
            RpcVerb::GetTransactionReceipt => "eth_getTransactionReceipt",
            RpcVerb::GetTransactionCount => "eth_getTransactionCount",
        }
    }

    /// Positional parameter count the verb expects.
    pub fn expected_param_count(&self) -> usize {
        match self {
            RpcVerb::Call => 2,
            RpcVerb::SendTransaction
            | RpcVerb::SendRawTransaction
            | RpcVerb::EstimateGas
            | RpcVerb::GetTransactionReceipt => 1,
            RpcVerb::GasPrice | RpcVerb::BlockNumber => 0,
            RpcVerb::GetTransactionCount => 2,
        }
    }
}

/// Immediate (non-tracked) result of an invocation, as handed to callbacks.
#[derive(Debug, Clone)]
pub enum RpcOutcome {
    /// Decoded return values of a read-only call
    CallResult(Vec<Token>),
    /// Hash of a submitted transaction
    TransactionHash(keel_primitives::H256),
    /// Gas estimate
    GasEstimate(u64),
    /// Message signature
    Signature(bytes::Bytes),
}

/// User callback invoked once with the immediate outcome or the error.
///
/// Callback consumers and future/handle consumers observe identical
/// failures; validation errors are delivered to both.
pub type Callback = Box<dyn FnOnce(Result<RpcOutcome, ContractError>) + Send>;

/// One invocation's RPC descriptor. Built per call, consumed by dispatch.
pub struct RpcMethodModel {
    /// Target verb
    pub verb: RpcVerb,
    /// Positional parameters, already transformed to wire form
    pub params: Vec<Value>,
    /// Output types the response decodes through (read path only)
    pub output_types: Vec<ParamType>,
    /// Block the read executes against
    pub block: BlockId,
    /// Optional user callback
    pub callback: Option<Callback>,
}

impl RpcMethodModel {
    /// Create a model for a verb with no parameters attached yet.
    pub fn new(verb: RpcVerb) -> Self {
        Self {
            verb,
            params: Vec::new(),
            output_types: Vec::new(),
            block: BlockId::default(),
            callback: None,
        }
    }

    /// Attach positional parameters.
    pub fn params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Attach output types for response decoding.
    pub fn output_types(mut self, types: Vec<ParamType>) -> Self {
        self.output_types = types;
        self
    }

    /// Attach the block identifier for a read.
    pub fn block(mut self, block: BlockId) -> Self {
        self.block = block;
        self
    }

    /// Attach a user callback.
    pub fn callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Verify the parameter count matches what the verb expects.
    pub fn check_params(&self) -> Result<(), ContractError> {
        let expected = self.verb.expected_param_count();
        if self.params.len() != expected {
            return Err(ContractError::Validation(format!(
                "{} expects {} parameters, model carries {}",
                self.verb.method_name(),
                expected,
                self.params.len()
            )));
        }
        Ok(())
    }

    /// Invoke and consume the callback, if one is attached.
    pub fn take_callback(&mut self) -> Option<Callback> {
        self.callback.take()
    }
}

impl std::fmt::Debug for RpcMethodModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcMethodModel")
            .field("verb", &self.verb)
            .field("params", &self.params)
            .field("output_types", &self.output_types)
            .field("block", &self.block)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_method_names() {
        assert_eq!(RpcVerb::Call.method_name(), "eth_call");
        assert_eq!(RpcVerb::SendRawTransaction.method_name(), "eth_sendRawTransaction");
        assert_eq!(RpcVerb::GasPrice.method_name(), "eth_gasPrice");
    }

    #[test]
    fn test_param_count_checked() {
        let model = RpcMethodModel::new(RpcVerb::Call);
        assert!(model.check_params().is_err());

        let model = model.params(vec![Value::Null, Value::String("latest".into())]);
        assert!(model.check_params().is_ok());
    }

    #[test]
    fn test_callback_taken_once() {
        let mut model = RpcMethodModel::new(RpcVerb::GasPrice).callback(Box::new(|_| {}));
        assert!(model.take_callback().is_some());
        assert!(model.take_callback().is_none());
    }
}
