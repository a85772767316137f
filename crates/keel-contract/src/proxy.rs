//! Contract method proxy
//!
//! A [`Contract`] pairs an address with its ABI model and a dispatcher.
//! [`Contract::method`] resolves a name and argument count through the
//! model and yields a [`MethodInvocation`] builder; the builder's terminal
//! operations (`call`, `send`, `estimate_gas`, `encode`) encode the
//! arguments and route through the dispatcher. Ambiguous overloads are
//! rejected at resolution, never silently picked.

use std::sync::Arc;

use bytes::Bytes;
use keel_primitives::Address;

use crate::abi::{
    encode_deploy, encode_function_call, AbiItemDescriptor, AbiModel, RequestKind, Resolution,
    Token,
};
use crate::dispatch::{DispatchRequest, Dispatcher, Execution};
use crate::handle::ResultHandle;
use crate::options::{apply_defaults, TransactionDefaults, TransactionOptions};
use crate::rpc::{Callback, RpcOutcome};
use crate::types::BlockId;
use crate::ContractError;

/// A deployed contract: address + ABI + dispatcher.
///
/// Cheap to clone; the model and dispatcher are shared read-only.
#[derive(Clone)]
pub struct Contract {
    address: Address,
    abi: Arc<AbiModel>,
    dispatcher: Arc<Dispatcher>,
    defaults: TransactionDefaults,
}

impl Contract {
    /// Bind an ABI model to a deployed address.
    pub fn new(address: Address, abi: AbiModel, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            address,
            abi: Arc::new(abi),
            dispatcher,
            defaults: TransactionDefaults::default(),
        }
    }

    /// Contract-level option defaults merged into every invocation.
    pub fn with_defaults(mut self, defaults: TransactionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// The bound contract address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The shared ABI model.
    pub fn abi(&self) -> &Arc<AbiModel> {
        &self.abi
    }

    /// Resolve a method by name and argument count and build an invocation.
    ///
    /// Overloads that are still ambiguous at this arity fail fast with
    /// [`ContractError::AmbiguousOverload`]; nothing is ever picked
    /// arbitrarily.
    pub fn method(&self, name: &str, args: Vec<Token>) -> Result<MethodInvocation, ContractError> {
        let descriptor = match self.abi.resolve(name, Some(args.len()))? {
            Resolution::Single(descriptor) => descriptor,
            Resolution::Ambiguous(candidates) => {
                return Err(ContractError::AmbiguousOverload {
                    name: name.to_string(),
                    arity: args.len(),
                    count: candidates.len(),
                })
            }
        };
        Ok(MethodInvocation {
            descriptor,
            args,
            target: Some(self.address),
            bytecode: None,
            dispatcher: self.dispatcher.clone(),
            defaults: self.defaults.clone(),
            callback: None,
        })
    }

    /// Build a deployment invocation: bytecode followed by encoded
    /// constructor arguments. Dispatches as a transaction.
    pub fn deploy(
        abi: &AbiModel,
        bytecode: Bytes,
        args: Vec<Token>,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<MethodInvocation, ContractError> {
        let descriptor = match abi.constructor() {
            Some(descriptor) => descriptor.clone(),
            None if args.is_empty() => Arc::new(AbiItemDescriptor::constructor(Vec::new())),
            None => {
                return Err(ContractError::ArityMismatch {
                    name: "constructor".to_string(),
                    expected: vec![0],
                    got: args.len(),
                })
            }
        };
        if descriptor.inputs.len() != args.len() {
            return Err(ContractError::ArityMismatch {
                name: "constructor".to_string(),
                expected: vec![descriptor.inputs.len()],
                got: args.len(),
            });
        }
        Ok(MethodInvocation {
            descriptor,
            args,
            target: None,
            bytecode: Some(bytecode),
            dispatcher,
            defaults: TransactionDefaults::default(),
            callback: None,
        })
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// One resolved invocation, ready to encode and route.
///
/// Built per call, never shared. Terminal operations consume the builder.
pub struct MethodInvocation {
    descriptor: Arc<AbiItemDescriptor>,
    args: Vec<Token>,
    /// `None` for deployments
    target: Option<Address>,
    /// Deployment bytecode, when this is a constructor invocation
    bytecode: Option<Bytes>,
    dispatcher: Arc<Dispatcher>,
    defaults: TransactionDefaults,
    callback: Option<Callback>,
}

impl MethodInvocation {
    /// The resolved descriptor.
    pub fn descriptor(&self) -> &AbiItemDescriptor {
        &self.descriptor
    }

    /// Attach a callback; it fires once with the immediate outcome
    /// (transaction hash or decoded call result) or the error.
    pub fn callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Encode the call data without any I/O: selector plus arguments, or
    /// bytecode plus constructor arguments for a deployment.
    pub fn encode(&self) -> Result<Bytes, ContractError> {
        let types = self.descriptor.input_types();
        let encoded = match &self.bytecode {
            Some(bytecode) => encode_deploy(bytecode, &types, &self.args)?,
            None => encode_function_call(self.descriptor.selector(), &types, &self.args)?,
        };
        Ok(Bytes::from(encoded))
    }

    /// Build the dispatch request without sending it.
    pub fn build_request(
        mut self,
        options: TransactionOptions,
    ) -> Result<DispatchRequest, ContractError> {
        let kind = self.descriptor.request_kind();
        let output_types = self.descriptor.output_types();
        let options = self.prepare(options)?;
        let mut request = DispatchRequest::new(kind, options);
        request.output_types = output_types;
        request.callback = self.callback.take();
        Ok(request)
    }

    /// Execute as a read-only call against `block` and decode the outputs.
    ///
    /// Works for any method, including state-mutating ones; nothing is
    /// submitted.
    pub async fn call(mut self, block: BlockId) -> Result<Vec<Token>, ContractError> {
        let output_types = self.descriptor.output_types();
        let options = self.prepare(TransactionOptions::default())?;
        let mut request = DispatchRequest::new(RequestKind::Call, options);
        request.output_types = output_types;
        request.block = block;
        request.callback = self.callback.take();

        match self.dispatcher.execute(request).await? {
            Execution::Value(RpcOutcome::CallResult(tokens)) => Ok(tokens),
            _ => Err(ContractError::Decoding(
                "call dispatched to a non-call path".into(),
            )),
        }
    }

    /// Submit as a transaction and track it to confirmation.
    ///
    /// Always returns a handle; local validation or encoding failures come
    /// back as an already-rejected handle, after the callback has observed
    /// the error.
    pub async fn send(mut self, options: TransactionOptions) -> ResultHandle {
        let callback = self.callback.take();
        match self.prepare(options) {
            Ok(options) => self.dispatcher.send(options, callback).await,
            Err(error) => {
                if let Some(callback) = callback {
                    callback(Err(error.clone()));
                }
                ResultHandle::rejected(error)
            }
        }
    }

    /// Estimate the gas the transaction would consume.
    pub async fn estimate_gas(mut self, options: TransactionOptions) -> Result<u64, ContractError> {
        let callback = self.callback.take();
        let options = self.prepare(options)?;
        let mut request = DispatchRequest::new(RequestKind::Estimate, options);
        request.callback = callback;

        match self.dispatcher.execute(request).await? {
            Execution::Value(RpcOutcome::GasEstimate(gas)) => Ok(gas),
            _ => Err(ContractError::Decoding(
                "estimate dispatched to a non-estimate path".into(),
            )),
        }
    }

    /// Merge defaults, encode the data, and point the options at the
    /// contract (deployments leave `to` empty).
    fn prepare(
        &self,
        mut options: TransactionOptions,
    ) -> Result<TransactionOptions, ContractError> {
        apply_defaults(&mut options, &self.defaults);
        options.data = self.encode()?;
        if options.to.is_none() {
            options.to = self.target;
        }
        Ok(options)
    }
}

impl std::fmt::Debug for MethodInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("method", &self.descriptor.signature())
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
