//! Invocation routing
//!
//! The [`Dispatcher`] takes a fully-built request (kind, options, output
//! types, callback) and routes it: read calls go to `eth_call` and decode
//! inline; submissions fill the gas price (one lookup, only when absent),
//! optionally sign locally, submit, and hand the returned hash to the
//! confirmation workflow; sign requests never touch the transport at all.
//! Local validation and encoding failures surface before any network I/O.

use std::sync::Arc;

use keel_primitives::{parse_hex_bytes, parse_hex_u128, parse_hex_u64, H256};
use serde_json::Value;

use crate::abi::{self, ParamType, RequestKind, Token};
use crate::confirm::{self, ConfirmOptions};
use crate::handle::ResultHandle;
use crate::options::{validate_for_call, validate_for_send, TransactionOptions};
use crate::rpc::{Callback, RpcMethodModel, RpcOutcome, RpcVerb};
use crate::signer::Signer;
use crate::transport::Transport;
use crate::types::BlockId;
use crate::ContractError;

/// What an executed invocation produced.
pub enum Execution {
    /// An immediate value (read call, estimate, signature)
    Value(RpcOutcome),
    /// A tracked submission; progress and outcome arrive on the handle
    Tracked(ResultHandle),
}

/// One request handed to [`Dispatcher::execute`].
pub struct DispatchRequest {
    /// How the invocation routes
    pub kind: RequestKind,
    /// Transaction parameters, data already encoded
    pub options: TransactionOptions,
    /// Output types a read response decodes through
    pub output_types: Vec<ParamType>,
    /// Block a read executes against
    pub block: BlockId,
    /// Optional user callback, invoked once with the immediate outcome
    pub callback: Option<Callback>,
}

impl DispatchRequest {
    /// A request with no outputs, default block, and no callback.
    pub fn new(kind: RequestKind, options: TransactionOptions) -> Self {
        Self {
            kind,
            options,
            output_types: Vec::new(),
            block: BlockId::default(),
            callback: None,
        }
    }
}

/// Routes invocations to the transport, the signer, and the confirmation
/// workflow. Cheap to clone behind an `Arc`; holds no per-call state.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    signer: Option<Arc<dyn Signer>>,
    chain_id: u64,
    confirm: ConfirmOptions,
}

impl Dispatcher {
    /// A dispatcher delegating signing to the node.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            signer: None,
            chain_id: 1,
            confirm: ConfirmOptions::default(),
        }
    }

    /// Attach a local signer; submissions switch to `eth_sendRawTransaction`.
    pub fn with_signer(mut self, signer: Arc<dyn Signer>, chain_id: u64) -> Self {
        self.signer = Some(signer);
        self.chain_id = chain_id;
        self
    }

    /// Override confirmation tracking options.
    pub fn confirm_options(mut self, options: ConfirmOptions) -> Self {
        self.confirm = options;
        self
    }

    /// The transport invocations go through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Route one invocation.
    ///
    /// `Send` (and `Deploy`, which submits as `Send`) always yields
    /// [`Execution::Tracked`]: failures before or during submission come
    /// back as an already-rejected handle rather than an `Err`, so the
    /// caller gets one uniform shape. The other kinds return their value or
    /// the error directly. The callback, when present, observes the same
    /// outcome either way.
    pub async fn execute(&self, request: DispatchRequest) -> Result<Execution, ContractError> {
        let DispatchRequest {
            kind,
            options,
            output_types,
            block,
            callback,
        } = request;

        match kind.for_dispatch() {
            RequestKind::Sign => {
                let result = self.sign_message(&options).await.map(RpcOutcome::Signature);
                deliver(callback, result.clone());
                Ok(Execution::Value(result?))
            }
            RequestKind::Call => {
                let tokens = self.read_call(&options, output_types, block, callback).await?;
                Ok(Execution::Value(RpcOutcome::CallResult(tokens)))
            }
            RequestKind::Estimate => {
                let gas = self.estimate(options, callback).await?;
                Ok(Execution::Value(RpcOutcome::GasEstimate(gas)))
            }
            RequestKind::Send => Ok(Execution::Tracked(self.send(options, callback).await)),
            // for_dispatch() never returns Deploy
            RequestKind::Deploy => Err(ContractError::Validation(
                "deployment must dispatch as a transaction".into(),
            )),
        }
    }

    /// Submit a transaction and track it. Never fails outright: errors come
    /// back as a rejected handle, after the callback has seen them.
    pub async fn send(
        &self,
        options: TransactionOptions,
        callback: Option<Callback>,
    ) -> ResultHandle {
        match self.submit(options).await {
            Ok(hash) => {
                if let Some(callback) = callback {
                    callback(Ok(RpcOutcome::TransactionHash(hash)));
                }
                tracing::debug!(tx = %hash, "transaction submitted, tracking confirmation");
                confirm::spawn(self.transport.clone(), self.confirm.clone(), hash)
            }
            Err(error) => {
                if let Some(callback) = callback {
                    callback(Err(error.clone()));
                }
                tracing::debug!(error = %error, "submission failed");
                ResultHandle::rejected(error)
            }
        }
    }

    async fn submit(&self, mut options: TransactionOptions) -> Result<H256, ContractError> {
        validate_for_send(&options)?;

        let model = if let Some(signer) = &self.signer {
            self.fill_for_signing(&mut options).await?;
            let payload = signer.sign_transaction(&options, self.chain_id).await?;
            let raw = format!("0x{}", hex::encode(&payload.raw_transaction));
            RpcMethodModel::new(RpcVerb::SendRawTransaction).params(vec![Value::String(raw)])
        } else {
            self.ensure_gas_price(&mut options).await?;
            RpcMethodModel::new(RpcVerb::SendTransaction).params(vec![request_value(&options)?])
        };

        match self.run_model(&model).await? {
            RpcOutcome::TransactionHash(hash) => Ok(hash),
            _ => Err(ContractError::Decoding(
                "submission produced no transaction hash".into(),
            )),
        }
    }

    async fn read_call(
        &self,
        options: &TransactionOptions,
        output_types: Vec<ParamType>,
        block: BlockId,
        callback: Option<Callback>,
    ) -> Result<Vec<Token>, ContractError> {
        let mut model = RpcMethodModel::new(RpcVerb::Call)
            .output_types(output_types)
            .block(block);
        if let Some(callback) = callback {
            model = model.callback(callback);
        }
        let prep = validate_for_call(options).and_then(|()| {
            model.params = vec![request_value(options)?, block_value(model.block)?];
            Ok(())
        });
        match self.dispatch_model(model, prep).await? {
            RpcOutcome::CallResult(tokens) => Ok(tokens),
            _ => Err(ContractError::Decoding(
                "call produced a non-call outcome".into(),
            )),
        }
    }

    async fn estimate(
        &self,
        mut options: TransactionOptions,
        callback: Option<Callback>,
    ) -> Result<u64, ContractError> {
        let mut model = RpcMethodModel::new(RpcVerb::EstimateGas);
        if let Some(callback) = callback {
            model = model.callback(callback);
        }
        let prep = async {
            validate_for_send(&options)?;
            self.ensure_gas_price(&mut options).await?;
            model.params = vec![request_value(&options)?];
            Ok(())
        }
        .await;
        match self.dispatch_model(model, prep).await? {
            RpcOutcome::GasEstimate(gas) => Ok(gas),
            _ => Err(ContractError::Decoding(
                "estimate produced a non-estimate outcome".into(),
            )),
        }
    }

    /// Run a built model: consume its callback, perform the request unless
    /// preparation already failed, and let the callback observe the same
    /// outcome the caller gets.
    async fn dispatch_model(
        &self,
        mut model: RpcMethodModel,
        prep: Result<(), ContractError>,
    ) -> Result<RpcOutcome, ContractError> {
        let callback = model.take_callback();
        let result = match prep {
            Ok(()) => self.run_model(&model).await,
            Err(error) => Err(error),
        };
        deliver(callback, result.clone());
        result
    }

    /// Issue the request and map the raw response into the verb's outcome,
    /// decoding read responses through the model's output types.
    async fn run_model(&self, model: &RpcMethodModel) -> Result<RpcOutcome, ContractError> {
        model.check_params()?;
        let value = self
            .transport
            .request_json(model.verb.method_name(), model.params.clone())
            .await?;
        match model.verb {
            RpcVerb::Call => {
                let text = expect_string(&value)?;
                if model.output_types.is_empty() {
                    return Ok(RpcOutcome::CallResult(Vec::new()));
                }
                let data = parse_hex_bytes(text)?;
                Ok(RpcOutcome::CallResult(abi::decode(
                    &model.output_types,
                    &data,
                )?))
            }
            RpcVerb::SendTransaction | RpcVerb::SendRawTransaction => {
                Ok(RpcOutcome::TransactionHash(parse_hash(&value)?))
            }
            RpcVerb::EstimateGas => Ok(RpcOutcome::GasEstimate(parse_hex_u64(expect_string(
                &value,
            )?)?)),
            verb => Err(ContractError::Decoding(format!(
                "{} has no invocation outcome",
                verb.method_name()
            ))),
        }
    }

    async fn sign_message(&self, options: &TransactionOptions) -> Result<bytes::Bytes, ContractError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| ContractError::Signing("no signer configured".into()))?;
        let from = options
            .from
            .ok_or_else(|| ContractError::Validation("signing needs a `from` address".into()))?;
        signer.sign_message(&options.data, &from).await
    }

    /// Fetch the network gas price when none was supplied. At most one
    /// lookup per submission; an explicit price, including zero, suppresses
    /// it entirely.
    async fn ensure_gas_price(
        &self,
        options: &mut TransactionOptions,
    ) -> Result<(), ContractError> {
        if options.gas_price.is_some() {
            return Ok(());
        }
        let model = RpcMethodModel::new(RpcVerb::GasPrice);
        let value = self.request(model).await?;
        let price = parse_hex_u128(expect_string(&value)?)?;
        tracing::debug!(gas_price = price, "fetched network gas price");
        options.gas_price = Some(price);
        Ok(())
    }

    /// Fill everything a local signer needs: gas price, nonce, gas limit.
    async fn fill_for_signing(
        &self,
        options: &mut TransactionOptions,
    ) -> Result<(), ContractError> {
        self.ensure_gas_price(options).await?;

        if options.nonce.is_none() {
            let from = options
                .from
                .ok_or_else(|| ContractError::Validation("signing needs a `from` address".into()))?;
            let model = RpcMethodModel::new(RpcVerb::GetTransactionCount).params(vec![
                Value::String(from.to_hex()),
                Value::String("pending".into()),
            ]);
            let value = self.request(model).await?;
            options.nonce = Some(parse_hex_u64(expect_string(&value)?)?);
        }

        if options.gas.is_none() {
            let model = RpcMethodModel::new(RpcVerb::EstimateGas)
                .params(vec![request_value(options)?]);
            let value = self.request(model).await?;
            options.gas = Some(parse_hex_u64(expect_string(&value)?)?);
        }
        Ok(())
    }

    async fn request(&self, model: RpcMethodModel) -> Result<Value, ContractError> {
        model.check_params()?;
        self.transport
            .request_json(model.verb.method_name(), model.params)
            .await
    }
}

/// Invoke the callback with a copy of the outcome, keeping the original for
/// the caller.
fn deliver(callback: Option<Callback>, outcome: Result<RpcOutcome, ContractError>) {
    if let Some(callback) = callback {
        callback(outcome);
    }
}

fn request_value(options: &TransactionOptions) -> Result<Value, ContractError> {
    serde_json::to_value(options.to_request())
        .map_err(|e| ContractError::Encoding(e.to_string()))
}

fn block_value(block: BlockId) -> Result<Value, ContractError> {
    serde_json::to_value(block).map_err(|e| ContractError::Encoding(e.to_string()))
}

fn expect_string(value: &Value) -> Result<&str, ContractError> {
    value
        .as_str()
        .ok_or_else(|| ContractError::Decoding(format!("expected hex string, got {value}")))
}

fn parse_hash(value: &Value) -> Result<H256, ContractError> {
    Ok(H256::from_hex(expect_string(value)?)?)
}
