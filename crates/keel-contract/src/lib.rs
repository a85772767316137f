//! # keel-contract
//!
//! Client library for invoking smart-contract functions over JSON-RPC and
//! tracking the resulting transactions through confirmation.
//!
//! ## Features
//!
//! - **AbiModel**: function descriptors with overload resolution
//! - **Contract**: method proxy yielding invocation builders
//! - **Dispatcher**: routing between call, send, estimate, and local signing
//! - **ResultHandle**: awaitable outcome plus ordered progress events
//! - **ABI**: Solidity ABI encoding and decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keel_contract::abi::{AbiItemDescriptor, AbiModel, Param, ParamType, StateMutability, Token};
//! use keel_contract::{
//!     BlockId, Contract, Dispatcher, MockTransport, TransactionOptions, TxEvent,
//! };
//! use keel_primitives::{Address, U256};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let abi = AbiModel::from_items([
//!         AbiItemDescriptor::function(
//!             "balanceOf",
//!             StateMutability::View,
//!             vec![Param::new("owner", ParamType::Address)],
//!             vec![Param::new("balance", ParamType::Uint(256))],
//!         ),
//!         AbiItemDescriptor::function(
//!             "transfer",
//!             StateMutability::NonPayable,
//!             vec![
//!                 Param::new("to", ParamType::Address),
//!                 Param::new("amount", ParamType::Uint(256)),
//!             ],
//!             vec![Param::new("success", ParamType::Bool)],
//!         ),
//!     ]);
//!
//!     let dispatcher = Arc::new(Dispatcher::new(Arc::new(MockTransport::new())));
//!     let token = Address::from_hex("0x6b175474e89094c44da98b954eedeac495271d0f")?;
//!     let contract = Contract::new(token, abi, dispatcher);
//!
//!     // Read path: resolves immediately with decoded outputs
//!     let owner = Address::from_hex("0x742d35cc6634c0532925a3b844bc9e7595f0ab3d")?;
//!     let balance = contract
//!         .method("balanceOf", vec![Token::Address(owner)])?
//!         .call(BlockId::Latest)
//!         .await?;
//!     println!("balance: {:?}", balance);
//!
//!     // Write path: submit, then follow progress events until settlement
//!     let mut handle = contract
//!         .method(
//!             "transfer",
//!             vec![Token::Address(owner), Token::Uint(U256::from(1000u64))],
//!         )?
//!         .send(TransactionOptions::default().from(owner))
//!         .await;
//!
//!     while let Some(event) = handle.next_event().await {
//!         if let TxEvent::Confirmation { count, .. } = event {
//!             println!("confirmation {count}");
//!         }
//!     }
//!     let receipt = handle.wait().await?;
//!     println!("mined in block {:?}", receipt.block_number);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
mod confirm;
mod dispatch;
mod error;
mod handle;
mod options;
mod proxy;
mod rpc;
mod signer;
mod transport;
pub mod types;

// Re-export main types
pub use confirm::ConfirmOptions;
pub use dispatch::{DispatchRequest, Dispatcher, Execution};
pub use error::ContractError;
pub use handle::{ResultHandle, TxEvent};
pub use options::{TransactionDefaults, TransactionOptions};
pub use proxy::{Contract, MethodInvocation};
pub use rpc::{Callback, RpcMethodModel, RpcOutcome, RpcVerb};
pub use signer::{SignedPayload, Signer};
pub use transport::{MockTransport, Transport};
pub use types::{BlockId, CallRequest, Log, Receipt, TxStatus};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export primitives for convenience
pub use keel_primitives::{Address, H256, U256};
