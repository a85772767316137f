//! End-to-end contract invocation tests
//!
//! Exercises the full path from method resolution through encoding,
//! dispatch, and confirmation tracking against a scripted transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use keel_contract::abi::{AbiItemDescriptor, AbiModel, Param, ParamType, StateMutability, Token};
use keel_contract::{
    Address, BlockId, Callback, ConfirmOptions, Contract, ContractError, Dispatcher,
    MockTransport, RpcOutcome, TransactionOptions, TxEvent, U256,
};
use serde_json::{json, Value};

const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

fn erc20() -> AbiModel {
    AbiModel::from_items([
        AbiItemDescriptor::function(
            "balanceOf",
            StateMutability::View,
            vec![Param::new("owner", ParamType::Address)],
            vec![Param::new("balance", ParamType::Uint(256))],
        ),
        AbiItemDescriptor::function(
            "transfer",
            StateMutability::NonPayable,
            vec![
                Param::parse("to", "address").unwrap(),
                Param::parse("amount", "uint256").unwrap(),
            ],
            vec![Param::new("success", ParamType::Bool)],
        ),
        AbiItemDescriptor::function(
            "decimals",
            StateMutability::Pure,
            vec![],
            vec![Param::new("", ParamType::Uint(8))],
        ),
    ])
}

fn token_address() -> Address {
    Address::from_hex("0x6b175474e89094c44da98b954eedeac495271d0f").unwrap()
}

fn holder() -> Address {
    Address::from_hex("0x00a329c0648769a73afac7f9381e08fb43dbea72").unwrap()
}

fn fast_confirm() -> ConfirmOptions {
    ConfirmOptions {
        poll_interval: Duration::from_millis(1),
        target_confirmations: 1,
        timeout: Some(Duration::from_secs(5)),
        max_poll_retries: 3,
    }
}

fn contract(transport: Arc<MockTransport>) -> Contract {
    let dispatcher = Arc::new(Dispatcher::new(transport).confirm_options(fast_confirm()));
    Contract::new(token_address(), erc20(), dispatcher)
}

fn mined_receipt() -> Value {
    json!({
        "transactionHash": TX_HASH,
        "blockNumber": "0x10",
        "blockHash": "0x00000000000000000000000000000000000000000000000000000000000000aa",
        "status": "0x1",
        "gasUsed": "0x5208",
        "logs": []
    })
}

// ==================== Read Path Tests ====================

#[tokio::test]
async fn test_view_call_decodes_balance() {
    let transport = Arc::new(MockTransport::new());
    transport.set_response("eth_call", json!(format!("0x{:0>64}", "de0b6b3a7640000")));
    let contract = contract(transport.clone());

    let tokens = contract
        .method("balanceOf", vec![Token::Address(holder())])
        .unwrap()
        .call(BlockId::Latest)
        .await
        .unwrap();

    assert_eq!(
        tokens,
        vec![Token::Uint(U256::from(1_000_000_000_000_000_000u64))]
    );
    // Read path: no gas price lookup, no submission, no receipt polling
    assert_eq!(transport.call_count("eth_call"), 1);
    assert_eq!(transport.call_count("eth_gasPrice"), 0);
    assert_eq!(transport.call_count("eth_sendTransaction"), 0);
    assert_eq!(transport.call_count("eth_getTransactionReceipt"), 0);
}

#[tokio::test]
async fn test_zero_argument_call() {
    let transport = Arc::new(MockTransport::new());
    transport.set_response("eth_call", json!(format!("0x{:0>64}", "12")));
    let contract = contract(transport.clone());

    let tokens = contract
        .method("decimals", vec![])
        .unwrap()
        .call(BlockId::Latest)
        .await
        .unwrap();
    assert_eq!(tokens, vec![Token::Uint(U256::from(18u64))]);

    // Zero-argument calls send the bare 4-byte selector
    let data = transport.calls()[0].params[0]["data"].as_str().unwrap().to_string();
    assert_eq!(data.len(), 2 + 8);
}

#[tokio::test]
async fn test_call_against_numbered_block() {
    let transport = Arc::new(MockTransport::new());
    let contract = contract(transport.clone());

    let _ = contract
        .method("decimals", vec![])
        .unwrap()
        .call(BlockId::Number(0x1234))
        .await;

    assert_eq!(transport.calls()[0].params[1], json!("0x1234"));
}

// ==================== Submission Tests ====================

#[tokio::test]
async fn test_transfer_encodes_known_selector() {
    let contract = contract(Arc::new(MockTransport::new()));
    let data = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(1u64))],
        )
        .unwrap()
        .encode()
        .unwrap();

    // keccak256("transfer(address,uint256)")[..4]
    assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
}

#[tokio::test]
async fn test_send_fetches_gas_price_exactly_once() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response("eth_getTransactionReceipt", mined_receipt());
    let contract = contract(transport.clone());

    let handle = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(10u64))],
        )
        .unwrap()
        .send(TransactionOptions::default().from(holder()))
        .await;

    assert!(handle.wait().await.is_ok());
    assert_eq!(transport.call_count("eth_gasPrice"), 1);
}

#[tokio::test]
async fn test_explicit_gas_price_skips_lookup() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response("eth_getTransactionReceipt", mined_receipt());
    let contract = contract(transport.clone());

    let handle = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(10u64))],
        )
        .unwrap()
        .send(
            TransactionOptions::default()
                .from(holder())
                .gas_price(2_000_000_000),
        )
        .await;

    assert!(handle.wait().await.is_ok());
    assert_eq!(transport.call_count("eth_gasPrice"), 0);
    assert_eq!(
        transport.calls()[0].params[0]["gasPrice"],
        json!("0x77359400")
    );
}

#[tokio::test]
async fn test_send_events_arrive_in_order() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response("eth_getTransactionReceipt", mined_receipt());
    let contract = contract(transport);

    let mut handle = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(10u64))],
        )
        .unwrap()
        .send(TransactionOptions::default().from(holder()))
        .await;

    let mut kinds = Vec::new();
    while let Some(event) = handle.next_event().await {
        kinds.push(match event {
            TxEvent::TransactionHash(_) => "hash",
            TxEvent::Receipt(_) => "receipt",
            TxEvent::Confirmation { .. } => "confirmation",
            TxEvent::Error(_) => "error",
        });
    }
    assert_eq!(kinds, vec!["hash", "receipt", "confirmation"]);
    assert!(handle.wait().await.is_ok());
}

#[tokio::test]
async fn test_callback_receives_transaction_hash() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response("eth_getTransactionReceipt", mined_receipt());
    let contract = contract(transport);

    let fired = Arc::new(AtomicUsize::new(0));
    let fired_in_callback = fired.clone();
    let callback: Callback = Box::new(move |result| {
        assert!(matches!(result, Ok(RpcOutcome::TransactionHash(_))));
        fired_in_callback.fetch_add(1, Ordering::SeqCst);
    });

    let handle = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(10u64))],
        )
        .unwrap()
        .callback(callback)
        .send(TransactionOptions::default().from(holder()))
        .await;

    assert!(handle.wait().await.is_ok());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

// ==================== Failure Tests ====================

#[tokio::test]
async fn test_arity_mismatch_makes_no_network_calls() {
    let transport = Arc::new(MockTransport::new());
    let contract = contract(transport.clone());

    let result = contract.method("transfer", vec![Token::Address(holder())]);
    assert!(matches!(
        result,
        Err(ContractError::ArityMismatch { got: 1, .. })
    ));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_failure_visible_to_callback_events_and_wait() {
    let transport = Arc::new(MockTransport::new());
    let contract = contract(transport.clone());

    let callback_errors = Arc::new(AtomicUsize::new(0));
    let counter = callback_errors.clone();
    let callback: Callback = Box::new(move |result| {
        if result.is_err() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    // Missing `from` fails validation before any I/O
    let mut handle = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(10u64))],
        )
        .unwrap()
        .callback(callback)
        .send(TransactionOptions::default())
        .await;

    assert!(matches!(
        handle.next_event().await,
        Some(TxEvent::Error(ContractError::Validation(_)))
    ));
    assert!(handle.next_event().await.is_none());
    assert!(matches!(
        handle.wait().await,
        Err(ContractError::Validation(_))
    ));
    assert_eq!(callback_errors.load(Ordering::SeqCst), 1);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_reverted_transaction_rejects_handle() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response(
        "eth_getTransactionReceipt",
        json!({
            "transactionHash": TX_HASH,
            "blockNumber": "0x10",
            "status": "0x0",
            "gasUsed": "0x5208",
            "logs": []
        }),
    );
    let contract = contract(transport);

    let handle = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(10u64))],
        )
        .unwrap()
        .send(TransactionOptions::default().from(holder()))
        .await;

    assert!(matches!(
        handle.wait().await,
        Err(ContractError::TransactionReverted(_))
    ));
}

#[tokio::test]
async fn test_node_rejection_surfaces_rpc_error() {
    let transport = Arc::new(MockTransport::new());
    transport.push_error(
        "eth_sendTransaction",
        ContractError::Rpc {
            code: -32000,
            message: "nonce too low".into(),
        },
    );
    let contract = contract(transport);

    let handle = contract
        .method(
            "transfer",
            vec![Token::Address(holder()), Token::Uint(U256::from(10u64))],
        )
        .unwrap()
        .send(TransactionOptions::default().from(holder()))
        .await;

    assert!(matches!(
        handle.wait().await,
        Err(ContractError::Rpc { code: -32000, .. })
    ));
}

// ==================== Concurrency Tests ====================

#[tokio::test]
async fn test_concurrent_sends_are_independent() {
    let transport = Arc::new(MockTransport::new());
    transport.set_response("eth_getTransactionReceipt", mined_receipt());
    // First submission fails, second succeeds
    transport.push_error(
        "eth_sendTransaction",
        ContractError::Transport("connection reset".into()),
    );
    let contract = contract(transport.clone());

    let args = vec![Token::Address(holder()), Token::Uint(U256::from(10u64))];
    let failing = contract
        .method("transfer", args.clone())
        .unwrap()
        .send(TransactionOptions::default().from(holder()));
    let succeeding = contract
        .method("transfer", args)
        .unwrap()
        .send(TransactionOptions::default().from(holder()));

    let (failing, succeeding) = tokio::join!(failing, succeeding);
    assert!(matches!(
        failing.wait().await,
        Err(ContractError::Transport(_))
    ));
    assert!(succeeding.wait().await.is_ok());
    // Each submission fetched the gas price for itself
    assert_eq!(transport.call_count("eth_gasPrice"), 2);
}

#[tokio::test]
async fn test_estimate_and_call_share_a_contract() {
    let transport = Arc::new(MockTransport::new());
    transport.set_response("eth_call", json!(format!("0x{:0>64}", "1")));
    let contract = contract(transport.clone());

    let args = vec![Token::Address(holder()), Token::Uint(U256::from(10u64))];
    let gas = contract
        .method("transfer", args.clone())
        .unwrap()
        .estimate_gas(TransactionOptions::default().from(holder()))
        .await
        .unwrap();
    assert_eq!(gas, 21_000);

    let result = contract
        .method("balanceOf", vec![Token::Address(holder())])
        .unwrap()
        .call(BlockId::Latest)
        .await
        .unwrap();
    assert_eq!(result, vec![Token::Uint(U256::from(1u64))]);
}
