//! Transaction-confirmation workflow
//!
//! After submission, a spawned task walks the state machine
//! `Pending → Mined → Confirming → Finalized` (with `Failed` reachable from
//! any non-terminal state), polling the node for the receipt and then for
//! chain-head advancement. Progress is reported through the paired
//! [`ResultHandle`]; the task owns its [`ConfirmationState`] and releases
//! it on termination or cancellation. One workflow per transaction; a
//! failure in one never touches another.

use std::sync::Arc;
use std::time::Duration;

use keel_primitives::{parse_hex_u64, H256};
use serde_json::Value;
use tokio::time::{sleep, Instant};

use crate::handle::{Completion, ResultHandle, TxEvent};
use crate::transport::Transport;
use crate::types::Receipt;
use crate::ContractError;

/// Tuning knobs for confirmation tracking.
#[derive(Debug, Clone)]
pub struct ConfirmOptions {
    /// Delay between receipt / chain-head polls
    pub poll_interval: Duration,
    /// Confirmations required before the handle resolves. The block
    /// containing the transaction counts as the first confirmation, so the
    /// default of 1 resolves as soon as the receipt is mined.
    pub target_confirmations: u32,
    /// Bound on total wait time; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Consecutive transport/RPC errors tolerated while polling before the
    /// workflow fails
    pub max_poll_retries: u32,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            target_confirmations: 1,
            timeout: Some(Duration::from_secs(300)),
            max_poll_retries: 3,
        }
    }
}

/// Phase of one tracked transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Mined,
    Confirming,
    Finalized,
    Failed,
}

/// State owned by one workflow task.
struct ConfirmationState {
    transaction_hash: H256,
    receipt: Option<Receipt>,
    confirmations_seen: u32,
    target_confirmations: u32,
    phase: Phase,
}

/// Spawn a workflow tracking `hash` and return its handle immediately.
pub(crate) fn spawn(
    transport: Arc<dyn Transport>,
    options: ConfirmOptions,
    hash: H256,
) -> ResultHandle {
    let (completion, mut handle) = ResultHandle::channel(Some(hash));
    let task = tokio::spawn(run(transport, options, hash, completion));
    handle.attach_task(task);
    handle
}

async fn run(
    transport: Arc<dyn Transport>,
    options: ConfirmOptions,
    hash: H256,
    mut completion: Completion,
) {
    let mut state = ConfirmationState {
        transaction_hash: hash,
        receipt: None,
        confirmations_seen: 0,
        target_confirmations: options.target_confirmations.max(1),
        phase: Phase::Pending,
    };
    let deadline = options.timeout.map(|t| Instant::now() + t);

    completion.emit(TxEvent::TransactionHash(hash));

    if let Err(error) = drive(&transport, &options, deadline, &mut state, &completion).await {
        state.phase = Phase::Failed;
        tracing::debug!(
            tx = %state.transaction_hash,
            error = %error,
            "confirmation workflow failed"
        );
        completion.reject(error);
        return;
    }

    // Finalized: resolve with the mined receipt
    if let Some(receipt) = state.receipt.take() {
        completion.resolve(receipt);
    }
}

async fn drive(
    transport: &Arc<dyn Transport>,
    options: &ConfirmOptions,
    deadline: Option<Instant>,
    state: &mut ConfirmationState,
    completion: &Completion,
) -> Result<(), ContractError> {
    let mut retries_left = options.max_poll_retries;

    // Pending: wait for a mined receipt
    let receipt = loop {
        check_deadline(deadline, state, options)?;

        match fetch_receipt(transport.as_ref(), &state.transaction_hash).await {
            Ok(Some(receipt)) if receipt.is_mined() => break receipt,
            Ok(_) => {
                tracing::trace!(tx = %state.transaction_hash, "receipt not yet available");
                retries_left = options.max_poll_retries;
            }
            Err(error) => {
                if retries_left == 0 {
                    return Err(error);
                }
                retries_left -= 1;
                tracing::warn!(
                    tx = %state.transaction_hash,
                    error = %error,
                    retries_left,
                    "receipt poll failed, retrying"
                );
            }
        }
        sleep(options.poll_interval).await;
    };

    state.phase = Phase::Mined;
    tracing::debug!(tx = %state.transaction_hash, phase = ?state.phase, "receipt found");
    completion.emit(TxEvent::Receipt(receipt.clone()));

    if !receipt.is_success() {
        return Err(ContractError::TransactionReverted(state.transaction_hash));
    }

    let receipt_block = receipt
        .block_number
        .ok_or_else(|| ContractError::Decoding("mined receipt without block number".into()))?;
    state.receipt = Some(receipt);
    state.phase = Phase::Confirming;

    let mut retries_left = options.max_poll_retries;
    loop {
        check_deadline(deadline, state, options)?;

        match fetch_block_number(transport.as_ref()).await {
            Ok(head) => {
                retries_left = options.max_poll_retries;
                // Containing block is confirmation 1
                let available = head
                    .checked_sub(receipt_block)
                    .map(|d| (d + 1).min(u64::from(state.target_confirmations)) as u32)
                    .unwrap_or(0);

                while state.confirmations_seen < available {
                    state.confirmations_seen += 1;
                    let receipt = state
                        .receipt
                        .clone()
                        .ok_or_else(|| ContractError::Decoding("receipt lost".into()))?;
                    completion.emit(TxEvent::Confirmation {
                        count: state.confirmations_seen,
                        receipt,
                    });
                }

                if state.confirmations_seen >= state.target_confirmations {
                    state.phase = Phase::Finalized;
                    tracing::debug!(
                        tx = %state.transaction_hash,
                        confirmations = state.confirmations_seen,
                        phase = ?state.phase,
                        "transaction confirmed"
                    );
                    return Ok(());
                }
            }
            Err(error) => {
                if retries_left == 0 {
                    return Err(error);
                }
                retries_left -= 1;
                tracing::warn!(
                    tx = %state.transaction_hash,
                    error = %error,
                    retries_left,
                    "chain-head poll failed, retrying"
                );
            }
        }
        sleep(options.poll_interval).await;
    }
}

fn check_deadline(
    deadline: Option<Instant>,
    state: &ConfirmationState,
    options: &ConfirmOptions,
) -> Result<(), ContractError> {
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return Err(ContractError::ConfirmationTimeout {
                hash: state.transaction_hash,
                timeout: options.timeout.unwrap_or_default(),
            });
        }
    }
    Ok(())
}

async fn fetch_receipt(
    transport: &dyn Transport,
    hash: &H256,
) -> Result<Option<Receipt>, ContractError> {
    let value = transport
        .request_json(
            "eth_getTransactionReceipt",
            vec![Value::String(hash.to_hex())],
        )
        .await?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

async fn fetch_block_number(transport: &dyn Transport) -> Result<u64, ContractError> {
    let value = transport.request_json("eth_blockNumber", vec![]).await?;
    let text = value
        .as_str()
        .ok_or_else(|| ContractError::Decoding("block number is not a string".into()))?;
    Ok(parse_hex_u64(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::TxEvent;
    use crate::transport::MockTransport;
    use serde_json::json;

    const TX: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

    fn fast_options() -> ConfirmOptions {
        ConfirmOptions {
            poll_interval: Duration::from_millis(1),
            target_confirmations: 1,
            timeout: Some(Duration::from_secs(5)),
            max_poll_retries: 3,
        }
    }

    fn receipt_json(status: &str) -> Value {
        json!({
            "transactionHash": TX,
            "blockNumber": "0x10",
            "blockHash": "0x00000000000000000000000000000000000000000000000000000000000000aa",
            "status": status,
            "gasUsed": "0x5208",
            "logs": []
        })
    }

    #[tokio::test]
    async fn test_success_emits_ordered_events_and_resolves() {
        let transport = Arc::new(MockTransport::new());
        // First poll sees no receipt, second sees the mined one
        transport.push_response("eth_getTransactionReceipt", Value::Null);
        transport.push_response("eth_getTransactionReceipt", receipt_json("0x1"));

        let hash = H256::from_hex(TX).unwrap();
        let mut handle = spawn(transport.clone(), fast_options(), hash);

        assert!(matches!(
            handle.next_event().await,
            Some(TxEvent::TransactionHash(h)) if h == hash
        ));
        assert!(matches!(handle.next_event().await, Some(TxEvent::Receipt(_))));
        assert!(matches!(
            handle.next_event().await,
            Some(TxEvent::Confirmation { count: 1, .. })
        ));
        assert!(handle.next_event().await.is_none());

        let receipt = handle.wait().await.unwrap();
        assert_eq!(receipt.block_number, Some(0x10));
        assert!(transport.call_count("eth_getTransactionReceipt") >= 2);
    }

    #[tokio::test]
    async fn test_multiple_confirmations_strictly_increase() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response("eth_getTransactionReceipt", receipt_json("0x1"));
        // Head advances one block per poll starting at the receipt block
        transport.push_response("eth_blockNumber", Value::String("0x10".into()));
        transport.push_response("eth_blockNumber", Value::String("0x11".into()));
        transport.push_response("eth_blockNumber", Value::String("0x12".into()));

        let options = ConfirmOptions {
            target_confirmations: 3,
            ..fast_options()
        };
        let hash = H256::from_hex(TX).unwrap();
        let mut handle = spawn(transport, options, hash);

        let mut counts = Vec::new();
        while let Some(event) = handle.next_event().await {
            if let TxEvent::Confirmation { count, .. } = event {
                counts.push(count);
            }
        }
        assert_eq!(counts, vec![1, 2, 3]);
        assert!(handle.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_reverted_transaction_fails_with_error_event() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response("eth_getTransactionReceipt", receipt_json("0x0"));

        let hash = H256::from_hex(TX).unwrap();
        let mut handle = spawn(transport, fast_options(), hash);

        let mut saw_receipt = false;
        let mut saw_error = false;
        let mut saw_confirmation = false;
        while let Some(event) = handle.next_event().await {
            match event {
                TxEvent::Receipt(_) => saw_receipt = true,
                TxEvent::Error(ContractError::TransactionReverted(_)) => saw_error = true,
                TxEvent::Confirmation { .. } => saw_confirmation = true,
                _ => {}
            }
        }
        assert!(saw_receipt);
        assert!(saw_error);
        assert!(!saw_confirmation);
        assert!(matches!(
            handle.wait().await,
            Err(ContractError::TransactionReverted(_))
        ));
    }

    #[tokio::test]
    async fn test_times_out_when_never_mined() {
        let transport = Arc::new(MockTransport::new());
        // Default mock receipt response is null forever
        let options = ConfirmOptions {
            timeout: Some(Duration::from_millis(10)),
            ..fast_options()
        };
        let hash = H256::from_hex(TX).unwrap();
        let handle = spawn(transport, options, hash);

        assert!(matches!(
            handle.wait().await,
            Err(ContractError::ConfirmationTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_transient_poll_errors_are_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.push_error(
            "eth_getTransactionReceipt",
            ContractError::Transport("blip".into()),
        );
        transport.push_response("eth_getTransactionReceipt", receipt_json("0x1"));

        let hash = H256::from_hex(TX).unwrap();
        let handle = spawn(transport, fast_options(), hash);
        assert!(handle.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_persistent_poll_errors_escalate() {
        let transport = Arc::new(MockTransport::new());
        for _ in 0..8 {
            transport.push_error(
                "eth_getTransactionReceipt",
                ContractError::Transport("down".into()),
            );
        }
        transport.set_response("eth_getTransactionReceipt", Value::Null);

        let options = ConfirmOptions {
            max_poll_retries: 2,
            ..fast_options()
        };
        let hash = H256::from_hex(TX).unwrap();
        let handle = spawn(transport, options, hash);

        assert!(matches!(
            handle.wait().await,
            Err(ContractError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let transport = Arc::new(MockTransport::new());
        let hash = H256::from_hex(TX).unwrap();
        let handle = spawn(transport.clone(), fast_options(), hash);

        // Give the task a moment to start polling, then detach
        sleep(Duration::from_millis(5)).await;
        handle.cancel();
        sleep(Duration::from_millis(5)).await;

        let polls = transport.call_count("eth_getTransactionReceipt");
        sleep(Duration::from_millis(10)).await;
        assert_eq!(transport.call_count("eth_getTransactionReceipt"), polls);
    }
}
