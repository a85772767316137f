//! Result handle: one-shot completion plus a progress-event stream
//!
//! A [`ResultHandle`] is what every submission returns: it settles exactly
//! once with a receipt or an error, and before settling it delivers an
//! ordered sequence of named progress events. Both channels close together
//! at settlement. The settle-once guarantee is structural — the completion
//! sender is consumed by the first settle and simply cannot fire twice.

use keel_primitives::H256;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::types::Receipt;
use crate::ContractError;

/// Progress event emitted while a transaction is being tracked.
#[derive(Debug, Clone)]
pub enum TxEvent {
    /// Submission accepted; carries the transaction hash
    TransactionHash(H256),
    /// Receipt obtained (the transaction is mined)
    Receipt(Receipt),
    /// One more confirmation observed
    Confirmation {
        /// Running confirmation count, strictly increasing
        count: u32,
        /// Latest receipt
        receipt: Receipt,
    },
    /// Terminal failure; always precedes the handle's rejection
    Error(ContractError),
}

/// Sender half owned by the confirmation workflow.
///
/// Settling takes both senders, which closes the event channel at the same
/// moment the outcome fires; neither channel can deliver anything afterwards.
pub(crate) struct Completion {
    outcome: Option<oneshot::Sender<Result<Receipt, ContractError>>>,
    events: Option<mpsc::UnboundedSender<TxEvent>>,
}

impl Completion {
    /// Emit a progress event. Silently dropped after settlement.
    pub(crate) fn emit(&self, event: TxEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    /// Settle successfully. No-op if already settled.
    pub(crate) fn resolve(&mut self, receipt: Receipt) {
        if let Some(tx) = self.outcome.take() {
            let _ = tx.send(Ok(receipt));
        }
        self.events = None;
    }

    /// Settle with an error, emitting the `Error` event first so
    /// event-only consumers observe the failure too. No-op if settled.
    pub(crate) fn reject(&mut self, error: ContractError) {
        if let Some(tx) = self.outcome.take() {
            self.emit(TxEvent::Error(error.clone()));
            let _ = tx.send(Err(error));
        }
        self.events = None;
    }

    /// Whether a terminal outcome has been delivered.
    pub(crate) fn is_settled(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Handle to one tracked transaction.
pub struct ResultHandle {
    transaction_hash: Option<H256>,
    outcome: oneshot::Receiver<Result<Receipt, ContractError>>,
    events: mpsc::UnboundedReceiver<TxEvent>,
    task: Option<JoinHandle<()>>,
}

impl ResultHandle {
    /// Create a connected (sender, handle) pair.
    pub(crate) fn channel(transaction_hash: Option<H256>) -> (Completion, ResultHandle) {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Completion {
                outcome: Some(outcome_tx),
                events: Some(events_tx),
            },
            ResultHandle {
                transaction_hash,
                outcome: outcome_rx,
                events: events_rx,
                task: None,
            },
        )
    }

    /// Create a handle that is already rejected. Used when validation
    /// fails before any network I/O.
    pub(crate) fn rejected(error: ContractError) -> ResultHandle {
        let (mut completion, handle) = Self::channel(None);
        completion.reject(error);
        handle
    }

    /// Attach the polling task so cancellation can stop it.
    pub(crate) fn attach_task(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }

    /// Hash of the tracked transaction, when submission succeeded.
    pub fn transaction_hash(&self) -> Option<&H256> {
        self.transaction_hash.as_ref()
    }

    /// Next progress event, or `None` once the event channel is closed
    /// and drained.
    pub async fn next_event(&mut self) -> Option<TxEvent> {
        self.events.recv().await
    }

    /// Wait for the terminal outcome, consuming the handle. Buffered
    /// progress events are discarded.
    pub async fn wait(mut self) -> Result<Receipt, ContractError> {
        match (&mut self.outcome).await {
            Ok(result) => result,
            // The workflow was dropped without settling (cancelled)
            Err(_) => Err(ContractError::Transport(
                "confirmation workflow stopped before settling".into(),
            )),
        }
    }

    /// Stop tracking: aborts the polling workflow and drops all state.
    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ResultHandle {
    // Detaching from the handle stops the polling task promptly
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultHandle")
            .field("transaction_hash", &self.transaction_hash)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxStatus;

    fn test_receipt() -> Receipt {
        Receipt {
            transaction_hash: H256::from_bytes([1u8; 32]),
            block_number: Some(1),
            block_hash: None,
            status: TxStatus::Success,
            gas_used: 21000,
            contract_address: None,
            logs: vec![],
        }
    }

    #[tokio::test]
    async fn test_resolves_once() {
        let (mut completion, handle) = ResultHandle::channel(None);
        completion.resolve(test_receipt());
        assert!(completion.is_settled());

        // A second resolve is a structural no-op
        completion.resolve(test_receipt());

        let receipt = handle.wait().await.unwrap();
        assert_eq!(receipt.gas_used, 21000);
    }

    #[tokio::test]
    async fn test_events_before_resolution_are_delivered() {
        let (mut completion, mut handle) = ResultHandle::channel(None);
        let hash = H256::from_bytes([2u8; 32]);
        completion.emit(TxEvent::TransactionHash(hash));
        completion.emit(TxEvent::Receipt(test_receipt()));
        completion.resolve(test_receipt());

        assert!(matches!(
            handle.next_event().await,
            Some(TxEvent::TransactionHash(h)) if h == hash
        ));
        assert!(matches!(handle.next_event().await, Some(TxEvent::Receipt(_))));
        // Channel closed after settlement, no further events
        assert!(handle.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_no_events_after_settlement() {
        let (mut completion, mut handle) = ResultHandle::channel(None);
        completion.resolve(test_receipt());
        completion.emit(TxEvent::TransactionHash(H256::ZERO));
        assert!(handle.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_rejection_emits_error_event_first() {
        let (mut completion, mut handle) = ResultHandle::channel(None);
        completion.reject(ContractError::Transport("gone".into()));

        assert!(matches!(handle.next_event().await, Some(TxEvent::Error(_))));
        assert!(handle.next_event().await.is_none());
        assert!(matches!(
            handle.wait().await,
            Err(ContractError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_pre_rejected_handle() {
        let handle = ResultHandle::rejected(ContractError::Validation("bad".into()));
        assert!(handle.transaction_hash().is_none());
        assert!(matches!(
            handle.wait().await,
            Err(ContractError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_wait_after_events_consumed() {
        let (mut completion, mut handle) = ResultHandle::channel(Some(H256::ZERO));
        completion.emit(TxEvent::TransactionHash(H256::ZERO));
        completion.resolve(test_receipt());

        assert!(matches!(
            handle.next_event().await,
            Some(TxEvent::TransactionHash(_))
        ));
        assert!(handle.wait().await.is_ok());
    }
}
