//! Transport interface for JSON-RPC communication
//!
//! The core never talks to the network directly; everything goes through the
//! object-safe [`Transport`] trait. [`HttpTransport`] is the shipped
//! implementation, [`MockTransport`] backs the tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::ContractError;

/// Object-safe JSON-RPC transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the `result` payload.
    async fn request_json(&self, method: &str, params: Vec<Value>)
        -> Result<Value, ContractError>;
}

/// One request observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// RPC method name
    pub method: String,
    /// Positional parameters as sent
    pub params: Vec<Value>,
}

/// In-memory transport for tests.
///
/// Responses are served from per-method FIFO queues first, then from sticky
/// defaults. Every request is recorded so tests can assert how many network
/// calls an operation performed.
pub struct MockTransport {
    queued: Mutex<HashMap<String, VecDeque<Result<Value, ContractError>>>>,
    defaults: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// Create a mock with defaults for the common methods.
    pub fn new() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert("eth_gasPrice".to_string(), Value::String("0x3b9aca00".into()));
        defaults.insert("eth_blockNumber".to_string(), Value::String("0x100".into()));
        defaults.insert("eth_estimateGas".to_string(), Value::String("0x5208".into()));
        defaults.insert("eth_getTransactionCount".to_string(), Value::String("0x0".into()));
        defaults.insert("eth_call".to_string(), Value::String("0x".into()));
        defaults.insert("eth_getTransactionReceipt".to_string(), Value::Null);
        let tx_hash =
            "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b".to_string();
        defaults.insert("eth_sendTransaction".to_string(), Value::String(tx_hash.clone()));
        defaults.insert("eth_sendRawTransaction".to_string(), Value::String(tx_hash));

        Self {
            queued: Mutex::new(HashMap::new()),
            defaults: Mutex::new(defaults),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set a sticky response for a method, replacing the default.
    pub fn set_response(&self, method: &str, response: Value) {
        self.defaults.lock().insert(method.to_string(), response);
    }

    /// Queue a one-shot response; queued entries are served before defaults.
    pub fn push_response(&self, method: &str, response: Value) {
        self.queued
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    /// Queue a one-shot error.
    pub fn push_error(&self, method: &str, error: ContractError) {
        self.queued
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// All requests observed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of requests observed for one method.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.method == method).count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ContractError> {
        self.calls.lock().push(RecordedCall {
            method: method.to_string(),
            params,
        });

        if let Some(queue) = self.queued.lock().get_mut(method) {
            if let Some(next) = queue.pop_front() {
                return next;
            }
        }

        if let Some(default) = self.defaults.lock().get(method).cloned() {
            return Ok(default);
        }

        Err(ContractError::Rpc {
            code: -32601,
            message: format!("Method not found: {}", method),
        })
    }
}

/// HTTP transport speaking JSON-RPC 2.0.
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport posting to the given endpoint URL.
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ContractError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.next_id(),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ContractError::Transport(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ContractError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(ContractError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response.result.ok_or_else(|| ContractError::Rpc {
            code: -32603,
            message: "No result in response".to_string(),
        })
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}
