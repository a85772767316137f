//! Wire types for JSON-RPC requests and responses

use bytes::Bytes;
use keel_primitives::{
    format_quantity, format_u256, parse_hex_bytes, parse_hex_u64, Address, H256, U256,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Block identifier for read queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Specific block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
    /// Earliest block (genesis)
    Earliest,
}

impl Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            BlockId::Number(n) => serializer.serialize_str(&format!("0x{:x}", n)),
            BlockId::Latest => serializer.serialize_str("latest"),
            BlockId::Pending => serializer.serialize_str("pending"),
            BlockId::Earliest => serializer.serialize_str("earliest"),
        }
    }
}

/// Request body for `eth_call`, `eth_estimateGas`, and `eth_sendTransaction`.
///
/// All quantities serialize as minimal 0x-hex strings; absent fields are
/// omitted from the map entirely.
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient address (absent for deployment)
    pub to: Option<Address>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Gas price
    pub gas_price: Option<u128>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Call data
    pub data: Option<Bytes>,
    /// Sender nonce
    pub nonce: Option<u64>,
}

impl Serialize for CallRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        if let Some(from) = &self.from {
            map.serialize_entry("from", &from.to_hex())?;
        }
        if let Some(to) = &self.to {
            map.serialize_entry("to", &to.to_hex())?;
        }
        if let Some(gas) = &self.gas {
            map.serialize_entry("gas", &format_quantity(*gas as u128))?;
        }
        if let Some(gas_price) = &self.gas_price {
            map.serialize_entry("gasPrice", &format_quantity(*gas_price))?;
        }
        if let Some(value) = &self.value {
            map.serialize_entry("value", &format_u256(value))?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", &format!("0x{}", hex::encode(data)))?;
        }
        if let Some(nonce) = &self.nonce {
            map.serialize_entry("nonce", &format_quantity(*nonce as u128))?;
        }
        map.end()
    }
}

/// Outcome status reported in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Transaction reverted
    Failure,
    /// Transaction succeeded
    Success,
}

impl From<bool> for TxStatus {
    fn from(success: bool) -> Self {
        if success {
            TxStatus::Success
        } else {
            TxStatus::Failure
        }
    }
}

/// A log entry emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics
    pub topics: Vec<H256>,
    /// Non-indexed data
    pub data: Bytes,
}

impl<'de> Deserialize<'de> for Log {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawLog {
            address: Address,
            #[serde(default)]
            topics: Vec<H256>,
            #[serde(default)]
            data: Option<String>,
        }

        let raw = RawLog::deserialize(deserializer)?;
        let data = match raw.data {
            Some(s) => Bytes::from(parse_hex_bytes(&s).map_err(serde::de::Error::custom)?),
            None => Bytes::new(),
        };
        Ok(Log {
            address: raw.address,
            topics: raw.topics,
            data,
        })
    }
}

/// Node-reported outcome of a submitted transaction.
///
/// `block_number == None` means the transaction is known but not yet mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the transaction this receipt belongs to
    pub transaction_hash: H256,
    /// Containing block number, once mined
    pub block_number: Option<u64>,
    /// Containing block hash, once mined
    pub block_hash: Option<H256>,
    /// Execution status
    pub status: TxStatus,
    /// Gas consumed by this transaction
    pub gas_used: u64,
    /// Created contract address (deployment transactions only)
    pub contract_address: Option<Address>,
    /// Emitted logs
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Whether execution succeeded
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }

    /// Whether the transaction has been included in a block
    pub fn is_mined(&self) -> bool {
        self.block_number.is_some()
    }
}

impl<'de> Deserialize<'de> for Receipt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawReceipt {
            transaction_hash: H256,
            #[serde(default)]
            block_number: Option<String>,
            #[serde(default)]
            block_hash: Option<H256>,
            // Nodes predating status receipts omit the field; treat as success
            #[serde(default)]
            status: Option<String>,
            #[serde(default)]
            gas_used: Option<String>,
            #[serde(default)]
            contract_address: Option<Address>,
            #[serde(default)]
            logs: Vec<Log>,
        }

        let raw = RawReceipt::deserialize(deserializer)?;

        let block_number = raw
            .block_number
            .map(|s| parse_hex_u64(&s))
            .transpose()
            .map_err(serde::de::Error::custom)?;
        let status = match raw.status.as_deref() {
            Some(s) => {
                let v = parse_hex_u64(s).map_err(serde::de::Error::custom)?;
                TxStatus::from(v != 0)
            }
            None => TxStatus::Success,
        };
        let gas_used = raw
            .gas_used
            .map(|s| parse_hex_u64(&s))
            .transpose()
            .map_err(serde::de::Error::custom)?
            .unwrap_or(0);

        Ok(Receipt {
            transaction_hash: raw.transaction_hash,
            block_number,
            block_hash: raw.block_hash,
            status,
            gas_used,
            contract_address: raw.contract_address,
            logs: raw.logs,
        })
    }
}
