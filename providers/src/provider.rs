//! The `Provider` trait surface and the `BlockTag` block-selector.
//!
//! Grounded on `ethers-providers/src/provider.rs`'s `Provider<P>` method list
//! (`get_balance`, `get_transaction_count`, `get_code`, `get_storage_at`,
//! `get_block_number`, `get_gas_price`, `call`, `estimate_gas`,
//! `send_raw_transaction`, `get_block`, `get_transaction`, ENS
//! `lookup_address`/`resolve_name`) and its `JsonRpcClient` split: the actual
//! HTTP transport is an external collaborator, so this crate defines only the
//! trait plus the polling/coercion/composition logic built on top of it.

use std::sync::Arc;

use ethers_lite_core::types::{Address, BigInt256, Hash, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ProviderError,
    json_path::{query_path, Coerced},
    promise::{MainExecutor, Promise},
};

fn bad_coercion(key: &str, found: &Coerced) -> ProviderError {
    ProviderError::BadResponse(format!("unexpected coercion for {key}: {found:?}"))
}

fn is_present(raw: &Value, key: &str) -> bool {
    matches!(raw.get(key), Some(value) if !value.is_null())
}

fn hash_at(raw: &Value, key: &str) -> crate::error::Result<Hash> {
    match query_path(raw, &format!("dictionary:{key}/hash"))? {
        Coerced::Hash(value) => Ok(value),
        other => Err(bad_coercion(key, &other)),
    }
}

fn address_at(raw: &Value, key: &str) -> crate::error::Result<Address> {
    match query_path(raw, &format!("dictionary:{key}/address"))? {
        Coerced::Address(value) => Ok(value),
        other => Err(bad_coercion(key, &other)),
    }
}

fn integer_hex_at(raw: &Value, key: &str) -> crate::error::Result<i64> {
    match query_path(raw, &format!("dictionary:{key}/integerHex"))? {
        Coerced::Integer(value) => Ok(value),
        other => Err(bad_coercion(key, &other)),
    }
}

fn big_number_hex_at(raw: &Value, key: &str) -> crate::error::Result<BigInt256> {
    match query_path(raw, &format!("dictionary:{key}/bigNumberHex"))? {
        Coerced::BigNumber(value) => Ok(value),
        other => Err(bad_coercion(key, &other)),
    }
}

fn data_at(raw: &Value, key: &str) -> crate::error::Result<Vec<u8>> {
    match query_path(raw, &format!("dictionary:{key}/data"))? {
        Coerced::Data(value) => Ok(value),
        other => Err(bad_coercion(key, &other)),
    }
}

fn transaction_hashes_at(raw: &Value, key: &str) -> crate::error::Result<Vec<Hash>> {
    let count = match raw.get(key) {
        Some(Value::Array(items)) => items.len(),
        Some(_) => return Err(ProviderError::BadResponse(format!("{key} is not an array"))),
        None => return Ok(Vec::new()),
    };
    (0..count).map(|i| hash_at(raw, &format!("{key}/array:{i}"))).collect()
}

/// A block selector: `Earliest` (0), `Latest` (-1), `Pending` (-2), or an
/// explicit block `Number` (>=1). Grounded on `Provider.h`'s `BLOCK_TAG_*`
/// integer constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    Earliest,
    Latest,
    Pending,
    Number(u64),
}

impl BlockTag {
    /// The wire-level integer encoding (`earliest=0`, `latest=-1`,
    /// `pending=-2`, block numbers `>=1`).
    pub fn to_i64(self) -> i64 {
        match self {
            Self::Earliest => 0,
            Self::Latest => -1,
            Self::Pending => -2,
            Self::Number(n) => n as i64,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Earliest),
            -1 => Some(Self::Latest),
            -2 => Some(Self::Pending),
            n if n >= 1 => Some(Self::Number(n as u64)),
            _ => None,
        }
    }
}

/// A fetched block, with every field `BlockInfo.h` documents as required.
/// `raw` stays around as an escape hatch for the fields that header leaves
/// commented out (`sha3Uncles`, `logsBloom`, `miner`, `uncles`, ...), reached
/// via [`crate::json_path::query_path`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub timestamp: u64,
    pub nonce: u64,
    pub extra_data: Vec<u8>,
    pub gas_limit: BigInt256,
    pub gas_used: BigInt256,
    pub transaction_hashes: Vec<Hash>,
    pub raw: Value,
}

impl Block {
    /// Populates every documented `BlockInfo.h` field from a raw
    /// `eth_getBlockByHash`/`eth_getBlockByNumber` result, keeping `raw`
    /// itself for whatever a caller needs beyond this list.
    pub fn from_raw(raw: Value) -> crate::error::Result<Self> {
        Ok(Self {
            number: integer_hex_at(&raw, "number")? as u64,
            hash: hash_at(&raw, "hash")?,
            parent_hash: hash_at(&raw, "parentHash")?,
            timestamp: integer_hex_at(&raw, "timestamp")? as u64,
            nonce: integer_hex_at(&raw, "nonce")? as u64,
            extra_data: data_at(&raw, "extraData")?,
            gas_limit: big_number_hex_at(&raw, "gasLimit")?,
            gas_used: big_number_hex_at(&raw, "gasUsed")?,
            transaction_hashes: transaction_hashes_at(&raw, "transactions")?,
            raw,
        })
    }
}

/// A fetched transaction, with every field `TransactionInfo.h` documents.
/// Fields that header's pending-transaction constructor leaves unset
/// (`blockHash`, `blockNumber`, `timestamp`, `cumulativeGasUsed`, `gasUsed`)
/// are `None` until the transaction is mined; `raw` remains the escape hatch
/// for anything beyond this list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub hash: Hash,
    pub block_hash: Option<Hash>,
    pub block_number: Option<u64>,
    pub timestamp: Option<u64>,
    pub contract_address: Option<Address>,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_limit: BigInt256,
    pub gas_price: BigInt256,
    pub gas_used: Option<BigInt256>,
    pub cumulative_gas_used: Option<BigInt256>,
    pub nonce: u64,
    pub data: Vec<u8>,
    pub value: BigInt256,
    pub raw: Value,
}

impl TransactionInfo {
    /// Populates every documented `TransactionInfo.h` field from a raw
    /// `eth_getTransactionBy*`/`eth_getTransactionReceipt`-shaped result.
    /// Block-dependent fields resolve to `None` on a pending transaction.
    pub fn from_raw(raw: Value) -> crate::error::Result<Self> {
        let block_number = if is_present(&raw, "blockNumber") {
            Some(integer_hex_at(&raw, "blockNumber")? as u64)
        } else {
            None
        };
        let block_hash =
            if is_present(&raw, "blockHash") { Some(hash_at(&raw, "blockHash")?) } else { None };
        let timestamp =
            if is_present(&raw, "timestamp") { Some(integer_hex_at(&raw, "timestamp")? as u64) } else { None };
        let contract_address = if is_present(&raw, "contractAddress") {
            Some(address_at(&raw, "contractAddress")?)
        } else {
            None
        };
        let to = if is_present(&raw, "to") { Some(address_at(&raw, "to")?) } else { None };
        let gas_used = if is_present(&raw, "gasUsed") {
            Some(big_number_hex_at(&raw, "gasUsed")?)
        } else {
            None
        };
        let cumulative_gas_used = if is_present(&raw, "cumulativeGasUsed") {
            Some(big_number_hex_at(&raw, "cumulativeGasUsed")?)
        } else {
            None
        };

        Ok(Self {
            hash: hash_at(&raw, "hash")?,
            block_hash,
            block_number,
            timestamp,
            contract_address,
            from: address_at(&raw, "from")?,
            to,
            gas_limit: big_number_hex_at(&raw, "gas")?,
            gas_price: big_number_hex_at(&raw, "gasPrice")?,
            gas_used,
            cumulative_gas_used,
            nonce: integer_hex_at(&raw, "nonce")? as u64,
            data: data_at(&raw, "input")?,
            value: big_number_hex_at(&raw, "value")?,
            raw,
        })
    }
}

pub type BigIntPromise = Promise<BigInt256>;
pub type U64Promise = Promise<u64>;
pub type BytesPromise = Promise<Vec<u8>>;
pub type HashPromise = Promise<Hash>;
pub type AddressPromise = Promise<Address>;
pub type StringPromise = Promise<String>;
pub type BlockPromise = Promise<Block>;
pub type TransactionPromise = Promise<TransactionInfo>;
pub type TransactionListPromise = Promise<Vec<TransactionInfo>>;
pub type FloatPromise = Promise<f64>;

/// The public read/write surface every backend (JSON-RPC transport,
/// `Fallback`, `RoundRobin`) implements. Each operation returns a typed
/// promise rather than blocking or `async fn`, per this specification's
/// no-async-runtime design.
pub trait Provider: Send + Sync {
    fn chain_id(&self) -> u64;

    fn executor(&self) -> Arc<dyn MainExecutor>;

    fn get_balance(&self, address: Address, tag: BlockTag) -> BigIntPromise;
    fn get_transaction_count(&self, address: Address, tag: BlockTag) -> U64Promise;
    fn get_code(&self, address: Address) -> BytesPromise;
    fn get_storage_at(&self, address: Address, position: BigInt256) -> Promise<[u8; 32]>;
    fn get_block_number(&self) -> U64Promise;
    fn get_gas_price(&self) -> BigIntPromise;
    fn call(&self, tx: &Transaction) -> BytesPromise;
    fn estimate_gas(&self, tx: &Transaction) -> BigIntPromise;
    fn send_transaction(&self, signed_bytes: &[u8]) -> HashPromise;
    fn get_block_by_hash(&self, hash: Hash) -> BlockPromise;
    fn get_block_by_tag(&self, tag: BlockTag) -> BlockPromise;
    fn get_transaction(&self, hash: Hash) -> TransactionPromise;
    fn get_transactions(&self, address: Address, start_tag: BlockTag) -> TransactionListPromise;
    fn get_ether_price(&self) -> FloatPromise;
    fn lookup_name(&self, name: &str) -> AddressPromise;
    fn lookup_address(&self, address: Address) -> StringPromise;
}

/// Rejects `promise`'s caller with [`ProviderError::NotImplemented`] —
/// convenience for backends that only implement a subset of `Provider`.
pub fn not_implemented<T: Clone + Send + 'static>(executor: Arc<dyn MainExecutor>) -> Promise<T> {
    Promise::rejected(executor, ProviderError::NotImplemented.into())
}

impl From<ProviderError> for crate::promise::PromiseError {
    fn from(error: ProviderError) -> Self {
        crate::promise::PromiseError::with_cause(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn block_tag_round_trips_reserved_values() {
        assert_eq!(BlockTag::Earliest.to_i64(), 0);
        assert_eq!(BlockTag::Latest.to_i64(), -1);
        assert_eq!(BlockTag::Pending.to_i64(), -2);
        assert_eq!(BlockTag::Number(42).to_i64(), 42);

        assert_eq!(BlockTag::from_i64(0), Some(BlockTag::Earliest));
        assert_eq!(BlockTag::from_i64(-1), Some(BlockTag::Latest));
        assert_eq!(BlockTag::from_i64(-2), Some(BlockTag::Pending));
        assert_eq!(BlockTag::from_i64(7), Some(BlockTag::Number(7)));
        assert_eq!(BlockTag::from_i64(-3), None);
    }

    fn sample_hash(byte: u8) -> String {
        format!("0x{}", hex::encode([byte; 32]))
    }

    fn sample_address(byte: u8) -> String {
        format!("0x{}", hex::encode([byte; 20]))
    }

    #[test]
    fn block_from_raw_populates_every_documented_field() {
        let raw = json!({
            "number": "0x10",
            "hash": sample_hash(0xaa),
            "parentHash": sample_hash(0xbb),
            "timestamp": "0x5f5e100",
            "nonce": "0x2a",
            "extraData": "0xdeadbeef",
            "gasLimit": "0x5208",
            "gasUsed": "0x5208",
            "transactions": [sample_hash(0x01), sample_hash(0x02)],
        });

        let block = Block::from_raw(raw).unwrap();
        assert_eq!(block.number, 16);
        assert_eq!(block.nonce, 42);
        assert_eq!(block.extra_data, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(block.gas_limit, BigInt256::from_u64(0x5208));
        assert_eq!(block.transaction_hashes.len(), 2);
    }

    #[test]
    fn transaction_info_from_raw_leaves_block_fields_none_when_pending() {
        let raw = json!({
            "hash": sample_hash(0xcc),
            "blockHash": Value::Null,
            "blockNumber": Value::Null,
            "from": sample_address(0x01),
            "to": sample_address(0x02),
            "gas": "0x5208",
            "gasPrice": "0x3b9aca00",
            "nonce": "0x0",
            "input": "0x",
            "value": "0xde0b6b3a7640000",
        });

        let tx = TransactionInfo::from_raw(raw).unwrap();
        assert!(tx.block_hash.is_none());
        assert!(tx.block_number.is_none());
        assert!(tx.gas_used.is_none());
        assert!(tx.cumulative_gas_used.is_none());
        assert_eq!(tx.to, Some(Address::parse(&sample_address(0x02)).unwrap()));
        assert_eq!(tx.value, BigInt256::from_u64(1_000_000_000_000_000_000));
    }

    #[test]
    fn transaction_info_from_raw_populates_block_fields_once_mined() {
        let raw = json!({
            "hash": sample_hash(0xcc),
            "blockHash": sample_hash(0xdd),
            "blockNumber": "0x10",
            "timestamp": "0x5f5e100",
            "from": sample_address(0x01),
            "to": sample_address(0x02),
            "gas": "0x5208",
            "gasPrice": "0x3b9aca00",
            "gasUsed": "0x5208",
            "cumulativeGasUsed": "0x5208",
            "nonce": "0x1",
            "input": "0x",
            "value": "0x0",
        });

        let tx = TransactionInfo::from_raw(raw).unwrap();
        assert_eq!(tx.block_number, Some(16));
        assert_eq!(tx.block_hash, Some(Hash::parse(&sample_hash(0xdd)).unwrap()));
        assert_eq!(tx.gas_used, Some(BigInt256::from_u64(0x5208)));
    }

    #[test]
    fn contract_creation_transaction_has_contract_address_and_no_to() {
        let raw = json!({
            "hash": sample_hash(0xee),
            "from": sample_address(0x01),
            "to": Value::Null,
            "contractAddress": sample_address(0x99),
            "gas": "0x5208",
            "gasPrice": "0x3b9aca00",
            "nonce": "0x0",
            "input": "0x600a",
            "value": "0x0",
        });

        let tx = TransactionInfo::from_raw(raw).unwrap();
        assert!(tx.to.is_none());
        assert_eq!(tx.contract_address, Some(Address::parse(&sample_address(0x99)).unwrap()));
        assert_eq!(tx.data, vec![0x60, 0x0a]);
    }
}
