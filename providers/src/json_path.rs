//! `queryPath`: a small typed AST for descending into heterogeneous JSON-RPC
//! response shapes and coercing a leaf to a concrete wire type.
//!
//! Grounded in *intent* (lenient hex/decimal parsing of values that arrive as
//! either JSON numbers or strings) on `ethers-core`'s `serde_helpers.rs`
//! deserializers, but implemented as a dynamic path evaluator rather than a
//! family of `serde::Deserialize` impls, per this specification's call for a
//! "typed AST evaluator" over reflection.

use ethers_lite_core::types::{Address, BigInt256, Hash};
use serde_json::Value;

use crate::error::{ProviderError, Result};

/// One step of a `/`-delimited path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Dict(String),
    Array(usize),
    Type(Coercion),
}

/// The terminal leaf type a path resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coercion {
    String,
    IntegerHex,
    IntegerDecimal,
    Float,
    BigNumberHex,
    BigNumberDecimal,
    Data,
    Hash,
    Address,
    Object,
}

impl Coercion {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "integerHex" => Self::IntegerHex,
            "integerDecimal" => Self::IntegerDecimal,
            "float" => Self::Float,
            "bigNumberHex" => Self::BigNumberHex,
            "bigNumberDecimal" => Self::BigNumberDecimal,
            "data" => Self::Data,
            "hash" => Self::Hash,
            "address" => Self::Address,
            "object" => Self::Object,
            _ => return None,
        })
    }
}

/// A coerced leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Coerced {
    String(String),
    Integer(i64),
    Float(f64),
    BigNumber(BigInt256),
    Data(Vec<u8>),
    Hash(Hash),
    Address(Address),
    Object(Value),
}

/// Parses `"dictionary:KEY"`, `"array:INDEX"`, or a bare type directive, e.g.
/// `"result/array:0/dictionary:hash/hash"`.
pub fn parse_path(path: &str) -> Result<Vec<Segment>> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if let Some(key) = segment.strip_prefix("dictionary:") {
                Ok(Segment::Dict(key.to_string()))
            } else if let Some(index) = segment.strip_prefix("array:") {
                index
                    .parse::<usize>()
                    .map(Segment::Array)
                    .map_err(|_| ProviderError::BadResponse(format!("bad array index: {index}")))
            } else {
                Coercion::parse(segment)
                    .map(Segment::Type)
                    .ok_or_else(|| ProviderError::BadResponse(format!("unknown path segment: {segment}")))
            }
        })
        .collect()
}

/// Walks `root` along `path`, coercing the terminal segment.
pub fn query_path(root: &Value, path: &str) -> Result<Coerced> {
    let segments = parse_path(path)?;
    let mut current = root;
    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Dict(key) => {
                current = current.get(key).ok_or_else(|| {
                    ProviderError::BadResponse(format!("missing field {key:?}"))
                })?;
            }
            Segment::Array(i) => {
                current = current.get(i).ok_or_else(|| {
                    ProviderError::BadResponse(format!("missing index {i}"))
                })?;
            }
            Segment::Type(coercion) => {
                if index != segments.len() - 1 {
                    return Err(ProviderError::BadResponse(
                        "type segment must be terminal".into(),
                    ))
                }
                return coerce(current, *coercion)
            }
        }
    }
    Err(ProviderError::BadResponse("empty path".into()))
}

fn as_str_lenient(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strip_hex(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

fn coerce(value: &Value, coercion: Coercion) -> Result<Coerced> {
    let bad = |msg: &str| ProviderError::BadResponse(msg.to_string());
    match coercion {
        Coercion::String => {
            let s = as_str_lenient(value).ok_or_else(|| bad("expected string"))?;
            Ok(Coerced::String(s))
        }
        Coercion::IntegerHex => {
            let raw = as_str_lenient(value).ok_or_else(|| bad("expected hex integer"))?;
            let digits = strip_hex(&raw);
            if digits.is_empty() {
                return Ok(Coerced::Integer(0))
            }
            let value = i64::from_str_radix(digits, 16).map_err(|_| bad("malformed hex integer"))?;
            Ok(Coerced::Integer(value))
        }
        Coercion::IntegerDecimal => {
            let raw = as_str_lenient(value).ok_or_else(|| bad("expected decimal integer"))?;
            if raw.is_empty() {
                return Ok(Coerced::Integer(0))
            }
            let value = raw.parse::<i64>().map_err(|_| bad("malformed decimal integer"))?;
            Ok(Coerced::Integer(value))
        }
        Coercion::Float => {
            let value = match value {
                Value::Number(n) => n.as_f64().ok_or_else(|| bad("malformed float"))?,
                Value::String(s) if s.is_empty() => 0.0,
                Value::String(s) => s.parse::<f64>().map_err(|_| bad("malformed float"))?,
                _ => return Err(bad("expected float")),
            };
            Ok(Coerced::Float(value))
        }
        Coercion::BigNumberHex => {
            let raw = as_str_lenient(value).ok_or_else(|| bad("expected hex bignumber"))?;
            let digits = strip_hex(&raw);
            if digits.is_empty() {
                return Ok(Coerced::BigNumber(BigInt256::ZERO))
            }
            let padded = if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
            let bytes = hex::decode(&padded).map_err(|_| bad("malformed hex bignumber"))?;
            let value = BigInt256::from_bytes_be(ethers_lite_core::types::Sign::Positive, &bytes)
                .map_err(|_| bad("bignumber out of range"))?;
            Ok(Coerced::BigNumber(value))
        }
        Coercion::BigNumberDecimal => {
            let raw = as_str_lenient(value).ok_or_else(|| bad("expected decimal bignumber"))?;
            if raw.is_empty() {
                return Ok(Coerced::BigNumber(BigInt256::ZERO))
            }
            let value = BigInt256::from_dec_str(&raw).map_err(|_| bad("malformed decimal bignumber"))?;
            Ok(Coerced::BigNumber(value))
        }
        Coercion::Data => {
            let raw = as_str_lenient(value).ok_or_else(|| bad("expected data"))?;
            let digits = strip_hex(&raw);
            if digits.is_empty() {
                return Ok(Coerced::Data(Vec::new()))
            }
            let padded = if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
            let bytes = hex::decode(&padded).map_err(|_| bad("malformed data"))?;
            Ok(Coerced::Data(bytes))
        }
        Coercion::Hash => {
            let raw = as_str_lenient(value).ok_or_else(|| bad("expected hash"))?;
            let hash = Hash::parse(&raw).map_err(|_| bad("malformed hash"))?;
            Ok(Coerced::Hash(hash))
        }
        Coercion::Address => {
            let raw = as_str_lenient(value).ok_or_else(|| bad("expected address"))?;
            let address = Address::parse(&raw).map_err(|_| bad("malformed address"))?;
            Ok(Coerced::Address(address))
        }
        Coercion::Object => Ok(Coerced::Object(value.clone())),
    }
}
