//! The legacy/EIP-155 transaction model: field storage, RLP (un)signed forms,
//! EIP-155 signing digest, transaction hash and `from` recovery.
//!
//! Grounded on `ethers-core/src/types/transaction/{request,mod}.rs`'s
//! `rlp_base`/`rlp`/`rlp_unsigned`/`rlp_signed`/`sighash` split and its
//! `NUM_TX_FIELDS` constant. Per this specification's Design Notes, the EIP-1559/
//! EIP-2930 typed-transaction envelopes the teacher also carries
//! (`eip1559.rs`, `eip2930.rs`, `eip2718.rs`) are dropped: "two conflicting
//! `Transaction` headers appear in the source tree ... the canonical model is
//! the EIP-155 version."

use crate::{
    crypto::hash::keccak256,
    error::{Error, Result},
    types::{
        address::Address,
        bigint::{BigInt256, Sign},
        hash::Hash,
        rlp::{self, Item},
        signature::Signature,
    },
};
use serde::{Deserialize, Serialize};

/// Number of RLP fields in an *unsigned* legacy transaction (no EIP-155 suffix).
const UNSIGNED_FIELDS: usize = 6;
/// Number of RLP fields once the EIP-155 `(chain_id, 0, 0)` suffix is appended,
/// and equally the number of fields in a signed transaction (`..., v, r, s`).
const SIGNED_OR_EIP155_FIELDS: usize = 9;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: BigInt256,
    pub gas_price: BigInt256,
    pub gas_limit: BigInt256,
    /// `None` denotes contract creation.
    pub to_address: Option<Address>,
    pub value: BigInt256,
    pub data: Vec<u8>,
    /// `0` is preserved only as the documented, unsafe legacy-signing escape
    /// hatch (no replay protection); real networks use the registry's non-zero
    /// chain ids.
    pub chain_id: u64,
    pub signature: Option<Signature>,
}

impl Transaction {
    pub fn new(chain_id: u64) -> Self {
        Self {
            nonce: BigInt256::ZERO,
            gas_price: BigInt256::ZERO,
            gas_limit: BigInt256::ZERO,
            to_address: None,
            value: BigInt256::ZERO,
            data: Vec::new(),
            chain_id,
            signature: None,
        }
    }

    fn base_fields(&self) -> Vec<Item> {
        vec![
            Item::bytes(self.nonce.to_rlp_bytes()),
            Item::bytes(self.gas_price.to_rlp_bytes()),
            Item::bytes(self.gas_limit.to_rlp_bytes()),
            Item::bytes(self.to_address.map(|a| a.as_bytes().to_vec()).unwrap_or_default()),
            Item::bytes(self.value.to_rlp_bytes()),
            Item::bytes(self.data.clone()),
        ]
    }

    /// RLP of `[nonce, gasPrice, gasLimit, to, value, data]` for `chain_id == 0`,
    /// or `[..., chainId, 0, 0]` under EIP-155.
    pub fn unsigned_serialize(&self) -> Vec<u8> {
        let mut fields = self.base_fields();
        if self.chain_id != 0 {
            fields.push(Item::bytes(BigInt256::from_u64(self.chain_id).to_rlp_bytes()));
            fields.push(Item::bytes(Vec::new()));
            fields.push(Item::bytes(Vec::new()));
        }
        rlp::encode(&Item::List(fields))
    }

    pub fn signing_digest(&self) -> Hash {
        Hash::from_bytes(keccak256(self.unsigned_serialize()))
    }

    /// RLP of `[..., v, r, s]`; `v = 27 + rec_id` for `chain_id == 0`,
    /// `v = 35 + 2*chain_id + rec_id` under EIP-155.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let signature = self.signature.ok_or(Error::Malformed)?;
        let mut fields = self.base_fields();
        fields.push(Item::bytes(BigInt256::from_u64(signature.v).to_rlp_bytes()));
        fields.push(Item::bytes(minimal_be(&signature.r)));
        fields.push(Item::bytes(minimal_be(&signature.s)));
        Ok(rlp::encode(&Item::List(fields)))
    }

    /// `Keccak256(serialize())`; only meaningful once signed.
    pub fn transaction_hash(&self) -> Result<Hash> {
        Ok(Hash::from_bytes(keccak256(self.serialize()?)))
    }

    /// Recovers the sender address from the attached signature over
    /// `unsigned_serialize`.
    pub fn from_address(&self) -> Result<Address> {
        let signature = self.signature.ok_or(Error::Malformed)?;
        let chain_id_for_recovery = if self.chain_id != 0 { Some(self.chain_id) } else { None };
        signature.recover(self.signing_digest(), chain_id_for_recovery)
    }

    /// Decodes RLP into a transaction, recovering `from` when the list has 9
    /// elements (signed); a 6-element list is treated as unsigned.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let item = rlp::decode(data)?;
        let fields = item.as_list().ok_or(Error::Malformed)?;
        match fields.len() {
            UNSIGNED_FIELDS => Self::decode_fields(fields, None),
            SIGNED_OR_EIP155_FIELDS => {
                let v = be_to_u64(fields[6].as_bytes().ok_or(Error::Malformed)?);
                let r = pad32(fields[7].as_bytes().ok_or(Error::Malformed)?)?;
                let s = pad32(fields[8].as_bytes().ok_or(Error::Malformed)?)?;
                Self::decode_fields(fields, Some(Signature { r, s, v }))
            }
            _ => Err(Error::Malformed),
        }
    }

    fn decode_fields(fields: &[Item], signature: Option<Signature>) -> Result<Self> {
        let nonce = be_bigint(fields[0].as_bytes().ok_or(Error::Malformed)?);
        let gas_price = be_bigint(fields[1].as_bytes().ok_or(Error::Malformed)?);
        let gas_limit = be_bigint(fields[2].as_bytes().ok_or(Error::Malformed)?);
        let to_bytes = fields[3].as_bytes().ok_or(Error::Malformed)?;
        let to_address = if to_bytes.is_empty() {
            None
        } else if to_bytes.len() == 20 {
            let mut array = [0u8; 20];
            array.copy_from_slice(to_bytes);
            Some(Address::from_bytes(array))
        } else {
            return Err(Error::Malformed)
        };
        let value = be_bigint(fields[4].as_bytes().ok_or(Error::Malformed)?);
        let data = fields[5].as_bytes().ok_or(Error::Malformed)?.to_vec();

        let chain_id = match &signature {
            Some(sig) if sig.v >= 35 => (sig.v - 35) >> 1,
            _ => 0,
        };

        Ok(Self { nonce, gas_price, gas_limit, to_address, value, data, chain_id, signature })
    }
}

fn minimal_be(bytes: &[u8; 32]) -> Vec<u8> {
    let first_nonzero = bytes.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(idx) => bytes[idx..].to_vec(),
        None => Vec::new(),
    }
}

fn pad32(bytes: &[u8]) -> Result<[u8; 32]> {
    if bytes.len() > 32 {
        return Err(Error::Malformed)
    }
    let mut array = [0u8; 32];
    array[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(array)
}

fn be_bigint(bytes: &[u8]) -> BigInt256 {
    BigInt256::from_bytes_be(Sign::Positive, bytes).unwrap_or(BigInt256::ZERO)
}

fn be_to_u64(bytes: &[u8]) -> u64 {
    let mut array = [0u8; 8];
    let len = bytes.len().min(8);
    array[8 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    u64::from_be_bytes(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_alone_changes_signing_digest() {
        let mut tx = Transaction::new(0);
        tx.nonce = BigInt256::from_u64(9);
        let digest_legacy = tx.signing_digest();
        tx.chain_id = 1;
        let digest_eip155 = tx.signing_digest();
        assert_ne!(digest_legacy.as_bytes(), digest_eip155.as_bytes());
    }

    #[test]
    fn unsigned_field_count_by_chain_id() {
        let tx = Transaction::new(0);
        let item = rlp::decode(&tx.unsigned_serialize()).unwrap();
        assert_eq!(item.as_list().unwrap().len(), 6);

        let mut tx155 = Transaction::new(1);
        tx155.nonce = BigInt256::from_u64(1);
        let item155 = rlp::decode(&tx155.unsigned_serialize()).unwrap();
        assert_eq!(item155.as_list().unwrap().len(), 9);
    }
}
