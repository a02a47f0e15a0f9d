//! ECDSA signature triplet and recovery, grounded on
//! `ethers-core/src/types/signature.rs` (same `k256` recovery path). Signing
//! itself — deterministic nonce generation and canonical-s normalization — lives
//! in `ethers-lite-signers::ecdsa`, since it needs the private scalar; this module
//! only needs the public verification/recovery half.

use crate::{
    crypto::hash::keccak256,
    error::{Error, Result},
    types::{address::Address, hash::Hash},
};
use elliptic_curve::{consts::U32, sec1::ToEncodedPoint};
use generic_array::GenericArray;
use k256::{
    ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey},
    PublicKey as K256PublicKey,
};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// `secp256k1` group order `n`, big-endian.
const SECP256K1_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// A recoverable ECDSA signature: `(r, s, v)` with `v` carrying recovery
/// information — `27`/`28` for legacy signing, `35 + 2*chain_id + rec_id` under
/// EIP-155.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u64,
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signature")
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .field("v", &self.v)
            .finish()
    }
}

impl Signature {
    /// `s <= n/2`, the canonical-signature invariant.
    pub fn is_canonical(&self) -> bool {
        let half_n = {
            let mut n = SECP256K1_ORDER;
            shift_right_one_bit(&mut n);
            n
        };
        self.s <= half_n
    }

    fn recovery_id(&self, chain_id: Option<u64>) -> Result<u8> {
        let rec_id = match chain_id {
            Some(chain_id) => {
                let expected_floor = 35 + 2 * chain_id;
                if self.v < expected_floor {
                    return Err(Error::InvalidFormat)
                }
                (self.v - expected_floor) as u8
            }
            None => {
                if self.v != 27 && self.v != 28 {
                    return Err(Error::InvalidFormat)
                }
                (self.v - 27) as u8
            }
        };
        if rec_id > 1 {
            return Err(Error::InvalidFormat)
        }
        Ok(rec_id)
    }

    /// Recovers the address that produced this signature over `digest`, given
    /// the `chain_id` the `v` value was encoded against (`None` for legacy
    /// `v in {27,28}` signing).
    pub fn recover(&self, digest: Hash, chain_id: Option<u64>) -> Result<Address> {
        if self.r == [0u8; 32] || self.s == [0u8; 32] {
            return Err(Error::BadSignature)
        }
        let rec_id = self.recovery_id(chain_id)?;

        let r: &GenericArray<u8, U32> = GenericArray::from_slice(&self.r);
        let s: &GenericArray<u8, U32> = GenericArray::from_slice(&self.s);
        let sig = K256Signature::from_scalars(*r, *s).map_err(|_| Error::InvalidFormat)?;
        let recovery_id = RecoveryId::from_byte(rec_id).ok_or(Error::InvalidFormat)?;

        let verify_key =
            VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id).map_err(
                |_| {
                    tracing::warn!(v = self.v, "signature recovery failed");
                    Error::InvalidFormat
                },
            )?;
        Ok(address_from_verifying_key(&verify_key))
    }
}

/// Derives the address owning `verify_key`'s public point (last 20 bytes of
/// `Keccak256` of the uncompressed, prefix-stripped point).
pub fn address_from_verifying_key(verify_key: &VerifyingKey) -> Address {
    let public_key = K256PublicKey::from(verify_key);
    let encoded = public_key.to_encoded_point(false);
    let bytes = encoded.as_bytes();
    debug_assert_eq!(bytes[0], 0x04);
    let hash = keccak256(&bytes[1..]);
    let mut array = [0u8; 20];
    array.copy_from_slice(&hash[12..]);
    Address::from_bytes(array)
}

fn shift_right_one_bit(bytes: &mut [u8; 32]) {
    let mut carry = 0u8;
    for byte in bytes.iter_mut() {
        let new_carry = *byte & 1;
        *byte = (*byte >> 1) | (carry << 7);
        carry = new_carry;
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            return Err(Error::InvalidFormat)
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] as u64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_n_shift_matches_known_constant() {
        // n/2 floor, from the secp256k1 spec.
        let expected =
            hex::decode("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0")
                .unwrap();
        let mut n = SECP256K1_ORDER;
        shift_right_one_bit(&mut n);
        assert_eq!(n.to_vec(), expected);
    }
}
