//! A 20-byte Ethereum account/contract identity, with EIP-55 checksum and ICAP
//! (IBAN-shaped) encodings.
//!
//! The raw/checksum conversion is grounded on `ethers-core/src/utils/mod.rs`'s
//! `to_checksum`. ICAP has no teacher equivalent (ethers-rs dropped IBAN addresses
//! years ago); it is implemented directly from spec §4.4 and the glossary entry.

use crate::{
    crypto::hash::keccak256,
    error::{Error, Result},
    types::bigint::BigInt256,
};
use serde::{Deserialize, Serialize};
use std::fmt;

const ICAP_COUNTRY_PREFIX: &str = "XE";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Lowercase hex, no `0x` prefix.
    fn lowercase_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a `0x`-prefixed 42-character hex string in any case. If the input
    /// is mixed case, it must satisfy the EIP-55 checksum or this fails with
    /// [`Error::BadChecksum`].
    pub fn parse(s: &str) -> Result<Self> {
        let body = s.strip_prefix("0x").ok_or(Error::InvalidFormat)?;
        if body.len() != 40 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidFormat)
        }
        let bytes = hex::decode(body).map_err(|_| Error::InvalidFormat)?;
        let mut array = [0u8; 20];
        array.copy_from_slice(&bytes);
        let addr = Self(array);

        let is_all_lower = body.bytes().all(|b| !b.is_ascii_uppercase());
        let is_all_upper = body.bytes().all(|b| !b.is_ascii_lowercase());
        if is_all_lower || is_all_upper {
            return Ok(addr)
        }
        if addr.checksum() != s {
            return Err(Error::BadChecksum)
        }
        Ok(addr)
    }

    /// Computes the EIP-55 mixed-case checksum address, `0x`-prefixed.
    pub fn checksum(&self) -> String {
        let lower = self.lowercase_hex();
        let hash = keccak256(lower.as_bytes());
        let hash_hex = hex::encode(hash);
        let hash_bytes = hash_hex.as_bytes();

        lower.as_bytes().iter().zip(hash_bytes).fold("0x".to_owned(), |mut out, (c, h)| {
            let nibble = (*h as char).to_digit(16).unwrap_or(0);
            out.push(if nibble >= 8 { (*c as char).to_ascii_uppercase() } else { *c as char });
            out
        })
    }

    /// The ICAP (IBAN-shaped) form: `XE` + 2 mod-97-10 check digits + 30
    /// base-36 characters encoding the address as a big integer.
    pub fn icap(&self) -> String {
        let value = BigInt256::from_bytes_be(crate::types::bigint::Sign::Positive, &self.0)
            .expect("20 bytes always fits in 256 bits");
        let mut body = value.to_base36_string();
        while body.len() < 30 {
            body.insert(0, '0');
        }
        let check_digits = iso7064_check_digits(&body);
        format!("{ICAP_COUNTRY_PREFIX}{check_digits}{body}")
    }

    /// Parses a 34-character ICAP address (`XE` + 2 check digits + 30 base-36
    /// chars), validating the ISO 7064 mod-97-10 checksum.
    pub fn parse_icap(s: &str) -> Result<Self> {
        if s.len() != 34 || !s.starts_with(ICAP_COUNTRY_PREFIX) {
            return Err(Error::InvalidFormat)
        }
        let check_digits = &s[2..4];
        if !check_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidFormat)
        }
        let body = &s[4..];
        if iso7064_check_digits(body) != check_digits {
            return Err(Error::BadChecksum)
        }
        let value = BigInt256::from_base36_str(body)?;
        let bytes = value.to_bytes_be();
        if bytes.len() > 20 {
            return Err(Error::InvalidFormat)
        }
        let mut array = [0u8; 20];
        array[20 - bytes.len()..].copy_from_slice(&bytes);
        Ok(Self(array))
    }
}

/// ISO 7064 mod-97-10 check digits for an IBAN-shaped identifier: the numeric
/// string is `body + country_prefix_as_digits + "00"`, reduced mod 97, and the
/// check is `98 - remainder`, zero-padded to two digits.
fn iso7064_check_digits(body: &str) -> String {
    // Country code + "00" converted to digits per ISO 13616 (letters -> A=10..Z=35).
    let mut numeric = String::with_capacity(body.len() + 6);
    for c in body.chars() {
        numeric.push_str(&alnum_to_digits(c));
    }
    for c in ICAP_COUNTRY_PREFIX.chars() {
        numeric.push_str(&alnum_to_digits(c));
    }
    numeric.push_str("00");

    let mut remainder: u64 = 0;
    for c in numeric.chars() {
        let digit = c.to_digit(10).expect("numeric string") as u64;
        remainder = (remainder * 10 + digit) % 97;
    }
    format!("{:02}", 98 - remainder)
}

fn alnum_to_digits(c: char) -> String {
    if let Some(d) = c.to_digit(10) {
        d.to_string()
    } else {
        (c.to_ascii_uppercase() as u32 - 'A' as u32 + 10).to_string()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.checksum())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip55_checksum_vector() {
        let addr = Address::parse("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        assert_eq!(addr.checksum(), "0x52908400098527886E0F7030069857D2E4169EE7");
    }

    #[test]
    fn checksum_round_trips_and_rejects_single_bit_flip() {
        let addr = Address::parse("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        let checksum = addr.checksum();
        assert_eq!(Address::parse(&checksum).unwrap(), addr);

        let mut flipped = checksum.clone();
        let idx = flipped.find(|c: char| c.is_ascii_alphabetic()).unwrap();
        let c = flipped.as_bytes()[idx] as char;
        let replacement = if c.is_uppercase() { c.to_ascii_lowercase() } else { c.to_ascii_uppercase() };
        flipped.replace_range(idx..idx + 1, &replacement.to_string());
        assert!(Address::parse(&flipped).is_err());
    }

    #[test]
    fn icap_round_trips_and_rejects_digit_change() {
        let addr = Address::parse("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        let icap = addr.icap();
        assert_eq!(Address::parse_icap(&icap).unwrap(), addr);

        let mut mutated = icap.clone();
        let last = mutated.len() - 1;
        let c = mutated.as_bytes()[last];
        let replacement = if c == b'0' { b'1' } else { b'0' };
        mutated.replace_range(last..last + 1, &(replacement as char).to_string());
        assert!(Address::parse_icap(&mutated).is_err());
    }

    #[test]
    fn zero_address_is_distinguished() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::parse("0x52908400098527886e0f7030069857d2e4169ee7").unwrap().is_zero());
    }
}
