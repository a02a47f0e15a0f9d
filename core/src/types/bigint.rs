//! A signed 256-bit integer with exact decimal/hex/base-36/bytes conversions.
//!
//! Unlike [`ethereum_types::U256`] (unsigned, used for on-chain magnitudes) this
//! type carries an explicit sign and is the value type exposed at API boundaries
//! that accept user-typed numbers (wei amounts, ICAP bodies, RLP field values
//! before their sign is dropped on the wire). Representation is sign-magnitude,
//! not two's complement: `-0` is not a distinct value, and the canonical byte
//! form of the magnitude never carries a leading zero byte except for zero
//! itself (`[0x00]`).

use crate::error::{Error, Result};
use ethereum_types::U256;
use std::{cmp::Ordering, fmt, hash::Hash};

/// The sign of a [`BigInt256`]. Zero is always [`Sign::Positive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    Negative,
}

/// Signed integer, magnitude bounded by `2^256 - 1`.
#[derive(Clone, Copy, Eq)]
pub struct BigInt256 {
    sign: Sign,
    magnitude: U256,
}

impl BigInt256 {
    pub const ZERO: Self = Self { sign: Sign::Positive, magnitude: U256::zero() };

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative && !self.is_zero()
    }

    fn new(sign: Sign, magnitude: U256) -> Self {
        if magnitude.is_zero() {
            Self { sign: Sign::Positive, magnitude }
        } else {
            Self { sign, magnitude }
        }
    }

    pub fn from_u64(value: u64) -> Self {
        Self::new(Sign::Positive, U256::from(value))
    }

    pub fn from_i64(value: i64) -> Self {
        if value < 0 {
            Self::new(Sign::Negative, U256::from(value.unsigned_abs()))
        } else {
            Self::new(Sign::Positive, U256::from(value as u64))
        }
    }

    /// Parses a decimal string, with an optional leading `-`.
    pub fn from_dec_str(s: &str) -> Result<Self> {
        let (sign, digits) = split_sign(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidFormat)
        }
        let magnitude = U256::from_dec_str(digits).map_err(|_| Error::InvalidFormat)?;
        Ok(Self::new(sign, magnitude))
    }

    pub fn to_dec_string(&self) -> String {
        let mut s = self.magnitude.to_string();
        if self.is_negative() {
            s.insert(0, '-');
        }
        s
    }

    /// Parses a `0x`-prefixed or bare lowercase/uppercase hex string. Odd-length
    /// input is accepted (an implicit leading zero nibble).
    pub fn from_hex_str(s: &str) -> Result<Self> {
        let (sign, rest) = split_sign(s);
        let digits = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")).unwrap_or(rest);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidFormat)
        }
        if digits.len() > 64 {
            return Err(Error::InvalidFormat)
        }
        let padded = if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
        let bytes = hex::decode(padded).map_err(|_| Error::InvalidFormat)?;
        Ok(Self::new(sign, U256::from_big_endian(&bytes)))
    }

    pub fn to_hex_string(&self) -> String {
        let mut s = format!("0x{:x}", self.magnitude);
        if self.is_negative() {
            s.insert(0, '-');
        }
        s
    }

    /// Parses an uppercase base-36 string (used for the 30-character ICAP body).
    pub fn from_base36_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidFormat)
        }
        let mut acc = U256::zero();
        for c in s.chars() {
            let digit = c.to_digit(36).ok_or(Error::InvalidFormat)?;
            acc = acc.checked_mul(U256::from(36u64)).ok_or(Error::InvalidFormat)?;
            acc = acc.checked_add(U256::from(digit)).ok_or(Error::InvalidFormat)?;
        }
        Ok(Self::new(Sign::Positive, acc))
    }

    pub fn to_base36_string(&self) -> String {
        if self.magnitude.is_zero() {
            return "0".to_string()
        }
        let mut digits = Vec::new();
        let mut value = self.magnitude;
        let base = U256::from(36u64);
        while !value.is_zero() {
            let digit = (value % base).as_u32();
            digits.push(std::char::from_digit(digit, 36).unwrap().to_ascii_uppercase());
            value /= base;
        }
        digits.iter().rev().collect()
    }

    /// Minimal big-endian magnitude bytes. Zero encodes as a single `0x00` byte.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        if self.magnitude.is_zero() {
            return vec![0u8]
        }
        let mut buf = [0u8; 32];
        self.magnitude.to_big_endian(&mut buf);
        let first_nonzero = buf.iter().position(|&b| b != 0).unwrap_or(31);
        buf[first_nonzero..].to_vec()
    }

    pub fn from_bytes_be(sign: Sign, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > 32 {
            return Err(Error::InvalidFormat)
        }
        Ok(Self::new(sign, U256::from_big_endian(bytes)))
    }

    /// Minimal big-endian bytes with zero encoding to an *empty* slice, the form
    /// RLP transaction fields use (the wire form, distinct from [`to_bytes_be`]
    /// which always emits at least one byte).
    pub fn to_rlp_bytes(&self) -> Vec<u8> {
        if self.magnitude.is_zero() {
            Vec::new()
        } else {
            self.to_bytes_be()
        }
    }

    pub fn magnitude(&self) -> U256 {
        self.magnitude
    }

    pub fn add(&self, other: &Self) -> Self {
        match (self.sign, other.sign) {
            (a, b) if a == b => Self::new(a, self.magnitude + other.magnitude),
            _ => {
                if self.magnitude >= other.magnitude {
                    Self::new(self.sign, self.magnitude - other.magnitude)
                } else {
                    Self::new(other.sign, other.magnitude - self.magnitude)
                }
            }
        }
    }

    pub fn neg(&self) -> Self {
        Self::new(
            if self.sign == Sign::Positive { Sign::Negative } else { Sign::Positive },
            self.magnitude,
        )
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Self) -> Self {
        let sign = if self.sign == other.sign { Sign::Positive } else { Sign::Negative };
        Self::new(sign, self.magnitude * other.magnitude)
    }

    /// Truncating division (rounds toward zero); the modulus sign follows the
    /// dividend, satisfying `a == (a/b)*b + a%b` with `|a%b| < |b|`.
    pub fn div(&self, other: &Self) -> Result<Self> {
        if other.is_zero() {
            return Err(Error::DivisionByZero)
        }
        let sign = if self.sign == other.sign { Sign::Positive } else { Sign::Negative };
        Ok(Self::new(sign, self.magnitude / other.magnitude))
    }

    pub fn rem(&self, other: &Self) -> Result<Self> {
        if other.is_zero() {
            return Err(Error::DivisionByZero)
        }
        Ok(Self::new(self.sign, self.magnitude % other.magnitude))
    }

    fn signum(&self) -> i8 {
        if self.is_zero() {
            0
        } else if self.is_negative() {
            -1
        } else {
            1
        }
    }
}

fn split_sign(s: &str) -> (Sign, &str) {
    match s.strip_prefix('-') {
        Some(rest) => (Sign::Negative, rest),
        None => (Sign::Positive, s.strip_prefix('+').unwrap_or(s)),
    }
}

impl PartialEq for BigInt256 {
    fn eq(&self, other: &Self) -> bool {
        self.signum() == other.signum() && self.magnitude == other.magnitude
    }
}

impl Hash for BigInt256 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.signum().hash(state);
        self.magnitude.hash(state);
    }
}

impl PartialOrd for BigInt256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigInt256 {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.signum(), other.signum()) {
            (a, b) if a == b => {
                if self.is_negative() {
                    other.magnitude.cmp(&self.magnitude)
                } else {
                    self.magnitude.cmp(&other.magnitude)
                }
            }
            (a, b) => a.cmp(&b),
        }
    }
}

impl fmt::Debug for BigInt256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInt256({})", self.to_dec_string())
    }
}

impl fmt::Display for BigInt256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dec_string())
    }
}

impl From<u64> for BigInt256 {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl From<i64> for BigInt256 {
    fn from(v: i64) -> Self {
        Self::from_i64(v)
    }
}

impl From<U256> for BigInt256 {
    fn from(v: U256) -> Self {
        Self::new(Sign::Positive, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trip() {
        for s in ["0", "1", "-1", "123456789012345678901234567890", "-42"] {
            let n = BigInt256::from_dec_str(s).unwrap();
            assert_eq!(n.to_dec_string(), s);
        }
    }

    #[test]
    fn hex_round_trip_and_odd_length() {
        let a = BigInt256::from_hex_str("0xdead").unwrap();
        assert_eq!(a.to_hex_string(), "0xdead");
        let b = BigInt256::from_hex_str("0xdad").unwrap();
        assert_eq!(b, BigInt256::from_hex_str("0x0dad").unwrap());
    }

    #[test]
    fn add_sub_identity() {
        let a = BigInt256::from_dec_str("123456789").unwrap();
        let b = BigInt256::from_dec_str("-987654321").unwrap();
        assert_eq!(a.add(&b).sub(&b), a);
    }

    #[test]
    fn div_mod_identity() {
        let cases = [(7i64, 2i64), (-7, 2), (7, -2), (-7, -2), (1, 3)];
        for (a, b) in cases {
            let a = BigInt256::from_i64(a);
            let b = BigInt256::from_i64(b);
            let q = a.div(&b).unwrap();
            let r = a.rem(&b).unwrap();
            assert_eq!(q.mul(&b).add(&r), a);
            assert!(r.magnitude() < b.magnitude().max(U256::one()) || b.magnitude().is_zero());
        }
    }

    #[test]
    fn division_by_zero_fails() {
        let a = BigInt256::from_u64(1);
        assert!(a.div(&BigInt256::ZERO).is_err());
    }

    #[test]
    fn minimal_bytes_zero_is_single_byte() {
        assert_eq!(BigInt256::ZERO.to_bytes_be(), vec![0u8]);
        assert_eq!(BigInt256::ZERO.to_rlp_bytes(), Vec::<u8>::new());
    }

    #[test]
    fn ordering_is_total() {
        let vals = ["-5", "-1", "0", "1", "5"]
            .iter()
            .map(|s| BigInt256::from_dec_str(s).unwrap())
            .collect::<Vec<_>>();
        for w in vals.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn invalid_format_rejected() {
        assert!(BigInt256::from_dec_str("12x4").is_err());
        assert!(BigInt256::from_hex_str("0xzz").is_err());
    }

    #[test]
    fn base36_round_trip() {
        let n = BigInt256::from_dec_str("123456").unwrap();
        let b36 = n.to_base36_string();
        assert_eq!(BigInt256::from_base36_str(&b36).unwrap(), n);
    }
}
