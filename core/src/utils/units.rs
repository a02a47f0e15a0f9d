//! Ether amount formatting and parsing.
//!
//! Grounded in spirit on `ethers-core/src/utils/units.rs`'s `Units` enum (the
//! ether/gwei/wei scale), but the commify/approximate/truncation rules
//! implemented here are new — the teacher's `parse_units`/`format_units` do not
//! implement them — grounded directly on spec §6 ("Ether formatting") and the
//! `amount=` field of `Payment.h`'s payment URI.

use crate::types::bigint::{BigInt256, Sign};

const DECIMALS: u32 = 18;

/// Fractional digits kept when [`FormatOptions::approximate`] is set — a
/// display-precision cutoff, not a parsing limit (`parse_ether` still accepts
/// and round-trips the full 18 digits).
const APPROXIMATE_DECIMALS: usize = 6;

#[derive(Clone, Copy, Debug, Default)]
pub struct FormatOptions {
    /// Group the integer part by thousands with `,`.
    pub commify: bool,
    /// Allow trailing fractional digits to be dropped, appending `~` when any
    /// precision was lost.
    pub approximate: bool,
}

/// Formats a wei amount as decimal ether.
pub fn format_ether(wei: &BigInt256, options: FormatOptions) -> String {
    let negative = wei.is_negative();
    let magnitude = wei.magnitude();
    let divisor = pow10(DECIMALS);

    let integer = magnitude / divisor;
    let fraction = magnitude % divisor;

    let mut frac_str = format!("{:018}", fraction.as_u128());
    let mut truncated = false;
    if options.approximate {
        let cut = APPROXIMATE_DECIMALS.min(frac_str.len());
        let dropped_nonzero = frac_str[cut..].bytes().any(|b| b != b'0');
        frac_str.truncate(cut);
        truncated = dropped_nonzero;
        while frac_str.len() > 1 && frac_str.ends_with('0') {
            frac_str.pop();
        }
    } else {
        while frac_str.len() > 1 && frac_str.ends_with('0') {
            frac_str.pop();
        }
    }

    let mut integer_str = integer.to_string();
    if options.commify {
        integer_str = commify(&integer_str);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&integer_str);
    if !frac_str.is_empty() && frac_str != "0" {
        out.push('.');
        out.push_str(&frac_str);
    }
    if truncated {
        out.push('~');
    }
    out
}

fn commify(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(b',' as u8);
        }
        out.push(*b);
    }
    String::from_utf8(out).expect("ascii digits")
}

/// Parses a decimal ether string into wei. Accepts an optional leading sign, an
/// integer part, and an optional fractional part of up to 18 digits (trailing
/// zeros tolerated). More than 18 fractional digits returns `None`.
pub fn parse_ether(s: &str) -> Option<BigInt256> {
    parse_units(s, DECIMALS)
}

/// Parses a decimal string at an arbitrary number of fractional `decimals`,
/// the same sign/digit/length rules [`parse_ether`] applies at 18 decimals.
pub fn parse_units(s: &str, decimals: u32) -> Option<BigInt256> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (Sign::Negative, rest),
        None => (Sign::Positive, s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None
    }
    if frac_part.len() > decimals as usize {
        return None
    }

    let int_value = if int_part.is_empty() {
        ethereum_types::U256::zero()
    } else {
        ethereum_types::U256::from_dec_str(int_part).ok()?
    };

    let mut frac_padded = frac_part.to_string();
    while frac_padded.len() < decimals as usize {
        frac_padded.push('0');
    }
    let frac_value = if frac_padded.is_empty() {
        ethereum_types::U256::zero()
    } else {
        ethereum_types::U256::from_dec_str(&frac_padded).ok()?
    };

    let magnitude = int_value.checked_mul(pow10(decimals))?.checked_add(frac_value)?;
    Some(match sign {
        Sign::Positive => BigInt256::from(magnitude),
        Sign::Negative => BigInt256::from(magnitude).neg(),
    })
}

fn pow10(n: u32) -> ethereum_types::U256 {
    ethereum_types::U256::from(10u64).pow(ethereum_types::U256::from(n))
}
