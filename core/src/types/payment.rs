//! The `ethereum:` payment URI, supplemented from
//! `examples/original_source/ethers/src/Payment.h` (present in the original
//! source, dropped by the distillation; reintroduced per spec §6, which
//! documents the wire format without naming a dedicated component).

use crate::{
    types::{address::Address, bigint::BigInt256},
    utils::units::{parse_ether, parse_units},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub address: Address,
    /// Wei, parsed from the `amount` query parameter (decimal ether).
    pub amount: Option<BigInt256>,
    /// Wei, parsed from the `gas` query parameter (gwei).
    pub gas: Option<BigInt256>,
}

impl Payment {
    /// Parses `ethereum:<address>[?amount=<decimal ether>][&gas=<gwei>]`.
    /// Unknown query keys are ignored; a malformed `amount`/`gas` value yields
    /// `None` for the whole payment, per spec §6.
    pub fn parse(uri: &str) -> Option<Payment> {
        let body = uri.strip_prefix("ethereum:")?;
        let (addr_part, query) = match body.split_once('?') {
            Some((a, q)) => (a, Some(q)),
            None => (body, None),
        };
        let address = Address::parse(addr_part).ok()?;

        let mut amount = None;
        let mut gas = None;
        if let Some(query) = query {
            for pair in query.split('&') {
                let (key, value) = pair.split_once('=')?;
                match key {
                    "amount" => amount = Some(parse_ether(value)?),
                    "gas" => gas = Some(parse_gwei(value)?),
                    _ => {}
                }
            }
        }

        Some(Payment { address, amount, gas })
    }
}

fn parse_gwei(s: &str) -> Option<BigInt256> {
    parse_units(s, 9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_address_only() {
        let p = Payment::parse("ethereum:0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        assert!(p.amount.is_none());
        assert!(p.gas.is_none());
    }

    #[test]
    fn parses_amount_and_ignores_unknown_keys() {
        let p = Payment::parse(
            "ethereum:0x52908400098527886e0f7030069857d2e4169ee7?amount=1.5&foo=bar",
        )
        .unwrap();
        assert_eq!(p.amount.unwrap(), parse_ether("1.5").unwrap());
    }

    #[test]
    fn parses_gas_in_gwei() {
        let p = Payment::parse("ethereum:0x52908400098527886e0f7030069857d2e4169ee7?gas=21")
            .unwrap();
        assert_eq!(p.gas.unwrap(), BigInt256::from_u64(21_000_000_000));
    }

    #[test]
    fn malformed_uri_is_none() {
        assert!(Payment::parse("not-a-payment-uri").is_none());
        assert!(Payment::parse("ethereum:0xzz").is_none());
    }
}
