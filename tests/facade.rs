//! End-to-end smoke test exercising the three layers through the facade
//! crate's re-exports, grounded on the teacher's `tests/signer.rs` placement
//! convention (an integration test alongside unit tests, not inside them).

use ethers_lite::{core, signers};

#[test]
fn account_from_known_private_key_signs_and_recovers() {
    let key = hex::decode("4646464646464646464646464646464646464646464646464646464646464646")
        .unwrap();
    let account = signers::Account::from_private_key_bytes(&key).unwrap();

    let message = b"ethers-lite smoke test";
    let signature = account.sign_message(message);
    assert!(account.verify_message(message, &signature).unwrap());

    let mut tx = core::types::Transaction::new(1);
    tx.nonce = core::types::BigInt256::from_u64(0);
    tx.gas_price = core::types::BigInt256::from_u64(20_000_000_000);
    tx.gas_limit = core::types::BigInt256::from_u64(21_000);
    tx.to_address = Some(core::types::Address::parse("0x3535353535353535353535353535353535353535").unwrap());
    tx.value = core::types::BigInt256::from_u64(1);

    let signed = account.sign_transaction(&tx);
    assert_eq!(signed.from_address().unwrap(), account.address());
}
