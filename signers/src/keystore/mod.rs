//! Web3 Secret Storage v3 keystore: encrypt/decrypt a private scalar with
//! scrypt or PBKDF2 + AES-128-CTR + Keccak-256 MAC.
//!
//! The teacher (`ethers-signers/src/wallet/private_key.rs`) delegates this
//! entirely to the `eth-keystore` crate (`eth_keystore::new`/`decrypt_key`).
//! That crate's scrypt call cannot be interrupted, so this module
//! reimplements the pipeline over the same constituent RustCrypto primitives
//! (`scrypt_cancellable`, `pbkdf2`, `aes`+`ctr`, `Keccak256`) behind a
//! [`Cancellable`] handle, per spec §4.8/§5.

mod scrypt_cancellable;

use crate::error::{Result, SignerError};
use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ethers_lite_core::{
    crypto::hash::keccak256,
    types::Address,
};
use generic_array::GenericArray;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::{
    sync::{atomic::AtomicBool, atomic::Ordering, Arc},
    thread::JoinHandle,
};
use zeroize::Zeroize;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;

const DEFAULT_SCRYPT_LOG2_N: u8 = 17;
const DEFAULT_SCRYPT_R: u32 = 8;
const DEFAULT_SCRYPT_P: u32 = 1;
const DEFAULT_DKLEN: usize = 32;
const DEFAULT_PBKDF2_ITERATIONS: u32 = 262_144;

/// KDF parameters. `Scrypt` is the recommended default; `Pbkdf2` is accepted
/// on decrypt for interoperability with older keystores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KdfParams {
    Scrypt { n: u64, r: u32, p: u32, dklen: usize, salt: Vec<u8> },
    Pbkdf2 { c: u32, dklen: usize, salt: Vec<u8> },
}

impl KdfParams {
    /// Defaults per spec §4.8: `N=2^17, r=8, p=1, dklen=32`, random 32-byte salt.
    pub fn default_scrypt() -> Self {
        let mut salt = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut salt);
        KdfParams::Scrypt {
            n: 1u64 << DEFAULT_SCRYPT_LOG2_N,
            r: DEFAULT_SCRYPT_R,
            p: DEFAULT_SCRYPT_P,
            dklen: DEFAULT_DKLEN,
            salt,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CipherParams {
    iv: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kdf", content = "kdfparams", rename_all = "lowercase")]
enum KdfParamsWire {
    Scrypt { n: u64, r: u32, p: u32, dklen: usize, salt: String },
    Pbkdf2 { c: u32, prf: String, dklen: usize, salt: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CryptoSection {
    cipher: String,
    cipherparams: CipherParams,
    ciphertext: String,
    #[serde(flatten)]
    kdf: KdfParamsWire,
    mac: String,
}

/// The JSON v3 keystore document, byte-exact with the Web3 Secret Storage
/// Definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Keystore {
    version: u32,
    id: String,
    address: String,
    crypto: CryptoSection,
}

impl Keystore {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn address(&self) -> Result<Address> {
        Address::parse(&format!("0x{}", self.address)).map_err(SignerError::from)
    }
}

/// Handle returned by the cancellable encrypt/decrypt entry points. `cancel`
/// sets the flag the scrypt/pbkdf2-backed KDF observes between outer
/// iterations; `join` blocks for the result.
pub struct Cancellable<T> {
    flag: Arc<AtomicBool>,
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> Cancellable<T> {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn join(self) -> Result<T> {
        self.handle.join().expect("keystore worker thread panicked")
    }
}

/// Encrypts `private_key` under `password`, spawning the KDF on a background
/// thread so the returned handle's `cancel()` can be observed promptly.
pub fn encrypt_cancellable(
    private_key: Vec<u8>,
    password: Vec<u8>,
    params: KdfParams,
    address: Address,
) -> Cancellable<Keystore> {
    let flag = Arc::new(AtomicBool::new(false));
    let worker_flag = flag.clone();
    let handle = std::thread::spawn(move || {
        encrypt_inner(&private_key, &password, params, address, &worker_flag)
    });
    Cancellable { flag, handle }
}

/// Decrypts `keystore` under `password`, returning the 32-byte private key.
pub fn decrypt_cancellable(keystore: Keystore, password: Vec<u8>) -> Cancellable<Vec<u8>> {
    let flag = Arc::new(AtomicBool::new(false));
    let worker_flag = flag.clone();
    let handle = std::thread::spawn(move || decrypt_inner(&keystore, &password, &worker_flag));
    Cancellable { flag, handle }
}

/// Synchronous encrypt for callers that don't need cancellation (tests,
/// short-parameter keystores).
pub fn encrypt(
    private_key: &[u8],
    password: &[u8],
    params: KdfParams,
    address: Address,
) -> Result<Keystore> {
    encrypt_inner(private_key, password, params, address, &AtomicBool::new(false))
}

/// Synchronous decrypt for callers that don't need cancellation.
pub fn decrypt(keystore: &Keystore, password: &[u8]) -> Result<Vec<u8>> {
    decrypt_inner(keystore, password, &AtomicBool::new(false))
}

fn derive_kdf_key(params: &KdfParams, password: &[u8], cancelled: &AtomicBool) -> Result<Vec<u8>> {
    match params {
        KdfParams::Scrypt { n, r, p, dklen, salt } => scrypt_cancellable::scrypt_cancellable(
            password,
            salt,
            *n,
            *r as usize,
            *p as usize,
            *dklen,
            cancelled,
        ),
        KdfParams::Pbkdf2 { c, dklen, salt } => {
            if cancelled.load(Ordering::SeqCst) {
                return Err(SignerError::Cancelled)
            }
            let mut out = vec![0u8; *dklen];
            pbkdf2_hmac::<Sha256>(password, salt, *c, &mut out);
            Ok(out)
        }
    }
}

fn kdf_to_wire(params: &KdfParams) -> KdfParamsWire {
    match params {
        KdfParams::Scrypt { n, r, p, dklen, salt } => {
            KdfParamsWire::Scrypt { n: *n, r: *r, p: *p, dklen: *dklen, salt: hex::encode(salt) }
        }
        KdfParams::Pbkdf2 { c, dklen, salt } => KdfParamsWire::Pbkdf2 {
            c: *c,
            prf: "hmac-sha256".to_string(),
            dklen: *dklen,
            salt: hex::encode(salt),
        },
    }
}

fn wire_to_kdf(wire: &KdfParamsWire) -> Result<KdfParams> {
    match wire {
        KdfParamsWire::Scrypt { n, r, p, dklen, salt } => Ok(KdfParams::Scrypt {
            n: *n,
            r: *r,
            p: *p,
            dklen: *dklen,
            salt: hex::decode(salt)?,
        }),
        KdfParamsWire::Pbkdf2 { c, dklen, salt, prf } => {
            if prf != "hmac-sha256" {
                return Err(SignerError::UnsupportedKDF)
            }
            Ok(KdfParams::Pbkdf2 { c: *c, dklen: *dklen, salt: hex::decode(salt)? })
        }
    }
}

fn encrypt_inner(
    private_key: &[u8],
    password: &[u8],
    params: KdfParams,
    address: Address,
    cancelled: &AtomicBool,
) -> Result<Keystore> {
    if private_key.len() != 32 {
        return Err(SignerError::InvalidParameter("private key must be 32 bytes".into()))
    }

    tracing::debug!(address = %address, "starting keystore kdf");
    let mut derived = derive_kdf_key(&params, password, cancelled)?;
    if derived.len() < 32 {
        derived.zeroize();
        return Err(SignerError::InvalidParameter("dklen must be >= 32".into()))
    }

    let mut iv = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut ciphertext = private_key.to_vec();
    let mut cipher = Aes128Ctr::new(
        GenericArray::from_slice(&derived[..16]),
        GenericArray::from_slice(&iv),
    );
    cipher.apply_keystream(&mut ciphertext);

    let mut mac_input = Vec::with_capacity(16 + ciphertext.len());
    mac_input.extend_from_slice(&derived[16..32]);
    mac_input.extend_from_slice(&ciphertext);
    let mac = keccak256(&mac_input);
    mac_input.zeroize();
    derived.zeroize();

    Ok(Keystore {
        version: 3,
        id: uuid::Uuid::new_v4().to_string(),
        address: hex::encode(address.as_bytes()),
        crypto: CryptoSection {
            cipher: "aes-128-ctr".to_string(),
            cipherparams: CipherParams { iv: hex::encode(iv) },
            ciphertext: hex::encode(&ciphertext),
            kdf: kdf_to_wire(&params),
            mac: hex::encode(mac),
        },
    })
}

fn decrypt_inner(keystore: &Keystore, password: &[u8], cancelled: &AtomicBool) -> Result<Vec<u8>> {
    if keystore.version != 3 {
        return Err(SignerError::UnsupportedVersion)
    }
    if keystore.crypto.cipher != "aes-128-ctr" {
        return Err(SignerError::UnsupportedCipher)
    }

    let params = wire_to_kdf(&keystore.crypto.kdf)?;
    let mut derived = derive_kdf_key(&params, password, cancelled)?;
    if derived.len() < 32 {
        derived.zeroize();
        return Err(SignerError::InvalidParameter("dklen must be >= 32".into()))
    }

    let ciphertext = hex::decode(&keystore.crypto.ciphertext)?;
    let mut mac_input = Vec::with_capacity(16 + ciphertext.len());
    mac_input.extend_from_slice(&derived[16..32]);
    mac_input.extend_from_slice(&ciphertext);
    let mac = keccak256(&mac_input);
    mac_input.zeroize();

    let expected_mac = hex::decode(&keystore.crypto.mac)?;
    if mac.as_slice() != expected_mac.as_slice() {
        derived.zeroize();
        tracing::warn!("keystore mac mismatch, rejecting password");
        return Err(SignerError::WrongPassword)
    }

    let iv = hex::decode(&keystore.crypto.cipherparams.iv)?;
    if iv.len() != 16 {
        derived.zeroize();
        return Err(SignerError::InvalidParameter("iv must be 16 bytes".into()))
    }

    let mut plaintext = ciphertext;
    let mut cipher = Aes128Ctr::new(
        GenericArray::from_slice(&derived[..16]),
        GenericArray::from_slice(&iv),
    );
    cipher.apply_keystream(&mut plaintext);
    derived.zeroize();

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trips_with_correct_password() {
        let key = [7u8; 32];
        let address = Address::from_bytes([1u8; 20]);
        let params = KdfParams::Scrypt { n: 16, r: 1, p: 1, dklen: 32, salt: vec![9u8; 32] };
        let keystore = encrypt(&key, b"hunter2", params, address).unwrap();
        let recovered = decrypt(&keystore, b"hunter2").unwrap();
        assert_eq!(recovered, key);
    }

    #[test]
    fn wrong_password_fails_with_wrong_password_error() {
        let key = [7u8; 32];
        let address = Address::from_bytes([1u8; 20]);
        let params = KdfParams::Scrypt { n: 16, r: 1, p: 1, dklen: 32, salt: vec![9u8; 32] };
        let keystore = encrypt(&key, b"hunter2", params, address).unwrap();
        let result = decrypt(&keystore, b"wrong");
        assert!(matches!(result, Err(SignerError::WrongPassword)));
    }

    #[test]
    fn pbkdf2_variant_round_trips() {
        let key = [3u8; 32];
        let address = Address::from_bytes([2u8; 20]);
        let params = KdfParams::Pbkdf2 { c: 64, dklen: 32, salt: vec![1u8; 16] };
        let keystore = encrypt(&key, b"pw", params, address).unwrap();
        let recovered = decrypt(&keystore, b"pw").unwrap();
        assert_eq!(recovered, key);
    }

    #[test]
    fn cancelling_before_start_rejects_with_cancelled() {
        let address = Address::from_bytes([3u8; 20]);
        let params = KdfParams::Scrypt { n: 1 << 17, r: 8, p: 1, dklen: 32, salt: vec![0u8; 32] };
        let handle = encrypt_cancellable(vec![1u8; 32], b"pw".to_vec(), params, address);
        handle.cancel();
        let result = handle.join();
        assert!(matches!(result, Err(SignerError::Cancelled)));
    }

    #[test]
    fn known_web3_secret_storage_v3_vector_decrypts() {
        // https://github.com/ethereum/wiki/wiki/Web3-Secret-Storage-Definition
        let json = r#"{
            "address": "008aeeda4d805471df9b2e5b0f8a7a3d2fdf0fa0",
            "crypto": {
                "cipher": "aes-128-ctr",
                "cipherparams": { "iv": "6087dab2f9fdbbfaddc31a909735c1e6" },
                "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869b1d",
                "kdf": "scrypt",
                "kdfparams": {
                    "dklen": 32,
                    "n": 262144,
                    "r": 8,
                    "p": 1,
                    "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0b"
                },
                "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b"
            },
            "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
            "version": 3
        }"#;
        let keystore = Keystore::from_json(json).unwrap();
        let recovered = decrypt(&keystore, b"testpassword").unwrap();
        assert_eq!(hex::encode(recovered), "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d");
    }
}
