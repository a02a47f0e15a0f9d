//! A byte buffer guaranteed to be zeroed on every exit path.
//!
//! Grounded on the zero-on-drop secret handling in
//! `nconsigny-vanadium/apps/xous-ethapp/ethapp/src/crypto.rs` and
//! `chainflip-io-chainflip-backend`'s multisig crypto modules, both of which lean on
//! the `zeroize` crate rather than a hand-written `Drop` impl. The platform secure
//! allocator referenced in the Ethereum wallet specification's non-goals is out of
//! scope here; this type implements only its contract (zeroed on release), backed by
//! the process heap.

use zeroize::Zeroize;

/// A heap buffer that is zeroed when dropped, regardless of whether it is dropped
/// via normal scope exit, an early `?` return, or unwinding. Deliberately does not
/// implement `Clone` — see [`SecureBytes::try_clone_secure`].
pub struct SecureBytes(Vec<u8>);

impl SecureBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self(Vec::with_capacity(cap))
    }

    pub fn zeroed(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// A read-only view into a subrange; the returned buffer is itself
    /// zero-on-release since it owns a fresh copy rather than borrowing.
    pub fn view(&self, range: std::ops::Range<usize>) -> SecureBytes {
        SecureBytes(self.0[range].to_vec())
    }

    /// Explicit secure clone. There is no `impl Clone` shortcut used by the key
    /// custody core; call sites must opt in here so copying secret material is
    /// always visible at the call site.
    pub fn try_clone_secure(&self) -> SecureBytes {
        SecureBytes(self.0.clone())
    }

    /// Interprets the buffer as UTF-8, returning a zero-on-release string.
    pub fn reveal_str(&self) -> Result<SecureString, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)?;
        Ok(SecureString(self.0.clone()))
    }
}

impl Drop for SecureBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A UTF-8 string view derived from [`SecureBytes`]; inherits the zero-on-release
/// contract rather than being copied onto an ordinary unsecured `String`.
pub struct SecureString(Vec<u8>);

impl SecureString {
    pub fn as_str(&self) -> &str {
        // Safety/invariant: only constructed via `reveal_str` after a successful
        // UTF-8 validation of the same bytes.
        std::str::from_utf8(&self.0).expect("validated at construction")
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
