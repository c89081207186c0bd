//! Viewing-key engine: hierarchical key derivation and authenticated
//! encryption of transaction metadata for selective disclosure.
//!
//! Keys form a tree rooted at a per-user master key. Children are derived
//! with HKDF-SHA256 (salt = path segment, ikm = parent key) and can
//! themselves be parents, to unlimited depth. Derivation is one-way: a child
//! reveals nothing about its parent or siblings, so handing an auditor
//! `/m/audit/2024` scopes them to exactly that subtree. There is no runtime
//! tree object - callers pass concrete parent key bytes at each call.
//!
//! Payload encryption is XChaCha20-Poly1305 with a random 24-byte nonce
//! (extended nonces make random generation collision-safe). The AEAD key is
//! always a derived sub-key, never the raw viewing key bytes, so encryption
//! can never be confused with sibling derivation.

use borsh::{BorshDeserialize, BorshSerialize};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};

/// Domain separation label for child-key derivation.
const DERIVE_INFO: &[u8] = b"sip-viewing-derive-v1";

/// Domain separation label for the AEAD sub-key.
const ENCRYPT_INFO: &[u8] = b"sip-viewing-encrypt-v1";

/// Viewing key material length.
pub const VIEWING_KEY_LEN: usize = 32;

/// XChaCha20-Poly1305 nonce length.
pub const NONCE_LEN: usize = 24;

/// Poly1305 authentication tag length.
pub const TAG_LEN: usize = 16;

// ============================================================================
// Viewing Keys
// ============================================================================

/// A node in the viewing-key hierarchy: opaque key bytes plus the
/// derivation path that produced them. Key material is zeroized on drop.
pub struct ViewingKey {
    key: [u8; VIEWING_KEY_LEN],
    path: String,
}

impl ViewingKey {
    /// Generate a fresh root key tagged with a path label.
    pub fn generate(path: &str, rng: &mut dyn RngCore) -> Self {
        let mut key = [0u8; VIEWING_KEY_LEN];
        rng.fill_bytes(&mut key);
        Self {
            key,
            path: path.to_string(),
        }
    }

    /// Reconstruct a key from stored bytes and its path.
    pub fn from_bytes(key: [u8; VIEWING_KEY_LEN], path: &str) -> Self {
        Self {
            key,
            path: path.to_string(),
        }
    }

    /// The derivation path of this node.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Export key material for encrypted storage. Handle with care.
    pub fn export(&self) -> [u8; VIEWING_KEY_LEN] {
        self.key
    }

    /// Derive a child key for a path segment.
    ///
    /// Deterministic: the same parent and segment always yield the same
    /// child. One-way: the child computationally reveals nothing about the
    /// parent or any sibling.
    pub fn derive_child(&self, segment: &str) -> CryptoResult<ViewingKey> {
        if segment.is_empty() {
            return Err(CryptoError::EmptyPathSegment);
        }
        let hk = Hkdf::<Sha256>::new(Some(segment.as_bytes()), &self.key);
        let mut child = [0u8; VIEWING_KEY_LEN];
        hk.expand(DERIVE_INFO, &mut child)
            .map_err(|e| CryptoError::InternalError(format!("hkdf expand: {e}")))?;
        Ok(ViewingKey {
            key: child,
            path: format!("{}/{}", self.path.trim_end_matches('/'), segment),
        })
    }

    /// AEAD sub-key for payload encryption. Never hands out the raw viewing
    /// key bytes.
    fn encryption_subkey(&self) -> CryptoResult<[u8; VIEWING_KEY_LEN]> {
        let hk = Hkdf::<Sha256>::new(None, &self.key);
        let mut subkey = [0u8; VIEWING_KEY_LEN];
        hk.expand(ENCRYPT_INFO, &mut subkey)
            .map_err(|e| CryptoError::InternalError(format!("hkdf expand: {e}")))?;
        Ok(subkey)
    }

    pub(crate) fn key_bytes(&self) -> &[u8; VIEWING_KEY_LEN] {
        &self.key
    }
}

impl Drop for ViewingKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for ViewingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewingKey")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Encrypted Payloads
// ============================================================================

/// An authenticated ciphertext bound to exactly one viewing key. Immutable
/// once produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    nonce: [u8; NONCE_LEN],
    /// Ciphertext with the 16-byte Poly1305 tag appended.
    ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Wire form: nonce || ciphertext || tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Decode the wire form.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::InvalidLength {
                field: "encrypted payload",
                expected: NONCE_LEN + TAG_LEN,
                actual: bytes.len(),
            });
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        Ok(Self {
            nonce,
            ciphertext: bytes[NONCE_LEN..].to_vec(),
        })
    }
}

/// Encrypt a record for one viewing-key holder.
///
/// The record is serialized with its canonical borsh encoding, then sealed
/// under a sub-key derived from `key` with a fresh random 24-byte nonce.
pub fn encrypt_for_viewing<T: BorshSerialize>(
    record: &T,
    key: &ViewingKey,
    rng: &mut dyn RngCore,
) -> CryptoResult<EncryptedPayload> {
    let mut plaintext = record
        .try_to_vec()
        .map_err(|e| CryptoError::Serialization(e.to_string()))?;

    let mut subkey = key.encryption_subkey()?;
    let cipher = XChaCha20Poly1305::new_from_slice(&subkey)
        .map_err(|e| CryptoError::InternalError(format!("cipher init: {e}")))?;
    subkey.zeroize();

    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|e| CryptoError::InternalError(format!("encryption: {e}")))?;
    plaintext.zeroize();

    Ok(EncryptedPayload { nonce, ciphertext })
}

/// Multi-key mode: independently encrypt the same record once per key.
///
/// Each holder gets a fully separate ciphertext - no shared wrapped-key
/// structure - so compromising one key exposes nothing beyond the plaintext
/// that key was already entitled to.
pub fn encrypt_for_viewing_multi<T: BorshSerialize>(
    record: &T,
    keys: &[&ViewingKey],
    rng: &mut dyn RngCore,
) -> CryptoResult<Vec<EncryptedPayload>> {
    keys.iter()
        .map(|key| encrypt_for_viewing(record, key, rng))
        .collect()
}

/// Decrypt and deserialize a payload with a viewing key.
///
/// Fails closed: authentication failure yields no partial output, and a
/// wrong key is indistinguishable from a corrupted payload
/// ([`CryptoError::DecryptionFailed`] in both cases, to avoid standing up a
/// decryption oracle).
pub fn decrypt_with_viewing<T: BorshDeserialize>(
    payload: &EncryptedPayload,
    key: &ViewingKey,
) -> CryptoResult<T> {
    let mut subkey = key.encryption_subkey()?;
    let cipher = XChaCha20Poly1305::new_from_slice(&subkey)
        .map_err(|e| CryptoError::InternalError(format!("cipher init: {e}")))?;
    subkey.zeroize();

    let mut plaintext = cipher
        .decrypt(
            XNonce::from_slice(&payload.nonce),
            payload.ciphertext.as_slice(),
        )
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let record =
        T::try_from_slice(&plaintext).map_err(|e| CryptoError::Serialization(e.to_string()));
    plaintext.zeroize();
    record
}
