//! Stealth address engine.
//!
//! ## Protocol overview
//!
//! ### Recipient setup
//! 1. Generate spending key pair: (p, P) where P = p·G
//! 2. Generate viewing key pair: (q, Q) where Q = q·G
//! 3. Publish the meta-address `sip:<chain>:<P>:<Q>`
//!
//! ### Sender flow
//! 1. Generate a fresh ephemeral key pair: (r, R) where R = r·G
//! 2. Compute the shared secret: S = r·P
//! 3. Hash it: h_raw = SHA256(domain || S); view tag = h_raw[0]
//! 4. Derive the one-time address: A = Q + reduce(h_raw)·G
//! 5. Send funds to A and publish (A, R, view tag)
//!
//! ### Recipient scanning
//! 1. For each announcement (A, R, tag): compute S' = p·R (same ECDH point
//!    by commutativity - the sender used the recipient's public key with an
//!    ephemeral secret, the recipient uses the ephemeral public key with
//!    its own secret)
//! 2. Compare the first byte of SHA256(domain || S') against the tag and
//!    bail out on mismatch - this single-byte filter rejects 255/256 of
//!    foreign announcements before any further point arithmetic
//! 3. On a tag match, recompute A' = Q + reduce(h')·G and compare
//! 4. On a full match, the claim key is a = (q + reduce(h')) mod n with
//!    a·G = A
//!
//! The view tag is the first byte of the *raw* hash output, before scalar
//! reduction, on both sides.
//!
//! Scanning holds no state: every candidate check is an independent pure
//! function call, so batches partition freely across workers and cancel
//! cleanly between candidates.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::trace;
use zeroize::Zeroize;

use crate::chains::curve_for_chain;
use crate::curve::{CurveId, CurveOps, SecretScalar};
use crate::error::{CryptoError, CryptoResult};

/// Domain separator for the shared-secret hash.
const STEALTH_DOMAIN: &[u8] = b"sip_stealth_v1";

/// Domain separator for announcement commitments.
const ANNOUNCEMENT_DOMAIN: &[u8] = b"sip_announcement_v1";

/// URI scheme of the textual meta-address encoding.
const META_ADDRESS_SCHEME: &str = "sip";

// ============================================================================
// Meta-Addresses
// ============================================================================

/// A recipient's long-term published key pair. Immutable once issued;
/// rotating means publishing a new meta-address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaAddress {
    chain: String,
    curve: CurveId,
    spending_public: Vec<u8>,
    viewing_public: Vec<u8>,
}

impl MetaAddress {
    /// Assemble a meta-address from raw public keys, validating both points
    /// against the chain's curve.
    pub fn new(chain: &str, spending_public: &[u8], viewing_public: &[u8]) -> CryptoResult<Self> {
        let curve = curve_for_chain(chain)?;
        let ops = curve.ops();
        ops.validate_point(spending_public)?;
        ops.validate_point(viewing_public)?;
        Ok(Self {
            chain: chain.to_string(),
            curve,
            spending_public: spending_public.to_vec(),
            viewing_public: viewing_public.to_vec(),
        })
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn curve(&self) -> CurveId {
        self.curve
    }

    /// Spending public key P (the ECDH target for senders).
    pub fn spending_public(&self) -> &[u8] {
        &self.spending_public
    }

    /// Viewing public key Q (the base the one-time address extends).
    pub fn viewing_public(&self) -> &[u8] {
        &self.viewing_public
    }

    /// Textual form: `sip:<chain>:<hex spending pub>:<hex viewing pub>`.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            META_ADDRESS_SCHEME,
            self.chain,
            hex::encode(&self.spending_public),
            hex::encode(&self.viewing_public),
        )
    }

    /// Parse the textual form. Lossless inverse of [`encode`](Self::encode).
    pub fn decode(encoded: &str) -> CryptoResult<Self> {
        let mut parts = encoded.split(':');
        let scheme = parts
            .next()
            .ok_or_else(|| CryptoError::MalformedMetaAddress("empty string".into()))?;
        if scheme != META_ADDRESS_SCHEME {
            return Err(CryptoError::MalformedMetaAddress(format!(
                "unknown scheme '{scheme}'"
            )));
        }
        let (chain, spending_hex, viewing_hex) = match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some(chain), Some(s), Some(v), None) => (chain, s, v),
            _ => {
                return Err(CryptoError::MalformedMetaAddress(
                    "expected sip:<chain>:<spending>:<viewing>".into(),
                ))
            }
        };

        let spending = hex::decode(spending_hex)
            .map_err(|e| CryptoError::InvalidHex(format!("spending key: {e}")))?;
        let viewing = hex::decode(viewing_hex)
            .map_err(|e| CryptoError::InvalidHex(format!("viewing key: {e}")))?;
        Self::new(chain, &spending, &viewing)
    }

    /// Binary form: spending pub || viewing pub (chain travels separately).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.spending_public.len() + self.viewing_public.len());
        bytes.extend_from_slice(&self.spending_public);
        bytes.extend_from_slice(&self.viewing_public);
        bytes
    }

    /// Decode the binary form for a known chain.
    pub fn from_bytes(chain: &str, bytes: &[u8]) -> CryptoResult<Self> {
        let point_len = curve_for_chain(chain)?.ops().point_len();
        if bytes.len() != 2 * point_len {
            return Err(CryptoError::InvalidLength {
                field: "meta-address",
                expected: 2 * point_len,
                actual: bytes.len(),
            });
        }
        Self::new(chain, &bytes[..point_len], &bytes[point_len..])
    }
}

// ============================================================================
// Recipient Keys
// ============================================================================

/// Complete key set for a stealth recipient.
///
/// Both secret scalars are zeroized on drop. Clone is deliberately not
/// derived, so secrets are never duplicated by accident.
pub struct RecipientKeys {
    spending_secret: SecretScalar,
    viewing_secret: SecretScalar,
    meta: MetaAddress,
}

impl RecipientKeys {
    /// Generate fresh recipient keys for a chain from the injected RNG.
    pub fn generate(chain: &str, rng: &mut dyn RngCore) -> CryptoResult<Self> {
        let ops = curve_for_chain(chain)?.ops();
        let spending_secret = ops.random_scalar(rng);
        let viewing_secret = ops.random_scalar(rng);
        Self::assemble(chain, ops, spending_secret, viewing_secret)
    }

    /// Reconstruct keys from stored secrets.
    pub fn from_secrets(
        chain: &str,
        spending_secret: &[u8; 32],
        viewing_secret: &[u8; 32],
    ) -> CryptoResult<Self> {
        let ops = curve_for_chain(chain)?.ops();
        ops.validate_scalar(spending_secret)?;
        ops.validate_scalar(viewing_secret)?;
        Self::assemble(
            chain,
            ops,
            SecretScalar::from_bytes(*spending_secret),
            SecretScalar::from_bytes(*viewing_secret),
        )
    }

    fn assemble(
        chain: &str,
        ops: &dyn CurveOps,
        spending_secret: SecretScalar,
        viewing_secret: SecretScalar,
    ) -> CryptoResult<Self> {
        let spending_public = ops.basepoint_mul(spending_secret.as_bytes())?;
        let viewing_public = ops.basepoint_mul(viewing_secret.as_bytes())?;
        let meta = MetaAddress::new(chain, &spending_public, &viewing_public)?;
        Ok(Self {
            spending_secret,
            viewing_secret,
            meta,
        })
    }

    /// The published meta-address.
    pub fn meta_address(&self) -> &MetaAddress {
        &self.meta
    }

    /// Export secrets as bytes for encrypted storage. Handle with care.
    pub fn export_secrets(&self) -> ([u8; 32], [u8; 32]) {
        (self.spending_secret.export(), self.viewing_secret.export())
    }

    /// Scan-only delegation handle.
    ///
    /// Scanning needs the spending-private scalar for the ECDH step plus the
    /// viewing *public* key; the viewing-private scalar - the one secret that
    /// claims funds - stays behind.
    pub fn scan_handle(&self) -> ScanHandle {
        ScanHandle {
            curve: self.meta.curve(),
            spending_secret: self.spending_secret.clone(),
            viewing_public: self.meta.viewing_public.clone(),
        }
    }
}

/// Delegate handle that can detect incoming payments but not claim them.
pub struct ScanHandle {
    curve: CurveId,
    spending_secret: SecretScalar,
    viewing_public: Vec<u8>,
}

// ============================================================================
// One-Time Addresses
// ============================================================================

/// A per-transaction one-time address as published in an announcement.
/// Consumed once by the recipient; never reused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthAddress {
    /// The one-time address point A.
    pub address: Vec<u8>,
    /// The sender's ephemeral public key R.
    pub ephemeral_public: Vec<u8>,
    /// First byte of the raw shared-secret hash; the scanning fast filter.
    pub view_tag: u8,
}

impl StealthAddress {
    /// Wire form: address || ephemeral pub || view tag.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.address.len() + self.ephemeral_public.len() + 1);
        bytes.extend_from_slice(&self.address);
        bytes.extend_from_slice(&self.ephemeral_public);
        bytes.push(self.view_tag);
        bytes
    }

    /// Decode and validate the wire form for a given curve.
    pub fn from_bytes(curve: CurveId, bytes: &[u8]) -> CryptoResult<Self> {
        let ops = curve.ops();
        let point_len = ops.point_len();
        if bytes.len() != 2 * point_len + 1 {
            return Err(CryptoError::InvalidLength {
                field: "stealth address",
                expected: 2 * point_len + 1,
                actual: bytes.len(),
            });
        }
        let address = &bytes[..point_len];
        let ephemeral = &bytes[point_len..2 * point_len];
        ops.validate_point(address)?;
        ops.validate_point(ephemeral)?;
        Ok(Self {
            address: address.to_vec(),
            ephemeral_public: ephemeral.to_vec(),
            view_tag: bytes[2 * point_len],
        })
    }
}

/// Outcome of checking one announcement. Non-matches are ordinary returns,
/// not errors - they are the overwhelmingly common case while scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// View tag byte differs; rejected before any address recomputation.
    WrongViewTag,
    /// Tag matched but the fully recomputed address does not.
    WrongAddress,
    /// Full match; the announcement pays this recipient.
    Match,
}

impl ScanOutcome {
    pub fn is_match(self) -> bool {
        self == ScanOutcome::Match
    }
}

/// Raw SHA-256 of the shared-secret point under the stealth domain.
///
/// Byte 0 is the view tag; the scalar is the *reduction* of the whole
/// digest. Keeping the raw digest and the reduced scalar distinct is load-
/// bearing: the tag must come from the raw bytes.
fn shared_secret_hash(
    ops: &dyn CurveOps,
    secret: &[u8; 32],
    point: &[u8],
) -> CryptoResult<[u8; 32]> {
    let mut shared = ops.mul_point(secret, point)?;
    let mut hasher = Sha256::new();
    hasher.update(STEALTH_DOMAIN);
    hasher.update(&shared);
    let digest = hasher.finalize();
    shared.zeroize();

    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}

/// Compute a one-time address for a recipient (sender side).
///
/// Draws a fresh ephemeral scalar from the injected RNG on every call.
/// Ephemeral reuse breaks unlinkability, which is why no caller-supplied
/// ephemeral is accepted.
pub fn generate_stealth_address(
    meta: &MetaAddress,
    rng: &mut dyn RngCore,
) -> CryptoResult<StealthAddress> {
    let ops = meta.curve().ops();

    let ephemeral = ops.random_scalar(rng);
    let ephemeral_public = ops.basepoint_mul(ephemeral.as_bytes())?;

    let digest = shared_secret_hash(ops, ephemeral.as_bytes(), &meta.spending_public)?;
    let view_tag = digest[0];
    let h = ops.reduce_scalar(&digest);

    // A = Q + h·G
    let address = ops.add_points(&meta.viewing_public, &ops.basepoint_mul(&h)?)?;

    Ok(StealthAddress {
        address,
        ephemeral_public,
        view_tag,
    })
}

/// Check one announcement against a scan handle (recipient side).
///
/// The view-tag comparison short-circuits before the candidate address is
/// recomputed; only a tag match pays for the remaining point arithmetic.
pub fn check_stealth_address(
    handle: &ScanHandle,
    candidate: &StealthAddress,
) -> CryptoResult<ScanOutcome> {
    let ops = handle.curve.ops();
    let digest = shared_secret_hash(
        ops,
        handle.spending_secret.as_bytes(),
        &candidate.ephemeral_public,
    )?;

    if digest[0] != candidate.view_tag {
        return Ok(ScanOutcome::WrongViewTag);
    }

    let h = ops.reduce_scalar(&digest);
    let expected = ops.add_points(&handle.viewing_public, &ops.basepoint_mul(&h)?)?;

    if bool::from(expected.ct_eq(&candidate.address)) {
        Ok(ScanOutcome::Match)
    } else {
        Ok(ScanOutcome::WrongAddress)
    }
}

/// Recover the claim key for a matched announcement: a = (q + h) mod n.
///
/// Performs no ownership check. The caller must have confirmed the match via
/// [`check_stealth_address`] first; called on a foreign announcement this
/// silently returns a scalar that controls nothing. That is the documented
/// contract, not a defect.
pub fn derive_stealth_private_key(
    keys: &RecipientKeys,
    candidate: &StealthAddress,
) -> CryptoResult<SecretScalar> {
    let ops = keys.meta.curve().ops();
    let digest = shared_secret_hash(
        ops,
        keys.spending_secret.as_bytes(),
        &candidate.ephemeral_public,
    )?;
    let h = ops.reduce_scalar(&digest);
    let claim = ops.scalar_add(keys.viewing_secret.as_bytes(), &h)?;
    Ok(SecretScalar::from_bytes(claim))
}

/// Scan a batch of announcements, returning the indices that match.
///
/// Candidates are independent, so callers may partition a large set across
/// workers and run this per partition. The cancel flag is checked between
/// candidates; flipping it stops the scan with whatever was found so far.
pub fn scan_announcements(
    handle: &ScanHandle,
    candidates: &[StealthAddress],
    cancel: &AtomicBool,
) -> CryptoResult<Vec<usize>> {
    let mut matches = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            trace!(scanned = index, "scan cancelled");
            break;
        }
        if check_stealth_address(handle, candidate)?.is_match() {
            matches.push(index);
        }
    }
    trace!(
        candidates = candidates.len(),
        matches = matches.len(),
        "scan batch complete"
    );
    Ok(matches)
}

/// Commitment binding an announcement to its meta-address, for off-chain
/// announcement-log integrity checks.
///
/// commitment = SHA256(domain || R || P || Q || A)
pub fn announcement_commitment(meta: &MetaAddress, stealth: &StealthAddress) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(ANNOUNCEMENT_DOMAIN);
    hasher.update(&stealth.ephemeral_public);
    hasher.update(&meta.spending_public);
    hasher.update(&meta.viewing_public);
    hasher.update(&stealth.address);

    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}
