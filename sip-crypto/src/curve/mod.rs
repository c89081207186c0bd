//! Curve capability layer.
//!
//! Every engine in this crate is generic over a small "curve operations"
//! capability rather than a concrete curve: scalar arithmetic mod the group
//! order, point multiply/add, compressed encode/decode, and the derived
//! Pedersen generator. Two backends exist - short-Weierstrass secp256k1 for
//! EVM-compatible chains and Edwards curve25519 for chains that want raw
//! 32-byte public keys. Curve choice changes only the group arithmetic,
//! never the protocol logic.
//!
//! Wire conventions:
//! - Scalars are 32 bytes in the curve's native encoding (big-endian SEC1
//!   for secp256k1, little-endian for curve25519).
//! - Points are the curve's compressed encoding: 33 bytes SEC1 for
//!   secp256k1, 32 bytes compressed Edwards Y for curve25519.
//! Scalars and points never cross a curve boundary.

pub mod edwards;
pub mod secp;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::CryptoResult;

/// Domain separator for deriving the Pedersen generator `H`.
///
/// `H` must be a nothing-up-my-sleeve point: hash the domain string plus an
/// incrementing counter byte, lift the digest onto the curve, and accept the
/// first counter that produces a valid non-identity point distinct from `G`.
/// No party knows `log_G(H)`.
pub(crate) const PEDERSEN_H_DOMAIN: &[u8] = b"SIP-PEDERSEN-GENERATOR-H-v1";

/// The closed set of supported curve families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveId {
    /// secp256k1 (short Weierstrass) - EVM-compatible chains.
    Secp256k1,
    /// curve25519 (Edwards) - chains using raw 32-byte public keys.
    Ed25519,
}

impl CurveId {
    /// Look up the static backend for this curve.
    pub fn ops(self) -> &'static dyn CurveOps {
        match self {
            CurveId::Secp256k1 => &secp::SECP256K1,
            CurveId::Ed25519 => &edwards::ED25519,
        }
    }
}

// ============================================================================
// Zeroizing Scalar Wrapper
// ============================================================================

/// A secret scalar that zeroizes its contents on drop.
///
/// Holds the 32-byte curve-native encoding. The inner bytes are wiped, not
/// just a copy, so secrets do not linger after the owning key set goes away.
#[derive(Clone)]
pub struct SecretScalar {
    bytes: [u8; 32],
}

impl SecretScalar {
    /// Wrap raw scalar bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// The raw bytes (handle with care).
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Copy out the raw bytes for encrypted storage.
    pub fn export(&self) -> [u8; 32] {
        self.bytes
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretScalar").finish_non_exhaustive()
    }
}

// ============================================================================
// Curve Operations Capability
// ============================================================================

/// Group arithmetic capability implemented by each curve backend.
///
/// All methods are pure and hold no state; backends are unit structs with a
/// single static instance each, so `&'static dyn CurveOps` is safe to share
/// across threads. The only cached piece is the derived Pedersen generator,
/// which is computed once and read-only thereafter.
pub trait CurveOps: Send + Sync {
    /// Which curve this backend implements.
    fn id(&self) -> CurveId;

    /// Length of a compressed point encoding in bytes.
    fn point_len(&self) -> usize;

    /// Draw a uniformly random nonzero scalar from the supplied RNG.
    ///
    /// The RNG is an injected dependency; callers decide whether it is OS
    /// entropy or a seeded generator for deterministic tests.
    fn random_scalar(&self, rng: &mut dyn RngCore) -> SecretScalar;

    /// Reduce 32 arbitrary bytes to a canonical scalar mod the group order.
    fn reduce_scalar(&self, bytes: &[u8; 32]) -> [u8; 32];

    /// Lift a small non-negative integer into a scalar.
    fn scalar_from_u64(&self, value: u64) -> [u8; 32];

    /// `(a + b) mod n`. Errors if either input is non-canonical.
    fn scalar_add(&self, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]>;

    /// `(a - b) mod n`. Errors if either input is non-canonical.
    fn scalar_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]>;

    /// Whether the encoding is the zero scalar.
    fn scalar_is_zero(&self, scalar: &[u8; 32]) -> bool;

    /// Reject non-canonical scalar encodings (values >= the group order).
    fn validate_scalar(&self, scalar: &[u8; 32]) -> CryptoResult<()>;

    /// The scalar one, in wire encoding.
    fn scalar_one(&self) -> [u8; 32];

    /// `k·G` as a compressed point.
    fn basepoint_mul(&self, scalar: &[u8; 32]) -> CryptoResult<Vec<u8>>;

    /// `k·P` as a compressed point. Validates and decodes `point` first.
    fn mul_point(&self, scalar: &[u8; 32], point: &[u8]) -> CryptoResult<Vec<u8>>;

    /// `P + Q` as a compressed point.
    fn add_points(&self, p: &[u8], q: &[u8]) -> CryptoResult<Vec<u8>>;

    /// `P - Q` as a compressed point.
    fn sub_points(&self, p: &[u8], q: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Check that the bytes decode to a usable group element: on the curve,
    /// not the identity, and (for Edwards) free of small-order components.
    fn validate_point(&self, point: &[u8]) -> CryptoResult<()>;

    /// The derived Pedersen generator `H` (compressed), computed once via
    /// the hash-and-increment construction under [`PEDERSEN_H_DOMAIN`].
    fn pedersen_h(&self) -> &'static [u8];

    /// `value·G + blinding·H` as a compressed point.
    ///
    /// Computed entirely in the point domain so that a zero value (whose
    /// `value·G` term is the identity) never round-trips through a point
    /// encoding mid-computation.
    fn pedersen_commit(&self, value: u64, blinding: &[u8; 32]) -> CryptoResult<Vec<u8>>;

    /// Uncompressed encoding of a point, for chain address formatters that
    /// hash the full coordinates (65-byte SEC1 for secp256k1; Edwards points
    /// are returned as their canonical 32 bytes unchanged).
    fn uncompress_point(&self, point: &[u8]) -> CryptoResult<Vec<u8>>;
}
