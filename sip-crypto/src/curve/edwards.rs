//! curve25519 (Edwards) backend.
//!
//! Backs the chains that publish raw 32-byte public keys. Points are
//! compressed Edwards Y encodings; scalars are little-endian mod the
//! basepoint order l. Decoded points are rejected unless they are
//! torsion-free, so every value reaching the engines lives in the
//! prime-order subgroup.

use std::sync::OnceLock;

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
    traits::Identity,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroize;

use super::{CurveId, CurveOps, SecretScalar, PEDERSEN_H_DOMAIN};
use crate::error::{CryptoError, CryptoResult};

/// Static backend instance.
pub static ED25519: Ed25519Ops = Ed25519Ops;

/// Derived Pedersen generator, computed once on first use.
static PEDERSEN_H: OnceLock<[u8; 32]> = OnceLock::new();

pub struct Ed25519Ops;

fn decode_point(bytes: &[u8]) -> CryptoResult<EdwardsPoint> {
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidLength {
            field: "ed25519 point",
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(bytes);
    CompressedEdwardsY(buf)
        .decompress()
        .ok_or(CryptoError::PointNotOnCurve)
}

fn decode_scalar(bytes: &[u8; 32]) -> CryptoResult<Scalar> {
    Scalar::from_canonical_bytes(*bytes).ok_or(CryptoError::InvalidScalar)
}

/// Hash-and-increment derivation of `H` (see [`PEDERSEN_H_DOMAIN`]).
///
/// The digest is interpreted as a compressed Edwards Y coordinate; valid
/// decompressions are cofactor-cleared into the prime-order subgroup. The
/// first counter yielding a point that is neither the identity nor `G` wins.
fn derive_pedersen_h() -> [u8; 32] {
    let g = ED25519_BASEPOINT_POINT;
    for counter in 0u8..=255 {
        let mut hasher = Sha256::new();
        hasher.update(PEDERSEN_H_DOMAIN);
        hasher.update([counter]);
        let digest = hasher.finalize();

        let mut candidate_bytes = [0u8; 32];
        candidate_bytes.copy_from_slice(&digest);
        if let Some(point) = CompressedEdwardsY(candidate_bytes).decompress() {
            let cleared = point.mul_by_cofactor();
            if cleared != EdwardsPoint::identity() && cleared != g {
                debug!(curve = "ed25519", counter, "derived Pedersen generator H");
                return cleared.compress().to_bytes();
            }
        }
    }
    // 256 consecutive failed lift attempts has probability ~2^-256.
    unreachable!("Pedersen generator derivation exhausted the counter space")
}

impl CurveOps for Ed25519Ops {
    fn id(&self) -> CurveId {
        CurveId::Ed25519
    }

    fn point_len(&self) -> usize {
        32
    }

    fn random_scalar(&self, rng: &mut dyn RngCore) -> SecretScalar {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let scalar = Scalar::from_bytes_mod_order(bytes);
            bytes.zeroize();
            if scalar != Scalar::zero() {
                return SecretScalar::from_bytes(scalar.to_bytes());
            }
        }
    }

    fn reduce_scalar(&self, bytes: &[u8; 32]) -> [u8; 32] {
        Scalar::from_bytes_mod_order(*bytes).to_bytes()
    }

    fn scalar_from_u64(&self, value: u64) -> [u8; 32] {
        Scalar::from(value).to_bytes()
    }

    fn scalar_add(&self, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]> {
        let sum = decode_scalar(a)? + decode_scalar(b)?;
        Ok(sum.to_bytes())
    }

    fn scalar_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]> {
        let diff = decode_scalar(a)? - decode_scalar(b)?;
        Ok(diff.to_bytes())
    }

    fn scalar_is_zero(&self, scalar: &[u8; 32]) -> bool {
        Scalar::from_bytes_mod_order(*scalar) == Scalar::zero()
    }

    fn validate_scalar(&self, scalar: &[u8; 32]) -> CryptoResult<()> {
        decode_scalar(scalar).map(|_| ())
    }

    fn scalar_one(&self) -> [u8; 32] {
        Scalar::one().to_bytes()
    }

    fn basepoint_mul(&self, scalar: &[u8; 32]) -> CryptoResult<Vec<u8>> {
        let k = decode_scalar(scalar)?;
        let point = &k * &ED25519_BASEPOINT_POINT;
        Ok(point.compress().to_bytes().to_vec())
    }

    fn mul_point(&self, scalar: &[u8; 32], point: &[u8]) -> CryptoResult<Vec<u8>> {
        let k = decode_scalar(scalar)?;
        let p = decode_point(point)?;
        Ok((&k * &p).compress().to_bytes().to_vec())
    }

    fn add_points(&self, p: &[u8], q: &[u8]) -> CryptoResult<Vec<u8>> {
        let sum = decode_point(p)? + decode_point(q)?;
        Ok(sum.compress().to_bytes().to_vec())
    }

    fn sub_points(&self, p: &[u8], q: &[u8]) -> CryptoResult<Vec<u8>> {
        let diff = decode_point(p)? - decode_point(q)?;
        Ok(diff.compress().to_bytes().to_vec())
    }

    fn validate_point(&self, point: &[u8]) -> CryptoResult<()> {
        let decoded = decode_point(point)?;
        if decoded == EdwardsPoint::identity() {
            return Err(CryptoError::IdentityPoint);
        }
        // Small-order and mixed-order points enable key-leak tricks in the
        // ECDH step; only prime-order subgroup elements are accepted.
        if decoded.is_small_order() || !decoded.is_torsion_free() {
            return Err(CryptoError::PointNotOnCurve);
        }
        Ok(())
    }

    fn pedersen_h(&self) -> &'static [u8] {
        PEDERSEN_H.get_or_init(derive_pedersen_h)
    }

    fn pedersen_commit(&self, value: u64, blinding: &[u8; 32]) -> CryptoResult<Vec<u8>> {
        let r = decode_scalar(blinding)?;
        let h = decode_point(self.pedersen_h())?;
        let v = Scalar::from(value);
        let commitment = &v * &ED25519_BASEPOINT_POINT + &r * &h;
        Ok(commitment.compress().to_bytes().to_vec())
    }

    fn uncompress_point(&self, point: &[u8]) -> CryptoResult<Vec<u8>> {
        // The compressed Y form is already the canonical public encoding.
        self.validate_point(point)?;
        Ok(point.to_vec())
    }
}
