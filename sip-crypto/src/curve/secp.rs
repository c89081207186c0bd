//! secp256k1 (short Weierstrass) backend.
//!
//! Backs the EVM-compatible chains. Points are 33-byte SEC1 compressed
//! encodings; scalars are 32-byte big-endian mod the curve order. The curve
//! has prime order, so unlike the Edwards backend there is no cofactor to
//! clear - on-curve plus non-identity is sufficient.

use std::sync::OnceLock;

use k256::{
    elliptic_curve::{
        ops::Reduce,
        point::DecompressPoint,
        sec1::{FromEncodedPoint, ToEncodedPoint},
        PrimeField,
    },
    AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar, U256,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::Choice;
use tracing::debug;
use zeroize::Zeroize;

use super::{CurveId, CurveOps, SecretScalar, PEDERSEN_H_DOMAIN};
use crate::error::{CryptoError, CryptoResult};

/// Static backend instance.
pub static SECP256K1: Secp256k1Ops = Secp256k1Ops;

/// Derived Pedersen generator, computed once on first use.
static PEDERSEN_H: OnceLock<Vec<u8>> = OnceLock::new();

pub struct Secp256k1Ops;

fn decode_point(bytes: &[u8]) -> CryptoResult<AffinePoint> {
    if bytes.len() != 33 {
        return Err(CryptoError::InvalidLength {
            field: "secp256k1 point",
            expected: 33,
            actual: bytes.len(),
        });
    }
    let encoded = EncodedPoint::from_bytes(bytes)
        .map_err(|_| CryptoError::InvalidPointEncoding("secp256k1"))?;
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(CryptoError::PointNotOnCurve)
}

fn decode_scalar(bytes: &[u8; 32]) -> CryptoResult<Scalar> {
    Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(bytes)))
        .ok_or(CryptoError::InvalidScalar)
}

fn encode_point(point: &ProjectivePoint) -> Vec<u8> {
    point.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

fn scalar_bytes(scalar: &Scalar) -> [u8; 32] {
    scalar.to_repr().into()
}

/// Hash-and-increment derivation of `H` (see [`PEDERSEN_H_DOMAIN`]).
///
/// The digest is interpreted as an x-coordinate and lifted with the even-y
/// root. The first counter yielding a valid point distinct from `G` and the
/// identity wins.
fn derive_pedersen_h() -> Vec<u8> {
    for counter in 0u8..=255 {
        let mut hasher = Sha256::new();
        hasher.update(PEDERSEN_H_DOMAIN);
        hasher.update([counter]);
        let digest = hasher.finalize();

        let x = FieldBytes::clone_from_slice(&digest);
        if let Some(candidate) =
            Option::<AffinePoint>::from(AffinePoint::decompress(&x, Choice::from(0u8)))
        {
            if candidate != AffinePoint::IDENTITY && candidate != AffinePoint::GENERATOR {
                debug!(curve = "secp256k1", counter, "derived Pedersen generator H");
                return candidate.to_encoded_point(true).as_bytes().to_vec();
            }
        }
    }
    // 256 consecutive failed lift attempts has probability ~2^-256.
    unreachable!("Pedersen generator derivation exhausted the counter space")
}

impl CurveOps for Secp256k1Ops {
    fn id(&self) -> CurveId {
        CurveId::Secp256k1
    }

    fn point_len(&self) -> usize {
        33
    }

    fn random_scalar(&self, rng: &mut dyn RngCore) -> SecretScalar {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let scalar =
                <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::clone_from_slice(&bytes));
            bytes.zeroize();
            if !bool::from(scalar.is_zero()) {
                return SecretScalar::from_bytes(scalar_bytes(&scalar));
            }
        }
    }

    fn reduce_scalar(&self, bytes: &[u8; 32]) -> [u8; 32] {
        let scalar = <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::clone_from_slice(bytes));
        scalar_bytes(&scalar)
    }

    fn scalar_from_u64(&self, value: u64) -> [u8; 32] {
        scalar_bytes(&Scalar::from(value))
    }

    fn scalar_add(&self, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]> {
        let sum = decode_scalar(a)? + decode_scalar(b)?;
        Ok(scalar_bytes(&sum))
    }

    fn scalar_sub(&self, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]> {
        let diff = decode_scalar(a)? - decode_scalar(b)?;
        Ok(scalar_bytes(&diff))
    }

    fn scalar_is_zero(&self, scalar: &[u8; 32]) -> bool {
        match decode_scalar(scalar) {
            Ok(s) => bool::from(s.is_zero()),
            Err(_) => false,
        }
    }

    fn validate_scalar(&self, scalar: &[u8; 32]) -> CryptoResult<()> {
        decode_scalar(scalar).map(|_| ())
    }

    fn scalar_one(&self) -> [u8; 32] {
        scalar_bytes(&Scalar::ONE)
    }

    fn basepoint_mul(&self, scalar: &[u8; 32]) -> CryptoResult<Vec<u8>> {
        let k = decode_scalar(scalar)?;
        Ok(encode_point(&(ProjectivePoint::GENERATOR * k)))
    }

    fn mul_point(&self, scalar: &[u8; 32], point: &[u8]) -> CryptoResult<Vec<u8>> {
        let k = decode_scalar(scalar)?;
        let p = ProjectivePoint::from(decode_point(point)?);
        Ok(encode_point(&(p * k)))
    }

    fn add_points(&self, p: &[u8], q: &[u8]) -> CryptoResult<Vec<u8>> {
        let sum = ProjectivePoint::from(decode_point(p)?) + ProjectivePoint::from(decode_point(q)?);
        Ok(encode_point(&sum))
    }

    fn sub_points(&self, p: &[u8], q: &[u8]) -> CryptoResult<Vec<u8>> {
        let diff =
            ProjectivePoint::from(decode_point(p)?) - ProjectivePoint::from(decode_point(q)?);
        Ok(encode_point(&diff))
    }

    fn validate_point(&self, point: &[u8]) -> CryptoResult<()> {
        let decoded = decode_point(point)?;
        if decoded == AffinePoint::IDENTITY {
            return Err(CryptoError::IdentityPoint);
        }
        Ok(())
    }

    fn pedersen_h(&self) -> &'static [u8] {
        PEDERSEN_H.get_or_init(derive_pedersen_h)
    }

    fn pedersen_commit(&self, value: u64, blinding: &[u8; 32]) -> CryptoResult<Vec<u8>> {
        let r = decode_scalar(blinding)?;
        let h = ProjectivePoint::from(decode_point(self.pedersen_h())?);
        let commitment = ProjectivePoint::GENERATOR * Scalar::from(value) + h * r;
        Ok(encode_point(&commitment))
    }

    fn uncompress_point(&self, point: &[u8]) -> CryptoResult<Vec<u8>> {
        let decoded = decode_point(point)?;
        if decoded == AffinePoint::IDENTITY {
            return Err(CryptoError::IdentityPoint);
        }
        Ok(decoded.to_encoded_point(false).as_bytes().to_vec())
    }
}
