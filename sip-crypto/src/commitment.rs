//! Pedersen commitment engine.
//!
//! A commitment hides an amount as `C = value·G + blinding·H`, where `H` is
//! the per-curve nothing-up-my-sleeve generator (see the curve layer).
//! Commitments are perfectly hiding, computationally binding, and additively
//! homomorphic: `C1 + C2` commits to `value1 + value2` under blinding
//! `r1 + r2`. Callers that want to open a combined commitment must track
//! blinding factors through the matching [`add_blindings`] /
//! [`sub_blindings`] helpers.
//!
//! Values are `u64`. The group supports amounts up to the curve order, but
//! the API narrows the value domain to `u64`, so a homomorphic sum is
//! openable only while the total stays within `u64`. Callers combining
//! commitments check `value1.checked_add(value2)` themselves; the point
//! addition cannot.
//!
//! ## Zero-blinding policy
//!
//! A caller-supplied blinding factor of zero is substituted with scalar one
//! rather than rejected. This is a deliberate protocol-level policy (zero is
//! reserved as an invalid sentinel) and both `commit` and `verify_opening`
//! apply it, so the two sides always agree.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::curve::{CurveId, CurveOps};
use crate::error::{CryptoError, CryptoResult};

/// Wire length of a blinding factor.
pub const BLINDING_LEN: usize = 32;

/// A Pedersen commitment: a compressed curve point plus the curve it lives
/// on. The committed value and blinding factor are not part of this type -
/// they travel separately as an [`Opening`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    curve: CurveId,
    point: Vec<u8>,
}

impl Commitment {
    /// Which curve the commitment point lives on.
    pub fn curve(&self) -> CurveId {
        self.curve
    }

    /// The compressed point, as sent to the proof/settlement layer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.point
    }

    /// Decode a commitment from its compressed-point wire form.
    pub fn from_bytes(curve: CurveId, bytes: &[u8]) -> CryptoResult<Self> {
        curve.ops().validate_point(bytes)?;
        Ok(Self {
            curve,
            point: bytes.to_vec(),
        })
    }
}

/// The secret side of a commitment: the hidden value and its blinding
/// factor. Needed to open the commitment later; disclose deliberately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Opening {
    pub value: u64,
    pub blinding: [u8; BLINDING_LEN],
}

/// Apply the documented zero-blinding substitution.
fn normalize_blinding(ops: &dyn CurveOps, blinding: [u8; 32]) -> [u8; 32] {
    if ops.scalar_is_zero(&blinding) {
        ops.scalar_one()
    } else {
        blinding
    }
}

/// Commit to `value` under a blinding factor.
///
/// If `blinding` is `None` a fresh random nonzero scalar is drawn from the
/// injected RNG. A supplied blinding must be a canonical scalar; zero is
/// substituted per the module-level policy. Deterministic given its inputs,
/// no side effects.
///
/// Any `u64` commits cleanly, but an opening can only ever name a `u64`
/// value: summed commitments whose true total exceeds `u64::MAX` are
/// unopenable (see the module-level note on the value domain).
pub fn commit(
    curve: CurveId,
    value: u64,
    blinding: Option<[u8; 32]>,
    rng: &mut dyn RngCore,
) -> CryptoResult<(Commitment, Opening)> {
    let ops = curve.ops();
    let blinding = match blinding {
        Some(supplied) => {
            ops.validate_scalar(&supplied)?;
            normalize_blinding(ops, supplied)
        }
        None => ops.random_scalar(rng).export(),
    };

    let point = ops.pedersen_commit(value, &blinding)?;
    Ok((
        Commitment { curve, point },
        Opening { value, blinding },
    ))
}

/// Check that `(value, blinding)` opens `commitment`.
///
/// Recomputes `value·G + blinding·H` (with the same zero substitution) and
/// compares against the commitment in constant time. Returns `Ok(false)` on
/// mismatch; errors are reserved for malformed inputs.
pub fn verify_opening(
    commitment: &Commitment,
    value: u64,
    blinding: &[u8; 32],
) -> CryptoResult<bool> {
    let ops = commitment.curve.ops();
    ops.validate_scalar(blinding)?;
    let normalized = normalize_blinding(ops, *blinding);
    let recomputed = ops.pedersen_commit(value, &normalized)?;
    Ok(bool::from(recomputed.ct_eq(&commitment.point)))
}

/// Homomorphic addition: the result commits to `value1 + value2` under
/// blinding `r1 + r2`.
pub fn add_commitments(c1: &Commitment, c2: &Commitment) -> CryptoResult<Commitment> {
    if c1.curve != c2.curve {
        return Err(CryptoError::CurveMismatch);
    }
    let point = c1.curve.ops().add_points(&c1.point, &c2.point)?;
    Ok(Commitment {
        curve: c1.curve,
        point,
    })
}

/// Homomorphic subtraction: the result commits to `value1 - value2` under
/// blinding `r1 - r2`.
pub fn sub_commitments(c1: &Commitment, c2: &Commitment) -> CryptoResult<Commitment> {
    if c1.curve != c2.curve {
        return Err(CryptoError::CurveMismatch);
    }
    let point = c1.curve.ops().sub_points(&c1.point, &c2.point)?;
    Ok(Commitment {
        curve: c1.curve,
        point,
    })
}

/// Blinding-factor companion to [`add_commitments`].
pub fn add_blindings(curve: CurveId, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]> {
    curve.ops().scalar_add(a, b)
}

/// Blinding-factor companion to [`sub_commitments`].
pub fn sub_blindings(curve: CurveId, a: &[u8; 32], b: &[u8; 32]) -> CryptoResult<[u8; 32]> {
    curve.ops().scalar_sub(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn both_curves() -> [CurveId; 2] {
        [CurveId::Secp256k1, CurveId::Ed25519]
    }

    #[test]
    fn commit_and_open_round_trip() {
        let mut rng = OsRng;
        for curve in both_curves() {
            let (commitment, opening) = commit(curve, 1000, None, &mut rng).unwrap();
            assert!(verify_opening(&commitment, 1000, &opening.blinding).unwrap());
            assert!(!verify_opening(&commitment, 999, &opening.blinding).unwrap());
        }
    }

    #[test]
    fn commitments_do_not_reveal_the_value() {
        // Hiding: with independent random blinding, commitments to the same
        // value never repeat and commitments to different values are not
        // distinguishable by inspection of the point bytes.
        let mut rng = OsRng;
        for curve in both_curves() {
            let (a, _) = commit(curve, 5, None, &mut rng).unwrap();
            let (b, _) = commit(curve, 5, None, &mut rng).unwrap();
            let (c, _) = commit(curve, 6, None, &mut rng).unwrap();
            assert_ne!(a, b);
            assert_ne!(a, c);
            assert_eq!(a.as_bytes().len(), c.as_bytes().len());
        }
    }

    #[test]
    fn wrong_blinding_fails_to_open() {
        let mut rng = OsRng;
        for curve in both_curves() {
            let (commitment, _) = commit(curve, 50, None, &mut rng).unwrap();
            let other = curve.ops().random_scalar(&mut rng).export();
            assert!(!verify_opening(&commitment, 50, &other).unwrap());
        }
    }

    #[test]
    fn zero_blinding_is_substituted_with_one() {
        // Documented policy: a supplied zero blinding becomes scalar one on
        // both the commit and verify sides, so the two stay consistent.
        let mut rng = OsRng;
        for curve in both_curves() {
            let ops = curve.ops();
            let (with_zero, opening) = commit(curve, 7, Some([0u8; 32]), &mut rng).unwrap();
            assert_eq!(opening.blinding, ops.scalar_one());

            let (with_one, _) = commit(curve, 7, Some(ops.scalar_one()), &mut rng).unwrap();
            assert_eq!(with_zero, with_one);

            assert!(verify_opening(&with_zero, 7, &[0u8; 32]).unwrap());
            assert!(verify_opening(&with_zero, 7, &ops.scalar_one()).unwrap());
        }
    }

    #[test]
    fn commitments_are_homomorphic() {
        let mut rng = OsRng;
        for curve in both_curves() {
            let (c1, o1) = commit(curve, 100, None, &mut rng).unwrap();
            let (c2, o2) = commit(curve, 200, None, &mut rng).unwrap();

            let sum = add_commitments(&c1, &c2).unwrap();
            let blinding = add_blindings(curve, &o1.blinding, &o2.blinding).unwrap();
            assert!(verify_opening(&sum, 300, &blinding).unwrap());

            let diff = sub_commitments(&c2, &c1).unwrap();
            let blinding = sub_blindings(curve, &o2.blinding, &o1.blinding).unwrap();
            assert!(verify_opening(&diff, 100, &blinding).unwrap());
        }
    }

    #[test]
    fn homomorphism_holds_for_zero_values() {
        let mut rng = OsRng;
        for curve in both_curves() {
            let (c1, o1) = commit(curve, 0, None, &mut rng).unwrap();
            let (c2, o2) = commit(curve, 0, None, &mut rng).unwrap();
            let sum = add_commitments(&c1, &c2).unwrap();
            let blinding = add_blindings(curve, &o1.blinding, &o2.blinding).unwrap();
            assert!(verify_opening(&sum, 0, &blinding).unwrap());
        }
    }

    #[test]
    fn homomorphism_holds_at_the_value_domain_boundary() {
        let mut rng = OsRng;
        for curve in both_curves() {
            let (c1, o1) = commit(curve, u64::MAX - 3, None, &mut rng).unwrap();
            let (c2, o2) = commit(curve, 3, None, &mut rng).unwrap();

            let sum = add_commitments(&c1, &c2).unwrap();
            let blinding = add_blindings(curve, &o1.blinding, &o2.blinding).unwrap();
            assert!(verify_opening(&sum, u64::MAX, &blinding).unwrap());
            assert!(!verify_opening(&sum, u64::MAX - 1, &blinding).unwrap());

            let diff = sub_commitments(&c1, &c2).unwrap();
            let blinding = sub_blindings(curve, &o1.blinding, &o2.blinding).unwrap();
            assert!(verify_opening(&diff, u64::MAX - 6, &blinding).unwrap());
        }
    }

    #[test]
    fn sums_past_the_value_domain_are_unopenable() {
        // The group happily adds the points, but no u64 value names the true
        // total, so the combined commitment cannot be opened. Callers must
        // guard with checked_add before relying on a homomorphic sum.
        let mut rng = OsRng;
        assert!(u64::MAX.checked_add(1).is_none());
        for curve in both_curves() {
            let (c1, o1) = commit(curve, u64::MAX, None, &mut rng).unwrap();
            let (c2, o2) = commit(curve, 1, None, &mut rng).unwrap();

            let sum = add_commitments(&c1, &c2).unwrap();
            let blinding = add_blindings(curve, &o1.blinding, &o2.blinding).unwrap();

            // Neither the wrapped value nor either endpoint opens it: the
            // scalar 2^64 is not congruent to any u64 mod the group order.
            assert!(!verify_opening(&sum, 0, &blinding).unwrap());
            assert!(!verify_opening(&sum, u64::MAX, &blinding).unwrap());
            assert!(!verify_opening(&sum, 1, &blinding).unwrap());
        }
    }

    #[test]
    fn cross_curve_addition_is_rejected() {
        let mut rng = OsRng;
        let (c1, _) = commit(CurveId::Secp256k1, 1, None, &mut rng).unwrap();
        let (c2, _) = commit(CurveId::Ed25519, 1, None, &mut rng).unwrap();
        assert_eq!(add_commitments(&c1, &c2), Err(CryptoError::CurveMismatch));
    }

    #[test]
    fn wire_round_trip() {
        let mut rng = OsRng;
        for curve in both_curves() {
            let (commitment, _) = commit(curve, 42, None, &mut rng).unwrap();
            let decoded = Commitment::from_bytes(curve, commitment.as_bytes()).unwrap();
            assert_eq!(commitment, decoded);
            assert_eq!(commitment.as_bytes().len(), curve.ops().point_len());
        }
    }

    #[test]
    fn garbage_commitment_bytes_are_rejected() {
        assert!(Commitment::from_bytes(CurveId::Secp256k1, &[0xFFu8; 33]).is_err());
        assert!(Commitment::from_bytes(CurveId::Ed25519, &[0xFFu8; 32]).is_err());
    }
}
