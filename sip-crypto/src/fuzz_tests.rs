//! Property-based tests for the SIP crypto engines.
//!
//! Properties covered:
//! - Commitment binding: an opening verifies iff value and blinding match
//! - Homomorphism: sums of commitments open to sums of values
//! - Zero-blinding substitution: zero and one blindings are interchangeable
//! - Stealth correctness: recipients always detect and can claim their own
//!   payments, on both curve families
//! - Unlinkability: repeated payments to one meta-address share nothing
//! - KDF determinism and divergence across segments
//! - AEAD round-trip for arbitrary records

use proptest::prelude::*;
use rand::rngs::OsRng;

use crate::commitment::{add_blindings, add_commitments, commit, verify_opening};
use crate::curve::CurveId;
use crate::stealth::{
    check_stealth_address, derive_stealth_private_key, generate_stealth_address, MetaAddress,
    RecipientKeys, ScanOutcome,
};
use crate::viewing::{decrypt_with_viewing, encrypt_for_viewing, ViewingKey};

fn curve_strategy() -> impl Strategy<Value = CurveId> {
    prop_oneof![Just(CurveId::Secp256k1), Just(CurveId::Ed25519)]
}

fn chain_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("ethereum"), Just("near"), Just("solana")]
}

fn raw_scalar() -> impl Strategy<Value = [u8; 32]> {
    prop::array::uniform32(any::<u8>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// An opening verifies against its own commitment and fails against any
    /// other value.
    #[test]
    fn prop_commitment_binding(
        curve in curve_strategy(),
        value in any::<u64>(),
        other in any::<u64>(),
    ) {
        let mut rng = OsRng;
        let (commitment, opening) = commit(curve, value, None, &mut rng).unwrap();

        prop_assert!(verify_opening(&commitment, value, &opening.blinding).unwrap());
        if other != value {
            prop_assert!(!verify_opening(&commitment, other, &opening.blinding).unwrap());
        }
    }

    /// Caller-supplied blindings reduce to canonical scalars and round-trip
    /// through verification; zero is substituted with one on both sides.
    #[test]
    fn prop_supplied_blinding_round_trips(
        curve in curve_strategy(),
        value in any::<u64>(),
        raw in raw_scalar(),
    ) {
        let mut rng = OsRng;
        let blinding = curve.ops().reduce_scalar(&raw);
        let (commitment, opening) = commit(curve, value, Some(blinding), &mut rng).unwrap();
        prop_assert!(verify_opening(&commitment, value, &opening.blinding).unwrap());
        prop_assert!(verify_opening(&commitment, value, &blinding).unwrap());
    }

    /// Sum of commitments opens to the sum of values under summed blinding,
    /// across the whole u64 value domain; totals past u64::MAX have no
    /// representable opening.
    #[test]
    fn prop_commitment_homomorphism(
        curve in curve_strategy(),
        a in any::<u64>(),
        b in any::<u64>(),
    ) {
        let mut rng = OsRng;
        let (ca, oa) = commit(curve, a, None, &mut rng).unwrap();
        let (cb, ob) = commit(curve, b, None, &mut rng).unwrap();

        let sum = add_commitments(&ca, &cb).unwrap();
        let blinding = add_blindings(curve, &oa.blinding, &ob.blinding).unwrap();
        match a.checked_add(b) {
            Some(total) => prop_assert!(verify_opening(&sum, total, &blinding).unwrap()),
            None => prop_assert!(!verify_opening(&sum, a.wrapping_add(b), &blinding).unwrap()),
        }
    }

    /// The recipient always detects its own payment and the derived claim
    /// key controls the one-time address.
    #[test]
    fn prop_stealth_correctness(chain in chain_strategy()) {
        let mut rng = OsRng;
        let keys = RecipientKeys::generate(chain, &mut rng).unwrap();
        let stealth = generate_stealth_address(keys.meta_address(), &mut rng).unwrap();

        let outcome = check_stealth_address(&keys.scan_handle(), &stealth).unwrap();
        prop_assert_eq!(outcome, ScanOutcome::Match);

        let claim = derive_stealth_private_key(&keys, &stealth).unwrap();
        let ops = keys.meta_address().curve().ops();
        prop_assert_eq!(ops.basepoint_mul(claim.as_bytes()).unwrap(), stealth.address);
    }

    /// A payment to one recipient is never a full match for another.
    #[test]
    fn prop_stealth_non_ownership(chain in chain_strategy()) {
        let mut rng = OsRng;
        let alice = RecipientKeys::generate(chain, &mut rng).unwrap();
        let bob = RecipientKeys::generate(chain, &mut rng).unwrap();

        let stealth = generate_stealth_address(alice.meta_address(), &mut rng).unwrap();
        let outcome = check_stealth_address(&bob.scan_handle(), &stealth).unwrap();
        prop_assert_ne!(outcome, ScanOutcome::Match);
    }

    /// Two payments to the same meta-address share no visible bytes.
    #[test]
    fn prop_stealth_unlinkability(chain in chain_strategy()) {
        let mut rng = OsRng;
        let keys = RecipientKeys::generate(chain, &mut rng).unwrap();
        let a = generate_stealth_address(keys.meta_address(), &mut rng).unwrap();
        let b = generate_stealth_address(keys.meta_address(), &mut rng).unwrap();
        prop_assert_ne!(a.address, b.address);
        prop_assert_ne!(a.ephemeral_public, b.ephemeral_public);
    }

    /// Meta-address text encoding is lossless.
    #[test]
    fn prop_meta_address_round_trip(chain in chain_strategy()) {
        let mut rng = OsRng;
        let keys = RecipientKeys::generate(chain, &mut rng).unwrap();
        let decoded = MetaAddress::decode(&keys.meta_address().encode()).unwrap();
        prop_assert_eq!(&decoded, keys.meta_address());
    }

    /// Child derivation is a pure function of (parent, segment) and
    /// diverges across segments.
    #[test]
    fn prop_kdf_determinism(
        parent in raw_scalar(),
        segment in "[a-z0-9]{1,16}",
        sibling in "[a-z0-9]{1,16}",
    ) {
        let root = ViewingKey::from_bytes(parent, "/m");
        let a = root.derive_child(&segment).unwrap();
        let b = root.derive_child(&segment).unwrap();
        prop_assert_eq!(a.export(), b.export());
        prop_assert_ne!(a.export(), root.export());

        if segment != sibling {
            let c = root.derive_child(&sibling).unwrap();
            prop_assert_ne!(a.export(), c.export());
        }
    }

    /// Any record survives an encrypt/decrypt round trip; a sibling key
    /// never decrypts it.
    #[test]
    fn prop_encryption_round_trip(
        amount in any::<u64>(),
        memo in "[ -~]{0,64}",
        key_bytes in raw_scalar(),
    ) {
        let mut rng = OsRng;
        let root = ViewingKey::from_bytes(key_bytes, "/m");
        let key = root.derive_child("audit").unwrap();
        let sibling = root.derive_child("tax").unwrap();

        let record = (amount, memo);
        let payload = encrypt_for_viewing(&record, &key, &mut rng).unwrap();

        let decrypted: (u64, String) = decrypt_with_viewing(&payload, &key).unwrap();
        prop_assert_eq!(decrypted, record);
        prop_assert!(decrypt_with_viewing::<(u64, String)>(&payload, &sibling).is_err());
    }
}
