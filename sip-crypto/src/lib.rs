//! Core cryptography for the Shielded Intent Protocol (SIP).
//!
//! Three independent engines over prime-order elliptic-curve groups:
//!
//! - **Commitments** ([`commitment`]) - Pedersen commitments that hide
//!   amounts, verify openings, and add/subtract homomorphically.
//! - **Stealth addresses** ([`stealth`]) - per-recipient meta-addresses,
//!   per-transaction one-time addresses, and view-tag scanning with exact
//!   claim-key recovery.
//! - **Viewing keys** ([`viewing`]) - hierarchical path-based key
//!   derivation and authenticated encryption of transaction metadata for
//!   selective disclosure.
//!
//! Two curve families are supported ([`curve`]): secp256k1 for
//! EVM-compatible chains and curve25519 for chains using raw 32-byte keys,
//! selected per chain through a static table ([`chains`]). Proof circuits
//! are out of scope; the contract they are invoked through lives in
//! [`proof`].
//!
//! Every operation is a stateless pure function over supplied keys and
//! values - no engine holds mutable state, so everything is freely callable
//! from concurrent tasks. The single process-wide constant is the derived
//! Pedersen generator `H`, computed once per curve and read-only
//! thereafter. All randomness comes from caller-injected RNGs, which keeps
//! the engines deterministic and testable when seeded.
//!
//! Security properties:
//! - Secret scalars and viewing keys are zeroized on drop
//! - Cryptographic comparisons are constant-time
//! - All hashing is domain-separated to prevent cross-protocol reuse

pub mod chains;
pub mod commitment;
pub mod curve;
pub mod error;
pub mod proof;
pub mod stealth;
pub mod viewing;

#[cfg(test)]
mod fuzz_tests;

pub use chains::{chain_spec, curve_for_chain, supported_chains, ChainSpec};
pub use commitment::{
    add_blindings, add_commitments, commit, sub_blindings, sub_commitments, verify_opening,
    Commitment, Opening, BLINDING_LEN,
};
pub use curve::{CurveId, CurveOps, SecretScalar};
pub use error::{CryptoError, CryptoResult};
pub use proof::{
    FulfillmentProofParams, FundingProofParams, MockProofProvider, ProofArtifact, ProofProvider,
    ValidityProofParams, ViewingProof,
};
pub use stealth::{
    announcement_commitment, check_stealth_address, derive_stealth_private_key,
    generate_stealth_address, scan_announcements, MetaAddress, RecipientKeys, ScanHandle,
    ScanOutcome, StealthAddress,
};
pub use viewing::{
    decrypt_with_viewing, encrypt_for_viewing, encrypt_for_viewing_multi, EncryptedPayload,
    ViewingKey, NONCE_LEN, TAG_LEN, VIEWING_KEY_LEN,
};
