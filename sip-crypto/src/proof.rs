//! Proof interfaces.
//!
//! The circuits themselves live outside this crate; what lives here is the
//! contract they are called through. [`ProofProvider`] is the pluggable
//! backend seam: intents code is written against the trait and the concrete
//! backend (mock for tests, a real constraint-system prover in production)
//! is chosen by configuration. The params structs pin down exactly which
//! engine values each circuit consumes, split into public and private
//! inputs in documented order.
//!
//! [`ViewingProof`] is the one verifier-checkable artifact produced locally:
//! it asserts that a disclosed plaintext is the authentic opening of an
//! on-chain commitment and was produced by a holder of a specific scoped
//! viewing key, without revealing the key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::commitment::{verify_opening, Commitment};
use crate::error::{CryptoError, CryptoResult};
use crate::viewing::ViewingKey;

/// Domain separator for the viewing-proof tag.
const VIEWING_PROOF_DOMAIN: &[u8] = b"sip_viewing_proof_v1";

/// Domain separator for mock proof blobs.
const MOCK_PROOF_DOMAIN: &[u8] = b"sip_mock_proof_v1";

// ============================================================================
// Proof Provider Contract
// ============================================================================

/// A proof blob plus the public inputs it was generated against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub proof: Vec<u8>,
    pub public_inputs: Vec<Vec<u8>>,
}

/// Inputs to the funding circuit: "the committed amount is backed by a real
/// deposit".
pub struct FundingProofParams {
    // Public inputs, in circuit order.
    pub commitment: Vec<u8>,
    pub asset_id: String,
    // Private inputs.
    pub value: u64,
    pub blinding: [u8; 32],
}

impl FundingProofParams {
    /// Public inputs in the order the circuit expects them.
    pub fn public_inputs(&self) -> Vec<Vec<u8>> {
        vec![self.commitment.clone(), self.asset_id.as_bytes().to_vec()]
    }
}

/// Inputs to the validity circuit: "the intent's output commitment balances
/// its input and pays the stated stealth address".
pub struct ValidityProofParams {
    // Public inputs, in circuit order.
    pub input_commitment: Vec<u8>,
    pub output_commitment: Vec<u8>,
    pub stealth_address: Vec<u8>,
    pub ephemeral_public: Vec<u8>,
    // Private inputs.
    pub input_value: u64,
    pub input_blinding: [u8; 32],
    pub output_value: u64,
    pub output_blinding: [u8; 32],
}

impl ValidityProofParams {
    /// Public inputs in the order the circuit expects them.
    pub fn public_inputs(&self) -> Vec<Vec<u8>> {
        vec![
            self.input_commitment.clone(),
            self.output_commitment.clone(),
            self.stealth_address.clone(),
            self.ephemeral_public.clone(),
        ]
    }
}

/// Inputs to the fulfillment circuit: "the solver delivered what the intent
/// committed to, at the recipient's one-time address".
pub struct FulfillmentProofParams {
    // Public inputs, in circuit order.
    pub intent_commitment: Vec<u8>,
    pub fulfillment_commitment: Vec<u8>,
    pub recipient_stealth_address: Vec<u8>,
    // Private inputs.
    pub value: u64,
    pub blinding: [u8; 32],
}

impl FulfillmentProofParams {
    /// Public inputs in the order the circuit expects them.
    pub fn public_inputs(&self) -> Vec<Vec<u8>> {
        vec![
            self.intent_commitment.clone(),
            self.fulfillment_commitment.clone(),
            self.recipient_stealth_address.clone(),
        ]
    }
}

/// Pluggable proof backend.
///
/// Generation is async because real backends compile witnesses and talk to
/// provers; nothing in this crate blocks on them.
#[async_trait]
pub trait ProofProvider: Send + Sync {
    async fn generate_funding_proof(
        &self,
        params: FundingProofParams,
    ) -> CryptoResult<ProofArtifact>;

    async fn generate_validity_proof(
        &self,
        params: ValidityProofParams,
    ) -> CryptoResult<ProofArtifact>;

    async fn generate_fulfillment_proof(
        &self,
        params: FulfillmentProofParams,
    ) -> CryptoResult<ProofArtifact>;

    /// Check a proof against the public inputs the verifier expects.
    async fn verify(
        &self,
        artifact: &ProofArtifact,
        expected_public_inputs: &[Vec<u8>],
    ) -> CryptoResult<bool>;
}

// ============================================================================
// Mock Backend
// ============================================================================

/// Pass-through backend for tests: the "proof" is a hash of the public
/// inputs. Proves nothing, but exercises the full plumbing and rejects
/// mismatched or tampered public inputs the way a real verifier would.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockProofProvider;

impl MockProofProvider {
    fn blob(public_inputs: &[Vec<u8>]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(MOCK_PROOF_DOMAIN);
        for input in public_inputs {
            hasher.update((input.len() as u64).to_le_bytes());
            hasher.update(input);
        }
        hasher.finalize().to_vec()
    }

    fn artifact(public_inputs: Vec<Vec<u8>>) -> ProofArtifact {
        ProofArtifact {
            proof: Self::blob(&public_inputs),
            public_inputs,
        }
    }
}

#[async_trait]
impl ProofProvider for MockProofProvider {
    async fn generate_funding_proof(
        &self,
        params: FundingProofParams,
    ) -> CryptoResult<ProofArtifact> {
        Ok(Self::artifact(params.public_inputs()))
    }

    async fn generate_validity_proof(
        &self,
        params: ValidityProofParams,
    ) -> CryptoResult<ProofArtifact> {
        Ok(Self::artifact(params.public_inputs()))
    }

    async fn generate_fulfillment_proof(
        &self,
        params: FulfillmentProofParams,
    ) -> CryptoResult<ProofArtifact> {
        Ok(Self::artifact(params.public_inputs()))
    }

    async fn verify(
        &self,
        artifact: &ProofArtifact,
        expected_public_inputs: &[Vec<u8>],
    ) -> CryptoResult<bool> {
        if artifact.public_inputs != expected_public_inputs {
            return Ok(false);
        }
        Ok(artifact.proof == Self::blob(expected_public_inputs))
    }
}

// ============================================================================
// Viewing Proofs
// ============================================================================

/// A disclosure artifact binding a commitment opening to a viewing-key
/// holder.
///
/// The tag is a keyed hash under a sub-key derived from the viewing key, so
/// the proof is checkable by the designated verifier holding the same scoped
/// key (the auditor the disclosure was made to) and forgeable by no one
/// else; the viewing key itself never appears. Publicly verifiable variants
/// go through [`ProofProvider`] circuits instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingProof {
    pub commitment: Commitment,
    pub value: u64,
    pub blinding: [u8; 32],
    tag: [u8; 32],
}

fn proof_tag(key: &ViewingKey, commitment: &Commitment, value: u64, blinding: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(VIEWING_PROOF_DOMAIN);
    hasher.update(key.key_bytes());
    hasher.update(commitment.as_bytes());
    hasher.update(value.to_le_bytes());
    hasher.update(blinding);

    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

impl ViewingProof {
    /// Produce a proof that `(value, blinding)` opens `commitment`, tagged
    /// by the holder of `key`. Fails if the opening itself is wrong - a
    /// holder cannot attest to an opening that does not verify.
    pub fn create(
        key: &ViewingKey,
        commitment: &Commitment,
        value: u64,
        blinding: &[u8; 32],
    ) -> CryptoResult<Self> {
        if !verify_opening(commitment, value, blinding)? {
            return Err(CryptoError::ProofRejected("opening does not verify"));
        }
        let tag = proof_tag(key, commitment, value, blinding);
        Ok(Self {
            commitment: commitment.clone(),
            value,
            blinding: *blinding,
            tag,
        })
    }

    /// Verify as the designated key holder: re-checks the commitment
    /// opening (the Commitment Engine sub-check), then the key-binding tag
    /// in constant time.
    pub fn verify(&self, key: &ViewingKey) -> CryptoResult<bool> {
        if !verify_opening(&self.commitment, self.value, &self.blinding)? {
            return Ok(false);
        }
        let mut expected = proof_tag(key, &self.commitment, self.value, &self.blinding);
        let ok = bool::from(expected.ct_eq(&self.tag));
        expected.zeroize();
        Ok(ok)
    }
}
