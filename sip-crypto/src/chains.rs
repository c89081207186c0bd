//! Chain table: which curve a chain uses and how its on-chain address is
//! derived from a raw stealth public key.
//!
//! Address derivation is a pure, stateless mapping per chain, looked up in
//! one static table rather than branched at call sites. Adding a chain means
//! adding a row.

use sha3::{Digest, Keccak256};

use crate::curve::CurveId;
use crate::error::{CryptoError, CryptoResult};

/// One row of the chain table.
pub struct ChainSpec {
    /// Chain identifier as it appears in meta-addresses (`sip:<chain>:...`).
    pub chain: &'static str,
    /// Curve family the chain's keys live on.
    pub curve: CurveId,
    format: fn(&[u8]) -> CryptoResult<String>,
}

impl ChainSpec {
    /// Derive the chain's textual address from a stealth public key.
    pub fn address_for(&self, stealth_pubkey: &[u8]) -> CryptoResult<String> {
        (self.format)(stealth_pubkey)
    }
}

/// EVM chains: last 20 bytes of Keccak-256 over the uncompressed public key
/// coordinates (the 0x04 SEC1 tag is stripped first).
fn evm_address(stealth_pubkey: &[u8]) -> CryptoResult<String> {
    let uncompressed = CurveId::Secp256k1.ops().uncompress_point(stealth_pubkey)?;
    let digest = Keccak256::digest(&uncompressed[1..]);
    Ok(format!("0x{}", hex::encode(&digest[12..])))
}

/// NEAR implicit accounts: the raw 32-byte public key, lowercase hex.
fn near_address(stealth_pubkey: &[u8]) -> CryptoResult<String> {
    CurveId::Ed25519.ops().validate_point(stealth_pubkey)?;
    Ok(hex::encode(stealth_pubkey))
}

/// Solana: the raw 32-byte public key, base58.
fn solana_address(stealth_pubkey: &[u8]) -> CryptoResult<String> {
    CurveId::Ed25519.ops().validate_point(stealth_pubkey)?;
    Ok(bs58::encode(stealth_pubkey).into_string())
}

static CHAIN_TABLE: &[ChainSpec] = &[
    ChainSpec {
        chain: "ethereum",
        curve: CurveId::Secp256k1,
        format: evm_address,
    },
    ChainSpec {
        chain: "base",
        curve: CurveId::Secp256k1,
        format: evm_address,
    },
    ChainSpec {
        chain: "arbitrum",
        curve: CurveId::Secp256k1,
        format: evm_address,
    },
    ChainSpec {
        chain: "near",
        curve: CurveId::Ed25519,
        format: near_address,
    },
    ChainSpec {
        chain: "solana",
        curve: CurveId::Ed25519,
        format: solana_address,
    },
];

/// Look up a chain's table row.
pub fn chain_spec(chain: &str) -> CryptoResult<&'static ChainSpec> {
    CHAIN_TABLE
        .iter()
        .find(|spec| spec.chain == chain)
        .ok_or_else(|| CryptoError::UnsupportedChain(chain.to_string()))
}

/// Curve family for a chain identifier.
pub fn curve_for_chain(chain: &str) -> CryptoResult<CurveId> {
    chain_spec(chain).map(|spec| spec.curve)
}

/// All supported chain identifiers, for diagnostics and input validation.
pub fn supported_chains() -> impl Iterator<Item = &'static str> {
    CHAIN_TABLE.iter().map(|spec| spec.chain)
}
