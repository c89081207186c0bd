//! Error taxonomy for the SIP crypto engines.
//!
//! Three families, checked in this order:
//! 1. Validation - malformed encodings, out-of-range scalars, wrong lengths.
//!    Checked before any arithmetic.
//! 2. Integrity - syntactically valid data that fails a cryptographic check
//!    (point not on curve, authentication tag mismatch). Hot-path mismatches
//!    (scan non-matches, opening mismatches) are NOT errors - they come back
//!    as plain negative results from the engine functions.
//! 3. Fatal invariant violations surface as `GeneratorDerivation` /
//!    `InternalError` and indicate a bug, not bad input.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    // ----- Validation -----
    #[error("invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid point encoding for {0}")]
    InvalidPointEncoding(&'static str),

    #[error("scalar is not canonical mod the curve order")]
    InvalidScalar,

    #[error("unsupported chain identifier '{0}'")]
    UnsupportedChain(String),

    #[error("operands belong to different curves")]
    CurveMismatch,

    #[error("malformed meta-address: {0}")]
    MalformedMetaAddress(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("viewing key path segment must be non-empty")]
    EmptyPathSegment,

    // ----- Integrity -----
    #[error("point is not on the curve or is in a small-order subgroup")]
    PointNotOnCurve,

    #[error("point is the group identity")]
    IdentityPoint,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("viewing proof rejected: {0}")]
    ProofRejected(&'static str),

    // ----- Fatal / programmer errors -----
    #[error("Pedersen generator derivation exhausted the counter space")]
    GeneratorDerivation,

    #[error("proof backend failure: {0}")]
    ProofBackend(String),

    #[error("internal error: {0}")]
    InternalError(String),
}
