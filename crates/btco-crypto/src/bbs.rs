//! # BBS+ Signatures (Recognized, Not Implemented)
//!
//! BBS+ proofs (`BbsBlsSignature2020`, `bbs-2023`) are recognized so that a
//! credential carrying one is reported as unverifiable rather than as an
//! unknown proof type. No pairing backend is integrated: verification always
//! fails closed.

use btco_core::CanonicalBytes;

use crate::error::CryptoError;

/// Verify a BBS+ signature.
///
/// Always returns [`CryptoError::Unsupported`].
pub fn verify(
    _data: &CanonicalBytes,
    _signature: &[u8],
    _public_key: &[u8],
) -> Result<(), CryptoError> {
    Err(CryptoError::Unsupported(
        "BBS+ verification is not implemented".into(),
    ))
}
