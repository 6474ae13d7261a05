//! # btco-vc — Verifiable Credential Trust Engine
//!
//! Issues, verifies and revocation-checks W3C Verifiable Credentials whose
//! issuers and subjects are DIDs:
//!
//! - **Model** ([`VerifiableCredential`], [`Proof`], [`DidDocument`]) with
//!   key material resolved once into [`KeyMaterial`](btco_crypto::KeyMaterial).
//! - **Resolution** through the [`DidResolver`] collaborator trait, with
//!   in-memory and HTTP implementations.
//! - **Verification** ([`CredentialVerifier`]): structure, issuer
//!   resolution, method lookup, signature dispatch, expiration, status.
//! - **Status lists** ([`StatusListChecker`], [`Bitstring`]) for
//!   RevocationList2020 and StatusList2021.
//! - **Issuance** ([`CredentialIssuer`]) with mandatory self-verification.
//! - **Storage** through the [`CredentialRepository`] collaborator trait.
//!
//! ## Security Invariants
//!
//! - Verification fails closed. Every decode, network or crypto error is an
//!   invalid result, never a panic or a propagated error. The single
//!   exception is an unrecognized status type, which is treated as active
//!   and logged.
//! - Signature input is always [`CanonicalBytes`](btco_core::CanonicalBytes).
//! - Status-list recursion is bounded by [`MAX_STATUS_DEPTH`].

pub mod credential;
pub mod document;
pub mod error;
pub mod issuer;
pub mod proof;
pub mod repository;
pub mod resolver;
pub mod signature;
pub mod status;
pub mod verifier;

pub use credential::{ContextValue, CredentialTypeValue, Issuer, VerifiableCredential};
pub use document::{DidDocument, MethodEntry, VerificationMethod};
pub use error::{
    IssuanceError, RepositoryError, ResolutionError, VcError, VerificationFailure, VerificationStage,
};
pub use issuer::{build_draft, ContentInfo, CredentialIssuer, IssueParams};
pub use proof::{Proof, ProofKind, ProofSet};
pub use repository::{CredentialMetadata, CredentialRepository, InMemoryCredentialRepository, StoredCredential};
pub use resolver::{DidResolutionResult, DidResolver, HttpDidResolver, StaticDidResolver};
pub use status::{Bitstring, CredentialStatus, StatusError, StatusListChecker};
pub use verifier::{CredentialVerifier, MAX_STATUS_DEPTH};
