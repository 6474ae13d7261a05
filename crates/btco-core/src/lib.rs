//! # btco-core — Foundational Types for the Credential Trust Engine
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! other crate shares: the canonical byte representation that signatures are
//! computed over, validated DID newtypes, and the machine-readable error codes
//! surfaced to callers.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every signing or verification message is
//!    produced by `CanonicalBytes::new()` (RFC 8785 JCS). No raw
//!    `serde_json::to_vec()` for signature input.
//!
//! 2. **Validated identifiers.** `Did` and `DidUrl` reject malformed input at
//!    construction and deserialization time. No bare strings cross the
//!    resolver boundary.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `btco-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod identity;

pub use canonical::CanonicalBytes;
pub use error::{codes, CanonicalizationError, ValidationError};
pub use identity::{Did, DidUrl};
