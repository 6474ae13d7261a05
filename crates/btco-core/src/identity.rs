//! # Identity Newtypes
//!
//! Validated wrappers for decentralized identifiers.
//!
//! - [`Did`]: a bare `did:<method>:<method-specific-id>`, e.g.
//!   `did:btco:1908770696977240/0` (a satoshi number plus inscription index).
//! - [`DidUrl`]: a DID plus optional query and fragment, as used by
//!   `proof.verificationMethod` (`did:btco:123/0#key-1`).
//!
//! Both validate at construction and at deserialization time.
//!
//! Reference: <https://www.w3.org/TR/did-core/#did-syntax>

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implement `Deserialize` for string newtypes that validate their contents.
/// Deserializes as a plain `String`, then routes through `new()` so invalid
/// values are rejected instead of silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// W3C Decentralized Identifier.
///
/// # Validation
///
/// - Must start with `did:`
/// - Method name is non-empty lowercase alphanumeric
/// - Method-specific identifier is non-empty and contains no `?`, `#`, or
///   whitespace (those belong to a [`DidUrl`])
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Did(String);

impl_validating_deserialize!(Did);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// the `did:method:identifier` format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if split_did(&s).is_none() {
            return Err(ValidationError::InvalidDid(s));
        }
        Ok(Self(s))
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method (`btco` in `did:btco:123/0`).
    pub fn method(&self) -> &str {
        split_did(&self.0).map_or("", |(method, _)| method)
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        split_did(&self.0).map_or("", |(_, id)| id)
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn split_did(s: &str) -> Option<(&str, &str)> {
    let rest = s.strip_prefix("did:")?;
    let (method, identifier) = rest.split_once(':')?;
    if method.is_empty()
        || !method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return None;
    }
    if identifier.is_empty()
        || identifier
            .chars()
            .any(|c| c == '?' || c == '#' || c.is_whitespace())
    {
        return None;
    }
    Some((method, identifier))
}

/// A DID URL: a [`Did`] with an optional query and fragment.
///
/// A bare fragment reference (`#key-1`) is not a DID URL; relative references
/// are resolved against a DID Document's `id` by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct DidUrl {
    did: Did,
    query: Option<String>,
    fragment: Option<String>,
}

impl_validating_deserialize!(DidUrl);

impl DidUrl {
    /// Parse a DID URL.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDidUrl`] if the DID portion is
    /// malformed or the fragment is present but empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let (before_fragment, fragment) = match s.split_once('#') {
            Some((head, frag)) => (head, Some(frag)),
            None => (s.as_str(), None),
        };
        let (did_part, query) = match before_fragment.split_once('?') {
            Some((head, q)) => (head, Some(q)),
            None => (before_fragment, None),
        };
        if fragment.is_some_and(str::is_empty) {
            return Err(ValidationError::InvalidDidUrl(s));
        }
        let did = Did::new(did_part).map_err(|_| ValidationError::InvalidDidUrl(s.clone()))?;
        Ok(Self {
            did,
            query: query.map(str::to_string),
            fragment: fragment.map(str::to_string),
        })
    }

    /// The DID this URL dereferences against.
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// The fragment without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The query without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

impl std::fmt::Display for DidUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.did)?;
        if let Some(q) = &self.query {
            write!(f, "?{q}")?;
        }
        if let Some(frag) = &self.fragment {
            write!(f, "#{frag}")?;
        }
        Ok(())
    }
}

impl From<DidUrl> for String {
    fn from(url: DidUrl) -> Self {
        url.to_string()
    }
}

impl std::str::FromStr for DidUrl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_accepts_common_methods() {
        assert!(Did::new("did:btco:123/0").is_ok());
        assert!(Did::new("did:example:issuer").is_ok());
        assert!(Did::new("did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK").is_ok());
        assert!(Did::new("did:web:example.com:path:to:resource").is_ok());
    }

    #[test]
    fn did_rejects_malformed() {
        assert!(Did::new("").is_err());
        assert!(Did::new("notadid").is_err());
        assert!(Did::new("did:").is_err());
        assert!(Did::new("did::something").is_err());
        assert!(Did::new("did:Web:id").is_err());
        assert!(Did::new("did:method:").is_err());
        assert!(Did::new("did:btco:1#key-1").is_err());
        assert!(Did::new("did:btco:1 2").is_err());
    }

    #[test]
    fn did_accessors() {
        let did = Did::new("did:btco:1908770696977240/0").unwrap();
        assert_eq!(did.method(), "btco");
        assert_eq!(did.method_specific_id(), "1908770696977240/0");
        assert_eq!(did.to_string(), "did:btco:1908770696977240/0");
    }

    #[test]
    fn did_deserialize_validates() {
        let ok: Did = serde_json::from_str("\"did:example:issuer\"").unwrap();
        assert_eq!(ok.as_str(), "did:example:issuer");
        assert!(serde_json::from_str::<Did>("\"example:issuer\"").is_err());
    }

    #[test]
    fn did_url_splits_fragment_and_query() {
        let url = DidUrl::new("did:btco:123/0?versionId=2#key-1").unwrap();
        assert_eq!(url.did().as_str(), "did:btco:123/0");
        assert_eq!(url.query(), Some("versionId=2"));
        assert_eq!(url.fragment(), Some("key-1"));
        assert_eq!(url.to_string(), "did:btco:123/0?versionId=2#key-1");
    }

    #[test]
    fn did_url_without_fragment() {
        let url = DidUrl::new("did:example:issuer").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn did_url_rejects_relative_and_empty_fragment() {
        assert!(DidUrl::new("#key-1").is_err());
        assert!(DidUrl::new("did:example:issuer#").is_err());
    }

    #[test]
    fn did_url_serde_round_trips_as_string() {
        let url = DidUrl::new("did:example:issuer#key-1").unwrap();
        let json = serde_json::to_string(&url).unwrap();
        assert_eq!(json, "\"did:example:issuer#key-1\"");
        let back: DidUrl = serde_json::from_str(&json).unwrap();
        assert_eq!(back, url);
    }
}
