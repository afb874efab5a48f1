use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{CERTIFICATE_ID_BYTES, CERTIFICATE_ID_MAX_CHARS};
use crate::error::CertxError;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Identifier of a lesson unit inside a course (owned by the completion ledger).
pub type LessonUnitId = String;

/// Identifier of a quiz (owned by the quiz ledger).
pub type QuizId = String;

/// Identifier of a single quiz attempt.
pub type AttemptId = String;

/// Current wall-clock time as a [`Timestamp`].
pub fn now() -> Timestamp {
    chrono::Utc::now().timestamp()
}

// ── CertificateId ────────────────────────────────────────────────────────────

/// Public, opaque certificate identifier: 128 random bits, base-58 encoded.
///
/// Identifiers are drawn from the OS CSPRNG and carry no ordering, so knowing
/// one certificate id says nothing about any other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateId([u8; CERTIFICATE_ID_BYTES]);

impl CertificateId {
    /// Draw a fresh identifier from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CERTIFICATE_ID_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(b: [u8; CERTIFICATE_ID_BYTES]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; CERTIFICATE_ID_BYTES] {
        &self.0
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Parse the public textual form. Anything that does not decode to exactly
    /// 16 bytes is rejected.
    pub fn from_b58(s: &str) -> Result<Self, CertxError> {
        let s = s.trim();
        if s.is_empty() || s.len() > CERTIFICATE_ID_MAX_CHARS {
            return Err(CertxError::InvalidInput("malformed certificate id".into()));
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| CertxError::InvalidInput("malformed certificate id".into()))?;
        let arr: [u8; CERTIFICATE_ID_BYTES] = bytes
            .try_into()
            .map_err(|_| CertxError::InvalidInput("malformed certificate id".into()))?;
        Ok(Self(arr))
    }

    /// Decode a storage key back into an id.
    pub fn from_key(key: &[u8]) -> Result<Self, CertxError> {
        let arr: [u8; CERTIFICATE_ID_BYTES] = key
            .try_into()
            .map_err(|_| CertxError::Storage(format!("bad certificate key length {}", key.len())))?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for CertificateId {
    type Error = CertxError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_b58(&s)
    }
}

impl From<CertificateId> for String {
    fn from(id: CertificateId) -> Self {
        id.to_b58()
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateId({})", self.to_b58())
    }
}

// ── UserId / CourseId ────────────────────────────────────────────────────────

/// Learner identifier as issued by the upstream account system.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Course identifier as issued by the upstream catalog.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_id_b58_round_trip() {
        let id = CertificateId::generate();
        let parsed = CertificateId::from_b58(&id.to_b58()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn generated_ids_differ() {
        let a = CertificateId::generate();
        let b = CertificateId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(CertificateId::from_b58("").is_err());
        assert!(CertificateId::from_b58("123456").is_err());
        assert!(CertificateId::from_b58("0OIl-not-base58").is_err());
        let too_long = "1".repeat(CERTIFICATE_ID_MAX_CHARS + 1);
        assert!(CertificateId::from_b58(&too_long).is_err());
    }

    #[test]
    fn certificate_id_serializes_as_string() {
        let id = CertificateId::from_bytes([7u8; CERTIFICATE_ID_BYTES]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_b58()));
        let back: CertificateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
