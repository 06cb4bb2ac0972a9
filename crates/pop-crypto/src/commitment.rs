//! # Selective-Disclosure Commitments
//!
//! Each committed field gets its own key derived from the master secret:
//!
//! ```text
//! field_key  = HMAC-SHA256(master, "pop-commit/v1" || u64_be(index) || u32_be(len(path)) || path)
//! commitment = HMAC-SHA256(field_key, JCS(value))
//! ```
//!
//! Revealing a field discloses its value and its field key. The verifier
//! recomputes the HMAC and compares it with the published commitment in
//! constant time. A field key opens exactly one field of one record.
//!
//! ## Security Invariant
//!
//! [`CommitmentKey`] and [`FieldKey`] zeroize on drop and print as
//! `[REDACTED]` in `Debug`. Neither type implements `Display`.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use pop_core::{from_hex, to_hex, ContentDigest, FieldValue};

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Domain tag prefixed to every field key derivation.
pub const COMMIT_DOMAIN: &[u8] = b"pop-commit/v1";

const KEY_LEN: usize = 32;

fn hmac(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 32], CryptoError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}

/// The master secret behind every commitment of a manifest.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CommitmentKey([u8; KEY_LEN]);

impl std::fmt::Debug for CommitmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommitmentKey([REDACTED])")
    }
}

impl CommitmentKey {
    /// Wrap 32 bytes of key material.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Wrap a slice that must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Derive the key for one field of one record.
    pub fn field_key(&self, record_index: u64, field_path: &str) -> Result<FieldKey, CryptoError> {
        let path = field_path.as_bytes();
        let path_len = u32::try_from(path.len()).map_err(|_| CryptoError::PathTooLong(path.len()))?;
        let key = hmac(
            &self.0,
            &[COMMIT_DOMAIN, &record_index.to_be_bytes(), &path_len.to_be_bytes(), path],
        )?;
        Ok(FieldKey(key))
    }
}

/// A per-field key, revealed alongside the value on disclosure.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct FieldKey([u8; KEY_LEN]);

impl std::fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldKey([REDACTED])")
    }
}

impl FieldKey {
    /// Wrap 32 bytes of key material.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Commit to `value` under this key.
    pub fn commit(&self, value: &FieldValue) -> Result<ContentDigest, CryptoError> {
        let bytes = value.canonical_bytes()?;
        Ok(ContentDigest::sha256(hmac(&self.0, &[bytes.as_bytes()])?))
    }

    /// Check `value` against a published commitment in constant time.
    pub fn verify(&self, value: &FieldValue, expected: &ContentDigest) -> bool {
        match self.commit(value) {
            Ok(actual) => actual.bytes[..].ct_eq(&expected.bytes[..]).into(),
            Err(_) => false,
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(&self.0))
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut raw = from_hex(&s).map_err(serde::de::Error::custom)?;
        let key = <[u8; KEY_LEN]>::try_from(raw.as_slice()).map_err(|_| serde::de::Error::custom("field key must be 32 bytes"));
        raw.zeroize();
        key.map(FieldKey)
    }
}

/// A published commitment to one field of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Index of the record.
    pub record_index: u64,
    /// Subscripted field path, e.g. `LINES(2).QTY`.
    pub field_path: String,
    /// HMAC-SHA256 of the canonical value under the field key.
    pub digest: ContentDigest,
}

impl Commitment {
    /// Derive the field key and commit to `value`.
    pub fn create(
        key: &CommitmentKey,
        record_index: u64,
        field_path: &str,
        value: &FieldValue,
    ) -> Result<Self, CryptoError> {
        let digest = key.field_key(record_index, field_path)?.commit(value)?;
        Ok(Self {
            record_index,
            field_path: field_path.to_string(),
            digest,
        })
    }
}

/// Check a disclosed value and field key against a commitment.
pub fn verify_commitment(field_key: &FieldKey, value: &FieldValue, commitment: &Commitment) -> bool {
    field_key.verify(value, &commitment.digest)
}
