//! # Content Digests
//!
//! Defines [`ContentDigest`] and [`DigestAlgorithm`]. Every digest carries
//! an algorithm tag and serializes as `<algorithm>:<64 lowercase hex>`, the
//! form used in manifests and anchor receipts.
//!
//! ## Security Invariant
//!
//! [`sha256_digest()`] accepts only [`CanonicalBytes`]. The raw helper
//! [`sha256_raw()`] exists for the domain-separated Merkle and commitment
//! constructions, whose pre-images are fixed binary layouts rather than
//! JSON documents.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::ValueError;

/// The hash algorithm used to compute a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A digest with its algorithm tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a SHA-256 content digest from raw bytes.
    pub fn sha256(bytes: [u8; 32]) -> Self {
        Self {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.bytes)
    }

    /// Parse the `<algorithm>:<hex>` form produced by `Display`.
    pub fn parse(s: &str) -> Result<Self, ValueError> {
        let invalid = |reason: &str| ValueError::InvalidDigest {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (alg, hex) = s
            .split_once(':')
            .ok_or_else(|| invalid("missing algorithm prefix"))?;
        if alg != DigestAlgorithm::Sha256.as_str() {
            return Err(invalid("unknown algorithm"));
        }
        let raw = from_hex(hex)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| invalid("expected 32 bytes"))?;
        Ok(Self::sha256(bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentDigest::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest::sha256(sha256_raw(data.as_bytes()))
}

/// SHA-256 of raw bytes, returning the 32-byte array.
pub fn sha256_raw(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string (either case) to bytes.
pub fn from_hex(s: &str) -> Result<Vec<u8>, ValueError> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(ValueError::InvalidHex(format!(
            "odd length: {}",
            s.len()
        )));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .filter(|pair| pair.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ValueError::InvalidHex(format!("bad digit pair at position {i}")))
        })
        .collect()
}
