//! # Decoded Field Values
//!
//! [`FieldValue`] is the tagged value produced by decoding one field of one
//! record. Numerics never pass through floating point: integers are `i128`
//! and implied-decimal fields are [`ScaledDecimal`] pairs.
//!
//! ## Canonical Form
//!
//! Values serialize externally tagged, with every number as a string so
//! that JSON number precision never applies:
//!
//! | Variant | JSON |
//! |---|---|
//! | `Text` | `{"text":"ABC"}` |
//! | `Integer` | `{"int":"-123"}` |
//! | `Decimal` | `{"dec":"-1.23"}` (exactly `scale` fractional digits) |
//! | `Raw` | `{"raw":"00ff"}` |
//! | `Group` | `{"group":[["NAME",value],...]}` |
//! | `Array` | `{"array":[value,...]}` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canonical::CanonicalBytes;
use crate::error::{CanonicalizationError, ValueError};

/// An exact decimal: the true value is `scaled / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaledDecimal {
    /// The value with the decimal point removed.
    pub scaled: i128,
    /// Number of implied fractional digits.
    pub scale: u32,
}

impl ScaledDecimal {
    /// Create a scaled decimal.
    pub fn new(scaled: i128, scale: u32) -> Self {
        Self { scaled, scale }
    }

    /// Checked addition of two values with the same scale.
    ///
    /// Returns `None` on overflow or when the scales differ.
    pub fn checked_add(&self, other: &ScaledDecimal) -> Option<ScaledDecimal> {
        if self.scale != other.scale {
            return None;
        }
        self.scaled
            .checked_add(other.scaled)
            .map(|scaled| ScaledDecimal::new(scaled, self.scale))
    }
}

impl fmt::Display for ScaledDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.scaled < 0 { "-" } else { "" };
        let digits = self.scaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

impl FromStr for ScaledDecimal {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::InvalidDecimal(s.to_string());
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) if !f.is_empty() => (i, f),
            Some(_) => return Err(invalid()),
            None => (body, ""),
        };
        let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !(frac_part.is_empty() || all_digits(frac_part)) {
            return Err(invalid());
        }
        let magnitude: i128 = format!("{int_part}{frac_part}")
            .parse()
            .map_err(|_| invalid())?;
        let scale = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
        let scaled = if negative { -magnitude } else { magnitude };
        Ok(ScaledDecimal::new(scaled, scale))
    }
}

impl Serialize for ScaledDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScaledDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Character data decoded through the configured character set.
    #[serde(rename = "text")]
    Text(String),
    /// A numeric field with no implied decimal places.
    #[serde(rename = "int")]
    Integer(#[serde(with = "i128_string")] i128),
    /// A numeric field with implied decimal places.
    #[serde(rename = "dec")]
    Decimal(ScaledDecimal),
    /// Uninterpreted bytes (FILLER and unused OCCURS slack).
    #[serde(rename = "raw")]
    Raw(#[serde(with = "hex_bytes")] Vec<u8>),
    /// A group item: named children in declaration order.
    #[serde(rename = "group")]
    Group(Vec<(String, FieldValue)>),
    /// The occurrences of an OCCURS item.
    #[serde(rename = "array")]
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Short tag naming the variant, as used in the canonical form.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "int",
            Self::Decimal(_) => "dec",
            Self::Raw(_) => "raw",
            Self::Group(_) => "group",
            Self::Array(_) => "array",
        }
    }

    /// The numeric value as a scaled decimal, if this is a numeric variant.
    pub fn as_scaled(&self) -> Option<ScaledDecimal> {
        match self {
            Self::Integer(v) => Some(ScaledDecimal::new(*v, 0)),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Canonical bytes of this value alone (the commitment pre-image).
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }
}

mod i128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::digest::to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
