//! Decode and canonicalization options.
//!
//! Every option that influences canonical bytes lives in [`DecodeOptions`],
//! which the manifest records so a verifier can reproduce the output.

use serde::{Deserialize, Serialize};

/// EBCDIC code page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePage {
    /// IBM CP037 (US/Canada).
    Cp037,
    /// IBM CP1047 (Latin-1 open systems).
    Cp1047,
}

/// Character set of text and zoned fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    /// 7-bit ASCII (0x00-0x7F), passed through byte for byte.
    #[default]
    Ascii,
    /// EBCDIC through the given code page.
    Ebcdic(CodePage),
}

/// Which packed and zoned sign encodings are accepted.
///
/// Under [`SignNibbles::Preferred`] every accepted field image decodes to a
/// distinct value, so any edit to a sign byte changes the canonical record.
/// The other modes accept alternate encodings that decode to the same value
/// as a preferred one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignNibbles {
    /// One encoding per value. Packed: C or D on signed fields, F on
    /// unsigned ones. Zoned EBCDIC: C or D zone on the sign digit of signed
    /// fields, F zones otherwise. Zoned ASCII: plain digits for positive,
    /// `}` and `J`-`R` for negative. Negative zero is rejected.
    #[default]
    Preferred,
    /// Also F on signed fields, C on unsigned packed fields, `{`, `A`-`I`
    /// and `p`-`y` ASCII overpunch, and negative zero (read as zero).
    Relaxed,
    /// [`SignNibbles::Relaxed`] plus A and E positive, B negative.
    Extended,
}

impl SignNibbles {
    /// Whether alternate encodings of a value are accepted.
    pub fn is_relaxed(self) -> bool {
        self != SignNibbles::Preferred
    }
}

/// Range check applied to COMP, COMP-4, and BINARY items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryRange {
    /// Values must fit the picture's digit count.
    #[default]
    PicDigits,
    /// Any value the storage can hold.
    FullStorage,
}

/// Behaviour after a record fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The stream ends after the first error.
    #[default]
    Strict,
    /// The error is reported and decoding continues with the next record.
    Lenient,
}

/// Which REDEFINES alternates appear in canonical records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedefinesPolicy {
    /// Only the first-defined item of each REDEFINES set.
    #[default]
    First,
    /// Every alternate.
    All,
}

/// Options for [`crate::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeOptions {
    /// Character set for text and zoned fields.
    pub charset: Charset,
    /// Decode 0x00 in text fields as a space. Lossy: 0x00 and 0x20 then
    /// produce the same text.
    pub low_values_as_spaces: bool,
    /// Trim trailing spaces from text values. Lossy for the same reason.
    pub trim_trailing_spaces: bool,
    /// Accepted sign encodings.
    pub sign_nibbles: SignNibbles,
    /// Range check for COMP, COMP-4, and BINARY.
    pub binary_range: BinaryRange,
    /// Error handling mode.
    pub mode: Mode,
    /// REDEFINES canonicalization.
    pub redefines: RedefinesPolicy,
    /// Include FILLER and unused OCCURS DEPENDING ON bytes as raw values.
    pub include_filler: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            charset: Charset::Ascii,
            low_values_as_spaces: false,
            trim_trailing_spaces: false,
            sign_nibbles: SignNibbles::Preferred,
            binary_range: BinaryRange::PicDigits,
            mode: Mode::Strict,
            redefines: RedefinesPolicy::First,
            include_filler: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_serde_forms() {
        assert_eq!(serde_json::to_string(&Charset::Ascii).unwrap(), r#""ascii""#);
        assert_eq!(
            serde_json::to_string(&Charset::Ebcdic(CodePage::Cp1047)).unwrap(),
            r#"{"ebcdic":"cp1047"}"#
        );
    }

    #[test]
    fn partial_options_fill_defaults() {
        let opts: DecodeOptions = serde_json::from_str(r#"{"mode":"lenient"}"#).unwrap();
        assert_eq!(opts.mode, Mode::Lenient);
        assert!(opts.include_filler);
        assert_eq!(opts.sign_nibbles, SignNibbles::Preferred);
    }

    #[test]
    fn sign_modes_parse() {
        let opts: DecodeOptions = serde_json::from_str(r#"{"sign_nibbles":"relaxed"}"#).unwrap();
        assert!(opts.sign_nibbles.is_relaxed());
        assert!(!SignNibbles::Preferred.is_relaxed());
        assert!(serde_json::from_str::<DecodeOptions>(r#"{"accept_unsigned_nibble":true}"#).is_err());
    }

    #[test]
    fn unknown_option_rejected() {
        assert!(serde_json::from_str::<DecodeOptions>(r#"{"bogus":true}"#).is_err());
    }
}
