//! Zoned decimal (DISPLAY numeric) decoding.
//!
//! EBCDIC digits are `F0`-`F9`; an overpunched sign replaces the zone of the
//! first or last digit (C positive, D negative, and A/E/B under
//! [`SignNibbles::Extended`]). ASCII digits are `0x30`-`0x39`; overpunch uses
//! `}`/`J`-`R` for negative, with `{`/`A`-`I` positive and `p`-`y` negative
//! as relaxed alternates. SIGN SEPARATE fields carry a `+` or `-` character
//! before or after the digits.
//!
//! Under [`SignNibbles::Preferred`] a signed EBCDIC field must carry a C or
//! D zone, a signed ASCII field a plain digit or a `}`/`J`-`R` overpunch, and
//! an unsigned field plain digits only.

use pop_schema::SignConvention;

use crate::ebcdic;
use crate::error::DecodeErrorKind;
use crate::options::{Charset, DecodeOptions, SignNibbles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overpunch {
    Unsigned,
    Positive,
    Negative,
    /// The `p`-`y` ASCII convention.
    NegativeAlternate,
}

impl Overpunch {
    fn is_negative(self) -> bool {
        matches!(self, Overpunch::Negative | Overpunch::NegativeAlternate)
    }

    fn is_preferred(self, signed: bool, charset: Charset) -> bool {
        match (signed, self, charset) {
            (false, Overpunch::Unsigned, _) => true,
            (true, Overpunch::Negative, _) => true,
            (true, Overpunch::Positive, Charset::Ebcdic(_)) => true,
            (true, Overpunch::Unsigned, Charset::Ascii) => true,
            _ => false,
        }
    }
}

fn invalid(reason: String) -> DecodeErrorKind {
    DecodeErrorKind::ZonedDecimal(reason)
}

fn plain_digit(byte: u8, charset: Charset) -> Option<u8> {
    match charset {
        Charset::Ascii => byte.is_ascii_digit().then(|| byte - b'0'),
        Charset::Ebcdic(_) => (0xF0..=0xF9).contains(&byte).then(|| byte & 0x0F),
    }
}

fn overpunched_digit(byte: u8, options: &DecodeOptions) -> Option<(u8, Overpunch)> {
    if let Some(d) = plain_digit(byte, options.charset) {
        return Some((d, Overpunch::Unsigned));
    }
    match options.charset {
        Charset::Ascii => match byte {
            b'{' => Some((0, Overpunch::Positive)),
            b'A'..=b'I' => Some((byte - b'A' + 1, Overpunch::Positive)),
            b'}' => Some((0, Overpunch::Negative)),
            b'J'..=b'R' => Some((byte - b'J' + 1, Overpunch::Negative)),
            b'p'..=b'y' => Some((byte - b'p', Overpunch::NegativeAlternate)),
            _ => None,
        },
        Charset::Ebcdic(_) => {
            let digit = byte & 0x0F;
            if digit > 9 {
                return None;
            }
            let sign = match (byte >> 4, options.sign_nibbles) {
                (0x0C, _) => Overpunch::Positive,
                (0x0D, _) => Overpunch::Negative,
                (0x0A | 0x0E, SignNibbles::Extended) => Overpunch::Positive,
                (0x0B, SignNibbles::Extended) => Overpunch::Negative,
                _ => return None,
            };
            Some((digit, sign))
        }
    }
}

fn separate_sign(byte: u8, charset: Charset) -> Option<bool> {
    let (plus, minus) = match charset {
        Charset::Ascii => (b'+', b'-'),
        Charset::Ebcdic(_) => (ebcdic::EBCDIC_PLUS, ebcdic::EBCDIC_MINUS),
    };
    if byte == plus {
        Some(false)
    } else if byte == minus {
        Some(true)
    } else {
        None
    }
}

/// Decode a zoned field into the unscaled integer value.
pub fn decode_zoned(bytes: &[u8], sign: SignConvention, options: &DecodeOptions) -> Result<i128, DecodeErrorKind> {
    if bytes.is_empty() {
        return Err(invalid("empty field".to_string()));
    }
    let relaxed = options.sign_nibbles.is_relaxed();
    let (digits, negative) = match sign {
        SignConvention::LeadingSeparate | SignConvention::TrailingSeparate => {
            let (sign_byte, digits) = if sign == SignConvention::LeadingSeparate {
                (bytes[0], &bytes[1..])
            } else {
                (bytes[bytes.len() - 1], &bytes[..bytes.len() - 1])
            };
            let negative = separate_sign(sign_byte, options.charset)
                .ok_or_else(|| invalid(format!("invalid separate sign byte 0x{sign_byte:02x}")))?;
            (digit_values(digits, None, options)?, negative)
        }
        SignConvention::LeadingOverpunch
        | SignConvention::TrailingOverpunch
        | SignConvention::Unsigned
        | SignConvention::Signed => {
            let punch_at = if sign == SignConvention::LeadingOverpunch {
                0
            } else {
                bytes.len() - 1
            };
            let (values, punch) = overpunched(bytes, punch_at, options)?;
            let signed = sign != SignConvention::Unsigned;
            if punch.is_negative() && !signed {
                return Err(invalid("negative sign on an unsigned field".to_string()));
            }
            if !relaxed && !punch.is_preferred(signed, options.charset) {
                return Err(invalid(format!(
                    "byte 0x{:02x} is not the preferred sign encoding of {} field",
                    bytes[punch_at],
                    if signed { "a signed" } else { "an unsigned" }
                )));
            }
            (values, punch.is_negative())
        }
    };

    let mut value: i128 = 0;
    for d in digits {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(d)))
            .ok_or_else(|| DecodeErrorKind::Overflow("zoned value exceeds 128 bits".to_string()))?;
    }
    if negative && value == 0 && !relaxed {
        return Err(invalid("negative zero".to_string()));
    }
    Ok(if negative { -value } else { value })
}

fn overpunched(bytes: &[u8], punch_at: usize, options: &DecodeOptions) -> Result<(Vec<u8>, Overpunch), DecodeErrorKind> {
    let mut punch = Overpunch::Unsigned;
    let values = digit_values(bytes, Some((punch_at, &mut punch)), options)?;
    Ok((values, punch))
}

fn digit_values(
    bytes: &[u8],
    mut punch: Option<(usize, &mut Overpunch)>,
    options: &DecodeOptions,
) -> Result<Vec<u8>, DecodeErrorKind> {
    let mut values = Vec::with_capacity(bytes.len());
    for (position, &byte) in bytes.iter().enumerate() {
        let digit = match punch.as_mut() {
            Some((at, sign)) if *at == position => {
                let (d, s) = overpunched_digit(byte, options)
                    .ok_or_else(|| invalid(format!("invalid sign digit 0x{byte:02x} at byte {position}")))?;
                **sign = s;
                d
            }
            _ => plain_digit(byte, options.charset)
                .ok_or_else(|| invalid(format!("invalid digit 0x{byte:02x} at byte {position}")))?,
        };
        values.push(digit);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CodePage;

    fn ebcdic() -> DecodeOptions {
        DecodeOptions {
            charset: Charset::Ebcdic(CodePage::Cp037),
            ..DecodeOptions::default()
        }
    }

    fn relaxed(base: DecodeOptions) -> DecodeOptions {
        DecodeOptions {
            sign_nibbles: SignNibbles::Relaxed,
            ..base
        }
    }

    #[test]
    fn ascii_plain_and_overpunch() {
        let opts = DecodeOptions::default();
        assert_eq!(decode_zoned(b"0042", SignConvention::Unsigned, &opts).unwrap(), 42);
        assert_eq!(decode_zoned(b"123", SignConvention::TrailingOverpunch, &opts).unwrap(), 123);
        assert_eq!(decode_zoned(b"12L", SignConvention::TrailingOverpunch, &opts).unwrap(), -123);
        assert_eq!(decode_zoned(b"12}", SignConvention::TrailingOverpunch, &opts).unwrap(), -120);
        assert_eq!(decode_zoned(b"J23", SignConvention::LeadingOverpunch, &opts).unwrap(), -123);
    }

    #[test]
    fn ascii_alternate_overpunch_needs_relaxed_mode() {
        let opts = DecodeOptions::default();
        for image in [&b"12C"[..], b"12{", b"12s"] {
            assert!(matches!(
                decode_zoned(image, SignConvention::TrailingOverpunch, &opts),
                Err(DecodeErrorKind::ZonedDecimal(_))
            ));
        }
        assert!(decode_zoned(b"12C", SignConvention::Unsigned, &opts).is_err());

        let lax = relaxed(DecodeOptions::default());
        assert_eq!(decode_zoned(b"12C", SignConvention::TrailingOverpunch, &lax).unwrap(), 123);
        assert_eq!(decode_zoned(b"12{", SignConvention::TrailingOverpunch, &lax).unwrap(), 120);
        assert_eq!(decode_zoned(b"12s", SignConvention::TrailingOverpunch, &lax).unwrap(), -123);
    }

    #[test]
    fn ebcdic_zones() {
        let opts = ebcdic();
        assert_eq!(decode_zoned(&[0xF1, 0xF2, 0xC3], SignConvention::TrailingOverpunch, &opts).unwrap(), 123);
        assert_eq!(decode_zoned(&[0xF1, 0xF2, 0xD3], SignConvention::TrailingOverpunch, &opts).unwrap(), -123);
        assert_eq!(decode_zoned(&[0xD1, 0xF2, 0xF3], SignConvention::LeadingOverpunch, &opts).unwrap(), -123);
        assert_eq!(decode_zoned(&[0xF1, 0xF2, 0xF3], SignConvention::Unsigned, &opts).unwrap(), 123);
        assert!(decode_zoned(&[0xF1, 0xF2, 0xF3], SignConvention::TrailingOverpunch, &opts).is_err());
        assert!(decode_zoned(&[0xF1, 0xF2, 0xC3], SignConvention::Unsigned, &opts).is_err());
        assert!(decode_zoned(&[0xF1, 0xF2, 0xB3], SignConvention::TrailingOverpunch, &opts).is_err());

        assert_eq!(
            decode_zoned(&[0xF1, 0xF2, 0xF3], SignConvention::TrailingOverpunch, &relaxed(ebcdic())).unwrap(),
            123
        );
        let ext = DecodeOptions {
            sign_nibbles: SignNibbles::Extended,
            ..ebcdic()
        };
        assert_eq!(decode_zoned(&[0xF1, 0xF2, 0xB3], SignConvention::TrailingOverpunch, &ext).unwrap(), -123);
    }

    #[test]
    fn separate_sign() {
        let opts = DecodeOptions::default();
        assert_eq!(decode_zoned(b"-123", SignConvention::LeadingSeparate, &opts).unwrap(), -123);
        assert_eq!(decode_zoned(b"123+", SignConvention::TrailingSeparate, &opts).unwrap(), 123);
        assert!(decode_zoned(b" 123", SignConvention::LeadingSeparate, &opts).is_err());
        assert_eq!(
            decode_zoned(&[0x60, 0xF4, 0xF2], SignConvention::LeadingSeparate, &ebcdic()).unwrap(),
            -42
        );
    }

    #[test]
    fn rejects_bad_digits_and_unsigned_negatives() {
        let opts = DecodeOptions::default();
        assert!(matches!(
            decode_zoned(b"1 3", SignConvention::Unsigned, &opts),
            Err(DecodeErrorKind::ZonedDecimal(_))
        ));
        assert!(matches!(
            decode_zoned(b"12L", SignConvention::Unsigned, &opts),
            Err(DecodeErrorKind::ZonedDecimal(_))
        ));
        assert!(decode_zoned(b"1C3", SignConvention::TrailingOverpunch, &opts).is_err());
    }

    #[test]
    fn negative_zero() {
        let opts = DecodeOptions::default();
        assert!(decode_zoned(b"00}", SignConvention::TrailingOverpunch, &opts).is_err());
        assert!(decode_zoned(b"-000", SignConvention::LeadingSeparate, &opts).is_err());
        assert_eq!(decode_zoned(b"000", SignConvention::TrailingOverpunch, &opts).unwrap(), 0);
        let lax = relaxed(DecodeOptions::default());
        assert_eq!(decode_zoned(b"00}", SignConvention::TrailingOverpunch, &lax).unwrap(), 0);
    }
}
