//! Big-endian binary (COMP, COMP-4, BINARY, COMP-5) decoding.

use crate::error::DecodeErrorKind;

/// Decode a big-endian integer of up to 8 bytes.
///
/// Signed fields are two's complement. When `digit_limit` is set the
/// magnitude must fit that many decimal digits.
pub fn decode_binary(bytes: &[u8], signed: bool, digit_limit: Option<u32>) -> Result<i128, DecodeErrorKind> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(DecodeErrorKind::Overflow(format!(
            "unsupported binary length {}",
            bytes.len()
        )));
    }
    let mut value: i128 = bytes.iter().fold(0, |acc, b| (acc << 8) | i128::from(*b));
    if signed && bytes[0] & 0x80 != 0 {
        value -= 1i128 << (8 * bytes.len());
    }
    if let Some(digits) = digit_limit {
        let bound = 10i128.pow(digits);
        if value.unsigned_abs() >= bound.unsigned_abs() {
            return Err(DecodeErrorKind::Overflow(format!(
                "binary value exceeds {digits} digits"
            )));
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_and_unsigned() {
        assert_eq!(decode_binary(&[0x00, 0x7B], true, None).unwrap(), 123);
        assert_eq!(decode_binary(&[0xFF, 0x85], true, None).unwrap(), -123);
        assert_eq!(decode_binary(&[0xFF, 0x85], false, None).unwrap(), 65413);
        assert_eq!(
            decode_binary(&[0x80, 0, 0, 0, 0, 0, 0, 0], true, None).unwrap(),
            i128::from(i64::MIN)
        );
        assert_eq!(decode_binary(&[0xFF; 8], false, None).unwrap(), i128::from(u64::MAX));
    }

    #[test]
    fn picture_digit_range() {
        assert_eq!(decode_binary(&[0x27, 0x0F], false, Some(4)).unwrap(), 9999);
        assert!(matches!(
            decode_binary(&[0x27, 0x10], false, Some(4)),
            Err(DecodeErrorKind::Overflow(_))
        ));
        assert!(decode_binary(&[0xD8, 0xF0], true, Some(4)).is_err());
        assert_eq!(decode_binary(&[0x27, 0x10], false, None).unwrap(), 10000);
    }

    #[test]
    fn unsupported_lengths() {
        assert!(decode_binary(&[], true, None).is_err());
        assert!(decode_binary(&[0; 9], true, None).is_err());
    }
}
