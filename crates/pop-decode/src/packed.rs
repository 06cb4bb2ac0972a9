//! Packed decimal (COMP-3) decoding.
//!
//! Two digits per byte, sign in the low nibble of the last byte. For an
//! even digit count the high nibble of the first byte is a pad and must be
//! zero. `+12345` in `PIC S9(5) COMP-3` is `12 34 5C`.

use crate::error::DecodeErrorKind;
use crate::options::{DecodeOptions, SignNibbles};

/// Decode packed bytes holding `digits` digit positions into the unscaled
/// integer value.
pub fn decode_packed(bytes: &[u8], digits: u32, signed: bool, options: &DecodeOptions) -> Result<i128, DecodeErrorKind> {
    let Some((&last, _)) = bytes.split_last() else {
        return Err(DecodeErrorKind::PackedDecimal("empty field".to_string()));
    };
    let nibble_digits = bytes.len() * 2 - 1;
    let pad_nibbles = nibble_digits.saturating_sub(digits as usize);

    let mut value: i128 = 0;
    for (position, nibble) in bytes
        .iter()
        .flat_map(|b| [b >> 4, b & 0x0F])
        .take(nibble_digits)
        .enumerate()
    {
        if nibble > 9 {
            return Err(DecodeErrorKind::PackedDecimal(format!(
                "invalid digit nibble 0x{nibble:x} at byte {}",
                position / 2
            )));
        }
        if position < pad_nibbles {
            if nibble != 0 {
                return Err(DecodeErrorKind::Overflow(format!(
                    "nonzero pad nibble for a {digits}-digit field"
                )));
            }
            continue;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(nibble)))
            .ok_or_else(|| DecodeErrorKind::Overflow("packed value exceeds 128 bits".to_string()))?;
    }

    let relaxed = options.sign_nibbles.is_relaxed();
    let extended = options.sign_nibbles == SignNibbles::Extended;
    let negative = match last & 0x0F {
        0x0C if signed || relaxed => false,
        0x0F if !signed || relaxed => false,
        0x0D => true,
        0x0A | 0x0E if extended => false,
        0x0B if extended => true,
        nibble @ (0x0C | 0x0F) => {
            return Err(DecodeErrorKind::PackedDecimal(format!(
                "sign nibble 0x{nibble:x} is not the preferred sign of {} field",
                if signed { "a signed" } else { "an unsigned" }
            )))
        }
        other => {
            return Err(DecodeErrorKind::PackedDecimal(format!(
                "invalid sign nibble 0x{other:x}"
            )))
        }
    };
    if negative && !signed {
        return Err(DecodeErrorKind::PackedDecimal(
            "negative sign on an unsigned field".to_string(),
        ));
    }
    if negative && value == 0 && !relaxed {
        return Err(DecodeErrorKind::PackedDecimal("negative zero".to_string()));
    }
    Ok(if negative { -value } else { value })
}
