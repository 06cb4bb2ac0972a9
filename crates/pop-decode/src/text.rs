//! Text field decoding.

use crate::ebcdic;
use crate::options::{Charset, DecodeOptions};

/// An unmappable byte at a position within the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unmappable {
    /// Offset within the field.
    pub position: usize,
    /// The byte.
    pub byte: u8,
}

/// Decode a text field through the configured character set.
pub fn decode_text(bytes: &[u8], options: &DecodeOptions) -> Result<String, Unmappable> {
    let mut out = String::with_capacity(bytes.len());
    for (position, &byte) in bytes.iter().enumerate() {
        if byte == 0x00 && options.low_values_as_spaces {
            out.push(' ');
            continue;
        }
        let decoded = match options.charset {
            Charset::Ascii => byte.is_ascii().then(|| char::from(byte)),
            Charset::Ebcdic(page) => ebcdic::decode_char(page, byte),
        };
        match decoded {
            Some(c) => out.push(c),
            None => return Err(Unmappable { position, byte }),
        }
    }
    if options.trim_trailing_spaces {
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
    }
    Ok(out)
}
