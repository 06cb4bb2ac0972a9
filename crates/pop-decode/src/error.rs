//! # Decode Errors
//!
//! Every failure names the record index and, when one field is at fault,
//! its subscripted path. Values and raw bytes beyond the offending byte are
//! never included.

use thiserror::Error;

/// A record that could not be decoded.
#[derive(Error, Debug)]
#[error("record {record_index}{}: {kind}", describe_path(.field_path))]
pub struct DecodeError {
    /// 0-based index of the record in the stream.
    pub record_index: u64,
    /// Subscripted path of the failing field, empty for record-level errors.
    pub field_path: String,
    /// What went wrong.
    pub kind: DecodeErrorKind,
}

fn describe_path(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(", field {path}")
    }
}

/// Classification of decode failures.
#[derive(Error, Debug)]
pub enum DecodeErrorKind {
    /// The stream ended part-way through a record.
    #[error("truncated record: got {actual} of {expected} bytes")]
    TruncatedRecord {
        /// Record length from the layout.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A text byte has no mapping in the configured character set.
    #[error("unmappable byte 0x{byte:02x} at record offset {record_offset} (stream offset {stream_offset})")]
    Encoding {
        /// The offending byte.
        byte: u8,
        /// Offset from the start of the record.
        record_offset: usize,
        /// Offset from the start of the stream.
        stream_offset: u64,
    },

    /// Malformed COMP-3 data.
    #[error("invalid packed decimal: {0}")]
    PackedDecimal(String),

    /// Malformed zoned decimal data.
    #[error("invalid zoned decimal: {0}")]
    ZonedDecimal(String),

    /// A value does not fit its declared range.
    #[error("value out of range: {0}")]
    Overflow(String),

    /// An OCCURS DEPENDING ON count lies outside the declared bounds.
    #[error("occurrence count {count} outside {min}..={max}")]
    OccursBound {
        /// The decoded count.
        count: i128,
        /// Declared minimum.
        min: u32,
        /// Declared maximum.
        max: u32,
    },

    /// Reading the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
