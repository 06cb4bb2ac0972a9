//! # pop-decode — Copybook-Driven Record Decoder
//!
//! Decodes fixed-length binary records against a compiled
//! [`RecordLayout`](pop_schema::RecordLayout):
//!
//! - **Options** (`options.rs`): charset, sign nibble acceptance, binary
//!   range, strict/lenient mode, REDEFINES policy, FILLER handling.
//!
//! - **Text** (`text.rs`, `ebcdic.rs`): ASCII and EBCDIC (CP037, CP1047)
//!   alphanumeric fields, with unmappable bytes reported by offset.
//!
//! - **Numerics** (`zoned.rs`, `packed.rs`, `binary.rs`): zoned decimal
//!   with overpunch and separate signs, COMP-3 packed decimal, and
//!   big-endian binary.
//!
//! - **Record** (`record.rs`): walks one record's bytes through the layout,
//!   resolving OCCURS and OCCURS DEPENDING ON.
//!
//! - **Stream** (`stream.rs`): a lazy iterator over a byte stream with one
//!   reused record buffer and cooperative stop.
//!
//! - **Canonical** (`canonical.rs`): the [`CanonicalRecord`] form whose
//!   JCS bytes are committed to by the Merkle tree.
//!
//! ## Crate Policy
//!
//! - No floating point: decimals decode to `ScaledDecimal`.
//! - Every error carries the record index and the field path.
//! - Decoded values never appear in log output.

pub mod binary;
pub mod canonical;
pub mod ebcdic;
pub mod error;
pub mod options;
pub mod packed;
pub mod record;
pub mod stream;
pub mod text;
pub mod zoned;

use std::io::Read;

use pop_schema::RecordLayout;

pub use canonical::{CanonicalRecord, RECORD_FORMAT};
pub use error::{DecodeError, DecodeErrorKind};
pub use options::{BinaryRange, Charset, CodePage, DecodeOptions, Mode, RedefinesPolicy, SignNibbles};
pub use record::decode_record;
pub use stream::{DecodeSummary, RecordStream, StopHandle};

/// Decode every record of `reader` lazily against `layout`.
pub fn decode<'a, R: Read>(layout: &'a RecordLayout, reader: R, options: DecodeOptions) -> RecordStream<'a, R> {
    RecordStream::new(layout, reader, options)
}
