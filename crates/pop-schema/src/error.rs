//! # Schema Compilation Errors
//!
//! Every rejection carries the copybook line it was raised on where one
//! exists, so a caller can point at the offending entry.

use pop_core::CanonicalizationError;
use thiserror::Error;

/// Errors raised while compiling a copybook into a [`crate::RecordLayout`].
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The copybook contained no data description entries.
    #[error("copybook contains no data description entries")]
    Empty,

    /// The source text could not be tokenized or an entry was malformed.
    #[error("line {line}: syntax error: {message}")]
    Syntax {
        /// 1-based source line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A PICTURE string could not be analyzed.
    #[error("line {line}: invalid picture \"{picture}\": {reason}")]
    InvalidPicture {
        /// 1-based source line.
        line: usize,
        /// The picture string as written.
        picture: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A clause, usage, or statement outside the supported subset.
    #[error("line {line}: unsupported clause: {clause}")]
    UnsupportedClause {
        /// 1-based source line.
        line: usize,
        /// The clause as written.
        clause: String,
    },

    /// Level numbers do not form a valid hierarchy.
    #[error("line {line}: invalid level structure: {message}")]
    InvalidLevel {
        /// 1-based source line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Two siblings share a name.
    #[error("line {line}: duplicate name \"{name}\" among siblings")]
    DuplicateName {
        /// 1-based source line of the second declaration.
        line: usize,
        /// The repeated name.
        name: String,
    },

    /// A REDEFINES clause names an undeclared, later, or non-sibling item.
    #[error("line {line}: \"{name}\" cannot redefine \"{target}\": {reason}")]
    RedefinesTarget {
        /// 1-based source line.
        line: usize,
        /// The redefining item.
        name: String,
        /// The named target.
        target: String,
        /// Why the target is unusable.
        reason: String,
    },

    /// A REDEFINES alternate is longer than its target.
    #[error("\"{name}\" ({length} bytes) is longer than redefined \"{target}\" ({target_length} bytes)")]
    RedefinesTooLong {
        /// The redefining item.
        name: String,
        /// The redefined item.
        target: String,
        /// Length of the alternate.
        length: usize,
        /// Length of the target.
        target_length: usize,
    },

    /// An OCCURS clause is malformed or placed where it cannot be laid out.
    #[error("line {line}: invalid OCCURS on \"{name}\": {reason}")]
    Occurs {
        /// 1-based source line.
        line: usize,
        /// The repeated item.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An OCCURS DEPENDING ON count field cannot be resolved.
    #[error("line {line}: \"{name}\" DEPENDING ON \"{target}\": {reason}")]
    DependingOn {
        /// 1-based source line.
        line: usize,
        /// The variable-length item.
        name: String,
        /// The named count field.
        target: String,
        /// Why it could not be resolved.
        reason: String,
    },

    /// A numeric field declares more digits than its storage supports.
    #[error("line {line}: \"{name}\" declares {digits} digits, limit is {max}")]
    DigitLimit {
        /// 1-based source line.
        line: usize,
        /// The field.
        name: String,
        /// Declared digit count.
        digits: u32,
        /// Limit for the field's usage.
        max: u32,
    },

    /// The computed record length exceeds the configured maximum.
    #[error("record length {length} exceeds maximum {max}")]
    RecordTooLong {
        /// Computed length.
        length: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The copybook declares several 01 records and none was selected.
    #[error("copybook declares multiple records ({}); set record_name to choose one", names.join(", "))]
    MultipleRecords {
        /// Names of the declared records.
        names: Vec<String>,
    },

    /// The selected record name does not exist in the copybook.
    #[error("record \"{0}\" not found in copybook")]
    RecordNotFound(String),

    /// The layout could not be canonicalized for fingerprinting.
    #[error("layout canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
