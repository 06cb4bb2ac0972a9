//! Schema compilation options.

use serde::{Deserialize, Serialize};

/// Default ceiling on compiled record length (the classic QSAM LRECL limit).
pub const DEFAULT_MAX_RECORD_LENGTH: usize = 32_760;

/// Copybook source layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Free-form text. `*` or `*>` at the start of a line comments it out;
    /// `*>` elsewhere starts an inline comment.
    #[default]
    Free,
    /// Fixed reference format: columns 1-6 sequence area, column 7
    /// indicator, columns 8-72 program text, columns 73+ ignored.
    Fixed,
}

/// Options controlling [`crate::compile_schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaOptions {
    /// Source layout of the copybook text.
    pub source_format: SourceFormat,
    /// Reject layouts longer than this many bytes.
    pub max_record_length: usize,
    /// Select one 01 record when the copybook declares several. Without
    /// any 01 level this names the implicit root.
    pub record_name: Option<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            source_format: SourceFormat::Free,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
            record_name: None,
        }
    }
}
