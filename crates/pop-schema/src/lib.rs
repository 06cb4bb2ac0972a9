//! # pop-schema — Copybook Schema Compiler
//!
//! Compiles COBOL copybook source into a [`RecordLayout`]:
//!
//! - **Lexer** (`lexer.rs`): free and fixed reference formats, comment and
//!   sequence-area stripping, literal-aware tokenization.
//!
//! - **Parser** (`parser.rs`): data description entries and their clauses
//!   (PICTURE, USAGE, OCCURS, REDEFINES, SIGN, VALUE and the layout-neutral
//!   clauses). Level 88 condition names are dropped.
//!
//! - **Picture** (`picture.rs`): picture category, display length, digit
//!   count, and implied scale.
//!
//! - **Compile** (`compile.rs`): level hierarchy, offsets, REDEFINES and
//!   OCCURS layout, OCCURS DEPENDING ON resolution, flattening, and the
//!   layout fingerprint.
//!
//! ## Crate Policy
//!
//! - Depends on `pop-core` for `CanonicalBytes` and `ContentDigest`.
//! - The same copybook text and options always produce a byte-identical
//!   layout and fingerprint.

pub mod compile;
pub mod error;
mod lexer;
pub mod layout;
pub mod options;
mod parser;
pub mod picture;

pub use compile::compile_schema;
pub use error::SchemaError;
pub use layout::{
    base_path, DataKind, DependingOn, ElementaryField, FieldSpec, ItemNode, LayoutItem, Occurs, RecordLayout,
    SignConvention, Usage,
};
pub use options::{SchemaOptions, SourceFormat};
pub use picture::{analyze_picture, Picture, PictureCategory};
