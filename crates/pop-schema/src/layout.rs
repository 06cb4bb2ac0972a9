//! # Record Layout
//!
//! The compiled, immutable description of one fixed-width record. A
//! [`RecordLayout`] carries two views of the same storage:
//!
//! - `items`: the item tree in declaration order, used by the decoder to
//!   produce nested `Group` and `Array` values. Offsets in the tree are
//!   absolute for the first occurrence of every enclosing OCCURS.
//! - `fields`: every elementary item with OCCURS expanded and a fully
//!   subscripted path such as `LINES(2).AMOUNT`, used for field lookup,
//!   commitment selection, and disclosure.
//!
//! The layout is shared read-only (`&RecordLayout`) by every consumer.

use serde::{Deserialize, Serialize};

use pop_core::ContentDigest;

/// Storage usage of a data item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    /// Character or zoned decimal storage.
    Display,
    /// COMP, COMP-4, and BINARY: big-endian, range limited by the picture.
    Binary,
    /// COMP-5: big-endian, full storage range.
    NativeBinary,
    /// COMP-3 and PACKED-DECIMAL.
    Packed,
}

/// How an elementary item's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Character data, including edited pictures.
    Text,
    /// Zoned decimal (DISPLAY numeric).
    Zoned,
    /// Packed decimal (COMP-3).
    Packed,
    /// COMP, COMP-4, BINARY.
    Binary,
    /// COMP-5.
    NativeBinary,
    /// An unnamed FILLER item, kept as raw bytes.
    Filler,
}

impl DataKind {
    /// True for kinds that decode to `Integer` or `Decimal`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Zoned | Self::Packed | Self::Binary | Self::NativeBinary)
    }
}

/// Where and how a numeric item stores its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    /// No `S` in the picture.
    Unsigned,
    /// Packed sign nibble or two's complement binary.
    Signed,
    /// Zoned, sign overpunched on the last digit (the default for `S`).
    TrailingOverpunch,
    /// Zoned, sign overpunched on the first digit.
    LeadingOverpunch,
    /// Zoned, `+`/`-` character after the digits.
    TrailingSeparate,
    /// Zoned, `+`/`-` character before the digits.
    LeadingSeparate,
}

impl SignConvention {
    /// True unless the field is unsigned.
    pub fn is_signed(&self) -> bool {
        !matches!(self, Self::Unsigned)
    }
}

/// Interpretation of an elementary item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementaryField {
    /// Decoding rule for the bytes.
    pub kind: DataKind,
    /// Sign placement.
    pub sign: SignConvention,
    /// Digit positions (numeric kinds only).
    pub digits: u32,
    /// Implied fractional digits (numeric kinds only).
    pub scale: u32,
    /// The picture as written, if any.
    pub picture: Option<String>,
}

/// The resolved count field of an OCCURS DEPENDING ON item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependingOn {
    /// Path of the count field.
    pub field_path: String,
    /// Index of the count field in [`RecordLayout::fields`].
    pub field_index: usize,
}

/// Repetition of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurs {
    /// Minimum occurrences (equal to `max` for fixed tables).
    pub min: u32,
    /// Maximum occurrences; storage is always reserved for `max`.
    pub max: u32,
    /// Count field for variable tables.
    pub depending_on: Option<DependingOn>,
}

/// Group or elementary content of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemNode {
    /// A group item and its subordinate items.
    Group(Vec<LayoutItem>),
    /// An elementary item.
    Field(ElementaryField),
}

/// One data item in the layout tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    /// Item name; unnamed items are `FILLER#n` (1-based among siblings).
    pub name: String,
    /// Level number as written.
    pub level: u8,
    /// Absolute offset of the first occurrence.
    pub offset: usize,
    /// Length in bytes of a single occurrence.
    pub length: usize,
    /// Repetition, if the item has an OCCURS clause.
    pub occurs: Option<Occurs>,
    /// Name of the sibling this item redefines.
    pub redefines: Option<String>,
    /// Group children or elementary interpretation.
    pub node: ItemNode,
}

impl LayoutItem {
    /// Bytes reserved for the item, all occurrences included.
    pub fn total_length(&self) -> usize {
        let count = self.occurs.as_ref().map_or(1, |o| o.max as usize);
        self.length * count
    }

    /// True for unnamed FILLER items.
    pub fn is_filler(&self) -> bool {
        self.name.starts_with("FILLER#")
    }
}

/// One elementary item with OCCURS expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Item name without qualification.
    pub name: String,
    /// Dotted path below the record, with 1-based subscripts.
    pub path: String,
    /// Absolute byte offset within the record.
    pub offset: usize,
    /// Byte length.
    pub length: usize,
    /// Decoding rule and numeric attributes.
    pub field: ElementaryField,
    /// Occurrence numbers of every enclosing OCCURS, outermost first.
    pub subscripts: Vec<u32>,
    /// Target of the nearest enclosing REDEFINES alternate.
    pub redefines: Option<String>,
}

/// A compiled copybook record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordLayout {
    /// Name of the 01 record, or of the implicit root.
    pub record_name: String,
    /// Fixed record length in bytes.
    pub length: usize,
    /// Top-level items in declaration order.
    pub items: Vec<LayoutItem>,
    /// Elementary items, OCCURS expanded, in storage declaration order.
    pub fields: Vec<FieldSpec>,
    #[serde(skip)]
    pub(crate) fingerprint: ContentDigest,
}

impl RecordLayout {
    /// SHA-256 over the canonical serialization of this layout.
    pub fn fingerprint(&self) -> ContentDigest {
        self.fingerprint
    }

    /// Look up an elementary field by its subscripted path.
    pub fn field(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Every elementary field whose path, with subscripts removed, is `base`.
    pub fn fields_with_base_path<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields.iter().filter(move |f| base_path(&f.path) == base)
    }

    /// The OCCURS DEPENDING ON item, if the record has one.
    pub fn depending_item(&self) -> Option<&LayoutItem> {
        fn find(items: &[LayoutItem]) -> Option<&LayoutItem> {
            items.iter().find_map(|item| {
                if item.occurs.as_ref().is_some_and(|o| o.depending_on.is_some()) {
                    return Some(item);
                }
                match &item.node {
                    ItemNode::Group(children) => find(children),
                    ItemNode::Field(_) => None,
                }
            })
        }
        find(&self.items)
    }
}

/// Strip `(n)` subscripts from a field path: `LINES(2).AMOUNT` becomes
/// `LINES.AMOUNT`.
pub fn base_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_strips_subscripts() {
        assert_eq!(base_path("LINES(2).AMOUNT"), "LINES.AMOUNT");
        assert_eq!(base_path("A(1).B(12).C"), "A.B.C");
        assert_eq!(base_path("PLAIN"), "PLAIN");
    }

    #[test]
    fn total_length_uses_max_occurrences() {
        let item = LayoutItem {
            name: "T".into(),
            level: 5,
            offset: 0,
            length: 4,
            occurs: Some(Occurs {
                min: 1,
                max: 3,
                depending_on: None,
            }),
            redefines: None,
            node: ItemNode::Field(ElementaryField {
                kind: DataKind::Text,
                sign: SignConvention::Unsigned,
                digits: 0,
                scale: 0,
                picture: Some("X(4)".into()),
            }),
        };
        assert_eq!(item.total_length(), 12);
        assert!(!item.is_filler());
    }
}
