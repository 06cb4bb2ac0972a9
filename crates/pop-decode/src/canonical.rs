//! # Canonical Records
//!
//! A [`CanonicalRecord`] is the decoded form of one record: its stream index
//! plus named values in schema declaration order. Its canonical bytes
//! (format `pop-record/1`) are the JCS serialization of
//! `{"fields":[[name,value],...],"index":N}`; the pair list keeps
//! declaration order intact under JCS key sorting.

use serde::{Deserialize, Serialize};

use pop_core::{CanonicalBytes, CanonicalizationError, FieldValue};

/// Identifier of the canonical record byte format.
pub const RECORD_FORMAT: &str = "pop-record/1";

/// One decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// 0-based position of the record in the stream.
    pub index: u64,
    /// Top-level values in declaration order.
    pub fields: Vec<(String, FieldValue)>,
}

impl CanonicalRecord {
    /// The canonical byte form hashed into the Merkle leaf.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// Resolve a subscripted path such as `LINES(2).QTY`.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        let mut level: &[(String, FieldValue)] = &self.fields;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let (name, subscript) = split_subscript(segment)?;
            let (_, value) = level.iter().find(|(n, _)| n == name)?;
            let value = match subscript {
                Some(i) => match value {
                    FieldValue::Array(items) => items.get(i.checked_sub(1)?)?,
                    _ => return None,
                },
                None => value,
            };
            if segments.peek().is_none() {
                return Some(value);
            }
            match value {
                FieldValue::Group(children) => level = children,
                _ => return None,
            }
        }
        None
    }

    /// Visit every non-group, non-array value with its subscripted path.
    pub fn for_each_leaf<F: FnMut(&str, &FieldValue)>(&self, mut visit: F) {
        fn walk<F: FnMut(&str, &FieldValue)>(path: &str, value: &FieldValue, visit: &mut F) {
            match value {
                FieldValue::Group(children) => {
                    for (name, child) in children {
                        walk(&format!("{path}.{name}"), child, visit);
                    }
                }
                FieldValue::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        walk(&format!("{path}({})", i + 1), item, visit);
                    }
                }
                leaf => visit(path, leaf),
            }
        }
        for (name, value) in &self.fields {
            walk(name, value, &mut visit);
        }
    }
}

fn split_subscript(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.strip_suffix(')') {
        Some(rest) => {
            let (name, index) = rest.split_once('(')?;
            Some((name, Some(index.parse().ok()?)))
        }
        None => Some((segment, None)),
    }
}
