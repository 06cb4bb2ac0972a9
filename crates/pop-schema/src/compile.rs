//! # Copybook Compilation
//!
//! Builds a [`RecordLayout`] from parsed entries in four passes:
//!
//! 1. Hierarchy: level numbers become a tree; elementary items may not own
//!    subordinates and a returning level must match an open one.
//! 2. Record selection: a single 01 record, the one named by
//!    `record_name`, or an implicit root when no 01 level exists.
//! 3. Layout: offsets advance sequentially, REDEFINES alternates share their
//!    target's offset, OCCURS reserves `max` occurrences.
//! 4. Flattening and OCCURS DEPENDING ON resolution, then fingerprinting.

use std::collections::HashSet;

use pop_core::{sha256_digest, CanonicalBytes, ContentDigest};

use crate::error::SchemaError;
use crate::layout::{
    DataKind, DependingOn, ElementaryField, FieldSpec, ItemNode, LayoutItem, Occurs, RecordLayout,
    SignConvention, Usage,
};
use crate::lexer::tokenize;
use crate::options::SchemaOptions;
use crate::parser::{parse_entries, Entry, SignClause};
use crate::picture::{analyze_picture, PictureCategory};

/// Digit limit for zoned and packed decimal items.
pub const MAX_DECIMAL_DIGITS: u32 = 31;
/// Digit limit for binary items.
pub const MAX_BINARY_DIGITS: u32 = 18;

const IMPLICIT_RECORD_NAME: &str = "RECORD";

struct Node {
    entry: Entry,
    children: Vec<usize>,
}

enum Top {
    Record(usize),
    Implicit(String, Vec<usize>),
}

struct DependingSite {
    line: usize,
    name: String,
    target: String,
    offset: usize,
    end: usize,
    in_redefines: bool,
}

/// Compile copybook text into a record layout.
///
/// # Errors
///
/// Returns a [`SchemaError`] describing the first construct that cannot be
/// laid out.
pub fn compile_schema(text: &str, options: &SchemaOptions) -> Result<RecordLayout, SchemaError> {
    let tokens = tokenize(text, options.source_format)?;
    let entries = parse_entries(&tokens)?;
    if entries.is_empty() {
        return Err(SchemaError::Empty);
    }
    let (nodes, roots) = build_hierarchy(entries)?;
    let top = select_record(&nodes, &roots, options)?;

    let mut ctx = LayoutContext {
        nodes: &nodes,
        depending: None,
        max: options.max_record_length,
    };
    let (record_name, mut items, length) = match top {
        Top::Record(idx) => {
            let node = &nodes[idx];
            let name = node.entry.name.clone().unwrap_or_else(|| "FILLER".to_string());
            if node.entry.redefines.is_some() {
                tracing::debug!(record = %name, "record-level REDEFINES has no effect on a single record layout");
            }
            if node.children.is_empty() {
                let item = ctx.lay_out_item(idx, name.clone(), 0, None, 0, false)?;
                let length = item.total_length();
                (name, vec![item], length)
            } else {
                let (items, length) = ctx.lay_out_children(&node.children, 0, node.entry.usage, 0, false)?;
                (name, items, length)
            }
        }
        Top::Implicit(name, children) => {
            let (items, length) = ctx.lay_out_children(&children, 0, None, 0, false)?;
            (name, items, length)
        }
    };
    if length > options.max_record_length {
        return Err(SchemaError::RecordTooLong {
            length,
            max: options.max_record_length,
        });
    }

    let mut fields = Vec::new();
    flatten(&items, "", 0, &[], None, &mut fields);

    if let Some(site) = ctx.depending.take() {
        let resolved = resolve_depending_on(&site, &fields, length)?;
        patch_depending_on(&mut items, &resolved);
    }

    let mut layout = RecordLayout {
        record_name,
        length,
        items,
        fields,
        fingerprint: ContentDigest::sha256([0u8; 32]),
    };
    layout.fingerprint = sha256_digest(&CanonicalBytes::new(&layout)?);

    tracing::debug!(
        record = %layout.record_name,
        length = layout.length,
        fields = layout.fields.len(),
        fingerprint = %layout.fingerprint,
        "schema compiled"
    );
    Ok(layout)
}

fn build_hierarchy(entries: Vec<Entry>) -> Result<(Vec<Node>, Vec<usize>), SchemaError> {
    let mut nodes: Vec<Node> = Vec::with_capacity(entries.len());
    let mut roots = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for entry in entries {
        let idx = nodes.len();
        let level = entry.level;
        if level == 1 || level == 77 {
            stack.clear();
            roots.push(idx);
        } else {
            let mut popped = None;
            while let Some(&top) = stack.last() {
                if nodes[top].entry.level < level {
                    break;
                }
                popped = Some(nodes[top].entry.level);
                stack.pop();
            }
            if let Some(previous) = popped {
                if previous != level {
                    return Err(SchemaError::InvalidLevel {
                        line: entry.line,
                        message: format!("level {level:02} does not match any enclosing level"),
                    });
                }
            }
            match stack.last() {
                Some(&parent) => {
                    let parent_entry = &nodes[parent].entry;
                    if parent_entry.picture.is_some() {
                        return Err(SchemaError::InvalidLevel {
                            line: entry.line,
                            message: format!(
                                "elementary item {} cannot have subordinate items",
                                parent_entry.name.as_deref().unwrap_or("FILLER")
                            ),
                        });
                    }
                    nodes[parent].children.push(idx);
                }
                None => roots.push(idx),
            }
        }
        let standalone = level == 77;
        nodes.push(Node {
            entry,
            children: Vec::new(),
        });
        if !standalone {
            stack.push(idx);
        }
    }
    Ok((nodes, roots))
}

fn select_record(nodes: &[Node], roots: &[usize], options: &SchemaOptions) -> Result<Top, SchemaError> {
    let records: Vec<usize> = roots
        .iter()
        .copied()
        .filter(|&r| nodes[r].entry.level == 1)
        .collect();
    if records.is_empty() {
        let name = options
            .record_name
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| IMPLICIT_RECORD_NAME.to_string());
        return Ok(Top::Implicit(name, roots.to_vec()));
    }

    let selected = match &options.record_name {
        Some(wanted) => {
            let wanted_upper = wanted.to_ascii_uppercase();
            records
                .iter()
                .copied()
                .find(|&r| nodes[r].entry.name.as_deref() == Some(wanted_upper.as_str()))
                .ok_or_else(|| SchemaError::RecordNotFound(wanted.clone()))?
        }
        None if records.len() == 1 => records[0],
        None => {
            return Err(SchemaError::MultipleRecords {
                names: records
                    .iter()
                    .map(|&r| nodes[r].entry.name.clone().unwrap_or_else(|| "FILLER".to_string()))
                    .collect(),
            })
        }
    };
    if roots.len() > 1 {
        tracing::debug!(ignored = roots.len() - 1, "items outside the selected record are ignored");
    }
    Ok(Top::Record(selected))
}

struct LayoutContext<'a> {
    nodes: &'a [Node],
    depending: Option<DependingSite>,
    max: usize,
}

impl<'a> LayoutContext<'a> {
    fn too_long(&self, length: usize) -> SchemaError {
        SchemaError::RecordTooLong {
            length,
            max: self.max,
        }
    }

    fn lay_out_children(
        &mut self,
        children: &[usize],
        start: usize,
        usage: Option<Usage>,
        occurs_depth: usize,
        in_redefines: bool,
    ) -> Result<(Vec<LayoutItem>, usize), SchemaError> {
        let nodes = self.nodes;
        let mut items: Vec<LayoutItem> = Vec::with_capacity(children.len());
        let mut cursor = start;
        let mut fillers = 0usize;
        let mut seen = HashSet::new();
        let mut base: Option<usize> = None;

        for &idx in children {
            let entry = &nodes[idx].entry;
            let name = match &entry.name {
                Some(n) => {
                    if !seen.insert(n.as_str()) {
                        return Err(SchemaError::DuplicateName {
                            line: entry.line,
                            name: n.clone(),
                        });
                    }
                    n.clone()
                }
                None => {
                    fillers += 1;
                    format!("FILLER#{fillers}")
                }
            };

            let item = match &entry.redefines {
                Some(target) => {
                    let redefines_err = |reason: &str| SchemaError::RedefinesTarget {
                        line: entry.line,
                        name: name.clone(),
                        target: target.clone(),
                        reason: reason.to_string(),
                    };
                    let Some(b) = base.filter(|&b| items[b].name == *target) else {
                        let reason = if items.iter().any(|i| i.name == *target) {
                            "must name the closest preceding item that is not itself a redefinition"
                        } else {
                            "target is not declared earlier at the same level"
                        };
                        return Err(redefines_err(reason));
                    };
                    let target_item = &items[b];
                    if target_item
                        .occurs
                        .as_ref()
                        .is_some_and(|o| o.depending_on.is_some())
                    {
                        return Err(redefines_err("a variable-length table cannot be redefined"));
                    }
                    let (offset, target_length) = (target_item.offset, target_item.total_length());
                    let mut item = self.lay_out_item(idx, name.clone(), offset, usage, occurs_depth, true)?;
                    if item.total_length() > target_length {
                        return Err(SchemaError::RedefinesTooLong {
                            name,
                            target: target.clone(),
                            length: item.total_length(),
                            target_length,
                        });
                    }
                    item.redefines = Some(target.clone());
                    item
                }
                None => {
                    let item = self.lay_out_item(idx, name, cursor, usage, occurs_depth, in_redefines)?;
                    cursor = cursor
                        .checked_add(item.total_length())
                        .ok_or_else(|| self.too_long(usize::MAX))?;
                    if cursor > self.max {
                        return Err(self.too_long(cursor));
                    }
                    base = Some(items.len());
                    item
                }
            };
            items.push(item);
        }
        Ok((items, cursor - start))
    }

    fn lay_out_item(
        &mut self,
        idx: usize,
        name: String,
        offset: usize,
        inherited: Option<Usage>,
        occurs_depth: usize,
        in_redefines: bool,
    ) -> Result<LayoutItem, SchemaError> {
        let nodes = self.nodes;
        let node = &nodes[idx];
        let entry = &node.entry;
        let usage = entry.usage.or(inherited);

        let (length, item_node) = if node.children.is_empty() {
            let (field, length) = elementary(entry, &name, usage)?;
            (length, ItemNode::Field(field))
        } else {
            if entry.sign.is_some() {
                return Err(SchemaError::UnsupportedClause {
                    line: entry.line,
                    clause: format!("SIGN on group item {name}"),
                });
            }
            let child_depth = occurs_depth + usize::from(entry.occurs.is_some());
            let (children, length) =
                self.lay_out_children(&node.children, offset, usage, child_depth, in_redefines)?;
            (length, ItemNode::Group(children))
        };

        let occurs = match &entry.occurs {
            None => None,
            Some(clause) => {
                let occurs_err = |reason: &str| SchemaError::Occurs {
                    line: entry.line,
                    name: name.clone(),
                    reason: reason.to_string(),
                };
                if entry.level == 1 || entry.level == 77 {
                    return Err(occurs_err("OCCURS is not allowed at level 01 or 77"));
                }
                if clause.max == 0 || clause.min > clause.max {
                    return Err(occurs_err("bounds must satisfy min <= max and max >= 1"));
                }
                let end = (clause.max as usize)
                    .checked_mul(length)
                    .and_then(|total| total.checked_add(offset))
                    .ok_or_else(|| self.too_long(usize::MAX))?;
                match &clause.depending_on {
                    None if clause.min != clause.max => {
                        return Err(occurs_err("a variable-size table requires DEPENDING ON"))
                    }
                    None => Some(Occurs {
                        min: clause.min,
                        max: clause.max,
                        depending_on: None,
                    }),
                    Some(target) => {
                        if occurs_depth > 0 {
                            return Err(occurs_err(
                                "OCCURS DEPENDING ON inside another OCCURS is not supported",
                            ));
                        }
                        if self.depending.is_some() {
                            return Err(occurs_err(
                                "OCCURS DEPENDING ON must be the last storage item of the record",
                            ));
                        }
                        self.depending = Some(DependingSite {
                            line: entry.line,
                            name: name.clone(),
                            target: target.clone(),
                            offset,
                            end,
                            in_redefines,
                        });
                        Some(Occurs {
                            min: clause.min,
                            max: clause.max,
                            depending_on: Some(DependingOn {
                                field_path: target.clone(),
                                field_index: 0,
                            }),
                        })
                    }
                }
            }
        };

        Ok(LayoutItem {
            name,
            level: entry.level,
            offset,
            length,
            occurs,
            redefines: None,
            node: item_node,
        })
    }
}

fn elementary(entry: &Entry, name: &str, usage: Option<Usage>) -> Result<(ElementaryField, usize), SchemaError> {
    let line = entry.line;
    let Some(picture) = &entry.picture else {
        return Err(SchemaError::InvalidPicture {
            line,
            picture: String::new(),
            reason: format!("elementary item {name} has no PICTURE clause"),
        });
    };
    let invalid = |reason: String| SchemaError::InvalidPicture {
        line,
        picture: picture.clone(),
        reason,
    };
    let pic = analyze_picture(picture).map_err(invalid)?;
    let usage = usage.unwrap_or(Usage::Display);
    let numeric = pic.category == PictureCategory::Numeric;

    if !numeric && usage != Usage::Display {
        return Err(invalid("binary and packed usages require a numeric picture".to_string()));
    }
    if entry.sign.is_some() && !(numeric && pic.signed && usage == Usage::Display) {
        return Err(invalid("SIGN clause requires a signed DISPLAY numeric picture".to_string()));
    }
    let check_digits = |max: u32| {
        if pic.digits > max {
            Err(SchemaError::DigitLimit {
                line,
                name: name.to_string(),
                digits: pic.digits,
                max,
            })
        } else {
            Ok(())
        }
    };

    let (kind, sign, length) = if !numeric {
        (DataKind::Text, SignConvention::Unsigned, pic.display_length)
    } else {
        let signed_or = |signed: SignConvention| {
            if pic.signed {
                signed
            } else {
                SignConvention::Unsigned
            }
        };
        match usage {
            Usage::Display => {
                check_digits(MAX_DECIMAL_DIGITS)?;
                let (sign, extra) = match entry.sign {
                    None
                    | Some(SignClause {
                        leading: false,
                        separate: false,
                    }) => (signed_or(SignConvention::TrailingOverpunch), 0),
                    Some(SignClause {
                        leading: true,
                        separate: false,
                    }) => (SignConvention::LeadingOverpunch, 0),
                    Some(SignClause {
                        leading: false,
                        separate: true,
                    }) => (SignConvention::TrailingSeparate, 1),
                    Some(SignClause {
                        leading: true,
                        separate: true,
                    }) => (SignConvention::LeadingSeparate, 1),
                };
                (DataKind::Zoned, sign, pic.display_length + extra)
            }
            Usage::Packed => {
                check_digits(MAX_DECIMAL_DIGITS)?;
                (
                    DataKind::Packed,
                    signed_or(SignConvention::Signed),
                    (pic.digits as usize + 2) / 2,
                )
            }
            Usage::Binary | Usage::NativeBinary => {
                check_digits(MAX_BINARY_DIGITS)?;
                let length = match pic.digits {
                    0..=4 => 2,
                    5..=9 => 4,
                    _ => 8,
                };
                let kind = if usage == Usage::Binary {
                    DataKind::Binary
                } else {
                    DataKind::NativeBinary
                };
                (kind, signed_or(SignConvention::Signed), length)
            }
        }
    };

    let field = if entry.name.is_none() {
        ElementaryField {
            kind: DataKind::Filler,
            sign: SignConvention::Unsigned,
            digits: 0,
            scale: 0,
            picture: Some(picture.clone()),
        }
    } else if numeric {
        ElementaryField {
            kind,
            sign,
            digits: pic.digits,
            scale: pic.scale,
            picture: Some(picture.clone()),
        }
    } else {
        ElementaryField {
            kind,
            sign,
            digits: 0,
            scale: 0,
            picture: Some(picture.clone()),
        }
    };
    Ok((field, length))
}

fn flatten(
    items: &[LayoutItem],
    prefix: &str,
    delta: usize,
    subscripts: &[u32],
    redefines: Option<&str>,
    out: &mut Vec<FieldSpec>,
) {
    for item in items {
        let redefines = item.redefines.as_deref().or(redefines);
        let repeated = item.occurs.as_ref().map(|o| o.max);
        for i in 0..repeated.unwrap_or(1) {
            let mut subs = subscripts.to_vec();
            let segment = if repeated.is_some() {
                subs.push(i + 1);
                format!("{}({})", item.name, i + 1)
            } else {
                item.name.clone()
            };
            let path = if prefix.is_empty() {
                segment
            } else {
                format!("{prefix}.{segment}")
            };
            let occurrence_delta = delta + i as usize * item.length;
            match &item.node {
                ItemNode::Field(field) => out.push(FieldSpec {
                    name: item.name.clone(),
                    path,
                    offset: item.offset + occurrence_delta,
                    length: item.length,
                    field: field.clone(),
                    subscripts: subs,
                    redefines: redefines.map(str::to_string),
                }),
                ItemNode::Group(children) => {
                    flatten(children, &path, occurrence_delta, &subs, redefines, out)
                }
            }
        }
    }
}

fn resolve_depending_on(
    site: &DependingSite,
    fields: &[FieldSpec],
    record_length: usize,
) -> Result<DependingOn, SchemaError> {
    if site.in_redefines || site.end != record_length {
        return Err(SchemaError::Occurs {
            line: site.line,
            name: site.name.clone(),
            reason: "OCCURS DEPENDING ON must be the last storage item of the record".to_string(),
        });
    }
    let err = |reason: &str| SchemaError::DependingOn {
        line: site.line,
        name: site.name.clone(),
        target: site.target.clone(),
        reason: reason.to_string(),
    };
    let candidates: Vec<(usize, &FieldSpec)> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name == site.target || crate::layout::base_path(&f.path) == site.target)
        .collect();
    let (index, field) = match candidates.as_slice() {
        [] => return Err(err("count field is not declared")),
        list if list.iter().any(|(_, f)| !f.subscripts.is_empty()) => {
            return Err(err("count field may not be inside an OCCURS"))
        }
        [one] => *one,
        _ => return Err(err("count field name is ambiguous; qualify it with its path")),
    };
    if !field.field.kind.is_numeric() || field.field.scale != 0 {
        return Err(err("count field must be an integer numeric item"));
    }
    if field.offset + field.length > site.offset {
        return Err(err("count field must be declared before the table"));
    }
    Ok(DependingOn {
        field_path: field.path.clone(),
        field_index: index,
    })
}

fn patch_depending_on(items: &mut [LayoutItem], resolved: &DependingOn) -> bool {
    for item in items {
        if let Some(dep) = item.occurs.as_mut().and_then(|o| o.depending_on.as_mut()) {
            *dep = resolved.clone();
            return true;
        }
        if let ItemNode::Group(children) = &mut item.node {
            if patch_depending_on(children, resolved) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SourceFormat;

    fn compile(text: &str) -> Result<RecordLayout, SchemaError> {
        compile_schema(text, &SchemaOptions::default())
    }

    const ACCOUNT: &str = r#"
        01  ACCOUNT-REC.
            05  ACCT-ID        PIC X(12).
            05  ACCT-NAME      PIC X(20).
            05  BALANCE        PIC S9(7)V99 COMP-3.
            05  OPEN-YEAR      PIC 9(4).
            05  BRANCH         PIC S9(4) COMP.
            05  FILLER         PIC X(4).
    "#;

    #[test]
    fn account_layout_is_47_bytes() {
        let layout = compile(ACCOUNT).unwrap();
        assert_eq!(layout.record_name, "ACCOUNT-REC");
        assert_eq!(layout.length, 47);
        let paths: Vec<(&str, usize, usize)> = layout
            .fields
            .iter()
            .map(|f| (f.path.as_str(), f.offset, f.length))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("ACCT-ID", 0, 12),
                ("ACCT-NAME", 12, 20),
                ("BALANCE", 32, 5),
                ("OPEN-YEAR", 37, 4),
                ("BRANCH", 41, 2),
                ("FILLER#1", 43, 4),
            ]
        );
        let balance = layout.field("BALANCE").unwrap();
        assert_eq!(balance.field.kind, DataKind::Packed);
        assert_eq!(balance.field.sign, SignConvention::Signed);
        assert_eq!((balance.field.digits, balance.field.scale), (9, 2));
        assert_eq!(layout.field("FILLER#1").unwrap().field.kind, DataKind::Filler);
    }

    #[test]
    fn top_level_lengths_sum_to_record_length() {
        let layout = compile(ACCOUNT).unwrap();
        let sum: usize = layout
            .items
            .iter()
            .filter(|i| i.redefines.is_none())
            .map(LayoutItem::total_length)
            .sum();
        assert_eq!(sum, layout.length);
    }

    #[test]
    fn fingerprint_is_deterministic_and_layout_sensitive() {
        let a = compile(ACCOUNT).unwrap();
        let b = compile(ACCOUNT).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a, b);
        let changed = compile(&ACCOUNT.replace("X(20)", "X(21)")).unwrap();
        assert_ne!(a.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn nested_groups_and_occurs_expand_paths() {
        let layout = compile(
            "01 ORDER.
               05 HEADER.
                  10 ORDER-NO PIC 9(6).
               05 LINES OCCURS 2 TIMES.
                  10 SKU    PIC X(3).
                  10 QTY    PIC 9(2).",
        )
        .unwrap();
        assert_eq!(layout.length, 16);
        let paths: Vec<(&str, usize)> = layout.fields.iter().map(|f| (f.path.as_str(), f.offset)).collect();
        assert_eq!(
            paths,
            vec![
                ("HEADER.ORDER-NO", 0),
                ("LINES(1).SKU", 6),
                ("LINES(1).QTY", 9),
                ("LINES(2).SKU", 11),
                ("LINES(2).QTY", 14),
            ]
        );
        assert_eq!(layout.field("LINES(2).QTY").unwrap().subscripts, vec![2]);
        assert_eq!(layout.fields_with_base_path("LINES.QTY").count(), 2);
    }

    #[test]
    fn redefines_shares_offset_and_does_not_advance() {
        let layout = compile(
            "01 REC.
               05 RAW-DATE PIC X(8).
               05 DATE-PARTS REDEFINES RAW-DATE.
                  10 YYYY PIC 9(4).
                  10 MMDD PIC 9(4).
               05 TAIL PIC X(2).",
        )
        .unwrap();
        assert_eq!(layout.length, 10);
        assert_eq!(layout.field("DATE-PARTS.MMDD").unwrap().offset, 4);
        assert_eq!(
            layout.field("DATE-PARTS.YYYY").unwrap().redefines.as_deref(),
            Some("RAW-DATE")
        );
        assert_eq!(layout.field("TAIL").unwrap().offset, 8);
    }

    #[test]
    fn redefines_errors() {
        let longer = compile("01 R. 05 A PIC X(2). 05 B REDEFINES A PIC X(3).");
        assert!(matches!(longer, Err(SchemaError::RedefinesTooLong { .. })));
        let forward = compile("01 R. 05 B REDEFINES A PIC X(2). 05 A PIC X(2).");
        assert!(matches!(forward, Err(SchemaError::RedefinesTarget { .. })));
        let non_adjacent = compile("01 R. 05 A PIC X(2). 05 C PIC X. 05 B REDEFINES A PIC X(2).");
        assert!(matches!(non_adjacent, Err(SchemaError::RedefinesTarget { .. })));
        let chained = compile("01 R. 05 A PIC X(2). 05 B REDEFINES A PIC 99. 05 C REDEFINES A PIC X.");
        assert!(chained.is_ok());
    }

    #[test]
    fn storage_lengths_by_usage() {
        let layout = compile(
            "01 R.
               05 P1 PIC S9(4) COMP-3.
               05 P2 PIC 9(5) PACKED-DECIMAL.
               05 B1 PIC 9(4) BINARY.
               05 B2 PIC S9(9) COMP-4.
               05 B3 PIC 9(18) COMP-5.
               05 Z1 PIC S9(3) SIGN LEADING SEPARATE.
               05 T1 PIC ZZ9.99.",
        )
        .unwrap();
        let lens: Vec<usize> = layout.fields.iter().map(|f| f.length).collect();
        assert_eq!(lens, vec![3, 3, 2, 4, 8, 4, 6]);
        assert_eq!(layout.field("P2").unwrap().field.sign, SignConvention::Unsigned);
        assert_eq!(layout.field("B3").unwrap().field.kind, DataKind::NativeBinary);
        assert_eq!(layout.field("Z1").unwrap().field.sign, SignConvention::LeadingSeparate);
        assert_eq!(layout.field("T1").unwrap().field.kind, DataKind::Text);
    }

    #[test]
    fn group_usage_is_inherited() {
        let layout = compile(
            "01 R.
               05 AMOUNTS COMP-3.
                  10 A1 PIC S9(3).
                  10 A2 PIC S9(5).",
        )
        .unwrap();
        assert!(layout.fields.iter().all(|f| f.field.kind == DataKind::Packed));
        assert_eq!(layout.length, 5);
    }

    #[test]
    fn digit_limits() {
        assert!(matches!(
            compile("01 R. 05 A PIC 9(19) COMP."),
            Err(SchemaError::DigitLimit { max: 18, .. })
        ));
        assert!(matches!(
            compile("01 R. 05 A PIC 9(32) COMP-3."),
            Err(SchemaError::DigitLimit { max: 31, .. })
        ));
        assert!(compile("01 R. 05 A PIC S9(31) COMP-3.").is_ok());
    }

    #[test]
    fn level_structure_errors() {
        assert!(matches!(
            compile("01 R. 05 A PIC X. 10 B PIC X."),
            Err(SchemaError::InvalidLevel { .. })
        ));
        assert!(matches!(
            compile("01 R. 05 A. 10 B PIC X. 07 C PIC X."),
            Err(SchemaError::InvalidLevel { .. })
        ));
        assert!(matches!(
            compile("01 R. 05 A. 05 B PIC X."),
            Err(SchemaError::InvalidPicture { .. })
        ));
    }

    #[test]
    fn duplicate_sibling_names_rejected_but_fillers_numbered() {
        assert!(matches!(
            compile("01 R. 05 A PIC X. 05 A PIC X."),
            Err(SchemaError::DuplicateName { .. })
        ));
        let layout = compile("01 R. 05 FILLER PIC X. 05 A PIC X. 05 FILLER PIC XX.").unwrap();
        let names: Vec<&str> = layout.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["FILLER#1", "A", "FILLER#2"]);
    }

    #[test]
    fn empty_and_oversized_copybooks() {
        assert!(matches!(compile("   \n* only a comment\n"), Err(SchemaError::Empty)));
        let options = SchemaOptions {
            max_record_length: 10,
            ..SchemaOptions::default()
        };
        assert!(matches!(
            compile_schema("01 R. 05 A PIC X(11).", &options),
            Err(SchemaError::RecordTooLong { length: 11, max: 10 })
        ));
        assert!(matches!(
            compile("01 R. 05 T OCCURS 9999 TIMES. 10 U OCCURS 9999 TIMES PIC X(100)."),
            Err(SchemaError::RecordTooLong { .. })
        ));
    }

    #[test]
    fn record_selection() {
        let two = "01 A-REC. 05 X PIC X. 01 B-REC. 05 Y PIC XX.";
        assert!(matches!(compile(two), Err(SchemaError::MultipleRecords { .. })));
        let options = SchemaOptions {
            record_name: Some("b-rec".into()),
            ..SchemaOptions::default()
        };
        let layout = compile_schema(two, &options).unwrap();
        assert_eq!(layout.record_name, "B-REC");
        assert_eq!(layout.length, 2);

        let implicit = compile("05 X PIC X(3). 05 Y PIC 9.").unwrap();
        assert_eq!(implicit.record_name, "RECORD");
        assert_eq!(implicit.length, 4);
    }

    #[test]
    fn occurs_depending_on_resolves_count_field() {
        let layout = compile(
            "01 R.
               05 N-ITEMS PIC 9(2).
               05 ITEMS OCCURS 1 TO 3 TIMES DEPENDING ON N-ITEMS.
                  10 CODE PIC X(2).",
        )
        .unwrap();
        assert_eq!(layout.length, 8);
        let item = layout.depending_item().unwrap();
        let occurs = item.occurs.as_ref().unwrap();
        assert_eq!((occurs.min, occurs.max), (1, 3));
        let dep = occurs.depending_on.as_ref().unwrap();
        assert_eq!(dep.field_path, "N-ITEMS");
        assert_eq!(layout.fields[dep.field_index].path, "N-ITEMS");
    }

    #[test]
    fn occurs_depending_on_errors() {
        let not_last = compile(
            "01 R. 05 N PIC 9. 05 T OCCURS 1 TO 3 DEPENDING ON N PIC X. 05 AFTER PIC X.",
        );
        assert!(matches!(not_last, Err(SchemaError::Occurs { .. })));
        let undeclared = compile("01 R. 05 T OCCURS 1 TO 3 DEPENDING ON MISSING PIC X.");
        assert!(matches!(undeclared, Err(SchemaError::DependingOn { .. })));
        let later = compile("01 R. 05 G. 10 T OCCURS 1 TO 3 DEPENDING ON N PIC X. 05 N PIC 9.");
        assert!(later.is_err());
        let text_count = compile("01 R. 05 N PIC X. 05 T OCCURS 1 TO 3 DEPENDING ON N PIC X.");
        assert!(matches!(text_count, Err(SchemaError::DependingOn { .. })));
        let nested = compile(
            "01 R. 05 N PIC 9. 05 O OCCURS 2. 10 T OCCURS 1 TO 3 DEPENDING ON N PIC X.",
        );
        assert!(matches!(nested, Err(SchemaError::Occurs { .. })));
        let no_depending = compile("01 R. 05 T OCCURS 1 TO 3 PIC X.");
        assert!(matches!(no_depending, Err(SchemaError::Occurs { .. })));
    }

    #[test]
    fn fixed_format_source() {
        let text = concat!(
            "000100 01  REC.\n",
            "000200*    a comment\n",
            "000300     05  CODE  PIC X(3).                                          IGNORED1\n",
        );
        let options = SchemaOptions {
            source_format: SourceFormat::Fixed,
            ..SchemaOptions::default()
        };
        let layout = compile_schema(text, &options).unwrap();
        assert_eq!(layout.length, 3);
    }

    #[test]
    fn level_88_and_77() {
        let layout = compile("77 COUNTER PIC 9(3). 77 FLAG PIC X. 88 ON VALUE 'Y'.").unwrap();
        assert_eq!(layout.length, 4);
        assert_eq!(layout.fields.len(), 2);
    }
}
