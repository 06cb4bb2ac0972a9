//! Single-record decoding against a compiled layout.
//!
//! The item tree is walked in declaration order. Group items become
//! `Group` values, OCCURS items become `Array` values, FILLER becomes `Raw`.
//! For an OCCURS DEPENDING ON item the count field is decoded first and only
//! the active occurrences are produced; the unused tail is emitted as
//! `<name>#SLACK` when FILLER is included.

use pop_core::{FieldValue, ScaledDecimal};
use pop_schema::{DataKind, DependingOn, ElementaryField, ItemNode, LayoutItem, Occurs, RecordLayout};

use crate::binary::decode_binary;
use crate::canonical::CanonicalRecord;
use crate::error::{DecodeError, DecodeErrorKind};
use crate::options::{BinaryRange, DecodeOptions, RedefinesPolicy};
use crate::packed::decode_packed;
use crate::text::decode_text;
use crate::zoned::decode_zoned;

/// Decode one record's bytes. `bytes` must be exactly `layout.length` long.
pub fn decode_record(
    layout: &RecordLayout,
    bytes: &[u8],
    index: u64,
    options: &DecodeOptions,
) -> Result<CanonicalRecord, DecodeError> {
    if bytes.len() != layout.length {
        return Err(DecodeError {
            record_index: index,
            field_path: String::new(),
            kind: DecodeErrorKind::TruncatedRecord {
                expected: layout.length,
                actual: bytes.len(),
            },
        });
    }
    let decoder = RecordDecoder {
        layout,
        bytes,
        index,
        record_start: index.saturating_mul(layout.length as u64),
        options,
    };
    let mut fields = Vec::with_capacity(layout.items.len());
    decoder.decode_items(&layout.items, 0, "", &mut fields)?;
    Ok(CanonicalRecord { index, fields })
}

struct RecordDecoder<'a> {
    layout: &'a RecordLayout,
    bytes: &'a [u8],
    index: u64,
    record_start: u64,
    options: &'a DecodeOptions,
}

impl RecordDecoder<'_> {
    fn error(&self, path: &str, kind: DecodeErrorKind) -> DecodeError {
        DecodeError {
            record_index: self.index,
            field_path: path.to_string(),
            kind,
        }
    }

    fn slice(&self, offset: usize, length: usize, path: &str) -> Result<&[u8], DecodeError> {
        offset
            .checked_add(length)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| {
                self.error(
                    path,
                    DecodeErrorKind::TruncatedRecord {
                        expected: offset.saturating_add(length),
                        actual: self.bytes.len(),
                    },
                )
            })
    }

    fn decode_items(
        &self,
        items: &[LayoutItem],
        delta: usize,
        prefix: &str,
        out: &mut Vec<(String, FieldValue)>,
    ) -> Result<(), DecodeError> {
        for item in items {
            if item.redefines.is_some() && self.options.redefines == RedefinesPolicy::First {
                continue;
            }
            let is_raw_filler = matches!(&item.node, ItemNode::Field(f) if f.kind == DataKind::Filler);
            if is_raw_filler && !self.options.include_filler {
                continue;
            }
            let path = if prefix.is_empty() {
                item.name.clone()
            } else {
                format!("{prefix}.{}", item.name)
            };
            match &item.occurs {
                None => {
                    let value = self.decode_occurrence(item, delta, &path)?;
                    out.push((item.name.clone(), value));
                }
                Some(occurs) => self.decode_table(item, occurs, delta, &path, out)?,
            }
        }
        Ok(())
    }

    fn decode_table(
        &self,
        item: &LayoutItem,
        occurs: &Occurs,
        delta: usize,
        path: &str,
        out: &mut Vec<(String, FieldValue)>,
    ) -> Result<(), DecodeError> {
        let count = match &occurs.depending_on {
            None => occurs.max as usize,
            Some(dep) => self.occurrence_count(dep, occurs, path)?,
        };
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            let occurrence = format!("{path}({})", i + 1);
            values.push(self.decode_occurrence(item, delta + i * item.length, &occurrence)?);
        }
        out.push((item.name.clone(), FieldValue::Array(values)));

        let max = occurs.max as usize;
        if count < max && self.options.include_filler {
            let start = item.offset + delta + count * item.length;
            let slack = self.slice(start, (max - count) * item.length, path)?;
            out.push((format!("{}#SLACK", item.name), FieldValue::Raw(slack.to_vec())));
        }
        Ok(())
    }

    fn occurrence_count(&self, dep: &DependingOn, occurs: &Occurs, path: &str) -> Result<usize, DecodeError> {
        let spec = self.layout.fields.get(dep.field_index).ok_or_else(|| {
            self.error(
                path,
                DecodeErrorKind::OccursBound {
                    count: -1,
                    min: occurs.min,
                    max: occurs.max,
                },
            )
        })?;
        let value = self.decode_field(&spec.field, spec.offset, spec.length, &spec.path)?;
        let count = value.as_scaled().map_or(-1, |d| d.scaled);
        if count < i128::from(occurs.min) || count > i128::from(occurs.max) {
            return Err(self.error(
                path,
                DecodeErrorKind::OccursBound {
                    count,
                    min: occurs.min,
                    max: occurs.max,
                },
            ));
        }
        Ok(count as usize)
    }

    fn decode_occurrence(&self, item: &LayoutItem, delta: usize, path: &str) -> Result<FieldValue, DecodeError> {
        match &item.node {
            ItemNode::Group(children) => {
                let mut fields = Vec::with_capacity(children.len());
                self.decode_items(children, delta, path, &mut fields)?;
                Ok(FieldValue::Group(fields))
            }
            ItemNode::Field(field) => self.decode_field(field, item.offset + delta, item.length, path),
        }
    }

    fn decode_field(
        &self,
        field: &ElementaryField,
        offset: usize,
        length: usize,
        path: &str,
    ) -> Result<FieldValue, DecodeError> {
        let bytes = self.slice(offset, length, path)?;
        let opts = self.options;
        let unscaled = match field.kind {
            DataKind::Filler => return Ok(FieldValue::Raw(bytes.to_vec())),
            DataKind::Text => {
                return decode_text(bytes, opts).map(FieldValue::Text).map_err(|bad| {
                    let record_offset = offset + bad.position;
                    self.error(
                        path,
                        DecodeErrorKind::Encoding {
                            byte: bad.byte,
                            record_offset,
                            stream_offset: self.record_start + record_offset as u64,
                        },
                    )
                })
            }
            DataKind::Zoned => decode_zoned(bytes, field.sign, opts),
            DataKind::Packed => decode_packed(bytes, field.digits, field.sign.is_signed(), opts),
            DataKind::Binary => {
                let limit = (opts.binary_range == BinaryRange::PicDigits).then_some(field.digits);
                decode_binary(bytes, field.sign.is_signed(), limit)
            }
            DataKind::NativeBinary => decode_binary(bytes, field.sign.is_signed(), None),
        }
        .map_err(|kind| self.error(path, kind))?;

        Ok(if field.scale == 0 {
            FieldValue::Integer(unscaled)
        } else {
            FieldValue::Decimal(ScaledDecimal::new(unscaled, field.scale))
        })
    }
}
