//! Field codec: reads field text out of line buffers and writes it back.
//!
//! Decoding trims ASCII whitespace around each field and truncates fields
//! that run past the end of a short line. Encoding pads lines with spaces
//! up to the end of each written field and clips values wider than their
//! field.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::error::{FixedWidthError, Result};
use crate::layout::Layout;
use crate::pad::{SPACE, pad_right};

/// Decoded field text keyed by field name.
pub type FieldMap = BTreeMap<String, String>;

/// What to do with a value wider than its field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Truncation {
    /// Keep the leading bytes that fit and drop the rest.
    #[default]
    Silent,
    /// Fail with `FixedWidthError::Overflow`.
    Reject,
}

/// Extract the text of every field whose line is present.
///
/// Line `i` feeds sub-record `i`; extra lines are ignored and missing
/// lines contribute nothing. A field whose first byte lies past the end of
/// its line is left out. Literal fields always read as their literal.
pub fn get_fields<R: AsRef<[u8]>>(layout: &Layout, records: &[R]) -> FieldMap {
    let mut fields = FieldMap::new();

    for (index, (line, sub_record)) in records.iter().zip(layout.records()).enumerate() {
        let line = line.as_ref();

        for field in sub_record {
            if let Some(literal) = &field.literal {
                fields.insert(field.name.clone(), literal.clone());
                continue;
            }

            // Line isn't long enough to even partially fill the field.
            if line.len() <= field.start {
                trace!(record = index + 1, field = %field.name, "field past end of line");
                continue;
            }

            let end = field.end.min(line.len() - 1);
            let raw = line[field.start..=end].trim_ascii();
            fields.insert(field.name.clone(), String::from_utf8_lossy(raw).into_owned());
        }
    }

    fields
}

/// Write field text into line buffers.
///
/// `records` grows to at least the layout's sub-record count. Lines are
/// space-padded up to each written field's end and never shortened.
/// Fields not supplied keep whatever bytes their range already holds.
pub fn set_fields<I, K, V>(
    layout: &Layout,
    records: &mut Vec<Vec<u8>>,
    fields: I,
    truncation: Truncation,
) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    if records.len() < layout.record_count() {
        records.resize_with(layout.record_count(), Vec::new);
    }

    for (name, value) in fields {
        let name = name.as_ref();
        let position = layout
            .position(name)
            .ok_or_else(|| FixedWidthError::UnknownField(name.to_string()))?;
        let field = &layout.records()[position.record][position.field];

        let supplied = value.as_ref();
        let text = field.literal.as_deref().unwrap_or(supplied).as_bytes();
        let width = field.width();
        if text.len() > width {
            match truncation {
                Truncation::Silent => {
                    debug!(field = %field.name, width, len = text.len(), "value truncated to field width");
                }
                Truncation::Reject => {
                    return Err(FixedWidthError::Overflow {
                        field: field.name.clone(),
                        width,
                        len: text.len(),
                    });
                }
            }
        }

        let line = &mut records[position.record];
        pad_right(line, field.end + 1, SPACE);

        let len = text.len().min(width);
        line[field.start..field.start + len].copy_from_slice(&text[..len]);
    }

    Ok(())
}
