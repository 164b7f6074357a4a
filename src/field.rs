//! Field descriptors and the placement tag parser.
//!
//! Placement tags use comma-separated `key=value` pairs:
//! ```text
//! record=1,start=2,end=6,literal=LOREM
//! start=0,end=7,time=%m%d%Y
//! ```
//!
//! - `record` - 1-based sub-record (line) index, default 1, at most
//!   `MAX_RECORDS`
//! - `start` - 0-based inclusive byte offset, required
//! - `end` - 0-based inclusive byte offset, defaults to `start`, below
//!   `MAX_LINE_WIDTH`
//! - `literal` - fixed text always read and written for the field
//! - `time` - chrono strftime pattern for timestamp fields

use std::ops::RangeInclusive;

use chrono::format::{Item, StrftimeItems};

use crate::coerce::FieldValue;
use crate::error::{FixedWidthError, Result};

/// Longest line a layout may describe, in bytes.
pub const MAX_LINE_WIDTH: usize = 1 << 20;

/// Highest sub-record index a layout may use.
pub const MAX_RECORDS: usize = 1024;

/// How a field's text is converted to and from a typed value.
///
/// Resolved once from the declared Rust type when the layout is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Unsigned,
    Float,
    Boolean,
    Timestamp,
    /// Types implementing `Scan` and `Symbol`.
    Custom,
}

/// A declared field: its name, raw placement tag and value kind.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub tag: String,
    pub kind: ValueKind,
    pub optional: bool,
}

impl FieldSpec {
    /// Declare a field whose kind comes from its Rust type.
    pub fn of<V: FieldValue>(name: &str, tag: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            kind: V::KIND,
            optional: V::OPTIONAL,
        }
    }

    /// Declare a plain text field (used by runtime schemas).
    pub fn text(name: &str, tag: &str) -> Self {
        Self::of::<String>(name, tag)
    }
}

/// Placement of one field within a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// 1-based sub-record index.
    pub record: usize,
    /// Inclusive start byte offset.
    pub start: usize,
    /// Inclusive end byte offset, never less than `start`.
    pub end: usize,
    pub literal: Option<String>,
    pub time_format: Option<String>,
    pub kind: ValueKind,
    pub optional: bool,
}

impl Field {
    /// Parse a declared field's placement tag, applying defaults.
    pub fn parse(spec: &FieldSpec) -> Result<Self> {
        let name = spec.name.as_str();
        let mut record = None;
        let mut start = None;
        let mut end = None;
        let mut literal = None;
        let mut time_format = None;

        for pair in spec.tag.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let Some((key, value)) = pair.split_once('=') else {
                return Err(FixedWidthError::layout(
                    name,
                    format!("expected key=value, found '{pair}'"),
                ));
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "record" => record = Some(parse_offset(name, "record", value)?),
                "start" => start = Some(parse_offset(name, "start", value)?),
                "end" => end = Some(parse_offset(name, "end", value)?),
                "literal" => literal = Some(value.to_string()).filter(|s| !s.is_empty()),
                "time" => time_format = Some(parse_time_format(name, value)?),
                other => {
                    return Err(FixedWidthError::layout(
                        name,
                        format!("unknown placement key '{other}'"),
                    ));
                }
            }
        }

        let start = start.ok_or_else(|| FixedWidthError::layout(name, "missing start offset"))?;
        // Record is optional when the type has a single sub-record.
        let record = record.filter(|&r| r > 0).unwrap_or(1);
        // End is optional for 1-byte fields.
        let end = end.filter(|&e| e >= start).unwrap_or(start);

        if record > MAX_RECORDS {
            return Err(FixedWidthError::layout(
                name,
                format!("record {record} exceeds the limit of {MAX_RECORDS} sub-records"),
            ));
        }
        if end >= MAX_LINE_WIDTH {
            return Err(FixedWidthError::layout(
                name,
                format!("offset {end} exceeds the {MAX_LINE_WIDTH}-byte line limit"),
            ));
        }

        Ok(Self {
            name: spec.name.clone(),
            record,
            start,
            end,
            literal,
            time_format,
            kind: spec.kind,
            optional: spec.optional,
        })
    }

    /// Number of bytes the field occupies.
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }

    /// Byte range of the field within its line.
    pub fn range(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

fn parse_offset(field: &str, key: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        FixedWidthError::layout(field, format!("invalid {key} offset '{value}'"))
    })
}

fn parse_time_format(field: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(FixedWidthError::layout(field, "empty time format"));
    }
    if StrftimeItems::new(value).any(|item| matches!(item, Item::Error)) {
        return Err(FixedWidthError::layout(
            field,
            format!("invalid time format '{value}'"),
        ));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tag: &str) -> Result<Field> {
        Field::parse(&FieldSpec::text("Foo", tag))
    }

    #[test]
    fn test_parse_full_tag() {
        let field = parse("record=2,start=2,end=6,literal=LOREM").unwrap();
        assert_eq!(field.record, 2);
        assert_eq!(field.start, 2);
        assert_eq!(field.end, 6);
        assert_eq!(field.width(), 5);
        assert_eq!(field.literal.as_deref(), Some("LOREM"));
        assert_eq!(field.kind, ValueKind::Text);
        assert!(!field.optional);
    }

    #[test]
    fn test_parse_defaults() {
        let field = parse("start=7").unwrap();
        assert_eq!(field.record, 1);
        assert_eq!(field.end, 7);
        assert_eq!(field.width(), 1);
        assert_eq!(field.literal, None);
        assert_eq!(field.time_format, None);
    }

    #[test]
    fn test_record_zero_means_first() {
        assert_eq!(parse("record=0,start=1").unwrap().record, 1);
    }

    #[test]
    fn test_end_before_start_normalized() {
        let field = parse("start=5,end=2").unwrap();
        assert_eq!(field.range(), 5..=5);
    }

    #[test]
    fn test_keys_case_insensitive_and_spaced() {
        let field = parse(" Record = 3 , START=4, End=9 ").unwrap();
        assert_eq!((field.record, field.start, field.end), (3, 4, 9));
    }

    #[test]
    fn test_empty_literal_is_none() {
        assert_eq!(parse("start=0,literal=").unwrap().literal, None);
    }

    #[test]
    fn test_time_format() {
        let field = parse("start=0,end=7,time=%m%d%Y").unwrap();
        assert_eq!(field.time_format.as_deref(), Some("%m%d%Y"));
    }

    #[test]
    fn test_missing_start_is_error() {
        let err = parse("record=1,end=4").unwrap_err();
        assert!(matches!(err, FixedWidthError::Layout { ref field, .. } if field == "Foo"));
        assert!(err.to_string().contains("missing start"));
    }

    #[test]
    fn test_non_numeric_offset_is_error() {
        let err = parse("start=abc").unwrap_err();
        assert!(err.to_string().contains("invalid start offset 'abc'"));
        assert!(parse("start=-1").is_err());
    }

    #[test]
    fn test_offsets_beyond_line_limit_are_errors() {
        let err = parse("start=18446744073709551615").unwrap_err();
        assert!(matches!(err, FixedWidthError::Layout { .. }));
        assert!(err.to_string().contains("line limit"));
        assert!(parse("start=0,end=18446744073709551615").is_err());
        assert!(parse(&format!("start={MAX_LINE_WIDTH}")).is_err());

        let field = parse(&format!("start={}", MAX_LINE_WIDTH - 1)).unwrap();
        assert_eq!(field.end + 1, MAX_LINE_WIDTH);
    }

    #[test]
    fn test_record_beyond_limit_is_error() {
        let err = parse("record=18446744073709551615,start=0").unwrap_err();
        assert!(err.to_string().contains("sub-records"));
        assert_eq!(parse(&format!("record={MAX_RECORDS},start=0")).unwrap().record, MAX_RECORDS);
    }

    #[test]
    fn test_unknown_key_is_error() {
        let err = parse("start=0,width=3").unwrap_err();
        assert!(err.to_string().contains("unknown placement key 'width'"));
    }

    #[test]
    fn test_bare_word_is_error() {
        assert!(parse("start=0,optional").is_err());
    }

    #[test]
    fn test_invalid_time_format_is_error() {
        let err = parse("start=0,time=%Y%m%").unwrap_err();
        assert!(err.to_string().contains("invalid time format"));
    }

    #[test]
    fn test_field_spec_kind_from_type() {
        let spec = FieldSpec::of::<Option<u32>>("Count", "start=0,end=3");
        assert_eq!(spec.kind, ValueKind::Unsigned);
        assert!(spec.optional);
        let field = Field::parse(&spec).unwrap();
        assert!(field.optional);
        assert_eq!(field.kind, ValueKind::Unsigned);
    }
}
