//! Whole-document conversion between fixed-width text and JSON Lines.
//!
//! Each record spans `layout.record_count()` consecutive lines. Decoding
//! emits one JSON object of field text per record; encoding reads one JSON
//! object per line and writes that record's lines.

use tracing::debug;

use crate::codec::{self, Truncation};
use crate::error::Result;
use crate::layout::Layout;

/// Decode fixed-width text into JSON Lines.
///
/// Returns (output_text, record_count).
pub fn decode_document(layout: &Layout, input: &str) -> Result<(String, usize)> {
    let lines: Vec<&str> = input.lines().collect();
    let per_record = layout.record_count().max(1);

    let mut output = Vec::new();
    for chunk in lines.chunks(per_record) {
        let fields = codec::get_fields(layout, chunk);
        output.push(serde_json::to_string(&fields)?);
    }

    debug!(lines = lines.len(), records = output.len(), "decoded document");
    let count = output.len();
    Ok((output.join("\n"), count))
}

/// Encode JSON Lines into fixed-width text.
///
/// Strings are written as-is, `null` as empty, other JSON values as their
/// JSON text. Blank input lines are skipped.
/// Returns (output_text, record_count).
pub fn encode_document(
    layout: &Layout,
    input: &str,
    truncation: Truncation,
) -> Result<(String, usize)> {
    let mut output = Vec::new();
    let mut count = 0;

    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(line)?;
        let fields = object.into_iter().map(|(name, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (name, text)
        });

        let mut records = Vec::new();
        codec::set_fields(layout, &mut records, fields, truncation)?;
        output.extend(
            records
                .iter()
                .map(|record| String::from_utf8_lossy(record).into_owned()),
        );
        count += 1;
    }

    debug!(records = count, lines = output.len(), "encoded document");
    Ok((output.join("\n"), count))
}
