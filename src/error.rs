//! Error type shared by layout building, the field codec and coercion.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FixedWidthError>;

/// Errors raised while building layouts or converting records.
///
/// None of these are retried internally. Missing data (short lines, unset
/// optional fields) is never an error; it decodes to absence or zero values.
#[derive(Debug, Error)]
pub enum FixedWidthError {
    /// Placement metadata for a field is missing or malformed.
    #[error("invalid layout for field '{field}': {reason}")]
    Layout { field: String, reason: String },

    /// A field name that is not part of the layout was read or written.
    #[error("field '{0}' does not exist in this layout")]
    UnknownField(String),

    /// A field value could not be converted to or from its declared type.
    #[error("cannot convert field '{field}': {reason}")]
    Coercion { field: String, reason: String },

    /// A value is wider than its field and the transaction rejects truncation.
    #[error("value for field '{field}' is {len} bytes, field width is {width}")]
    Overflow {
        field: String,
        width: usize,
        len: usize,
    },

    /// Decoding lines into a record failed.
    #[error("failed to decode {record_type}: {source}")]
    Decode {
        record_type: &'static str,
        #[source]
        source: Box<FixedWidthError>,
    },

    /// Encoding a record into lines failed.
    #[error("failed to encode {record_type}: {source}")]
    Encode {
        record_type: &'static str,
        #[source]
        source: Box<FixedWidthError>,
    },

    /// A runtime schema or JSON document could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixedWidthError {
    pub(crate) fn layout(field: &str, reason: impl Into<String>) -> Self {
        Self::Layout {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn coercion(field: &str, reason: impl Into<String>) -> Self {
        Self::Coercion {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// The innermost error, looking through `Decode` and `Encode` context.
    pub fn root(&self) -> &FixedWidthError {
        match self {
            Self::Decode { source, .. } | Self::Encode { source, .. } => source.root(),
            other => other,
        }
    }
}
