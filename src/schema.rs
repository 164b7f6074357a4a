//! Runtime schemas for record types known only at run time.
//!
//! Schema files are JSON documents listing text fields with their
//! placement tags:
//! ```json
//! {
//!   "fields": [
//!     {"name": "last", "tag": "start=0,end=7"},
//!     {"name": "first", "tag": "start=8,end=17"}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::Layout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the layout described by this schema. Every field is text.
    pub fn layout(&self) -> Result<Layout> {
        Layout::from_tags(self.fields.iter().map(|f| (&f.name, &f.tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixedWidthError;
    use crate::field::ValueKind;

    #[test]
    fn test_schema_layout() {
        let schema = Schema::from_json(
            r#"{"fields": [
                {"name": "last", "tag": "start=0,end=7"},
                {"name": "dept", "tag": "record=2,start=0,end=9"}
            ]}"#,
        )
        .unwrap();
        let layout = schema.layout().unwrap();
        assert_eq!(layout.record_count(), 2);
        assert_eq!(layout.field("dept").unwrap().record, 2);
        assert!(layout.fields().all(|f| f.kind == ValueKind::Text));
    }

    #[test]
    fn test_schema_bad_json() {
        let err = Schema::from_json(r#"{"fields": [{"name": "last"}]}"#).unwrap_err();
        assert!(matches!(err, FixedWidthError::Json(_)));
    }

    #[test]
    fn test_schema_bad_tag() {
        let schema = Schema {
            fields: vec![SchemaField {
                name: "last".to_string(),
                tag: "end=7".to_string(),
            }],
        };
        assert!(matches!(schema.layout(), Err(FixedWidthError::Layout { .. })));
    }
}
