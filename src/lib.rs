//! # fixedwidth-rs
//!
//! Conversion between fixed-width text records and typed Rust structs.
//!
//! Fixed-width files place every field at a known byte range instead of
//! separating fields with delimiters, the way mainframe and banking
//! interchange formats still do. A record may span several physical lines
//! (sub-records).
//!
//! ## Overview
//!
//! - **Layouts**: built once per record type from per-field placement tags
//!   and cached process-wide
//! - **Field codec**: slices trimmed field text out of lines, or writes it
//!   back with space padding and width clipping
//! - **Coercion**: integers (zero-padded), booleans, timestamps with
//!   per-field formats, optional values and custom scan/symbol types
//! - **Transactions**: bind a layout to line buffers for one conversion
//! - **Padding**: `pad_right` is what the encoder uses; `pad_left` is for
//!   callers zero-filling numeric text before handing it to the encoder
//!
//! ## Example
//!
//! ```
//! use fixedwidth_rs::{decode, encode, fixed_width};
//!
//! fixed_width! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Employee {
//!         pub last: String => "start=0,end=7",
//!         pub first: String => "start=8,end=17",
//!         pub salary: u32 => "start=18,end=25",
//!     }
//! }
//!
//! let employee: Employee = decode(&["SMITH   JOHN      00050000"]).unwrap();
//! assert_eq!(employee.last, "SMITH");
//! assert_eq!(employee.salary, 50_000);
//!
//! let lines = encode(&employee).unwrap();
//! assert_eq!(lines[0], b"SMITH   JOHN      50000   ");
//! ```

pub mod codec;
pub mod coerce;
pub mod convert;
pub mod error;
pub mod field;
pub mod layout;
pub mod pad;
pub mod record;
pub mod schema;
pub mod transaction;

pub use codec::{FieldMap, Truncation, get_fields, set_fields};
pub use coerce::{DecodeHook, FieldValue, Scan, Symbol, Value};
pub use convert::{decode_document, encode_document};
pub use error::{FixedWidthError, Result};
pub use field::{Field, FieldSpec, MAX_LINE_WIDTH, MAX_RECORDS, ValueKind};
pub use layout::{Layout, LayoutCache, Position};
pub use pad::{SPACE, pad_left, pad_right};
pub use record::{FieldReader, FixedWidth};
pub use schema::{Schema, SchemaField};
pub use transaction::{Transaction, decode, encode};
