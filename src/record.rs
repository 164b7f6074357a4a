//! Record types: the `FixedWidth` trait and the `fixed_width!` macro.
//!
//! A record type declares its fields once, with a placement tag per field.
//! The layout is built from that declaration; no runtime introspection is
//! involved.
//!
//! ```
//! use fixedwidth_rs::{decode, encode, fixed_width};
//!
//! fixed_width! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Header {
//!         pub foo: String => "record=1,start=0,end=0",
//!         pub lorem: String => "record=1,start=2,end=6,literal=LOREM",
//!         pub bar: bool => "record=1,start=7,end=7",
//!         pub note: String,
//!     }
//! }
//!
//! let header = Header { foo: "Y".into(), bar: true, ..Default::default() };
//! let lines = encode(&header).unwrap();
//! assert_eq!(lines[0], b"Y LOREM1");
//!
//! let decoded: Header = decode(&lines).unwrap();
//! assert_eq!(decoded.lorem, "LOREM");
//! assert!(decoded.bar);
//! ```

use crate::codec::FieldMap;
use crate::coerce::{self, DecodeHook, FieldValue, Value};
use crate::error::{FixedWidthError, Result};
use crate::field::FieldSpec;
use crate::layout::Layout;

/// A record type with a fixed-width representation.
pub trait FixedWidth: Sized + 'static {
    /// Declared fields with their placement tags.
    fn schema() -> Vec<FieldSpec>;

    /// Typed values of every placed field.
    fn to_fields(&self) -> Vec<(&'static str, Value)>;

    /// Build a record from decoded field text.
    fn from_fields(fields: &FieldReader<'_>) -> Result<Self>;
}

/// Typed access to the decoded field text of one record.
pub struct FieldReader<'a> {
    layout: &'a Layout,
    fields: &'a FieldMap,
    hook: Option<&'a DecodeHook>,
}

impl<'a> FieldReader<'a> {
    pub fn new(layout: &'a Layout, fields: &'a FieldMap, hook: Option<&'a DecodeHook>) -> Self {
        Self {
            layout,
            fields,
            hook,
        }
    }

    /// Decode field `name` as `V`.
    ///
    /// A field absent from the decoded text (its line is missing or too
    /// short) yields `V::default()`.
    pub fn get<V: FieldValue>(&self, name: &str) -> Result<V> {
        let field = self
            .layout
            .field(name)
            .ok_or_else(|| FixedWidthError::UnknownField(name.to_string()))?;

        let Some(raw) = self.fields.get(name) else {
            return Ok(V::default());
        };

        let value = coerce::decode(raw, field, self.hook)?;
        V::from_value(value).map_err(|reason| FixedWidthError::coercion(name, reason))
    }

    /// Decoded text of field `name`, if present.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Declare a struct and implement `FixedWidth` for it.
///
/// Fields followed by `=> "tag"` are placed in the fixed-width layout; the
/// rest are ignored on encode and set to `Default::default()` on decode.
/// Field names in the layout are the Rust field names.
#[macro_export]
macro_rules! fixed_width {
    (@spec $specs:ident, $field:ident, $ty:ty, $tag:literal) => {
        $specs.push($crate::FieldSpec::of::<$ty>(stringify!($field), $tag));
    };
    (@spec $specs:ident, $field:ident, $ty:ty) => {};

    (@encode $values:ident, $value:expr, $field:ident, $tag:literal) => {
        $values.push((stringify!($field), $crate::FieldValue::to_value($value)));
    };
    (@encode $values:ident, $value:expr, $field:ident) => {};

    (@decode $fields:ident, $field:ident, $ty:ty, $tag:literal) => {
        $fields.get::<$ty>(stringify!($field))?
    };
    (@decode $fields:ident, $field:ident, $ty:ty) => {
        <$ty as ::std::default::Default>::default()
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::FixedWidth for $name {
            fn schema() -> ::std::vec::Vec<$crate::FieldSpec> {
                #[allow(unused_mut)]
                let mut specs = ::std::vec::Vec::new();
                $( $crate::fixed_width!(@spec specs, $field, $ty $(, $tag)?); )*
                specs
            }

            fn to_fields(&self) -> ::std::vec::Vec<(&'static str, $crate::Value)> {
                #[allow(unused_mut)]
                let mut values = ::std::vec::Vec::new();
                $( $crate::fixed_width!(@encode values, &self.$field, $field $(, $tag)?); )*
                values
            }

            fn from_fields(fields: &$crate::FieldReader<'_>) -> $crate::Result<Self> {
                let _ = fields;
                Ok(Self {
                    $( $field: $crate::fixed_width!(@decode fields, $field, $ty $(, $tag)?), )*
                })
            }
        }
    };
}
