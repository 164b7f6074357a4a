//! Type coercion between field text and typed values.
//!
//! Decoding runs the optional caller hook first, then dispatches on the
//! field's `ValueKind`:
//! - empty text into an optional field is `Null`
//! - empty text into a timestamp is the zero timestamp (Unix epoch)
//! - integers have leading zeros stripped before parsing
//! - booleans use weak parsing (`1`/`t`/`true`, `0`/`f`/`false`, empty)
//! - custom types receive the raw text and scan it themselves
//!
//! Encoding renders `Null` as empty text, timestamps with the field's time
//! format (RFC 3339 by default), and booleans as `1`/`0`.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::error::{FixedWidthError, Result};
use crate::field::{Field, ValueKind};

/// Caller-supplied transform applied to a field's raw text before the
/// built-in decode rules. Returning `Err` fails the field's conversion.
///
/// The hook only rewrites text: its output still goes through the rules for
/// the field's `ValueKind`, so it cannot produce a typed value directly.
pub type DecodeHook = Arc<dyn Fn(&Field, &str) -> std::result::Result<String, String> + Send + Sync>;

/// A typed field value, the meeting point of the codec and record types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// UTC wall-clock time.
    Timestamp(NaiveDateTime),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Int(_) => "integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(ts) => f.write_str(&format_timestamp(ts, None)),
        }
    }
}

/// A Rust type that can occupy a fixed-width field.
///
/// `Default` is the value a field takes when its line is missing or too
/// short to reach it.
pub trait FieldValue: Default + Sized {
    /// Conversion rules applied to this type's text.
    const KIND: ValueKind;
    /// Whether empty text decodes to `Value::Null`.
    const OPTIONAL: bool = false;

    fn from_value(value: Value) -> std::result::Result<Self, String>;

    fn to_value(&self) -> Value;
}

/// Parse a custom type from its field text.
pub trait Scan: Sized {
    fn scan(raw: &str) -> std::result::Result<Self, String>;
}

/// Symbolic text written for a custom type, typically an enum code.
pub trait Symbol {
    fn symbol(&self) -> String;
}

/// Implement `FieldValue` for a type that implements `Scan`, `Symbol` and
/// `Default`.
///
/// Blank field text that `Scan` rejects decodes to `Default`, like a missing
/// field. Any other text `Scan` rejects is a coercion error for the field.
///
/// ```
/// use fixedwidth_rs::{Scan, Symbol, custom_field};
///
/// #[derive(Debug, Default, PartialEq)]
/// enum Status {
///     #[default]
///     Open,
///     Closed,
/// }
///
/// impl Scan for Status {
///     fn scan(raw: &str) -> Result<Self, String> {
///         match raw {
///             "O" => Ok(Status::Open),
///             "C" => Ok(Status::Closed),
///             other => Err(format!("unknown status '{other}'")),
///         }
///     }
/// }
///
/// impl Symbol for Status {
///     fn symbol(&self) -> String {
///         match self {
///             Status::Open => "O".to_string(),
///             Status::Closed => "C".to_string(),
///         }
///     }
/// }
///
/// custom_field!(Status);
/// ```
#[macro_export]
macro_rules! custom_field {
    ($ty:ty) => {
        impl $crate::FieldValue for $ty {
            const KIND: $crate::ValueKind = $crate::ValueKind::Custom;

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, ::std::string::String> {
                let raw = value.to_string();
                match <$ty as $crate::Scan>::scan(&raw) {
                    ::std::result::Result::Err(_) if raw.is_empty() => {
                        ::std::result::Result::Ok(<$ty as ::std::default::Default>::default())
                    }
                    scanned => scanned,
                }
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Text(<$ty as $crate::Symbol>::symbol(self))
            }
        }
    };
}

fn mismatch(expected: &str, found: &Value) -> String {
    format!("expected {expected}, found {}", found.type_name())
}

macro_rules! signed_field {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            const KIND: ValueKind = ValueKind::Integer;

            fn from_value(value: Value) -> std::result::Result<Self, String> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i)
                        .map_err(|_| format!("{i} is out of range for {}", stringify!($ty))),
                    other => Err(mismatch("integer", &other)),
                }
            }

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            const KIND: ValueKind = ValueKind::Unsigned;

            fn from_value(value: Value) -> std::result::Result<Self, String> {
                match value {
                    Value::UInt(u) => <$ty>::try_from(u)
                        .map_err(|_| format!("{u} is out of range for {}", stringify!($ty))),
                    other => Err(mismatch("unsigned integer", &other)),
                }
            }

            fn to_value(&self) -> Value {
                Value::UInt(*self as u64)
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64, isize);
unsigned_field!(u8, u16, u32, u64, usize);

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(mismatch("float", &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        f64::from_value(value).map(|x| x as f32)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FieldValue for NaiveDateTime {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch("timestamp", &other)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FieldValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        NaiveDateTime::from_value(value).map(|ts| ts.date())
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(self.and_time(NaiveTime::default()))
    }
}

impl FieldValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        NaiveDateTime::from_value(value).map(|ts| ts.and_utc())
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const OPTIONAL: bool = true;

    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, T::to_value)
    }
}

/// Convert a field's decoded text into a `Value` of the field's kind.
pub fn decode(raw: &str, field: &Field, hook: Option<&DecodeHook>) -> Result<Value> {
    let hooked;
    let raw = match hook {
        Some(hook) => {
            hooked = hook(field, raw).map_err(|reason| FixedWidthError::coercion(&field.name, reason))?;
            hooked.as_str()
        }
        None => raw,
    };

    if raw.is_empty() && field.optional {
        return Ok(Value::Null);
    }

    let value = match field.kind {
        ValueKind::Text | ValueKind::Custom => Value::Text(raw.to_string()),
        ValueKind::Timestamp if raw.is_empty() => Value::Timestamp(NaiveDateTime::default()),
        ValueKind::Timestamp => parse_timestamp(raw, field.time_format.as_deref())
            .map(Value::Timestamp)
            .map_err(|reason| FixedWidthError::coercion(&field.name, reason))?,
        ValueKind::Integer => {
            let digits = strip_leading_zeros(raw);
            if digits.is_empty() {
                Value::Int(0)
            } else {
                digits.parse().map(Value::Int).map_err(|_| {
                    FixedWidthError::coercion(&field.name, format!("'{raw}' is not an integer"))
                })?
            }
        }
        ValueKind::Unsigned => {
            let digits = strip_leading_zeros(raw);
            if digits.is_empty() {
                Value::UInt(0)
            } else {
                digits.parse().map(Value::UInt).map_err(|_| {
                    FixedWidthError::coercion(
                        &field.name,
                        format!("'{raw}' is not an unsigned integer"),
                    )
                })?
            }
        }
        ValueKind::Float if raw.is_empty() => Value::Float(0.0),
        ValueKind::Float => raw.parse().map(Value::Float).map_err(|_| {
            FixedWidthError::coercion(&field.name, format!("'{raw}' is not a number"))
        })?,
        ValueKind::Boolean => weak_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| FixedWidthError::coercion(&field.name, format!("'{raw}' is not a boolean")))?,
    };

    Ok(value)
}

/// Render a `Value` as the text written into its field.
pub fn encode(value: &Value, field: &Field) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Timestamp(ts) => format_timestamp(ts, field.time_format.as_deref()),
    }
}

// Zero-filled numeric fields such as "0017".
fn strip_leading_zeros(raw: &str) -> &str {
    raw.trim_start_matches('0')
}

fn weak_bool(raw: &str) -> Option<bool> {
    match raw {
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        _ => None,
    }
}

fn parse_timestamp(raw: &str, format: Option<&str>) -> std::result::Result<NaiveDateTime, String> {
    let Some(format) = format else {
        return DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .map_err(|e| format!("'{raw}' is not an RFC 3339 timestamp: {e}"));
    };

    if let Ok(dt) = DateTime::parse_from_str(raw, format) {
        return Ok(dt.naive_utc());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
        return Ok(ts);
    }
    // Date-only formats land on midnight.
    NaiveDate::parse_from_str(raw, format)
        .map(|date| date.and_time(NaiveTime::default()))
        .map_err(|e| format!("'{raw}' does not match time format '{format}': {e}"))
}

fn format_timestamp(ts: &NaiveDateTime, format: Option<&str>) -> String {
    let ts = ts.and_utc();
    match format {
        Some(format) => ts.format(format).to_string(),
        None => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;

    fn field<V: FieldValue>(tag: &str) -> Field {
        Field::parse(&FieldSpec::of::<V>("Foo", tag)).unwrap()
    }

    fn decode_as<V: FieldValue>(raw: &str, tag: &str) -> Result<V> {
        let value = decode(raw, &field::<V>(tag), None)?;
        V::from_value(value).map_err(|reason| FixedWidthError::coercion("Foo", reason))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_zero_padded_integer() {
        assert_eq!(decode_as::<i32>("007", "start=0,end=2").unwrap(), 7);
        assert_eq!(decode_as::<u64>("0010", "start=0,end=3").unwrap(), 10);
        assert_eq!(decode_as::<i64>("000", "start=0,end=2").unwrap(), 0);
        assert_eq!(decode_as::<i16>("", "start=0").unwrap(), 0);
        assert_eq!(decode_as::<i32>("-42", "start=0,end=2").unwrap(), -42);
    }

    #[test]
    fn test_integer_errors() {
        let err = decode_as::<i32>("12a", "start=0,end=2").unwrap_err();
        assert!(matches!(err, FixedWidthError::Coercion { ref field, .. } if field == "Foo"));
        assert!(decode_as::<u8>("-1", "start=0,end=1").is_err());
        let err = decode_as::<i8>("300", "start=0,end=2").unwrap_err();
        assert!(err.to_string().contains("out of range for i8"));
    }

    #[test]
    fn test_weak_bool() {
        for raw in ["1", "t", "T", "true", "TRUE", "True"] {
            assert!(decode_as::<bool>(raw, "start=0").unwrap(), "{raw}");
        }
        for raw in ["", "0", "f", "F", "false", "FALSE", "False"] {
            assert!(!decode_as::<bool>(raw, "start=0").unwrap(), "{raw}");
        }
        assert!(decode_as::<bool>("Y", "start=0").is_err());
    }

    #[test]
    fn test_float() {
        assert_eq!(decode_as::<f64>("12.50", "start=0,end=4").unwrap(), 12.5);
        assert_eq!(decode_as::<f32>("", "start=0").unwrap(), 0.0);
        assert!(decode_as::<f64>("1,5", "start=0,end=2").is_err());
    }

    #[test]
    fn test_text_is_untouched() {
        assert_eq!(decode_as::<String>("007", "start=0,end=2").unwrap(), "007");
    }

    #[test]
    fn test_timestamp_with_format() {
        let ts = decode_as::<NaiveDateTime>("03171994", "start=0,end=7,time=%m%d%Y").unwrap();
        assert_eq!(ts, ymd(1994, 3, 17));

        let date = decode_as::<NaiveDate>("19950418", "start=0,end=7,time=%Y%m%d").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1995, 4, 18).unwrap());
    }

    #[test]
    fn test_timestamp_default_rfc3339() {
        let ts = decode_as::<DateTime<Utc>>("2021-06-01T12:30:00+02:00", "start=0,end=24").unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(ts.naive_utc(), expected);
        assert!(decode_as::<NaiveDateTime>("06/01/2021", "start=0,end=9").is_err());
    }

    #[test]
    fn test_timestamp_parse_failure_names_field() {
        let err = decode_as::<NaiveDateTime>("13451994", "start=0,end=7,time=%m%d%Y").unwrap_err();
        assert!(matches!(err, FixedWidthError::Coercion { ref field, .. } if field == "Foo"));
        assert!(err.to_string().contains("%m%d%Y"));
    }

    #[test]
    fn test_empty_timestamp_is_zero_value() {
        let ts = decode_as::<NaiveDateTime>("", "start=0,end=7").unwrap();
        assert_eq!(ts, NaiveDateTime::default());
        let ts = decode_as::<DateTime<Utc>>("", "start=0,end=7").unwrap();
        assert_eq!(ts, DateTime::<Utc>::default());
    }

    #[test]
    fn test_empty_optional_is_null() {
        assert_eq!(decode_as::<Option<NaiveDateTime>>("", "start=0,end=7").unwrap(), None);
        assert_eq!(decode_as::<Option<i32>>("", "start=0,end=3").unwrap(), None);
        assert_eq!(decode_as::<Option<String>>("", "start=0").unwrap(), None);
        assert_eq!(decode_as::<Option<i32>>("0042", "start=0,end=3").unwrap(), Some(42));
    }

    #[test]
    fn test_hook_runs_first() {
        let hook: DecodeHook = Arc::new(|field: &Field, raw: &str| -> std::result::Result<String, String> {
            if field.kind == ValueKind::Boolean {
                Ok(match raw {
                    "Y" => "1".to_string(),
                    "N" => "0".to_string(),
                    other => other.to_string(),
                })
            } else {
                Ok(raw.to_string())
            }
        });
        let flag = field::<bool>("start=0");
        assert_eq!(decode("Y", &flag, Some(&hook)).unwrap(), Value::Bool(true));
        assert_eq!(decode("N", &flag, Some(&hook)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_hook_can_blank_optional() {
        let hook: DecodeHook = Arc::new(|_: &Field, raw: &str| -> std::result::Result<String, String> {
            Ok(if raw == "N/A" { String::new() } else { raw.to_string() })
        });
        let count = field::<Option<u32>>("start=0,end=2");
        assert_eq!(decode("N/A", &count, Some(&hook)).unwrap(), Value::Null);
    }

    #[test]
    fn test_hook_error_is_coercion_error() {
        let hook: DecodeHook = Arc::new(|_: &Field, _: &str| -> std::result::Result<String, String> {
            Err("rejected".to_string())
        });
        let err = decode("X", &field::<String>("start=0"), Some(&hook)).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert field 'Foo': rejected");
    }

    #[test]
    fn test_encode_values() {
        let text = field::<String>("start=0,end=9");
        assert_eq!(encode(&Value::Null, &text), "");
        assert_eq!(encode(&true.to_value(), &text), "1");
        assert_eq!(encode(&false.to_value(), &text), "0");
        assert_eq!(encode(&42u16.to_value(), &text), "42");
        assert_eq!(encode(&(-7i8).to_value(), &text), "-7");
        assert_eq!(encode(&1.25f64.to_value(), &text), "1.25");
        assert_eq!(encode(&None::<i32>.to_value(), &text), "");
    }

    #[test]
    fn test_encode_timestamps() {
        let default = field::<NaiveDateTime>("start=0,end=19");
        assert_eq!(encode(&ymd(1994, 3, 17).to_value(), &default), "1994-03-17T00:00:00Z");

        let custom = field::<NaiveDate>("start=0,end=7,time=%m%d%Y");
        let date = NaiveDate::from_ymd_opt(1994, 3, 17).unwrap();
        assert_eq!(encode(&date.to_value(), &custom), "03171994");

        let zoned = field::<DateTime<Utc>>("start=0,end=30,time=%Y-%m-%d %H:%M %z");
        assert_eq!(
            encode(&ymd(2020, 1, 2).and_utc().to_value(), &zoned),
            "2020-01-02 00:00 +0000"
        );
    }

    #[derive(Debug, Default, PartialEq)]
    enum Status {
        #[default]
        Open,
        Closed,
    }

    impl Scan for Status {
        fn scan(raw: &str) -> std::result::Result<Self, String> {
            match raw {
                "O" => Ok(Status::Open),
                "C" => Ok(Status::Closed),
                other => Err(format!("unknown status '{other}'")),
            }
        }
    }

    impl Symbol for Status {
        fn symbol(&self) -> String {
            match self {
                Status::Open => "O".to_string(),
                Status::Closed => "C".to_string(),
            }
        }
    }

    custom_field!(Status);

    #[test]
    fn test_custom_scan_and_symbol() {
        assert_eq!(decode_as::<Status>("C", "start=0").unwrap(), Status::Closed);
        let err = decode_as::<Status>("X", "start=0").unwrap_err();
        assert!(err.to_string().contains("unknown status 'X'"));
        assert_eq!(encode(&Status::Closed.to_value(), &field::<Status>("start=0")), "C");
        assert_eq!(decode_as::<Option<Status>>("", "start=0").unwrap(), None);
    }

    #[test]
    fn test_custom_blank_is_default() {
        assert_eq!(decode_as::<Status>("", "start=0").unwrap(), Status::Open);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Timestamp(ymd(2000, 1, 1)).to_string(), "2000-01-01T00:00:00Z");
    }
}
