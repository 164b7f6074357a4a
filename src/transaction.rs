//! Transactions bind a record type's layout to a set of line buffers.
//!
//! Decoding appends lines and converts them into a record; encoding converts
//! a record into freshly padded lines. A transaction is meant for a single
//! conversion, though encode and decode may run back to back.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::trace;

use crate::codec::{self, FieldMap, Truncation};
use crate::coerce::{self, DecodeHook};
use crate::error::{FixedWidthError, Result};
use crate::field::Field;
use crate::layout::{Layout, LayoutCache};
use crate::record::{FieldReader, FixedWidth};

/// Decode already-split lines into a record of type `T`.
pub fn decode<T: FixedWidth, L: AsRef<[u8]>>(lines: &[L]) -> Result<T> {
    let mut txn = Transaction::<T>::new()?;
    txn.decode_lines(lines)
}

/// Encode a record into line buffers, one per sub-record.
pub fn encode<T: FixedWidth>(record: &T) -> Result<Vec<Vec<u8>>> {
    Transaction::<T>::new()?.encode_lines(record)
}

/// One conversion between record type `T` and its line buffers.
pub struct Transaction<T> {
    records: Vec<Vec<u8>>,
    layout: Arc<Layout>,
    decode_hook: Option<DecodeHook>,
    truncation: Truncation,
    _record: PhantomData<fn() -> T>,
}

impl<T: FixedWidth> Transaction<T> {
    /// Create a transaction using the process-wide layout cache.
    pub fn new() -> Result<Self> {
        Self::with_cache(LayoutCache::global())
    }

    /// Create a transaction resolving `T`'s layout through `cache`.
    pub fn with_cache(cache: &LayoutCache) -> Result<Self> {
        Ok(Self::with_layout(cache.get_or_build::<T>()?))
    }

    /// Create a transaction over an already built layout.
    pub fn with_layout(layout: Arc<Layout>) -> Self {
        Self {
            records: Vec::new(),
            layout,
            decode_hook: None,
            truncation: Truncation::default(),
            _record: PhantomData,
        }
    }

    /// Transform each field's raw text before the built-in decode rules.
    pub fn with_decode_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Field, &str) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        self.decode_hook = Some(Arc::new(hook));
        self
    }

    /// Choose how values wider than their field are handled on encode.
    pub fn with_truncation(mut self, truncation: Truncation) -> Self {
        self.truncation = truncation;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Append copies of `lines` to the transaction's records.
    pub fn append<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.records
            .extend(lines.into_iter().map(|line| line.as_ref().to_vec()));
    }

    pub fn records(&self) -> &[Vec<u8>] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Vec<u8>> {
        self.records
    }

    /// Text of every layout field present in the records.
    pub fn get_fields(&self) -> FieldMap {
        codec::get_fields(&self.layout, &self.records)
    }

    /// Write field text into the records by field name.
    ///
    /// On error the records are left as they were.
    pub fn set_fields<I, K, V>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut records = self.records.clone();
        codec::set_fields(&self.layout, &mut records, fields, self.truncation)?;
        self.records = records;
        Ok(())
    }

    /// Convert the records into a `T`.
    pub fn decode(&self) -> Result<T> {
        let fields = self.get_fields();
        trace!(fields = fields.len(), "decoding record");
        let reader = FieldReader::new(&self.layout, &fields, self.decode_hook.as_ref());
        T::from_fields(&reader).map_err(|e| FixedWidthError::Decode {
            record_type: std::any::type_name::<T>(),
            source: Box::new(e),
        })
    }

    /// Append `lines`, then decode.
    pub fn decode_lines<L: AsRef<[u8]>>(&mut self, lines: &[L]) -> Result<T> {
        self.append(lines);
        self.decode()
    }

    /// Convert `record` into field text and write it into the records.
    pub fn encode(&mut self, record: &T) -> Result<()> {
        self.encode_fields(record)
            .map_err(|e| FixedWidthError::Encode {
                record_type: std::any::type_name::<T>(),
                source: Box::new(e),
            })
    }

    /// Encode `record` and return the resulting line buffers.
    pub fn encode_lines(mut self, record: &T) -> Result<Vec<Vec<u8>>> {
        self.encode(record)?;
        Ok(self.records)
    }

    /// Decoded fields as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        self.get_fields()
            .into_iter()
            .map(|(name, value)| (name, serde_json::Value::String(value)))
            .collect::<serde_json::Map<_, _>>()
            .into()
    }

    fn encode_fields(&mut self, record: &T) -> Result<()> {
        let mut fields = Vec::new();
        for (name, value) in record.to_fields() {
            let field = self
                .layout
                .field(name)
                .ok_or_else(|| FixedWidthError::UnknownField(name.to_string()))?;
            fields.push((name, coerce::encode(&value, field)));
        }
        self.set_fields(fields)
    }
}

impl<T> Serialize for Transaction<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(codec::get_fields(&self.layout, &self.records))
    }
}

impl<T> fmt::Debug for Transaction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("record_type", &std::any::type_name::<T>())
            .field("records", &self.records.len())
            .field("layout", &self.layout)
            .field("truncation", &self.truncation)
            .field("decode_hook", &self.decode_hook.is_some())
            .finish()
    }
}
