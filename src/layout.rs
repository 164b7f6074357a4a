//! Record layouts and the process-wide layout cache.
//!
//! A `Layout` groups field descriptors by sub-record (one physical line
//! each). Layouts are a pure function of a record type's declared fields,
//! so they are built once per type and shared through a `LayoutCache`.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{FixedWidthError, Result};
use crate::field::{Field, FieldSpec};
use crate::record::FixedWidth;

/// Location of a field inside a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 0-based sub-record index.
    pub record: usize,
    /// Index of the field within its sub-record.
    pub field: usize,
}

/// Field placement for every sub-record of a record type.
///
/// Sub-record `i` holds the fields declared with `record = i + 1`. Field
/// names are unique across the whole layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    records: Vec<Vec<Field>>,
    positions: HashMap<String, Position>,
}

impl Layout {
    /// Build a layout from declared fields.
    ///
    /// Sparse record indices still produce every intermediate sub-record,
    /// empty if nothing is declared for it.
    pub fn build(specs: &[FieldSpec]) -> Result<Self> {
        let mut layout = Layout::default();

        for spec in specs {
            let field = Field::parse(spec)?;
            if layout.positions.contains_key(&field.name) {
                return Err(FixedWidthError::layout(&field.name, "duplicate field name"));
            }

            let record = field.record - 1;
            if layout.records.len() <= record {
                layout.records.resize_with(record + 1, Vec::new);
            }
            let position = Position {
                record,
                field: layout.records[record].len(),
            };
            layout.positions.insert(field.name.clone(), position);
            layout.records[record].push(field);
        }

        Ok(layout)
    }

    /// Build a layout of text fields from `(name, tag)` pairs.
    pub fn from_tags<I, N, T>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, T)>,
        N: AsRef<str>,
        T: AsRef<str>,
    {
        let specs: Vec<FieldSpec> = tags
            .into_iter()
            .map(|(name, tag)| FieldSpec::text(name.as_ref(), tag.as_ref()))
            .collect();
        Self::build(&specs)
    }

    /// Number of sub-records (lines) in the layout.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Total number of fields across all sub-records.
    pub fn field_count(&self) -> usize {
        self.positions.len()
    }

    /// Fields of every sub-record, in sub-record order.
    pub fn records(&self) -> &[Vec<Field>] {
        &self.records
    }

    /// Fields of the sub-record at 0-based `index`.
    pub fn record(&self, index: usize) -> Option<&[Field]> {
        self.records.get(index).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.records.iter().flatten()
    }

    pub fn position(&self, name: &str) -> Option<Position> {
        self.positions.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        let position = self.position(name)?;
        Some(&self.records[position.record][position.field])
    }

    /// Minimum line length that holds every field of sub-record `index`.
    pub fn record_width(&self, index: usize) -> usize {
        self.record(index)
            .map(|fields| fields.iter().map(|f| f.end + 1).max().unwrap_or(0))
            .unwrap_or(0)
    }
}

static GLOBAL_CACHE: Lazy<LayoutCache> = Lazy::new(LayoutCache::new);

/// Memoized layouts keyed by record type.
///
/// Entries are never evicted. Concurrent first use of a type may build the
/// layout more than once; the first stored layout wins and every caller
/// receives a complete one.
#[derive(Debug, Default)]
pub struct LayoutCache {
    layouts: DashMap<TypeId, Arc<Layout>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache, created on first use and kept for the
    /// lifetime of the process.
    pub fn global() -> &'static LayoutCache {
        &GLOBAL_CACHE
    }

    /// Layout for record type `T`, building it on first request.
    pub fn get_or_build<T: FixedWidth>(&self) -> Result<Arc<Layout>> {
        self.get_or_insert_with(TypeId::of::<T>(), || {
            debug!(record_type = std::any::type_name::<T>(), "building layout");
            Layout::build(&T::schema())
        })
    }

    /// Cached layout for `id`, or the result of `build` stored under it.
    ///
    /// Build errors are returned and nothing is cached.
    pub fn get_or_insert_with<F>(&self, id: TypeId, build: F) -> Result<Arc<Layout>>
    where
        F: FnOnce() -> Result<Layout>,
    {
        if let Some(layout) = self.layouts.get(&id) {
            return Ok(Arc::clone(layout.value()));
        }

        // Built outside the shard lock; a racing insert of the same pure
        // layout is harmless.
        let layout = Arc::new(build()?);
        let stored = self.layouts.entry(id).or_insert(layout);
        debug!(
            fields = stored.field_count(),
            records = stored.record_count(),
            "layout cached"
        );
        Ok(Arc::clone(stored.value()))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.layouts.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
