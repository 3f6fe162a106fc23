use super::cursor::Cursor;
use super::value::{AttrValue, IntoValues};
use crate::directory::{ChangeTracker, SchemaLookup, ValueConverter};
use crate::error::{DirError, Result};
use crate::model::{AttributeSchema, SchemaRecord};
use serde::{Serialize, Serializer};
use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Target of [`Attribute::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Index(usize),
    Value(AttrValue),
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

impl From<AttrValue> for Selector {
    fn from(value: AttrValue) -> Self {
        Selector::Value(value)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Selector::Value(value.into())
    }
}

/// The value(s) of one directory attribute.
///
/// Values live in sparse, index-addressable slots. Removing a value empties
/// its slot without shifting the others; [`Attribute::values`] compacts the
/// slots back to `0..count`. Appends always go past the highest slot used
/// since the last compaction.
pub struct Attribute {
    name: String,
    slots: BTreeMap<usize, AttrValue>,
    next_slot: usize,
    needs_reindex: bool,
    owner: Option<Weak<dyn ChangeTracker>>,
    schema: Option<Arc<SchemaRecord>>,
}

pub struct AttributeBuilder<'a> {
    name: String,
    values: Vec<AttrValue>,
    owner: Option<Weak<dyn ChangeTracker>>,
    converter: Option<&'a dyn ValueConverter>,
}

impl<'a> AttributeBuilder<'a> {
    pub fn values(mut self, values: impl IntoValues) -> Self {
        self.values = values.into_values();
        self
    }

    pub fn owner<T: ChangeTracker + 'static>(mut self, owner: &Arc<T>) -> Self {
        let owner: Weak<T> = Arc::downgrade(owner);
        self.owner = Some(owner);
        self
    }

    /// Convert the initial values from wire to native form before storing them.
    pub fn convert_with(mut self, converter: &'a dyn ValueConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn build(self, lookup: &dyn SchemaLookup) -> Result<Attribute> {
        let name = self.name.to_lowercase();
        let schema = lookup.lookup(&name)?;

        let values = match self.converter {
            Some(converter) => converter.to_native(&name, self.values)?,
            None => self.values,
        };

        let mut attribute = Attribute {
            name,
            slots: BTreeMap::new(),
            next_slot: 0,
            needs_reindex: false,
            owner: None,
            schema,
        };
        attribute.add_silent(values)?;
        attribute.owner = self.owner;
        Ok(attribute)
    }
}

impl Attribute {
    pub fn builder<'a>(name: impl Into<String>) -> AttributeBuilder<'a> {
        AttributeBuilder {
            name: name.into(),
            values: Vec::new(),
            owner: None,
            converter: None,
        }
    }

    /// Unbound attribute with `values`, constrained by whatever `lookup` knows
    /// about `name`.
    pub fn new(
        name: impl Into<String>,
        values: impl IntoValues,
        lookup: &dyn SchemaLookup,
    ) -> Result<Self> {
        Self::builder(name).values(values).build(lookup)
    }

    /// Parse a document produced by [`Attribute::to_json`].
    pub fn from_json(name: impl Into<String>, json: &str, lookup: &dyn SchemaLookup) -> Result<Self> {
        let values: Vec<AttrValue> = serde_json::from_str(json).map_err(DirError::Serialization)?;
        Self::new(name, values, lookup)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // --- Schema ---

    pub fn schema(&self) -> Option<&Arc<SchemaRecord>> {
        self.schema.as_ref()
    }

    fn attribute_schema(&self) -> Option<&AttributeSchema> {
        self.schema.as_deref().and_then(SchemaRecord::as_attribute)
    }

    pub fn is_single_valued(&self) -> bool {
        self.attribute_schema().is_some_and(|s| s.single_valued)
    }

    pub fn is_constructed(&self) -> bool {
        self.attribute_schema().is_some_and(|s| s.constructed)
    }

    /// Whether values are distinguished names of other directory objects.
    pub fn is_resolvable(&self) -> bool {
        self.attribute_schema().is_some_and(AttributeSchema::resolvable)
    }

    // --- Ownership ---

    pub fn owner(&self) -> Option<Arc<dyn ChangeTracker>> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    /// Bind (or rebind) this attribute to the object that owns it.
    pub fn belongs_to<T: ChangeTracker + 'static>(&mut self, owner: &Arc<T>) {
        let owner: Weak<T> = Arc::downgrade(owner);
        self.owner = Some(owner);
    }

    pub fn detach(&mut self) {
        self.owner = None;
    }

    pub fn is_bound(&self) -> bool {
        self.owner().is_some()
    }

    fn notify(&self) {
        if let Some(owner) = self.owner() {
            owner.attribute_changed(self);
        }
    }

    // --- Reads ---

    /// All values in order. Compacts the slots first.
    pub fn values(&mut self) -> Vec<AttrValue> {
        self.reindex();
        self.iter().cloned().collect()
    }

    /// Value at `index`.
    ///
    /// A negative index resolves to slot `count() + |index|`, which is not
    /// "from the end"; existing callers depend on this.
    pub fn value(&self, index: isize) -> Option<&AttrValue> {
        let slot = if index < 0 {
            self.count() + index.unsigned_abs()
        } else {
            index.unsigned_abs()
        };
        self.get(slot)
    }

    pub fn get(&self, index: usize) -> Option<&AttrValue> {
        self.slots.get(&index)
    }

    pub fn exists(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Present values in slot order, skipping holes.
    pub fn iter(&self) -> impl Iterator<Item = &AttrValue> + '_ {
        self.slots.values()
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    fn reindex(&mut self) {
        if self.needs_reindex {
            let values = std::mem::take(&mut self.slots);
            self.slots = values.into_values().enumerate().collect();
            self.next_slot = self.slots.len();
            self.needs_reindex = false;
        }
    }

    // --- Mutations ---

    fn ensure_mutable(&self) -> Result<()> {
        if self.is_constructed() {
            return Err(DirError::InvalidOperation {
                attribute: self.name.clone(),
            });
        }
        Ok(())
    }

    fn ensure_capacity(&self, additional: usize) -> Result<()> {
        if self.is_single_valued() && self.count() + additional > 1 {
            return Err(DirError::ConstraintViolation {
                attribute: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Append values and notify the owner.
    pub fn add(&mut self, values: impl IntoValues) -> Result<()> {
        self.ensure_mutable()?;
        self.append(values.into_values())?;
        trace!(attribute = %self.name, count = self.count(), "Values added");
        self.notify();
        Ok(())
    }

    /// Append values without notifying the owner, for bulk loads.
    ///
    /// Constructed attributes accept silent loads; the single-valued limit
    /// still applies.
    pub fn add_silent(&mut self, values: impl IntoValues) -> Result<()> {
        self.append(values.into_values())
    }

    fn append(&mut self, values: Vec<AttrValue>) -> Result<()> {
        self.ensure_capacity(values.len())?;
        let end = self
            .next_slot
            .checked_add(values.len())
            .ok_or_else(|| DirError::SlotsExhausted {
                attribute: self.name.clone(),
            })?;
        self.slots.extend((self.next_slot..end).zip(values));
        self.next_slot = end;
        Ok(())
    }

    /// Remove a slot by index, or the first value if it matches.
    ///
    /// Only the first present value is compared (case-insensitively) against
    /// `Selector::Value`; a match further down is left in place.
    pub fn remove(&mut self, target: impl Into<Selector>) -> Result<()> {
        self.ensure_mutable()?;

        match target.into() {
            Selector::Index(index) => {
                self.slots.remove(&index);
            }
            Selector::Value(value) => {
                if let Some(first) = self.slots.first_entry() {
                    if first.get().eq_ignore_case(&value) {
                        first.remove();
                    }
                }
            }
        }

        self.needs_reindex = true;
        trace!(attribute = %self.name, count = self.count(), "Value removed");
        self.notify();
        Ok(())
    }

    /// Replace all values.
    pub fn set(&mut self, values: impl IntoValues) -> Result<()> {
        self.clear()?;
        self.add(values)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_mutable()?;
        self.slots.clear();
        self.next_slot = 0;
        self.needs_reindex = false;
        trace!(attribute = %self.name, "Values cleared");
        self.notify();
        Ok(())
    }

    /// Write a value into slot `index`. Any offset is accepted; writing past
    /// the next free slot leaves a hole.
    ///
    /// Follows the same rules as [`Attribute::add`]: constructed attributes
    /// refuse, and a single-valued attribute may only overwrite its value.
    pub fn set_at(&mut self, index: usize, value: impl Into<AttrValue>) -> Result<()> {
        self.ensure_mutable()?;
        if !self.exists(index) {
            self.ensure_capacity(1)?;
        }

        if index > self.next_slot {
            self.needs_reindex = true;
        }
        self.next_slot = self.next_slot.max(index.saturating_add(1));
        self.slots.insert(index, value.into());

        trace!(attribute = %self.name, index, "Value set");
        self.notify();
        Ok(())
    }

    pub fn unset(&mut self, index: usize) -> Result<()> {
        self.remove(Selector::Index(index))
    }

    // --- Serialization ---

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(DirError::Serialization)
    }

    /// Values in wire form, for writing changes back to the directory.
    pub fn to_wire(&self, converter: &dyn ValueConverter) -> Result<Vec<AttrValue>> {
        converter.to_wire(&self.name, self.iter().cloned().collect())
    }
}

impl Clone for Attribute {
    /// Compact copy with no owner.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            slots: self.iter().cloned().enumerate().collect(),
            next_slot: self.count(),
            needs_reindex: false,
            owner: None,
            schema: self.schema.clone(),
        }
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("slots", &self.slots)
            .field("bound", &self.is_bound())
            .field("schema", &self.schema.as_ref().map(|s| &s.name))
            .finish()
    }
}

impl<'a> IntoIterator for &'a Attribute {
    type Item = &'a AttrValue;
    type IntoIter = btree_map::Values<'a, usize, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.values()
    }
}
