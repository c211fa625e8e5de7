use crate::{attribute::AttributeId, value::Value};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Item
///
/// One flattened row keyed by attribute identifier.
/// Iteration order is the identifier order, so equal items render identically.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, IntoIterator, PartialEq, Serialize)]
#[into_iterator(owned, ref)]
pub struct Item(BTreeMap<AttributeId, Value>);

impl Item {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, id: AttributeId, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(id, value.into())
    }

    pub fn remove(&mut self, id: &AttributeId) -> Option<Value> {
        self.0.remove(id)
    }

    /// Value of a plain column of the page table.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Value> {
        self.0.get(&AttributeId::column(name))
    }

    /// Value for `id`, treating a missing entry as `Null`.
    #[must_use]
    pub fn value_or_null(&self, id: &AttributeId) -> Value {
        self.0.get(id).cloned().unwrap_or_default()
    }
}

impl FromIterator<(AttributeId, Value)> for Item {
    fn from_iter<I: IntoIterator<Item = (AttributeId, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
