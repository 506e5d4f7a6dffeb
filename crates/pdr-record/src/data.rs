// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered supporting data.

use crate::FieldValue;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered key/value fields attached to a record.
///
/// Field order is part of the report format, so entries keep their
/// insertion order. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportingData {
    entries: Vec<(String, FieldValue)>,
}

impl SupportingData {
    /// Create an empty set of fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value for `key` if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a field by name.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Append every field from `other`, replacing duplicates in place.
    pub fn extend(&mut self, other: SupportingData) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for SupportingData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

impl Serialize for SupportingData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
