//! Case-insensitive flat key/value mappings.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Delimiter joining nested keys when documents are flattened.
pub const KEY_DELIMITER: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    key: String,
    value: String,
}

/// A flat mapping from string keys to string values with case-insensitive keys.
///
/// Used both for the parsed view of a single document and for the merged
/// snapshot published to the host. When a key is overwritten the value is
/// replaced and the first-seen spelling of the key is kept.
///
/// # Examples
///
/// ```rust
/// use hotswap_nacos::core::FlatMapping;
///
/// let mut mapping = FlatMapping::new();
/// mapping.insert("Database.Host", "localhost");
/// mapping.insert("database.host", "db.internal");
///
/// assert_eq!(mapping.get("DATABASE.HOST"), Some("db.internal"));
/// assert_eq!(mapping.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatMapping {
    entries: HashMap<String, Slot>,
}

impl FlatMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value for the key if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.entry(key.to_lowercase()) {
            Entry::Occupied(mut slot) => Some(std::mem::replace(&mut slot.get_mut().value, value)),
            Entry::Vacant(slot) => {
                slot.insert(Slot { key, value });
                None
            }
        }
    }

    /// Look up a value, ignoring key case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|slot| slot.value.as_str())
    }

    /// Whether the mapping contains the key, ignoring case.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|slot| (slot.key.as_str(), slot.value.as_str()))
    }

    /// Overlay `other` onto this mapping: keys in `other` win.
    pub fn overlay(&mut self, other: FlatMapping) {
        for (_, slot) in other.entries {
            self.insert(slot.key, slot.value);
        }
    }

    /// Pairs sorted by lowercased key, for stable output.
    pub fn to_sorted_vec(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self
            .entries
            .iter()
            .map(|(folded, slot)| (folded.clone(), slot.key.clone(), slot.value.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs.into_iter().map(|(_, key, value)| (key, value)).collect()
    }
}

impl<K, V> FromIterator<(K, V)> for FlatMapping
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = FlatMapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}
