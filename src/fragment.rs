use crate::value::Value;

/// An insertion-ordered collection of field conditions.
///
/// This is the materialized form of a filter fragment: a key is either a
/// field name or an operator token, and repeated inserts of the same key
/// overwrite in place (last write wins, first position kept). Conditions
/// that must *not* collapse this way — repeated field names inside one
/// logical combinator block — are never routed through a fragment; the
/// interpreter carries them as an ordered pair sequence and emits one
/// single-key fragment per condition instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    entries: Vec<(String, Value)>,
}

impl Fragment {
    pub fn new() -> Self {
        Fragment::default()
    }

    /// A fragment holding exactly one condition.
    pub fn singleton(key: impl Into<String>, value: Value) -> Self {
        Fragment {
            entries: vec![(key.into(), value)],
        }
    }

    /// Materializes a pair sequence, collapsing repeated keys last-write-wins.
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        let mut fragment = Fragment::new();
        for (key, value) in pairs {
            fragment.insert(key, value);
        }
        fragment
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl IntoIterator for Fragment {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
