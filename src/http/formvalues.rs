//! Key-sorted multi-valued parameters.
//!
//! `FormValues` backs both query strings and `application/x-www-form-urlencoded`
//! bodies. Keys iterate in lexicographic order and each key keeps its values in
//! insertion order, so [`FormValues::encode`] is deterministic.

use serde::Serialize;
use std::collections::BTreeMap;

/// Ordered multimap from parameter name to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormValues {
    inner: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an urlencoded string (`a=1&b=2`).
    pub fn parse(input: &str) -> Self {
        let mut values = Self::new();
        for (key, value) in url::form_urlencoded::parse(input.as_bytes()) {
            values.add(key.into_owned(), value.into_owned());
        }
        values
    }

    /// Append a value to the given key.
    pub fn add<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.inner.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Replace all values of the given key with a single value.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.inner.insert(key.into(), vec![value.into()]);
        self
    }

    /// Replace all values of the given key.
    pub fn set_all<K: Into<String>>(&mut self, key: K, values: Vec<String>) -> &mut Self {
        self.inner.insert(key.into(), values);
        self
    }

    /// First value for the key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// All values for the key, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove the key and every value attached to it.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.inner.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate keys in sorted order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Overwrite keys present in `other`, keeping every other key.
    pub fn merge(&mut self, other: &FormValues) {
        for (key, values) in &other.inner {
            self.inner.insert(key.clone(), values.clone());
        }
    }

    /// Encode as `application/x-www-form-urlencoded`, keys sorted.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.inner {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
