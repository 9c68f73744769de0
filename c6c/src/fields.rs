use std::mem;

use itertools::Itertools;

/// Value read for fields that were never set.
pub static EMPTY_VALUE: &str = "_";

/// Fields.
///
/// An ordered bag of annotation layers, e.g. the columns of a token or the
/// meta information of a sentence. Keys keep the order of their first insertion.
#[derive(Clone, Default, Debug, Eq, PartialEq)]
pub struct Fields {
    vec: Vec<(String, String)>,
}

impl Fields {
    /// Construct empty `Fields`.
    pub fn new() -> Self {
        Fields::default()
    }

    /// Construct `Fields` from `vec`.
    ///
    /// Later duplicates of a key overwrite the value of the first occurrence.
    pub fn from_vec(vec: Vec<(String, String)>) -> Self {
        vec.into_iter().collect()
    }

    /// Get a slice of the backing `Vec`.
    pub fn inner(&self) -> &[(String, String)] {
        &self.vec
    }

    /// Insert `key` with `val`.
    ///
    /// If `key` was present, the replaced value is returned, otherwise `None`.
    pub fn insert<K, V>(&mut self, key: K, val: V) -> Option<String>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let key = key.as_ref();
        let val = val.into();
        for (k, v) in self.vec.iter_mut() {
            if k == key {
                return Some(mem::replace(v, val));
            }
        }
        self.vec.push((key.into(), val));
        None
    }

    /// Get the value associated with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vec
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the value associated with `key` or `"_"` if `key` is absent.
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or(EMPTY_VALUE)
    }

    /// Returns whether `key` holds a value other than `"_"`.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).map(|v| v != EMPTY_VALUE).unwrap_or(false)
    }

    /// Remove the pair associated with `key`.
    ///
    /// Returns `None` if `key` was not found.
    pub fn remove(&mut self, key: &str) -> Option<(String, String)> {
        let idx = self.vec.iter().position(|(k, _)| k == key)?;
        Some(self.vec.remove(idx))
    }

    /// Iterate over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vec.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vec.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
}

impl<K, V> std::iter::FromIterator<(K, V)> for Fields
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl ToString for Fields {
    fn to_string(&self) -> String {
        self.vec
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .join("|")
    }
}
