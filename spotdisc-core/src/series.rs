//! A single fetched data series: time-of-day label → numeric value.

use std::collections::BTreeMap;

/// Mapping from an `HH:MM` label to a value, as extracted by one fetch
/// adapter call. Labels are zero-padded, so the BTreeMap's lexicographic
/// order is chronological order. Ephemeral — lives only within one
/// aggregation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series(BTreeMap<String, f64>);

impl Series {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        self.0.insert(label.into(), value);
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for Series {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
