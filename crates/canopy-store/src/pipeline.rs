//! Filter pipeline descriptions as reported by a backing store.

use serde::{Deserialize, Serialize};

/// One filter step: its registered name and integer parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub name: String,
    pub params: Vec<u32>,
}

impl FilterEntry {
    pub fn new(name: impl Into<String>, params: impl Into<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
        }
    }

    /// First parameter of the filter, conventionally its level.
    pub fn first_param(&self) -> Option<u32> {
        self.params.first().copied()
    }
}

/// The filters applied to an object's payload, in pipeline order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPipeline {
    entries: Vec<FilterEntry>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter and return the pipeline, for chained construction.
    pub fn with(mut self, name: impl Into<String>, params: impl Into<Vec<u32>>) -> Self {
        self.push(FilterEntry::new(name, params));
        self
    }

    pub fn push(&mut self, entry: FilterEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Look up a filter by exact name.
    pub fn get(&self, name: &str) -> Option<&FilterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<FilterEntry> for FilterPipeline {
    fn from_iter<I: IntoIterator<Item = FilterEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FilterPipeline {
    type Item = &'a FilterEntry;
    type IntoIter = std::slice::Iter<'a, FilterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
