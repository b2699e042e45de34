use crate::index::SecondaryIndex;
use fiches_core::domain::PhoneKey;
use std::collections::BTreeMap;

/// The record mapping: one body per canonical phone key, iterated in key order.
#[derive(Debug, Clone, Default)]
pub struct Fiches {
    pub(crate) records: BTreeMap<PhoneKey, String>,
    /// Built on the first merge that enforces secondary uniqueness.
    pub(crate) index: Option<SecondaryIndex>,
}

impl Fiches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PhoneKey) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &PhoneKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PhoneKey, &str)> {
        self.records.iter().map(|(key, body)| (key, body.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PhoneKey> {
        self.records.keys()
    }

    pub fn export_text(&self) -> String {
        fiches_import::export_text(self.iter())
    }
}

impl PartialEq for Fiches {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for Fiches {}

impl FromIterator<(PhoneKey, String)> for Fiches {
    fn from_iter<I: IntoIterator<Item = (PhoneKey, String)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
            index: None,
        }
    }
}
