//! Position index of recognized mentions.
//!
//! Every offset holds the terms anchored there, longest first. Two records
//! with identical text at the same offset become one entry with the union of
//! their concept ids; different texts at one offset stay separate entries.
//! Lengths are counted in UTF-16 code units, matching the wire offsets.

use std::collections::BTreeMap;

use conceptmark_common::entities::parse_entities;
use conceptmark_common::{EntityRecord, Result};

/// One term anchored at an offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub text: String,
    pub ids: Vec<String>,
    utf16_len: usize,
}

impl MapEntry {
    fn new(text: &str, ids: &[String]) -> Self {
        Self {
            text: text.to_string(),
            ids: ids.to_vec(),
            utf16_len: text.encode_utf16().count(),
        }
    }

    /// Term length in UTF-16 code units, the unit wire offsets count in.
    pub fn utf16_len(&self) -> usize {
        self.utf16_len
    }

    fn merge_ids(&mut self, ids: &[String]) {
        for id in ids {
            if !self.ids.contains(id) {
                self.ids.push(id.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMap {
    buckets: BTreeMap<usize, Vec<MapEntry>>,
}

impl EntityMap {
    pub fn build(records: &[EntityRecord]) -> Self {
        let mut map = Self::default();
        for record in records {
            map.insert(record);
        }
        map
    }

    /// Parse wire records (`term|ids|offset`) and index them.
    pub fn from_wire<S: AsRef<str>>(entities: &[S]) -> Result<Self> {
        Ok(Self::build(&parse_entities(entities)?))
    }

    fn insert(&mut self, record: &EntityRecord) {
        let bucket = self.buckets.entry(record.offset).or_default();

        match bucket.iter_mut().find(|e| e.text == record.term) {
            Some(existing) => existing.merge_ids(&record.ids),
            None => bucket.push(MapEntry::new(&record.term, &record.ids)),
        }

        // Stable: equal lengths keep insertion order.
        bucket.sort_by(|a, b| b.utf16_len.cmp(&a.utf16_len));
    }

    /// Terms anchored at `offset`, longest first.
    pub fn get(&self, offset: usize) -> Option<&[MapEntry]> {
        self.buckets.get(&offset).map(Vec::as_slice)
    }

    /// Offsets in ascending order.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.keys().copied()
    }

    /// `(offset, terms)` pairs in ascending offset order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[MapEntry])> + '_ {
        self.buckets.iter().map(|(&pos, terms)| (pos, terms.as_slice()))
    }

    /// Number of distinct offsets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Build the position index straight from wire records.
pub fn build_entity_map<S: AsRef<str>>(entities: &[S]) -> Result<EntityMap> {
    EntityMap::from_wire(entities)
}
