use std::collections::HashMap;

use crate::api::{ImageId, ImageRecord};

/// Every record fetched this session, keyed by id. Records are never removed;
/// order is derived downstream, not stored here.
#[derive(Debug, Default)]
pub struct SourceCollection {
    records: HashMap<ImageId, ImageRecord>,
}

impl SourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the records whose ids are not yet present and returns exactly
    /// those, in input order. Already-known ids are left untouched.
    pub fn merge(&mut self, records: impl IntoIterator<Item = ImageRecord>) -> Vec<ImageRecord> {
        let mut added = Vec::new();
        for record in records {
            if self.records.contains_key(&record.id()) {
                continue;
            }
            self.records.insert(record.id(), record.clone());
            added.push(record);
        }
        added
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
