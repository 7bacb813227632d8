use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    api::{ImageId, ImageRecord},
    ordering::{OrderingKey, SearchPageOrder},
};

use super::item::PresentationItem;

/// Stable handle of an item in the view's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemKey(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// `ids` now occupy `index..index + ids.len()`.
    Insert { index: usize, ids: Vec<ImageId> },
    Remove { index: usize, id: ImageId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn inserted(&self) -> usize {
        self.changes
            .iter()
            .map(|c| match c {
                Change::Insert { ids, .. } => ids.len(),
                Change::Remove { .. } => 0,
            })
            .sum()
    }

    pub fn removed(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, Change::Remove { .. }))
            .count()
    }

    fn push_insert(&mut self, index: usize, id: ImageId) {
        if let Some(Change::Insert { index: start, ids }) = self.changes.last_mut() {
            if *start + ids.len() == index {
                ids.push(id);
                return;
            }
        }
        self.changes.push(Change::Insert { index, ids: vec![id] });
    }

    fn push_remove(&mut self, index: usize, id: ImageId) {
        self.changes.push(Change::Remove { index, id });
    }
}

pub type MediaFilter = fn(&ImageRecord) -> bool;

pub fn supported_media(record: &ImageRecord) -> bool {
    !record.image().is_video()
}

/// Where each incoming key lands once merged into `existing`. Both slices
/// must be sorted.
pub fn plan_insertions(existing: &[OrderingKey], incoming: &[OrderingKey]) -> Vec<usize> {
    incoming
        .iter()
        .enumerate()
        .map(|(offset, key)| existing.partition_point(|k| k < key) + offset)
        .collect()
}

/// The ordered, filtered list of presentation items. Owns every item; the
/// rest of the gallery refers to them by id or output index.
pub struct LiveView {
    filter: MediaFilter,
    order: SearchPageOrder,
    items: Vec<Option<PresentationItem>>,
    by_id: HashMap<ImageId, ItemKey>,
    output: Vec<ItemKey>,
    // Synthesized items sit in front of the sorted run.
    pinned: usize,
    constructed: usize,
}

impl Default for LiveView {
    fn default() -> Self {
        Self::new(supported_media)
    }
}

impl LiveView {
    pub fn new(filter: MediaFilter) -> Self {
        Self {
            filter,
            order: SearchPageOrder,
            items: Vec::new(),
            by_id: HashMap::new(),
            output: Vec::new(),
            pinned: 0,
            constructed: 0,
        }
    }

    /// Merges newly added source records into the output, skipping filtered
    /// records and ids that already have an item.
    pub fn apply(&mut self, delta: &[ImageRecord]) -> ChangeSet {
        let mut seen = HashSet::new();
        let mut incoming: Vec<ImageRecord> = delta
            .iter()
            .filter(|r| (self.filter)(*r))
            .filter(|r| !self.by_id.contains_key(&r.id()) && seen.insert(r.id()))
            .cloned()
            .collect();
        let mut changes = ChangeSet::default();
        if incoming.is_empty() {
            return changes;
        }
        self.order.sort(&mut incoming);

        let existing: Vec<OrderingKey> = self.output[self.pinned..]
            .iter()
            .map(|key| self.item(*key).record().key())
            .collect();
        let incoming_keys: Vec<OrderingKey> = incoming.iter().map(ImageRecord::key).collect();
        let positions = plan_insertions(&existing, &incoming_keys);

        for (record, position) in incoming.into_iter().zip(positions) {
            let id = record.id();
            let key = self.construct(PresentationItem::new(record));
            let index = self.pinned + position;
            self.output.insert(index, key);
            changes.push_insert(index, id);
        }
        debug!(inserted = changes.inserted(), len = self.len(), "live view updated");
        changes
    }

    pub fn pin_front(&mut self, item: PresentationItem) -> Option<ChangeSet> {
        if self.by_id.contains_key(&item.id()) {
            return None;
        }
        let id = item.id();
        let key = self.construct(item);
        self.output.insert(0, key);
        self.pinned += 1;
        let mut changes = ChangeSet::default();
        changes.push_insert(0, id);
        Some(changes)
    }

    pub fn remove(&mut self, ids: &[ImageId]) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for &id in ids {
            let Some(key) = self.by_id.remove(&id) else {
                continue;
            };
            let Some(index) = self.output.iter().position(|k| *k == key) else {
                continue;
            };
            self.output.remove(index);
            if index < self.pinned {
                self.pinned -= 1;
            }
            if let Some(mut item) = self.items[key.0].take() {
                item.dispose();
            }
            changes.push_remove(index, id);
        }
        changes
    }

    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    pub fn constructed(&self) -> usize {
        self.constructed
    }

    pub fn get(&self, index: usize) -> Option<&PresentationItem> {
        self.output.get(index).map(|key| self.item(*key))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PresentationItem> {
        let key = *self.output.get(index)?;
        self.items[key.0].as_mut()
    }

    pub fn find(&self, id: ImageId) -> Option<&PresentationItem> {
        self.by_id.get(&id).map(|key| self.item(*key))
    }

    pub fn find_mut(&mut self, id: ImageId) -> Option<&mut PresentationItem> {
        let key = *self.by_id.get(&id)?;
        self.items[key.0].as_mut()
    }

    pub fn index_of(&self, id: ImageId) -> Option<usize> {
        let key = self.by_id.get(&id)?;
        self.output.iter().position(|k| k == key)
    }

    pub fn item_key(&self, id: ImageId) -> Option<ItemKey> {
        self.by_id.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PresentationItem> + '_ {
        self.output.iter().map(|key| self.item(*key))
    }

    pub fn ids(&self) -> Vec<ImageId> {
        self.iter().map(PresentationItem::id).collect()
    }

    fn construct(&mut self, item: PresentationItem) -> ItemKey {
        let key = ItemKey(self.items.len());
        self.by_id.insert(item.id(), key);
        self.items.push(Some(item));
        self.constructed += 1;
        key
    }

    fn item(&self, key: ItemKey) -> &PresentationItem {
        self.items[key.0]
            .as_ref()
            .expect("output refers to a disposed item")
    }
}
