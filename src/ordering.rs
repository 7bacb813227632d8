use std::cmp::Ordering;

use crate::api::ImageRecord;

/// Position of a record in the search results: page first, then index within
/// the page. Unique per record, so the order is total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderingKey {
    pub page: u32,
    pub position: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPageOrder;

impl SearchPageOrder {
    pub fn compare(&self, a: &ImageRecord, b: &ImageRecord) -> Ordering {
        a.key().cmp(&b.key())
    }

    pub fn sort(&self, records: &mut [ImageRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}
