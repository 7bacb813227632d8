use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::error::GalleryError;

/// Held for as long as a page fetch is outstanding. Dropping it, on whatever
/// path, lets the next fetch start.
#[derive(Debug)]
pub struct PageFetchGuard {
    page: u32,
    flag: Arc<AtomicBool>,
}

impl PageFetchGuard {
    pub fn page(&self) -> u32 {
        self.page
    }
}

impl Drop for PageFetchGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Which search pages have been merged, and whether one is being fetched.
#[derive(Debug, Default)]
pub struct Pagination {
    fetched: BTreeSet<u32>,
    in_flight: Arc<AtomicBool>,
    exhausted: bool,
    total: Option<u32>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the right to fetch `page`.
    ///
    /// Returns `Ok(None)` when a fetch is already in flight or the page has
    /// been merged before; both are expected and not errors.
    pub fn try_begin(&self, page: u32, page_size: u32) -> Result<Option<PageFetchGuard>, GalleryError> {
        if page < 1 || page_size == 0 {
            return Err(GalleryError::InvalidPageRequest { page, page_size });
        }
        if self.fetched.contains(&page) {
            return Ok(None);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }
        Ok(Some(PageFetchGuard {
            page,
            flag: Arc::clone(&self.in_flight),
        }))
    }

    /// Records a successfully merged page. An empty page past every page seen
    /// so far means the search has no more results.
    pub fn complete(&mut self, page: u32, received: usize, total: u32) {
        let beyond = page > self.max_fetched();
        self.fetched.insert(page);
        self.total = Some(total);
        if received == 0 && beyond {
            self.exhausted = true;
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn max_fetched(&self) -> u32 {
        self.fetched.last().copied().unwrap_or(0)
    }

    pub fn min_fetched(&self) -> Option<u32> {
        self.fetched.first().copied()
    }

    /// The page a threshold crossing should ask for, if any.
    pub fn next_page(&self) -> Option<u32> {
        (!self.exhausted).then(|| self.max_fetched() + 1)
    }

    /// The page before the earliest merged one, for feeds that did not start
    /// at page 1.
    pub fn previous_page(&self) -> Option<u32> {
        self.min_fetched().filter(|&page| page > 1).map(|page| page - 1)
    }

    pub fn has_fetched(&self, page: u32) -> bool {
        self.fetched.contains(&page)
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.fetched.iter().copied()
    }

    /// Total number of results the search reported, once any page arrived.
    pub fn total(&self) -> Option<u32> {
        self.total
    }
}

/// True when at most `threshold` items remain after `index` in a list of `len`.
pub fn is_near_end(index: usize, len: usize, threshold: usize) -> bool {
    len == 0 || len.saturating_sub(1).saturating_sub(index) <= threshold
}

pub fn is_near_start(index: usize, threshold: usize) -> bool {
    index <= threshold
}
