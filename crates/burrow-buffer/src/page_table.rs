//! Page table mapping resident pages to frames.

use crate::frame::FrameId;
use burrow_common::page::PageId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Maps PageIds to the frames currently holding them.
pub struct PageTable {
    entries: RwLock<HashMap<PageId, FrameId>>,
}

impl PageTable {
    /// Creates a page table sized for `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Looks up the frame holding a page.
    #[inline]
    pub fn get(&self, page_id: PageId) -> Option<FrameId> {
        self.entries.read().get(&page_id).copied()
    }

    /// Returns true if the page is resident.
    #[inline]
    pub fn contains(&self, page_id: PageId) -> bool {
        self.entries.read().contains_key(&page_id)
    }

    /// Maps a page to a frame, replacing any previous mapping.
    pub fn insert(&self, page_id: PageId, frame_id: FrameId) {
        self.entries.write().insert(page_id, frame_id);
    }

    /// Removes the mapping for a page, returning the frame it occupied.
    pub fn remove(&self, page_id: PageId) -> Option<FrameId> {
        self.entries.write().remove(&page_id)
    }

    /// Number of resident pages.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no pages are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all (page, frame) mappings.
    ///
    /// Taken as a copy so callers can do I/O without holding the table lock.
    pub fn snapshot(&self) -> Vec<(PageId, FrameId)> {
        self.entries
            .read()
            .iter()
            .map(|(&p, &f)| (p, f))
            .collect()
    }
}
