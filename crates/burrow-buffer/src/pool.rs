//! Buffer pool manager.

use crate::frame::{BufferFrame, FrameId};
use crate::page_table::PageTable;
use crate::replacer::{ClockReplacer, Replacer};
use burrow_common::page::{PageId, PAGE_SIZE};
use burrow_common::{IndexError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A dirty page that was evicted from the buffer pool.
///
/// The caller decides whether it must be written back; a write-through
/// caller can discard it.
#[derive(Debug)]
pub struct EvictedPage {
    pub page_id: PageId,
    pub data: Box<[u8; PAGE_SIZE]>,
}

/// Configuration for the buffer pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub num_frames: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self { num_frames: 1024 }
    }
}

/// Buffer pool manager.
///
/// Manages a fixed-size pool of page frames:
/// - page table mapping resident pages to frames
/// - free list for frames that never held a page
/// - clock replacement for eviction
/// - pin counting so callers can hold pages across calls
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Array of buffer frames.
    frames: Vec<BufferFrame>,
    /// Page to frame mapping.
    page_table: PageTable,
    /// Frames that have never held a page.
    free_list: Mutex<Vec<FrameId>>,
    /// Page replacement policy.
    replacer: ClockReplacer,
}

impl BufferPool {
    /// Creates a new buffer pool.
    pub fn new(config: BufferPoolConfig) -> Self {
        let num_frames = config.num_frames;

        let frames: Vec<_> = (0..num_frames)
            .map(|i| BufferFrame::new(FrameId(i as u32)))
            .collect();

        // All frames start free; pop order is irrelevant.
        let free_list: Vec<_> = (0..num_frames).map(|i| FrameId(i as u32)).collect();

        Self {
            config,
            frames,
            page_table: PageTable::new(num_frames),
            free_list: Mutex::new(free_list),
            replacer: ClockReplacer::new(num_frames),
        }
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Returns the number of pages currently resident.
    pub fn page_count(&self) -> usize {
        self.page_table.len()
    }

    /// Returns true if a page is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.page_table.contains(page_id)
    }

    #[inline]
    fn frame(&self, frame_id: FrameId) -> &BufferFrame {
        &self.frames[frame_id.0 as usize]
    }

    /// Fetches a resident page, pinning it.
    ///
    /// Returns None if the page is not in the pool; the caller then reads
    /// it from disk and hands it to [`BufferPool::load_page`].
    pub fn fetch_page(&self, page_id: PageId) -> Option<&BufferFrame> {
        let frame_id = self.page_table.get(page_id)?;
        self.replacer.record_access(frame_id);
        let frame = self.frame(frame_id);
        frame.pin();
        Some(frame)
    }

    /// Inserts a page into the pool, pinning it.
    ///
    /// A page that is already resident keeps its frame; the index
    /// rewrites its meta page this way on every root change. Any dirty
    /// page evicted to make room is handed back to the caller.
    pub fn new_page(&self, page_id: PageId) -> Result<(&BufferFrame, Option<EvictedPage>)> {
        if let Some(frame) = self.fetch_page(page_id) {
            return Ok((frame, None));
        }

        let (frame_id, evicted) = self.claim_frame()?;
        let frame = self.frame(frame_id);
        frame.reset();
        frame.set_page_id(Some(page_id));
        frame.pin();
        self.page_table.insert(page_id, frame_id);
        self.replacer.record_access(frame_id);

        Ok((frame, evicted))
    }

    /// Loads page bytes read from disk into the pool, pinning the page.
    pub fn load_page(
        &self,
        page_id: PageId,
        data: &[u8],
    ) -> Result<(&BufferFrame, Option<EvictedPage>)> {
        let (frame, evicted) = self.new_page(page_id)?;
        frame.copy_from(data);
        Ok((frame, evicted))
    }

    /// Finds a frame for a new page: free list first, then eviction of
    /// an unpinned frame.
    fn claim_frame(&self) -> Result<(FrameId, Option<EvictedPage>)> {
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok((frame_id, None));
        }

        let victim = self
            .replacer
            .evict(&|candidate| !self.frame(candidate).is_pinned())
            .ok_or(IndexError::BufferPoolFull)?;

        Ok((victim, self.detach(victim)))
    }

    /// Unmaps whatever page a victim frame holds, handing back its data
    /// if it was dirty.
    fn detach(&self, frame_id: FrameId) -> Option<EvictedPage> {
        let frame = self.frame(frame_id);
        let page_id = frame.page_id()?;
        self.page_table.remove(page_id);

        if !frame.is_dirty() {
            return None;
        }
        let mut data = Box::new([0u8; PAGE_SIZE]);
        data.copy_from_slice(&frame.read_data()[..]);
        Some(EvictedPage { page_id, data })
    }

    /// Releases one pin on a resident page, marking the frame dirty when
    /// the caller modified it.
    ///
    /// A page with pin count zero becomes an eviction candidate. Returns
    /// false for pages the pool does not hold.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        match self.page_table.get(page_id) {
            Some(frame_id) => {
                let frame = self.frame(frame_id);
                if is_dirty {
                    frame.set_dirty(true);
                }
                frame.unpin();
                true
            }
            None => false,
        }
    }

    /// Flushes one page through the callback if it is dirty.
    ///
    /// Returns true if the page was flushed.
    pub fn flush_page<F>(&self, page_id: PageId, mut flush_fn: F) -> Result<bool>
    where
        F: FnMut(PageId, &[u8]) -> Result<()>,
    {
        let flushed = self.flush_where(|candidate| candidate == page_id, &mut flush_fn)?;
        Ok(flushed > 0)
    }

    /// Flushes every dirty page through the callback.
    ///
    /// Returns the number of pages flushed.
    pub fn flush_all<F>(&self, mut flush_fn: F) -> Result<usize>
    where
        F: FnMut(PageId, &[u8]) -> Result<()>,
    {
        self.flush_where(|_| true, &mut flush_fn)
    }

    /// Flushes every dirty page belonging to one file.
    ///
    /// Returns the number of pages flushed.
    pub fn flush_file<F>(&self, file_id: u32, mut flush_fn: F) -> Result<usize>
    where
        F: FnMut(PageId, &[u8]) -> Result<()>,
    {
        self.flush_where(|page_id| page_id.file_id == file_id, &mut flush_fn)
    }

    fn flush_where<P, F>(&self, matches: P, flush_fn: &mut F) -> Result<usize>
    where
        P: Fn(PageId) -> bool,
        F: FnMut(PageId, &[u8]) -> Result<()>,
    {
        let mut flushed = 0;
        for (page_id, frame_id) in self.page_table.snapshot() {
            if !matches(page_id) {
                continue;
            }
            let frame = self.frame(frame_id);
            if frame.is_dirty() {
                let data = frame.read_data();
                flush_fn(page_id, &**data)?;
                frame.set_dirty(false);
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut stats = BufferPoolStats {
            total_frames: self.config.num_frames,
            free_frames: self.free_count(),
            used_frames: self.page_table.len(),
            pinned_frames: 0,
            dirty_frames: 0,
        };

        for frame in &self.frames {
            if frame.page_id().is_none() {
                continue;
            }
            if frame.is_pinned() {
                stats.pinned_frames += 1;
            }
            if frame.is_dirty() {
                stats.dirty_frames += 1;
            }
        }

        stats
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of free frames.
    pub free_frames: usize,
    /// Number of frames holding pages.
    pub used_frames: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
}
