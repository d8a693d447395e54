//! Buffered page access for one index file.

use crate::file::IndexFile;
use burrow_buffer::BufferPool;
use burrow_common::page::{PageId, PageNo, PAGE_SIZE};
use burrow_common::Result;
use std::sync::Arc;

/// Pairs an [`IndexFile`] with the shared [`BufferPool`].
///
/// Every page the tree touches goes through here: reads pin the frame,
/// copy the page out and unpin; writes update the cached frame, mark it
/// dirty at unpin time, and write through to the file in the same call.
/// Write-through keeps the file current with the order mutations happen
/// in (leaf, then path bottom-up, then meta), so eviction never needs a
/// write-back.
pub struct PageCache {
    file: IndexFile,
    pool: Arc<BufferPool>,
}

impl PageCache {
    /// Creates a cache over an open index file.
    pub fn new(file: IndexFile, pool: Arc<BufferPool>) -> Self {
        Self { file, pool }
    }

    /// Runtime id of the underlying file.
    pub fn file_id(&self) -> u32 {
        self.file.file_id()
    }

    /// Number of allocated pages in the underlying file.
    pub fn num_pages(&self) -> u32 {
        self.file.num_pages()
    }

    /// Allocates a fresh page in the underlying file.
    pub fn allocate(&self) -> Result<PageNo> {
        self.file.allocate_page()
    }

    /// Reads a page, preferring the buffer pool over the file.
    pub fn read(&self, page_no: PageNo) -> Result<Box<[u8; PAGE_SIZE]>> {
        let page_id = self.page_id(page_no);

        if let Some(frame) = self.pool.fetch_page(page_id) {
            let mut data = Box::new([0u8; PAGE_SIZE]);
            data.copy_from_slice(&**frame.read_data());
            self.pool.unpin_page(page_id, false);
            return Ok(data);
        }

        let data = self.file.read_page(page_no)?;
        // Evicted pages were written through when dirtied; nothing to save.
        let (_frame, _evicted) = self.pool.load_page(page_id, &data[..])?;
        self.pool.unpin_page(page_id, false);
        Ok(data)
    }

    /// Overwrites a page, updating the cached frame and the file.
    pub fn write(&self, page_no: PageNo, data: &[u8; PAGE_SIZE]) -> Result<()> {
        let page_id = self.page_id(page_no);

        let (frame, _evicted) = self.pool.new_page(page_id)?;
        frame.copy_from(data);
        self.pool.unpin_page(page_id, true);

        self.file.write_page(page_no, data)
    }

    /// Pins a page so it stays resident across calls. Pairs with
    /// [`PageCache::unpin`].
    pub fn pin(&self, page_no: PageNo) -> Result<()> {
        let page_id = self.page_id(page_no);

        if self.pool.fetch_page(page_id).is_some() {
            return Ok(());
        }

        let data = self.file.read_page(page_no)?;
        // load_page leaves the page pinned for us.
        self.pool.load_page(page_id, &data[..])?;
        Ok(())
    }

    /// Releases a pin taken with [`PageCache::pin`].
    pub fn unpin(&self, page_no: PageNo) {
        self.pool.unpin_page(self.page_id(page_no), false);
    }

    /// Flushes this file's dirty pages through the buffer manager, then
    /// syncs the file.
    pub fn flush(&self) -> Result<usize> {
        let flushed = self.pool.flush_file(self.file.file_id(), |page_id, data| {
            let mut page = [0u8; PAGE_SIZE];
            page.copy_from_slice(data);
            self.file.write_page(page_id.page_no, &page)
        })?;
        self.file.flush()?;
        Ok(flushed)
    }

    fn page_id(&self, page_no: PageNo) -> PageId {
        PageId::new(self.file.file_id(), page_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::IndexFileConfig;
    use burrow_buffer::BufferPoolConfig;
    use tempfile::tempdir;

    fn test_cache(dir: &tempfile::TempDir, frames: usize) -> PageCache {
        let config = IndexFileConfig {
            data_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
        };
        let file = IndexFile::create(&config, "rel.0").unwrap();
        let pool = Arc::new(BufferPool::new(BufferPoolConfig { num_frames: frames }));
        PageCache::new(file, pool)
    }

    #[test]
    fn test_cache_write_then_read() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir, 8);

        let page_no = cache.allocate().unwrap();
        let mut data = [0u8; PAGE_SIZE];
        data[0] = 0x42;
        cache.write(page_no, &data).unwrap();

        assert_eq!(cache.read(page_no).unwrap()[0], 0x42);
    }

    #[test]
    fn test_cache_read_survives_eviction() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir, 2);

        // Write more pages than frames so earlier pages get evicted.
        let mut pages = vec![];
        for i in 0..5u8 {
            let page_no = cache.allocate().unwrap();
            let mut data = [0u8; PAGE_SIZE];
            data[0] = i;
            cache.write(page_no, &data).unwrap();
            pages.push(page_no);
        }

        // Write-through means every page reads back correctly.
        for (i, page_no) in pages.iter().enumerate() {
            assert_eq!(cache.read(*page_no).unwrap()[0], i as u8);
        }
    }

    #[test]
    fn test_cache_pin_keeps_page_resident() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir, 8);

        let page_no = cache.allocate().unwrap();
        let data = [7u8; PAGE_SIZE];
        cache.write(page_no, &data).unwrap();

        cache.pin(page_no).unwrap();
        assert_eq!(cache.read(page_no).unwrap()[0], 7);
        cache.unpin(page_no);
    }

    #[test]
    fn test_cache_flush_clears_dirty_pages() {
        let dir = tempdir().unwrap();
        let cache = test_cache(&dir, 8);

        let page_no = cache.allocate().unwrap();
        cache.write(page_no, &[1u8; PAGE_SIZE]).unwrap();

        // First flush writes the dirty frame, second finds nothing dirty.
        assert_eq!(cache.flush().unwrap(), 1);
        assert_eq!(cache.flush().unwrap(), 0);
    }
}
