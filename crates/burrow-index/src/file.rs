//! Paged index file I/O.

use burrow_common::page::{PageNo, PAGE_SIZE};
use burrow_common::{IndexError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

/// Configuration for index files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFileConfig {
    /// Base directory for index files.
    pub data_dir: PathBuf,
    /// Enable fsync after writes.
    pub fsync_enabled: bool,
}

impl Default for IndexFileConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            fsync_enabled: true,
        }
    }
}

/// Process-unique ids handed to open files, so the buffer manager can
/// tell pages of different files apart. Never stored on disk.
static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(1);

/// A single index file, read and written one page at a time.
///
/// Pages are numbered from 1; page `p` lives at byte offset
/// `(p - 1) * PAGE_SIZE`. Page number 0 is reserved as "no page".
pub struct IndexFile {
    /// Runtime identifier for the buffer manager.
    file_id: u32,
    /// Path to the file.
    path: PathBuf,
    /// Whether writes are followed by fsync.
    fsync_enabled: bool,
    /// Open handle and page count.
    inner: Mutex<FileInner>,
}

struct FileInner {
    file: File,
    num_pages: u32,
}

impl IndexFile {
    /// Returns true if the named index file exists under the configured
    /// data directory.
    pub fn exists(config: &IndexFileConfig, name: &str) -> bool {
        config.data_dir.join(name).exists()
    }

    /// Opens an existing index file.
    pub fn open(config: &IndexFileConfig, name: &str) -> Result<Self> {
        let path = config.data_dir.join(name);
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Self::from_handle(file, path, config.fsync_enabled)
    }

    /// Creates a new, empty index file. Truncates any existing file of
    /// the same name.
    pub fn create(config: &IndexFileConfig, name: &str) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let path = config.data_dir.join(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Self::from_handle(file, path, config.fsync_enabled)
    }

    fn from_handle(file: File, path: PathBuf, fsync_enabled: bool) -> Result<Self> {
        let file_size = file.metadata()?.len();
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file_id: NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed),
            path,
            fsync_enabled,
            inner: Mutex::new(FileInner { file, num_pages }),
        })
    }

    /// Returns the runtime file id.
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of allocated pages.
    pub fn num_pages(&self) -> u32 {
        self.inner.lock().num_pages
    }

    /// Allocates a new zeroed page at the end of the file.
    ///
    /// The first allocation returns page number 1.
    pub fn allocate_page(&self) -> Result<PageNo> {
        let mut inner = self.inner.lock();
        let page_no = inner.num_pages + 1;

        let offset = (page_no as u64 - 1) * PAGE_SIZE as u64;
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&[0u8; PAGE_SIZE])?;
        if self.fsync_enabled {
            inner.file.sync_all()?;
        }

        inner.num_pages = page_no;
        Ok(page_no)
    }

    /// Reads an allocated page.
    pub fn read_page(&self, page_no: PageNo) -> Result<Box<[u8; PAGE_SIZE]>> {
        let mut inner = self.inner.lock();
        if page_no == 0 || page_no > inner.num_pages {
            return Err(IndexError::PageNotFound {
                page_no,
                num_pages: inner.num_pages,
            });
        }

        let offset = (page_no as u64 - 1) * PAGE_SIZE as u64;
        inner.file.seek(SeekFrom::Start(offset))?;

        let mut buffer = Box::new([0u8; PAGE_SIZE]);
        inner.file.read_exact(&mut buffer[..])?;
        Ok(buffer)
    }

    /// Overwrites an allocated page.
    pub fn write_page(&self, page_no: PageNo, data: &[u8; PAGE_SIZE]) -> Result<()> {
        let mut inner = self.inner.lock();
        if page_no == 0 || page_no > inner.num_pages {
            return Err(IndexError::PageNotFound {
                page_no,
                num_pages: inner.num_pages,
            });
        }

        let offset = (page_no as u64 - 1) * PAGE_SIZE as u64;
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(data)?;

        if self.fsync_enabled {
            inner.file.sync_all()?;
        }
        Ok(())
    }

    /// Syncs all pending writes to storage.
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().file.sync_all()?;
        Ok(())
    }
}

impl Drop for IndexFile {
    fn drop(&mut self) {
        let _ = self.inner.lock().file.sync_all();
    }
}
