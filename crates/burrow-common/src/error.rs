//! Error types for Burrow.

use crate::types::AttrType;
use thiserror::Error;

/// Result type alias using IndexError.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur in Burrow operations.
#[derive(Debug, Error)]
pub enum IndexError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Paged file errors
    #[error("Page not found: {page_no} (file has {num_pages} pages)")]
    PageNotFound { page_no: u32, num_pages: u32 },

    #[error("Buffer pool full, unable to allocate frame")]
    BufferPoolFull,

    // Index meta errors
    #[error("Index meta mismatch on {field}: file has {found}, caller passed {expected}")]
    BadIndexMeta {
        field: &'static str,
        expected: String,
        found: String,
    },

    // Key errors
    #[error("Key type mismatch: index is {expected}, key is {found}")]
    KeyTypeMismatch { expected: AttrType, found: AttrType },

    #[error("Record too short: key needs {need} bytes at offset {offset}, record has {len}")]
    ShortRecord {
        offset: usize,
        need: usize,
        len: usize,
    },

    #[error("Key not found")]
    KeyNotFound,

    // Scan errors
    #[error("Bad scan opcodes: low operator must be GT or GTE, high must be LT or LTE")]
    BadOpcodes,

    #[error("Bad scan range: low value is greater than high value")]
    BadScanRange,

    #[error("No scan is currently executing")]
    ScanNotInitialized,

    #[error("Index scan completed")]
    ScanCompleted,
}
