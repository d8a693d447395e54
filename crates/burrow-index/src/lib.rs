//! Disk-resident B+ tree index for Burrow.
//!
//! This crate provides:
//! - A paged index file, one file per index, pages numbered from 1
//! - Buffered page access routing every read and write through the
//!   buffer manager
//! - The B+ tree engine: typed node layouts, search, insert with split
//!   propagation, range scans, and the index lifecycle
//! - The record-source seam used to build an index from its base relation

mod btree;
mod cache;
mod file;
mod relation;

pub use btree::{
    leaf_capacity, non_leaf_capacity, BTreeIndex, IndexKey, IndexMeta, KeyType, LeafNode,
    NonLeafNode, ScanOp, StringKey, RELATION_NAME_SIZE,
};
pub use cache::PageCache;
pub use file::{IndexFile, IndexFileConfig};
pub use relation::{EmptySource, RecordSource, SliceSource};
