//! The B+ tree index: lifecycle, insertion, and range scans.

use super::key::{IndexKey, KeyType, StringKey};
use super::meta::IndexMeta;
use super::node::{leaf_capacity, non_leaf_capacity, LeafNode, NonLeafNode};
use crate::cache::PageCache;
use crate::file::{IndexFile, IndexFileConfig};
use crate::relation::RecordSource;
use burrow_buffer::BufferPool;
use burrow_common::page::{PageNo, INVALID_PAGE_NO};
use burrow_common::{AttrType, IndexError, RecordId, Result};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Comparison operators accepted by [`BTreeIndex::start_scan`].
///
/// The low bound takes `Gt`/`Gte`, the high bound `Lt`/`Lte`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOp {
    Lt,
    Lte,
    Gte,
    Gt,
}

/// State of the one in-progress scan.
///
/// The low bound is consumed entirely while positioning the cursor in
/// `start_scan`; only the upper bound travels with the scan.
struct ScanState {
    /// Leaf currently being walked. Held pinned in the buffer pool.
    current_page_no: PageNo,
    /// Slot of the next entry to emit within that leaf.
    next_entry: usize,
    high: IndexKey,
    high_op: ScanOp,
}

/// A B+ tree index over a single attribute of a base relation.
///
/// One index instance supports one scan at a time; starting a new scan
/// ends the previous one. Instances are not meant to be shared across
/// threads.
pub struct BTreeIndex {
    /// Buffered access to the index file.
    cache: PageCache,
    /// `<relation>.<attrByteOffset>`, the index file's name.
    index_name: String,
    /// In-memory copy of the meta page; rewritten on root changes.
    meta: IndexMeta,
    /// Key slots per leaf for this attribute type.
    leaf_occupancy: usize,
    /// Key slots per non-leaf for this attribute type.
    node_occupancy: usize,
    /// The in-progress scan, if any.
    scan: Option<ScanState>,
    /// Set once close() has run; Drop then skips the flush.
    closed: bool,
}

impl BTreeIndex {
    /// Page number of the initial root leaf. While the root still has
    /// this number the tree is a single leaf.
    const INITIAL_ROOT_PAGE_NO: PageNo = 2;

    /// Opens the index for `relation_name` over the attribute at
    /// `attr_byte_offset`.
    ///
    /// If the index file `<relation>.<attrByteOffset>` exists, its meta
    /// page is checked against the arguments and the relation is not
    /// re-scanned. Otherwise the file is created with the meta page and
    /// an empty root leaf, and every record of `source` is inserted.
    pub fn open(
        relation_name: &str,
        attr_byte_offset: usize,
        attr_type: AttrType,
        pool: Arc<BufferPool>,
        config: &IndexFileConfig,
        source: &mut dyn RecordSource,
    ) -> Result<Self> {
        let index_name = format!("{}.{}", relation_name, attr_byte_offset);

        let (leaf_occupancy, node_occupancy) = occupancies(attr_type);

        if IndexFile::exists(config, &index_name) {
            let file = IndexFile::open(config, &index_name)?;
            let cache = PageCache::new(file, pool);
            let meta = IndexMeta::from_page(&*cache.read(IndexMeta::PAGE_NO)?)?;
            meta.validate(relation_name, attr_byte_offset, attr_type)?;
            info!(index = %index_name, root = meta.root_page_no, "using existing index file");

            return Ok(Self {
                cache,
                index_name,
                meta,
                leaf_occupancy,
                node_occupancy,
                scan: None,
                closed: false,
            });
        }

        info!(index = %index_name, %attr_type, "creating index file");
        let file = IndexFile::create(config, &index_name)?;
        let cache = PageCache::new(file, pool);

        let meta_page_no = cache.allocate()?;
        let root_page_no = cache.allocate()?;
        debug_assert_eq!(meta_page_no, IndexMeta::PAGE_NO);
        debug_assert_eq!(root_page_no, Self::INITIAL_ROOT_PAGE_NO);

        // The tree starts as a single empty leaf.
        match attr_type {
            AttrType::Integer => cache.write(root_page_no, LeafNode::<i32>::new().as_bytes())?,
            AttrType::Double => cache.write(root_page_no, LeafNode::<f64>::new().as_bytes())?,
            AttrType::String => cache.write(root_page_no, LeafNode::<StringKey>::new().as_bytes())?,
        }

        let meta = IndexMeta::new(relation_name, attr_byte_offset, attr_type, root_page_no);
        let mut index = Self {
            cache,
            index_name,
            meta,
            leaf_occupancy,
            node_occupancy,
            scan: None,
            closed: false,
        };
        index.write_meta()?;
        index.build_from_relation(source)?;
        Ok(index)
    }

    /// Name of the index file, `<relation>.<attrByteOffset>`.
    pub fn index_file_name(&self) -> &str {
        &self.index_name
    }

    /// Name of the base relation.
    pub fn relation(&self) -> &str {
        self.meta.relation()
    }

    /// Type of the indexed attribute.
    pub fn attr_type(&self) -> AttrType {
        self.meta.attr_type
    }

    /// Byte offset of the indexed attribute within a record.
    pub fn attr_byte_offset(&self) -> usize {
        self.meta.attr_byte_offset as usize
    }

    /// Page number of the current root.
    pub fn root_page_no(&self) -> PageNo {
        self.meta.root_page_no
    }

    /// Key slots per leaf node.
    pub fn leaf_occupancy(&self) -> usize {
        self.leaf_occupancy
    }

    /// Key slots per non-leaf node.
    pub fn node_occupancy(&self) -> usize {
        self.node_occupancy
    }

    /// Buffered page access for this index's file.
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Inserts one `(key, rid)` entry.
    ///
    /// The key must match the index's attribute type. The sentinel value
    /// (-1 for numeric keys, empty for strings) is reserved and must not
    /// be supplied.
    pub fn insert_entry(&mut self, key: &IndexKey, rid: RecordId) -> Result<()> {
        match self.meta.attr_type {
            AttrType::Integer => {
                let key = i32::from_key(key)?;
                self.insert_entry_typed(key, rid)
            }
            AttrType::Double => {
                let key = f64::from_key(key)?;
                self.insert_entry_typed(key, rid)
            }
            AttrType::String => {
                let key = StringKey::from_key(key)?;
                self.insert_entry_typed(key, rid)
            }
        }
    }

    /// Begins a range scan over the half-open interval described by the
    /// two bounds.
    ///
    /// `low_op` must be `Gt` or `Gte` and `high_op` must be `Lt` or
    /// `Lte`, otherwise [`IndexError::BadOpcodes`]. A low bound above
    /// the high bound fails with [`IndexError::BadScanRange`]. Any scan
    /// already in progress is ended first.
    pub fn start_scan(
        &mut self,
        low: &IndexKey,
        low_op: ScanOp,
        high: &IndexKey,
        high_op: ScanOp,
    ) -> Result<()> {
        if !matches!(low_op, ScanOp::Gt | ScanOp::Gte) || !matches!(high_op, ScanOp::Lt | ScanOp::Lte)
        {
            return Err(IndexError::BadOpcodes);
        }

        match self.meta.attr_type {
            AttrType::Integer => {
                let low = i32::from_key(low)?;
                let high = i32::from_key(high)?;
                self.start_scan_typed(low, high, low_op, high_op)
            }
            AttrType::Double => {
                let low = f64::from_key(low)?;
                let high = f64::from_key(high)?;
                self.start_scan_typed(low, high, low_op, high_op)
            }
            AttrType::String => {
                let low = StringKey::from_key(low)?;
                let high = StringKey::from_key(high)?;
                self.start_scan_typed(low, high, low_op, high_op)
            }
        }
    }

    /// Returns the record id of the next entry matching the scan.
    ///
    /// Fails with [`IndexError::ScanNotInitialized`] when no scan is in
    /// progress, and with [`IndexError::ScanCompleted`] once the range
    /// is exhausted; the latter signals normal termination.
    pub fn scan_next(&mut self) -> Result<RecordId> {
        if self.scan.is_none() {
            return Err(IndexError::ScanNotInitialized);
        }
        match self.meta.attr_type {
            AttrType::Integer => self.scan_next_typed::<i32>(),
            AttrType::Double => self.scan_next_typed::<f64>(),
            AttrType::String => self.scan_next_typed::<StringKey>(),
        }
    }

    /// Ends the in-progress scan, releasing the leaf it held.
    pub fn end_scan(&mut self) -> Result<()> {
        match self.scan.take() {
            Some(scan) => {
                self.cache.unpin(scan.current_page_no);
                Ok(())
            }
            None => Err(IndexError::ScanNotInitialized),
        }
    }

    /// Closes the index: ends any live scan, flushes this file's dirty
    /// pages through the buffer manager, and syncs the file.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.closed = true;
        if self.scan.is_some() {
            let _ = self.end_scan();
        }
        let flushed = self.cache.flush()?;
        debug!(index = %self.index_name, flushed, "index closed");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------

    /// Streams every record of the base relation into the index.
    fn build_from_relation(&mut self, source: &mut dyn RecordSource) -> Result<()> {
        let mut records = 0u64;
        while let Some((rid, record)) = source.next_record()? {
            let key = IndexKey::from_record(self.meta.attr_type, &record, self.attr_byte_offset())?;
            self.insert_entry(&key, rid)?;
            records += 1;
        }
        info!(index = %self.index_name, records, "indexed base relation");
        Ok(())
    }

    /// Rewrites the meta page. Called whenever the root changes.
    fn write_meta(&self) -> Result<()> {
        self.cache.write(IndexMeta::PAGE_NO, &self.meta.to_page())
    }

    // -------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------

    /// Root-to-leaf descent for `key`.
    ///
    /// Returns the leaf's page number plus the non-leaf pages visited,
    /// in descent order; the leaf itself is not on the path. While the
    /// root is still the initial leaf the path is empty.
    fn find_leaf<K: KeyType>(&self, key: &K) -> Result<(PageNo, Vec<PageNo>)> {
        let mut current = self.meta.root_page_no;
        let mut path = Vec::new();

        if current == Self::INITIAL_ROOT_PAGE_NO {
            return Ok((current, path));
        }

        loop {
            path.push(current);
            let node = NonLeafNode::<K>::from_bytes(self.cache.read(current)?);
            let next = node.search_child(key);
            if node.level() == 1 {
                // Children of this node are leaves.
                return Ok((next, path));
            }
            current = next;
        }
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Inserts into the target leaf. On a split, returns the new right
    /// page and the copied-up separator to propagate.
    fn insert_leaf<K: KeyType>(
        &mut self,
        leaf_page_no: PageNo,
        key: K,
        rid: RecordId,
    ) -> Result<Option<(PageNo, K)>> {
        let mut leaf = LeafNode::<K>::from_bytes(self.cache.read(leaf_page_no)?);

        if leaf.is_full() {
            let right_page_no = self.cache.allocate()?;
            let mut right = LeafNode::<K>::new();
            let split_key = leaf.split_insert(key, rid, &mut right, right_page_no);
            self.cache.write(right_page_no, right.as_bytes())?;
            self.cache.write(leaf_page_no, leaf.as_bytes())?;
            trace!(left = leaf_page_no, right = right_page_no, "leaf split");
            Ok(Some((right_page_no, split_key)))
        } else {
            leaf.insert(key, rid);
            self.cache.write(leaf_page_no, leaf.as_bytes())?;
            Ok(None)
        }
    }

    /// Inserts a `(child, key)` pair into a non-leaf on the propagation
    /// path. On a split, returns the new right page and the moved-up
    /// separator.
    ///
    /// `above_leaf` pins down the node's level: 1 for the non-leaf
    /// directly above the leaves, 0 for anything higher.
    fn insert_non_leaf<K: KeyType>(
        &mut self,
        page_no: PageNo,
        child_page_no: PageNo,
        key: K,
        above_leaf: bool,
    ) -> Result<Option<(PageNo, K)>> {
        let mut node = NonLeafNode::<K>::from_bytes(self.cache.read(page_no)?);
        node.set_level(if above_leaf { 1 } else { 0 });

        if node.is_full() {
            let right_page_no = self.cache.allocate()?;
            let mut right = NonLeafNode::<K>::new();
            let mid_key = node.split_insert(child_page_no, key, &mut right);
            self.cache.write(page_no, node.as_bytes())?;
            self.cache.write(right_page_no, right.as_bytes())?;
            trace!(left = page_no, right = right_page_no, "non-leaf split");
            Ok(Some((right_page_no, mid_key)))
        } else {
            node.insert(child_page_no, key);
            self.cache.write(page_no, node.as_bytes())?;
            Ok(None)
        }
    }

    /// Replaces the root after a split reached it.
    ///
    /// The new root holds the old root (or root leaf) as its leftmost
    /// child and the propagated pair as its only entry. The meta page is
    /// rewritten last.
    fn new_root<K: KeyType>(
        &mut self,
        child_page_no: PageNo,
        key: K,
        left_child: PageNo,
        above_leaf: bool,
    ) -> Result<()> {
        let root_page_no = self.cache.allocate()?;
        let mut root = NonLeafNode::<K>::new();
        root.set_level(if above_leaf { 1 } else { 0 });
        root.set_page_no(0, left_child);
        root.insert(child_page_no, key);
        self.cache.write(root_page_no, root.as_bytes())?;

        self.meta.root_page_no = root_page_no;
        self.write_meta()?;
        debug!(root = root_page_no, index = %self.index_name, "root promoted");
        Ok(())
    }

    /// The end-to-end insert protocol: descend, insert at the leaf, then
    /// propagate any split bottom-up along the remembered path, creating
    /// a new root if the split reaches the top.
    fn insert_entry_typed<K: KeyType>(&mut self, key: K, rid: RecordId) -> Result<()> {
        let (leaf_page_no, mut path) = self.find_leaf(&key)?;

        let mut carry = self.insert_leaf(leaf_page_no, key, rid)?;
        let mut above_leaf = true;

        // Walk the path bottom-up while splits keep propagating,
        // stopping short of the topmost entry (the root).
        while carry.is_some() && path.len() > 1 {
            if let (Some(pair), Some(page_no)) = (carry.take(), path.pop()) {
                carry = self.insert_non_leaf(page_no, pair.0, pair.1, above_leaf)?;
            }
            above_leaf = false;
        }

        if let Some((child_page_no, split_key)) = carry {
            match path.pop() {
                // The splitting node was the root leaf.
                None => self.new_root(child_page_no, split_key, leaf_page_no, above_leaf)?,
                // One non-leaf left: the root. If it splits too, a new
                // root goes above it with non-leaf children.
                Some(root_page_no) => {
                    if let Some((new_child, promoted)) =
                        self.insert_non_leaf(root_page_no, child_page_no, split_key, above_leaf)?
                    {
                        self.new_root(new_child, promoted, root_page_no, false)?;
                    }
                }
            }
        }

        Ok(())
    }

    // -------------------------------------------------------------------
    // Scan
    // -------------------------------------------------------------------

    fn start_scan_typed<K: KeyType>(
        &mut self,
        low: K,
        high: K,
        low_op: ScanOp,
        high_op: ScanOp,
    ) -> Result<()> {
        if low.key_cmp(&high) == Ordering::Greater {
            return Err(IndexError::BadScanRange);
        }

        // Starting a scan cancels any scan already in progress.
        if self.scan.is_some() {
            let _ = self.end_scan();
        }

        let (leaf_page_no, _path) = self.find_leaf(&low)?;
        let leaf = LeafNode::<K>::from_bytes(self.cache.read(leaf_page_no)?);
        let next_entry = leaf.lower_bound(&low);

        // The scan keeps its current leaf pinned until it moves on.
        self.cache.pin(leaf_page_no)?;
        self.scan = Some(ScanState {
            current_page_no: leaf_page_no,
            next_entry,
            high: high.into_key(),
            high_op,
        });

        // Position on the first candidate: step once past an exact match
        // when the low bound is exclusive, or past an empty slot. Running
        // off the end here just means the first scan_next reports
        // completion.
        let past_end = next_entry >= leaf_capacity::<K>() || leaf.key(next_entry).is_invalid();
        let exclusive_match = low_op == ScanOp::Gt
            && !past_end
            && leaf.key(next_entry).key_cmp(&low) == Ordering::Equal;
        if past_end || exclusive_match {
            match self.scan_next_typed::<K>() {
                Ok(_) | Err(IndexError::ScanCompleted) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    fn scan_next_typed<K: KeyType>(&mut self) -> Result<RecordId> {
        let (mut page_no, mut next_entry, high, high_op) = match &self.scan {
            Some(scan) => (
                scan.current_page_no,
                scan.next_entry,
                K::from_key(&scan.high)?,
                scan.high_op,
            ),
            None => return Err(IndexError::ScanNotInitialized),
        };

        let mut leaf = LeafNode::<K>::from_bytes(self.cache.read(page_no)?);

        // Off the end of this leaf: follow the sibling chain.
        if next_entry >= leaf_capacity::<K>() || leaf.key(next_entry).is_invalid() {
            let sibling = leaf.right_sibling();
            if sibling == INVALID_PAGE_NO {
                return Err(IndexError::ScanCompleted);
            }
            self.cache.pin(sibling)?;
            self.cache.unpin(page_no);
            page_no = sibling;
            next_entry = 0;
            leaf = LeafNode::<K>::from_bytes(self.cache.read(page_no)?);
        }

        let key = leaf.key(next_entry);
        let past_high = match high_op {
            ScanOp::Lt => key.key_cmp(&high) != Ordering::Less,
            _ => key.key_cmp(&high) == Ordering::Greater,
        };

        if past_high {
            self.store_scan_position(page_no, next_entry);
            return Err(IndexError::ScanCompleted);
        }

        let rid = leaf.rid(next_entry);
        self.store_scan_position(page_no, next_entry + 1);
        Ok(rid)
    }

    fn store_scan_position(&mut self, page_no: PageNo, next_entry: usize) {
        if let Some(scan) = self.scan.as_mut() {
            scan.current_page_no = page_no;
            scan.next_entry = next_entry;
        }
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        if !self.closed {
            // Errors on the destructor path are swallowed.
            let _ = self.shutdown();
        }
    }
}

fn occupancies(attr_type: AttrType) -> (usize, usize) {
    match attr_type {
        AttrType::Integer => (leaf_capacity::<i32>(), non_leaf_capacity::<i32>()),
        AttrType::Double => (leaf_capacity::<f64>(), non_leaf_capacity::<f64>()),
        AttrType::String => (
            leaf_capacity::<StringKey>(),
            non_leaf_capacity::<StringKey>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::{EmptySource, SliceSource};
    use burrow_buffer::BufferPoolConfig;
    use bytes::Bytes;
    use tempfile::tempdir;

    fn test_setup(dir: &tempfile::TempDir) -> (Arc<BufferPool>, IndexFileConfig) {
        let pool = Arc::new(BufferPool::new(BufferPoolConfig { num_frames: 64 }));
        let config = IndexFileConfig {
            data_dir: dir.path().to_path_buf(),
            fsync_enabled: false,
        };
        (pool, config)
    }

    fn int_record(key: i32) -> Bytes {
        let mut record = vec![0u8; 16];
        record[0..4].copy_from_slice(&key.to_ne_bytes());
        Bytes::from(record)
    }

    #[test]
    fn test_open_creates_file_and_names_it() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let index = BTreeIndex::open(
            "rel",
            4,
            AttrType::Integer,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();

        assert_eq!(index.index_file_name(), "rel.4");
        assert_eq!(index.relation(), "rel");
        assert_eq!(index.attr_type(), AttrType::Integer);
        assert_eq!(index.attr_byte_offset(), 4);
        assert_eq!(index.root_page_no(), 2);
        assert!(dir.path().join("rel.4").exists());
    }

    #[test]
    fn test_occupancies_match_attr_type() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let index = BTreeIndex::open(
            "rel",
            0,
            AttrType::Double,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();

        assert_eq!(index.leaf_occupancy(), leaf_capacity::<f64>());
        assert_eq!(index.node_occupancy(), non_leaf_capacity::<f64>());
    }

    #[test]
    fn test_build_from_source_then_point_scan() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let records = (1..=10)
            .map(|k| (RecordId::new(k as u32, 0), int_record(k)))
            .collect();
        let mut source = SliceSource::new(records);

        let mut index =
            BTreeIndex::open("rel", 0, AttrType::Integer, pool, &config, &mut source).unwrap();

        index
            .start_scan(
                &IndexKey::Int(7),
                ScanOp::Gte,
                &IndexKey::Int(7),
                ScanOp::Lte,
            )
            .unwrap();
        assert_eq!(index.scan_next().unwrap(), RecordId::new(7, 0));
        assert!(matches!(
            index.scan_next(),
            Err(IndexError::ScanCompleted)
        ));
    }

    #[test]
    fn test_scan_on_empty_tree_completes_immediately() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let mut index = BTreeIndex::open(
            "rel",
            0,
            AttrType::Integer,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();

        index
            .start_scan(
                &IndexKey::Int(0),
                ScanOp::Gte,
                &IndexKey::Int(100),
                ScanOp::Lte,
            )
            .unwrap();
        assert!(matches!(
            index.scan_next(),
            Err(IndexError::ScanCompleted)
        ));
        // Completion is stable across calls.
        assert!(matches!(
            index.scan_next(),
            Err(IndexError::ScanCompleted)
        ));
    }

    #[test]
    fn test_scan_opcode_validation() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let mut index = BTreeIndex::open(
            "rel",
            0,
            AttrType::Integer,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();

        for (low_op, high_op) in [
            (ScanOp::Lt, ScanOp::Lte),
            (ScanOp::Lte, ScanOp::Lt),
            (ScanOp::Gte, ScanOp::Gt),
            (ScanOp::Gt, ScanOp::Gte),
        ] {
            assert!(matches!(
                index.start_scan(&IndexKey::Int(0), low_op, &IndexKey::Int(9), high_op),
                Err(IndexError::BadOpcodes)
            ));
        }
    }

    #[test]
    fn test_scan_range_validation() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let mut index = BTreeIndex::open(
            "rel",
            0,
            AttrType::Integer,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();

        assert!(matches!(
            index.start_scan(
                &IndexKey::Int(10),
                ScanOp::Gte,
                &IndexKey::Int(5),
                ScanOp::Lte
            ),
            Err(IndexError::BadScanRange)
        ));
    }

    #[test]
    fn test_scan_state_errors() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let mut index = BTreeIndex::open(
            "rel",
            0,
            AttrType::Integer,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();

        assert!(matches!(
            index.scan_next(),
            Err(IndexError::ScanNotInitialized)
        ));
        assert!(matches!(
            index.end_scan(),
            Err(IndexError::ScanNotInitialized)
        ));

        // start then end: clean; a second end fails again.
        index
            .start_scan(
                &IndexKey::Int(0),
                ScanOp::Gte,
                &IndexKey::Int(9),
                ScanOp::Lte,
            )
            .unwrap();
        index.end_scan().unwrap();
        assert!(matches!(
            index.scan_next(),
            Err(IndexError::ScanNotInitialized)
        ));
        assert!(matches!(
            index.end_scan(),
            Err(IndexError::ScanNotInitialized)
        ));
    }

    #[test]
    fn test_key_type_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let mut index = BTreeIndex::open(
            "rel",
            0,
            AttrType::Integer,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();

        assert!(matches!(
            index.insert_entry(&IndexKey::Double(1.0), RecordId::new(1, 0)),
            Err(IndexError::KeyTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_close_is_clean() {
        let dir = tempdir().unwrap();
        let (pool, config) = test_setup(&dir);

        let mut index = BTreeIndex::open(
            "rel",
            0,
            AttrType::Integer,
            pool,
            &config,
            &mut EmptySource,
        )
        .unwrap();
        index
            .insert_entry(&IndexKey::Int(1), RecordId::new(1, 0))
            .unwrap();
        // Close with a live scan: the scan is ended silently.
        index
            .start_scan(
                &IndexKey::Int(0),
                ScanOp::Gte,
                &IndexKey::Int(9),
                ScanOp::Lte,
            )
            .unwrap();
        index.close().unwrap();
    }
}
