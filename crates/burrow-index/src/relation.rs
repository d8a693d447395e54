//! Record sources used to build an index from its base relation.

use burrow_common::{RecordId, Result};
use bytes::Bytes;

/// Supplies the base relation's records, in arbitrary order, during the
/// initial index build.
pub trait RecordSource {
    /// Returns the next record and its identifier, or `None` once the
    /// relation is exhausted.
    fn next_record(&mut self) -> Result<Option<(RecordId, Bytes)>>;
}

/// A record source over an in-memory list of records.
pub struct SliceSource {
    records: std::vec::IntoIter<(RecordId, Bytes)>,
}

impl SliceSource {
    /// Creates a source yielding `records` in order.
    pub fn new(records: Vec<(RecordId, Bytes)>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl RecordSource for SliceSource {
    fn next_record(&mut self) -> Result<Option<(RecordId, Bytes)>> {
        Ok(self.records.next())
    }
}

/// A source over an empty relation; the index starts empty.
pub struct EmptySource;

impl RecordSource for EmptySource {
    fn next_record(&mut self) -> Result<Option<(RecordId, Bytes)>> {
        Ok(None)
    }
}
