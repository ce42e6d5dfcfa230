use std::collections::HashMap;

use bytes::Bytes;

use crate::error::StorageError;
use crate::stream::Cursor;
use crate::table::MaterializedTable;
use crate::Result;

mod durable;

pub use durable::RedbStore;

pub const OFFSET_STREAM: &[u8] = b"__offset_stream__";
pub const OFFSET_WAL: &[u8] = b"__offset_wal__";

/// Keys in the store namespace that hold cursors rather than table rows.
pub fn is_reserved(key: &[u8]) -> bool {
    key == OFFSET_STREAM || key == OFFSET_WAL
}

/// State recovered from a checkpoint store on start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub table: MaterializedTable,
    pub stream: Cursor,
    pub wal: Cursor,
}

/// Durable home of the materialized table and both log cursors.
///
/// Every commit is a single transaction, a failed commit leaves the previous state intact.
pub trait Checkpoint {
    /// Reads the last committed state, an empty table with both cursors at
    /// [`Cursor::Earliest`] when nothing was committed yet.
    fn load(&self) -> Result<Snapshot>;

    /// Writes every table entry together with both cursors.
    fn commit_full(&mut self, table: &MaterializedTable, stream: Cursor, wal: Cursor) -> Result<()>;

    /// Writes only the stream cursor.
    fn commit_offset(&mut self, stream: Cursor) -> Result<()>;
}

pub(crate) fn encode_cursor(pos: u64) -> [u8; 8] {
    pos.to_le_bytes()
}

pub(crate) fn decode_cursor(key: &[u8], v: &[u8]) -> Result<Cursor> {
    let raw: [u8; 8] = v.try_into().map_err(|_| StorageError::CorruptCursor {
        key: String::from_utf8_lossy(key).into_owned(),
        len: v.len(),
    })?;
    Ok(Cursor::At(u64::from_le_bytes(raw)))
}

/// Splits a raw namespace into cursors and table rows.
pub(crate) fn snapshot_from<I>(entries: I) -> Result<Snapshot>
    where I: IntoIterator<Item = Result<(Vec<u8>, Vec<u8>)>>
{
    let mut snap = Snapshot::default();
    let mut rows = Vec::new();
    for entry in entries {
        let (k, v) = entry?;
        if k == OFFSET_STREAM {
            snap.stream = decode_cursor(&k, &v)?;
        } else if k == OFFSET_WAL {
            snap.wal = decode_cursor(&k, &v)?;
        } else {
            rows.push((String::from_utf8_lossy(&k).into_owned(), Bytes::from(v)));
        }
    }
    snap.table = rows.into_iter().collect();
    Ok(snap)
}

/// Non durable store with the same layout as [`RedbStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemory {
    inner: HashMap<Vec<u8>, Vec<u8>>,
    full_commits: usize,
    offset_commits: usize,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_commits(&self) -> usize {
        self.full_commits
    }

    pub fn offset_commits(&self) -> usize {
        self.offset_commits
    }
}

impl Checkpoint for InMemory {
    fn load(&self) -> Result<Snapshot> {
        snapshot_from(self.inner.iter().map(|(k, v)| Ok((k.clone(), v.clone()))))
    }

    fn commit_full(&mut self, table: &MaterializedTable, stream: Cursor, wal: Cursor) -> Result<()> {
        for (k, v) in table.iter() {
            self.inner.insert(k.as_bytes().to_vec(), v.to_vec());
        }
        if let Cursor::At(pos) = stream {
            self.inner.insert(OFFSET_STREAM.to_vec(), encode_cursor(pos).to_vec());
        }
        if let Cursor::At(pos) = wal {
            self.inner.insert(OFFSET_WAL.to_vec(), encode_cursor(pos).to_vec());
        }
        self.full_commits += 1;
        Ok(())
    }

    fn commit_offset(&mut self, stream: Cursor) -> Result<()> {
        if let Cursor::At(pos) = stream {
            self.inner.insert(OFFSET_STREAM.to_vec(), encode_cursor(pos).to_vec());
        }
        self.offset_commits += 1;
        Ok(())
    }
}
