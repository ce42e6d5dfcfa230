use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::config::PROCESSOR_NAME;
use crate::store::{encode_cursor, snapshot_from, Checkpoint, Snapshot, OFFSET_STREAM, OFFSET_WAL};
use crate::stream::Cursor;
use crate::table::MaterializedTable;
use crate::Result;

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new(PROCESSOR_NAME);

/// Checkpoint store in a single redb file.
///
/// Table rows and both cursors share one redb table, so a full commit is one
/// write transaction.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Opens or creates the store at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be created or is not a valid redb database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path.as_ref())?;
        // Create the table up front so that reads on a fresh file succeed.
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(TABLE)?;
        }
        txn.commit()?;
        debug!("Opened checkpoint store {}", path.as_ref().display());
        Ok(RedbStore { db })
    }
}

impl Checkpoint for RedbStore {
    fn load(&self) -> Result<Snapshot> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        let entries = table.iter()?.map(|entry| -> Result<(Vec<u8>, Vec<u8>)> {
            let (k, v) = entry?;
            Ok((k.value().to_vec(), v.value().to_vec()))
        });
        snapshot_from(entries)
    }

    fn commit_full(&mut self, rows: &MaterializedTable, stream: Cursor, wal: Cursor) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            for (k, v) in rows.iter() {
                table.insert(k.as_bytes(), v.as_ref())?;
            }
            if let Cursor::At(pos) = wal {
                table.insert(OFFSET_WAL, encode_cursor(pos).as_slice())?;
            }
            if let Cursor::At(pos) = stream {
                table.insert(OFFSET_STREAM, encode_cursor(pos).as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn commit_offset(&mut self, stream: Cursor) -> Result<()> {
        let pos = match stream {
            Cursor::At(pos) => pos,
            Cursor::Earliest => return Ok(()),
        };
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            table.insert(OFFSET_STREAM, encode_cursor(pos).as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}
