use std::collections::hash_map::{self, Entry};
use std::collections::HashMap;

use bytes::Bytes;

use crate::format::{Format, Json};
use crate::format::json::key_string;
use crate::store;
use crate::stream::Record;
use crate::{Error, Result};

const TABLE_FIELD: &str = "table";
const KEY_FIELD: &str = "key";

/// In-memory snapshot of one logical table, rebuilt from the changelog.
///
/// Values are the raw changelog payloads. The last write for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedTable {
    inner: HashMap<String, Bytes>,
}

impl MaterializedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Bytes> {
        self.inner.get(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Bytes> {
        self.inner.iter()
    }

    pub(crate) fn upsert(&mut self, key: String, value: Bytes) -> Change {
        match self.inner.entry(key) {
            Entry::Vacant(v) => {
                v.insert(value);
                Change::New
            }
            Entry::Occupied(mut o) => Change::Modified(o.insert(value)),
        }
    }
}

impl FromIterator<(String, Bytes)> for MaterializedTable {
    fn from_iter<I: IntoIterator<Item = (String, Bytes)>>(iter: I) -> Self {
        MaterializedTable { inner: iter.into_iter().collect() }
    }
}

/// Outcome of feeding one changelog record to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    New,
    /// Holds the replaced payload
    Modified(Bytes),
    Skipped(Skip),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Update for some other logical table sharing the changelog
    OtherTable(Option<String>),
    NoKey,
    ReservedKey(String),
}

/// Applies changelog records whose `table` field equals `selector`.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    selector: String,
}

impl TableBuilder {
    pub fn new(selector: impl Into<String>) -> Self {
        TableBuilder { selector: selector.into() }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Upserts the record into `table` if it belongs to the selected table.
    ///
    /// Returns [`Error::MessageParse`] for payloads that are not json, the table is
    /// left untouched in that case.
    pub fn apply(&self, table: &mut MaterializedTable, rec: &Record) -> Result<Change> {
        let doc = Json::deserialize(&rec.payload)
            .map_err(|source| Error::MessageParse { offset: rec.offset, source })?;

        let name = doc.get(TABLE_FIELD).and_then(key_string);
        if name.as_deref() != Some(self.selector.as_str()) {
            return Ok(Change::Skipped(Skip::OtherTable(name)));
        }

        let key = match doc.get(KEY_FIELD).and_then(key_string) {
            Some(key) => key,
            None => return Ok(Change::Skipped(Skip::NoKey)),
        };
        if store::is_reserved(key.as_bytes()) {
            warn!("Changelog key {:?} at offset {} collides with a cursor key, ignoring", key, rec.offset);
            return Ok(Change::Skipped(Skip::ReservedKey(key)));
        }

        Ok(table.upsert(key, rec.payload.clone()))
    }
}
