use bytes::{BufMut, Bytes, BytesMut};

use crate::format::{Format, Json, Path};
use crate::stream::Record;
use crate::table::MaterializedTable;
use crate::{Error, Result};

const STREAM_PREFIX: &[u8] = b"{\"stream\":";
const TABLE_PREFIX: &[u8] = b",\"table\":";

/// What the join made of one stream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The joined record, ready to publish
    Hit(Bytes),
    /// Carries the extracted key, if there was one
    Miss(Option<String>),
}

/// Inner join of stream records against a [`MaterializedTable`].
///
/// The stream side names its table row through a foreign key path. Records whose
/// row is not in the table yet are dropped, there is no buffering.
#[derive(Debug, Clone)]
pub struct Join {
    foreign_key: Path,
}

impl Join {
    pub fn new(foreign_key: &str) -> Self {
        Join { foreign_key: Path::parse(foreign_key) }
    }

    pub fn foreign_key(&self) -> &Path {
        &self.foreign_key
    }

    pub fn process(&self, table: &MaterializedTable, rec: &Record) -> Result<Outcome> {
        let doc = Json::deserialize(&rec.payload)
            .map_err(|source| Error::MessageParse { offset: rec.offset, source })?;

        let key = match self.foreign_key.key(&doc) {
            Some(key) => key,
            None => return Ok(Outcome::Miss(None)),
        };
        Ok(match table.get(&key) {
            Some(row) => Outcome::Hit(joined_record(&rec.payload, row)),
            None => Outcome::Miss(Some(key)),
        })
    }
}

/// `{"stream":<stream>,"table":<table>}` with both payloads copied verbatim.
pub fn joined_record(stream: &[u8], table: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(STREAM_PREFIX.len() + stream.len() + TABLE_PREFIX.len() + table.len() + 1);
    buf.put_slice(STREAM_PREFIX);
    buf.put_slice(stream);
    buf.put_slice(TABLE_PREFIX);
    buf.put_slice(table);
    buf.put_u8(b'}');
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;

    fn table_with(rows: &[&str]) -> MaterializedTable {
        let builder = TableBuilder::new("user_updates");
        let mut table = MaterializedTable::new();
        for (i, row) in rows.iter().enumerate() {
            builder.apply(&mut table, &Record::new(i as u64, row.to_string())).unwrap();
        }
        table
    }

    #[test]
    fn hit_embeds_both_payloads() {
        let table = table_with(&[r#"{"table":"user_updates","key":"42","name":"Al"}"#]);
        let join = Join::new("user_id");
        assert_eq!(join.foreign_key().to_string(), "user_id");

        let out = join.process(&table, &Record::new(0, r#"{"user_id":"42","action":"login"}"#)).unwrap();
        let expected = r#"{"stream":{"user_id":"42","action":"login"},"table":{"table":"user_updates","key":"42","name":"Al"}}"#;
        assert_eq!(out, Outcome::Hit(Bytes::from(expected)));
    }

    #[test]
    fn payloads_are_not_reencoded() {
        let table = table_with(&["{ \"table\" : \"user_updates\", \"key\" : \"1\" }"]);
        let join = Join::new("a.b.c");
        let stream = "{\"a\":{\"b\":{\"c\":1}},  \"z\":1.50}";

        match join.process(&table, &Record::new(0, stream)).unwrap() {
            Outcome::Hit(out) => {
                let text = std::str::from_utf8(&out).unwrap();
                assert!(text.contains("\"z\":1.50"));
                assert!(text.contains("{ \"table\" : \"user_updates\", \"key\" : \"1\" }"));
                let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
                assert_eq!(v["stream"]["a"]["b"]["c"], 1);
            }
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn unknown_key_misses() {
        let table = table_with(&[r#"{"table":"user_updates","key":"42"}"#]);
        let join = Join::new("user_id");

        let out = join.process(&table, &Record::new(0, r#"{"user_id":"99","action":"login"}"#)).unwrap();
        assert_eq!(out, Outcome::Miss(Some("99".into())));

        let out = join.process(&table, &Record::new(1, r#"{"action":"login"}"#)).unwrap();
        assert_eq!(out, Outcome::Miss(None));
    }

    #[test]
    fn malformed_stream_record() {
        let join = Join::new("user_id");
        let err = join.process(&MaterializedTable::new(), &Record::new(3, "user_id=42")).unwrap_err();
        assert!(err.is_recoverable());
    }
}
