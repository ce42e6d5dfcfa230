#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use bytes::Bytes;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use stream_table_join::error::StorageError;
use stream_table_join::store::{Checkpoint, Snapshot};
use stream_table_join::stream::Cursor;
use stream_table_join::{Config, Error, KSink, LogSource, MaterializedTable, Record, Result};

pub fn cfg() -> Config {
    Config::new()
        .set("bootstrap.servers", "localhost:29092")
        .set("auto.offset.reset", "earliest")
}

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rec(offset: u64, payload: &str) -> Record {
    Record::new(offset, payload.to_string())
}

/// Keeps every joined record in memory.
#[derive(Debug, Default)]
pub struct Collected(pub Vec<Bytes>);

impl KSink for Collected {
    fn send_next(&mut self, payload: Bytes) {
        self.0.push(payload);
    }
}

/// Yields a fixed list of records, then reports itself closed.
pub struct VecSource {
    records: VecDeque<Record>,
    closed: Rc<Cell<bool>>,
}

impl VecSource {
    pub fn new(records: Vec<Record>) -> Self {
        VecSource {
            records: records.into(),
            closed: Rc::new(Cell::new(false)),
        }
    }

    /// A source that stays silent until this one is closed.
    pub fn then(&self, records: Vec<Record>) -> Gated {
        Gated {
            gate: self.closed.clone(),
            inner: VecSource::new(records),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl LogSource for VecSource {
    async fn next(&mut self) -> Option<Result<Record>> {
        match self.records.pop_front() {
            Some(rec) => Some(Ok(rec)),
            None => {
                self.closed.set(true);
                None
            }
        }
    }
}

pub struct Gated {
    gate: Rc<Cell<bool>>,
    inner: VecSource,
}

#[async_trait::async_trait(?Send)]
impl LogSource for Gated {
    async fn next(&mut self) -> Option<Result<Record>> {
        while !self.gate.get() {
            tokio::task::yield_now().await;
        }
        self.inner.next().await
    }
}

/// An open log nobody writes to.
pub struct Silent;

#[async_trait::async_trait(?Send)]
impl LogSource for Silent {
    async fn next(&mut self) -> Option<Result<Record>> {
        std::future::pending().await
    }
}

/// Loses the broker on the first read.
pub struct Disconnected;

#[async_trait::async_trait(?Send)]
impl LogSource for Disconnected {
    async fn next(&mut self) -> Option<Result<Record>> {
        Some(Err(Error::Connection(KafkaError::MessageConsumption(
            RDKafkaErrorCode::BrokerTransportFailure,
        ))))
    }
}

/// Loads fine, refuses every commit.
pub struct ReadOnlyStore;

impl Checkpoint for ReadOnlyStore {
    fn load(&self) -> Result<Snapshot> {
        Ok(Snapshot::default())
    }

    fn commit_full(&mut self, _: &MaterializedTable, _: Cursor, _: Cursor) -> Result<()> {
        Err(refused())
    }

    fn commit_offset(&mut self, _: Cursor) -> Result<()> {
        Err(refused())
    }
}

fn refused() -> Error {
    StorageError::CorruptCursor { key: "__offset_stream__".into(), len: 0 }.into()
}
