use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::store::Checkpoint;
use crate::stream::join::{Join, Outcome};
use crate::stream::{Cursor, KSink, LogSource, Record};
use crate::table::{MaterializedTable, TableBuilder};
use crate::Result;

/// One unit of work for the join loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Time for a full checkpoint
    Tick,
    Changelog(Record),
    Stream(Record),
}

/// Task is the join processor itself.
///
/// It owns the materialized table, both cursors, the sink for joined records and the
/// checkpoint store, and handles exactly one [`Event`] at a time. Everything happens on the
/// thread that drives [`Task::run`], so nothing here is locked.
pub struct Task<C, K> {
    table: MaterializedTable,
    builder: TableBuilder,
    join: Join,
    stream: Cursor,
    wal: Cursor,
    store: C,
    sink: K,
    interval: Duration,
    joined: usize,
}

impl<C, K> Task<C, K>
    where C: Checkpoint,
          K: KSink
{
    /// Restores table and cursors from `store`.
    pub fn new(store: C, sink: K, table: &str, foreign_key: &str, interval: Duration) -> Result<Self> {
        let snap = store.load()?;
        let builder = TableBuilder::new(table);
        let join = Join::new(foreign_key);
        info!("Recovered {} table rows, stream offset: {} wal offset: {}", snap.table.len(), snap.stream, snap.wal);
        info!("Joining on table: {} foreign key: {}", builder.selector(), join.foreign_key());
        Ok(Task {
            table: snap.table,
            builder,
            join,
            stream: snap.stream,
            wal: snap.wal,
            store,
            sink,
            interval,
            joined: 0,
        })
    }

    pub fn table(&self) -> &MaterializedTable {
        &self.table
    }

    pub fn stream_cursor(&self) -> Cursor {
        self.stream
    }

    pub fn wal_cursor(&self) -> Cursor {
        self.wal
    }

    /// Stream records joined since the last full checkpoint.
    pub fn joined(&self) -> usize {
        self.joined
    }

    pub fn into_inner(self) -> (C, K) {
        (self.store, self.sink)
    }

    pub fn handle(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Tick => self.checkpoint(),
            Event::Changelog(rec) => self.on_changelog(&rec),
            Event::Stream(rec) => self.on_stream(&rec),
        }
    }

    /// Writes the whole table and both cursors in one commit.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.store.commit_full(&self.table, self.stream, self.wal)?;
        info!(
            "committed: {} stream offset: {} wal offset: {} joined: {}",
            self.table.len(), self.stream, self.wal, self.joined
        );
        self.joined = 0;
        Ok(())
    }

    fn on_changelog(&mut self, rec: &Record) -> Result<()> {
        // Consumed means consumed, whether or not the record was usable.
        self.wal.advance(rec.offset);
        match self.builder.apply(&mut self.table, rec) {
            Ok(change) => {
                trace!("wal offset {}: {:?}", rec.offset, change);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                debug!("Dropping changelog record: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn on_stream(&mut self, rec: &Record) -> Result<()> {
        self.stream.advance(rec.offset);
        match self.join.process(&self.table, rec) {
            Ok(Outcome::Hit(joined)) => {
                self.sink.send_next(joined);
                self.store.commit_offset(self.stream)?;
                self.joined += 1;
                Ok(())
            }
            Ok(Outcome::Miss(key)) => {
                trace!("stream offset {}: no table row for {:?}", rec.offset, key);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                debug!("Dropping stream record: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Multiplexes the checkpoint timer and both logs until a fatal error.
    ///
    /// Returns `Ok(())` only once both logs are closed, which Kafka logs never are.
    /// The first full checkpoint happens one interval after the start.
    pub async fn run<W, S>(&mut self, wal: &mut W, stream: &mut S) -> Result<()>
        where W: LogSource,
              S: LogSource
    {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut wal_open = true;
        let mut stream_open = true;

        info!("started");
        while wal_open || stream_open {
            let event = tokio::select! {
                _ = ticker.tick() => Event::Tick,
                msg = wal.next(), if wal_open => match msg {
                    Some(rec) => Event::Changelog(rec?),
                    None => {
                        info!("Changelog closed");
                        wal_open = false;
                        continue;
                    }
                },
                msg = stream.next(), if stream_open => match msg {
                    Some(rec) => Event::Stream(rec?),
                    None => {
                        info!("Stream closed");
                        stream_open = false;
                        continue;
                    }
                },
            };
            self.handle(event)?;
        }
        Ok(())
    }
}
