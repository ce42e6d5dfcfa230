use std::fmt;

use bytes::Bytes;
use rdkafka::Offset;

use crate::Result;

pub mod failures;
pub mod join;
pub mod topic;

/// One message read from a single partition log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: u64,
    pub payload: Bytes,
}

impl Record {
    pub fn new(offset: u64, payload: impl Into<Bytes>) -> Self {
        Record { offset, payload: payload.into() }
    }
}

/// Position of the next unread record in a log.
///
/// Ordered so that `Earliest` is below every concrete position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cursor {
    #[default]
    Earliest,
    At(u64),
}

impl Cursor {
    /// Moves past the record at `offset`, never backwards.
    pub fn advance(&mut self, offset: u64) {
        *self = (*self).max(Cursor::At(offset + 1));
    }

    pub fn offset(&self) -> Offset {
        match *self {
            Cursor::Earliest => Offset::Beginning,
            Cursor::At(pos) => Offset::Offset(pos as i64),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Earliest => write!(f, "earliest"),
            Cursor::At(pos) => write!(f, "{}", pos),
        }
    }
}

/// An ordered log of records, read one at a time.
///
/// `None` means the log is closed and will not produce anything else.
#[async_trait(?Send)]
pub trait LogSource {
    async fn next(&mut self) -> Option<Result<Record>>;
}

/// Destination of joined records.
///
/// Sending must not wait for the destination to acknowledge anything.
pub trait KSink {
    fn send_next(&mut self, payload: Bytes);
}

#[cfg(test)]
impl KSink for Vec<Bytes> {
    fn send_next(&mut self, payload: Bytes) {
        self.push(payload);
    }
}
