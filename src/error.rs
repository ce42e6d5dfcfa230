use rdkafka::error::KafkaError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while joining.
///
/// Only [`Error::MessageParse`] and [`Error::Publish`] are recovered inside the engine,
/// the other variants end the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("checkpoint store error: {0}")]
    Storage(#[from] StorageError),

    #[error("broker connection error: {0}")]
    Connection(#[from] KafkaError),

    #[error("malformed message at offset {offset}: {source}")]
    MessageParse {
        offset: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },
}

impl Error {
    /// Whether the event loop may carry on after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::MessageParse { .. } | Error::Publish { .. } => true,
            Error::Storage(_) | Error::Connection(_) => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("redb transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),

    #[error("corrupt cursor under {key:?}: expected 8 bytes, found {len}")]
    CorruptCursor { key: String, len: usize },
}

impl From<redb::TransactionError> for StorageError {
    fn from(e: redb::TransactionError) -> Self {
        StorageError::Transaction(Box::new(e))
    }
}

// Lets store code use `?` on redb results directly.
macro_rules! storage_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Error {
            fn from(e: $t) -> Self {
                Error::Storage(StorageError::from(e))
            }
        })*
    };
}

storage_from!(
    redb::DatabaseError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    redb::TransactionError
);
