#![deny(unused_must_use)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

pub mod config;
pub mod error;
pub mod format;

pub mod task;
pub mod table;
pub mod stream;
pub mod store;


pub use config::{Config, JoinOpts};
pub use error::{Error, Result};
pub use stream::{KSink, LogSource, Record};
pub use table::MaterializedTable;
pub use store::Checkpoint;
pub use task::Task;
