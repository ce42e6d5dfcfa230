#[macro_use]
extern crate log;

use clap::Parser;

use stream_table_join::store::RedbStore;
use stream_table_join::stream::failures::failures;
use stream_table_join::stream::topic::{RawConsumer, RawProducer};
use stream_table_join::{JoinOpts, Result, Task};

/// Publish failures waiting to be logged before new ones get dropped
const FAILURE_QUEUE: usize = 1024;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = JoinOpts::parse();

    if let Err(e) = processor(opts).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn processor(opts: JoinOpts) -> Result<()> {
    opts.log_settings();

    let store = RedbStore::open(&opts.file)?;
    let cfg = opts.client_config();

    let (reporter, drain) = failures(FAILURE_QUEUE);
    tokio::spawn(drain.run());
    let producer = RawProducer::new(&cfg, &opts.output, reporter)?;

    let mut task = Task::new(store, producer, &opts.table, &opts.foreignkey, opts.write_interval)?;

    info!(
        "consuming from: stream:{} offset:{}  wal:{} offset:{}",
        opts.stream, task.stream_cursor(), opts.wal, task.wal_cursor()
    );
    let mut stream = RawConsumer::new(&cfg, &opts.stream, task.stream_cursor())?;
    let mut wal = RawConsumer::new(&cfg, &opts.wal, task.wal_cursor())?;

    task.run(&mut wal, &mut stream).await
}
