use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::ClientConfig;

/// Broker client configuration shared by every consumer and producer.
#[derive(Clone, Debug)]
pub struct Config(pub(crate) ClientConfig);

impl Config {
    pub fn new() -> Config {
        Config(ClientConfig::new())
    }

    pub fn set(mut self, key: &str, value: &str) -> Config {
        self.0.set(key, value);
        self
    }

    pub fn set_group(self, group: &str) -> Config {
        self.set("group.id", group)
    }

    pub fn set_log_level(mut self, log_level: RDKafkaLogLevel) -> Config {
        self.0.set_log_level(log_level);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    pub fn client(&self) -> &ClientConfig {
        &self.0
    }

    /// Client settings for a join processor talking to `brokers`.
    ///
    /// Offsets are tracked in the checkpoint store, never on the broker, so the
    /// group id only exists because librdkafka wants one.
    pub fn for_brokers(brokers: &[String]) -> Config {
        Config::new()
            .set("bootstrap.servers", &brokers.join(","))
            .set_group(PROCESSOR_NAME)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set_log_level(RDKafkaLogLevel::Warning)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

pub const PROCESSOR_NAME: &str = "stream-table join";

/// Do stream-table joining on stream.foreignkey = table.primarykey
#[derive(Parser, Debug, Clone)]
#[command(name = "stream-table-join", version = "0.1")]
pub struct JoinOpts {
    /// Kafka broker addresses
    #[arg(short = 'b', long, value_delimiter = ',', default_value = "localhost:9092")]
    pub brokers: Vec<String>,

    /// Topic name for consuming the commit log
    #[arg(short = 't', long, default_value = "WAL")]
    pub wal: String,

    /// Logical table to materialize from the commit log
    #[arg(long, default_value = "user_updates")]
    pub table: String,

    /// The stream to join
    #[arg(long, default_value = "events")]
    pub stream: String,

    /// Dot-path of the json field used as foreign key in stream messages
    #[arg(long, visible_alias = "fk", default_value = "a.b.c")]
    pub foreignkey: String,

    /// Persisted table file
    #[arg(long, default_value = "./join.db")]
    pub file: PathBuf,

    /// Interval for table persistence
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub write_interval: Duration,

    /// Output topic for joined results
    #[arg(long, default_value = "joined")]
    pub output: String,
}

impl JoinOpts {
    pub fn client_config(&self) -> Config {
        Config::for_brokers(&self.brokers)
    }

    pub fn log_settings(&self) {
        info!("brokers: {:?}", self.brokers);
        info!("wal: {}", self.wal);
        info!("table: {}", self.table);
        info!("stream: {}", self.stream);
        info!("foreignkey: {}", self.foreignkey);
        info!("file: {}", self.file.display());
        info!("write-interval: {}", humantime::format_duration(self.write_interval));
        info!("output: {}", self.output);
    }
}
