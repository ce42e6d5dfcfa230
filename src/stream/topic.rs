use std::time::Duration;

use bytes::Bytes;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{DeliveryResult, Message};
use rdkafka::producer::{BaseRecord, Producer, ProducerContext, ThreadedProducer};
use rdkafka::{ClientContext, TopicPartitionList};

use crate::stream::failures::FailureReporter;
use crate::stream::{Cursor, KSink, LogSource, Record};
use crate::{Config, Error, Result};

/// Both logs are single partition.
pub const PARTITION: i32 = 0;

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads one partition of a topic, starting at a cursor recovered from the checkpoint store.
///
/// The partition is assigned manually so no group rebalancing can move it, and
/// offsets are never committed to the broker.
pub struct RawConsumer {
    topic: String,
    base: StreamConsumer,
}

impl RawConsumer {
    pub fn new(config: &Config, topic: &str, from: Cursor) -> Result<Self> {
        let base: StreamConsumer = config.0.create()?;

        let mut list = TopicPartitionList::new();
        list.add_partition_offset(topic, PARTITION, from.offset())?;
        base.assign(&list)?;

        let consumer = Self {
            topic: topic.to_string(),
            base,
        };
        // Fails when no broker answers, which is better found out now than on the first recv.
        let (low, high) = consumer.offset_range()?;
        debug!("Assigned {}:{} from {}, log holds [{}, {})", topic, PARTITION, from, low, high);
        Ok(consumer)
    }

    pub fn offset_range(&self) -> Result<(i64, i64)> {
        Ok(self.base.fetch_watermarks(&self.topic, PARTITION, METADATA_TIMEOUT)?)
    }
}

#[async_trait(?Send)]
impl LogSource for RawConsumer {
    async fn next(&mut self) -> Option<Result<Record>> {
        let item = match self.base.recv().await {
            Ok(msg) => {
                // Tombstones come through as empty payloads and get dropped as malformed.
                let payload = Bytes::copy_from_slice(msg.payload().unwrap_or_default());
                Ok(Record::new(msg.offset() as u64, payload))
            }
            Err(e) => Err(Error::Connection(e)),
        };
        Some(item)
    }
}

/// Routes delivery failures reported by librdkafka to the failure drain.
pub struct DeliveryContext {
    topic: String,
    failures: FailureReporter,
}

impl ClientContext for DeliveryContext {}

impl ProducerContext for DeliveryContext {
    type DeliveryOpaque = ();

    fn delivery(&self, result: &DeliveryResult<'_>, _: Self::DeliveryOpaque) {
        if let Err((e, _)) = result {
            self.failures.report(Error::Publish {
                topic: self.topic.clone(),
                reason: e.to_string(),
            });
        }
    }
}

/// Fire and forget producer for one topic.
///
/// Records are queued inside librdkafka and delivered by its background thread,
/// nothing is retried from here.
pub struct RawProducer {
    topic: String,
    base: ThreadedProducer<DeliveryContext>,
}

impl RawProducer {
    pub fn new(config: &Config, topic: &str, failures: FailureReporter) -> Result<Self> {
        let context = DeliveryContext {
            topic: topic.to_string(),
            failures,
        };
        let base = config.0.create_with_context(context)?;
        Ok(RawProducer {
            topic: topic.to_string(),
            base,
        })
    }
}

impl KSink for RawProducer {
    fn send_next(&mut self, payload: Bytes) {
        let rec = BaseRecord::<(), [u8]>::to(&self.topic).payload(payload.as_ref());
        if let Err((e, _)) = self.base.send(rec) {
            self.base.context().failures.report(Error::Publish {
                topic: self.topic.clone(),
                reason: e.to_string(),
            });
        }
    }
}
