//! Broker client abstraction.
//!
//! The producer depends only on this capability set, so the transport is
//! swappable: a real partitioned log client in production, the in-memory
//! broker in tests and local development.

use crate::{EventError, EventResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Where a record landed: partition and offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCoordinates {
    pub partition: i32,
    pub offset: i64,
}

/// A transport message ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerRecord {
    /// Destination topic.
    pub topic: String,
    /// Partition key. The producer uses the event id here, so a given
    /// event always routes to the same partition.
    pub key: String,
    /// Serialized event bytes.
    pub payload: Vec<u8>,
    /// Metadata headers mirrored from the event.
    pub headers: Vec<(String, String)>,
}

impl BrokerRecord {
    /// Looks up a header value by key.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Client for a partitioned, append-only message broker.
///
/// Implementations must be safe for concurrent sends; the producer is
/// invoked from many tasks at once and relies on that contract instead
/// of serializing sends itself. Retry and backoff on transient transport
/// failures are the implementation's concern, configured at construction.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Sends a single record and returns where it landed.
    async fn send(&self, record: BrokerRecord) -> EventResult<RecordCoordinates>;

    /// Sends a batch as one atomic client call: either every record is
    /// accepted or none is.
    async fn send_batch(&self, records: Vec<BrokerRecord>) -> EventResult<Vec<RecordCoordinates>>;

    /// Releases the client's resources. Further sends may fail.
    async fn close(&self) -> EventResult<()>;
}

/// In-memory broker for tests and local development.
///
/// Records every accepted message, counts client calls, and can be told
/// to fail sends to exercise error paths. Partitions are derived from
/// the record key the way a real broker would, so key-based routing is
/// observable in tests.
pub struct InMemoryBroker {
    partitions: i32,
    records: Mutex<Vec<(BrokerRecord, RecordCoordinates)>>,
    next_offset: AtomicI64,
    send_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    fail_sends: AtomicBool,
    closed: AtomicBool,
}

impl InMemoryBroker {
    /// Creates a broker with 12 partitions.
    pub fn new() -> Self {
        Self::with_partitions(12)
    }

    /// Creates a broker with an explicit partition count.
    pub fn with_partitions(partitions: i32) -> Self {
        Self {
            partitions: partitions.max(1),
            records: Mutex::new(Vec::new()),
            next_offset: AtomicI64::new(0),
            send_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent send (single or batch) fail.
    pub fn fail_next_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Number of single-send client calls so far.
    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Number of batch-send client calls so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// All records accepted so far, with their coordinates.
    pub async fn records(&self) -> Vec<(BrokerRecord, RecordCoordinates)> {
        self.records.lock().await.clone()
    }

    /// Number of records accepted so far.
    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Deterministic key-to-partition routing.
    fn partition_for(&self, key: &str) -> i32 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in key.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        (hash % self.partitions as u64) as i32
    }

    fn coordinates_for(&self, key: &str) -> RecordCoordinates {
        RecordCoordinates {
            partition: self.partition_for(key),
            offset: self.next_offset.fetch_add(1, Ordering::SeqCst),
        }
    }

    fn check_send(&self, topic: &str, key: &str) -> EventResult<()> {
        let reason = if self.closed.load(Ordering::SeqCst) {
            "broker client is closed"
        } else if self.fail_sends.load(Ordering::SeqCst) {
            "injected broker failure"
        } else {
            return Ok(());
        };

        Err(EventError::Publish {
            topic: topic.to_string(),
            event_id: key.to_string(),
            event_type: String::new(),
            reason: reason.to_string(),
        })
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerClient for InMemoryBroker {
    async fn send(&self, record: BrokerRecord) -> EventResult<RecordCoordinates> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.check_send(&record.topic, &record.key)?;

        let coords = self.coordinates_for(&record.key);
        self.records.lock().await.push((record, coords));
        Ok(coords)
    }

    async fn send_batch(&self, records: Vec<BrokerRecord>) -> EventResult<Vec<RecordCoordinates>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let (topic, key) = records
            .first()
            .map(|r| (r.topic.clone(), r.key.clone()))
            .unwrap_or_default();
        self.check_send(&topic, &key)?;

        let mut stored = self.records.lock().await;
        let mut coords = Vec::with_capacity(records.len());
        for record in records {
            let c = self.coordinates_for(&record.key);
            stored.push((record, c));
            coords.push(c);
        }
        Ok(coords)
    }

    async fn close(&self) -> EventResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
