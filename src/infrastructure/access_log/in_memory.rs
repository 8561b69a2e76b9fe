//! In-memory message broker

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::domain::{LogBroker, StateError, Subscription};

/// Records a topic retains when no limit is configured
pub const DEFAULT_RETENTION: usize = 10_000;

type SharedReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>;

#[derive(Debug)]
struct ConsumerGroup {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    receiver: SharedReceiver,
}

#[derive(Debug, Default)]
struct Topic {
    records: VecDeque<Vec<u8>>,
    groups: HashMap<String, ConsumerGroup>,
}

/// Process-local broker with topic retention and consumer groups
///
/// Meant for tests and single-process wiring: nothing leaves the process.
/// Each topic keeps at most `retention` records and drops the oldest once
/// full. A newly created group starts from the earliest retained record.
/// Members of an existing group pull from the group's shared queue, so each
/// record reaches exactly one member of every group. A group queue is
/// unbounded and grows while its members do not read.
#[derive(Debug)]
pub struct InMemoryBroker {
    topics: Mutex<HashMap<String, Topic>>,
    retention: usize,
    closed: AtomicBool,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Creates a broker keeping at most `retention` records per topic
    pub fn with_retention(retention: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            retention,
            closed: AtomicBool::new(false),
        }
    }

    /// Number of records retained on a topic
    pub async fn retained(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .await
            .get(topic)
            .map_or(0, |topic| topic.records.len())
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StateError::connection("Broker closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl LogBroker for InMemoryBroker {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), StateError> {
        self.ensure_open()?;

        let mut topics = self.topics.lock().await;
        let topic = topics.entry(topic.to_string()).or_default();

        for group in topic.groups.values() {
            // The group owns its receiver, so the channel cannot be closed here
            let _ = group.sender.send(payload.clone());
        }

        if self.retention > 0 {
            if topic.records.len() == self.retention {
                topic.records.pop_front();
            }
            topic.records.push_back(payload);
        }

        Ok(())
    }

    async fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription, StateError> {
        self.ensure_open()?;

        let mut topics = self.topics.lock().await;
        let topic = topics.entry(topic.to_string()).or_default();

        let receiver = match topic.groups.get(group) {
            Some(existing) => existing.receiver.clone(),
            None => {
                let (sender, receiver) = mpsc::unbounded_channel();

                for record in &topic.records {
                    let _ = sender.send(record.clone());
                }

                let receiver = Arc::new(Mutex::new(receiver));
                topic.groups.insert(
                    group.to_string(),
                    ConsumerGroup {
                        sender,
                        receiver: receiver.clone(),
                    },
                );
                receiver
            }
        };

        let stream = futures::stream::unfold(receiver, |receiver| async move {
            let payload = receiver.lock().await.recv().await;
            payload.map(|payload| (payload, receiver))
        });

        Ok(Box::pin(stream))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        // Dropping the senders ends every subscription once it is drained
        self.topics.lock().await.clear();
    }
}
