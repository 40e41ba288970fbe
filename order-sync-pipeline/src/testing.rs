//! Scripted consumer and in-memory collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use order_sync_repository::{LookupError, OrderIndex, OrderLookup, SearchEngineQuery, SearchIndexError};
use order_sync_shared::{OrderDocument, SearchResponse};

use crate::consumer::{ConsumedMessage, MessageConsumer, MessagePosition};
use crate::errors::{ConsumerError, PublishError};
use crate::producer::DocumentPublisher;

pub enum Step {
    Message { payload: Vec<u8>, delay: Duration },
    Timeout,
    Error,
}

impl Step {
    pub fn message(payload: impl Into<Vec<u8>>) -> Self {
        Self::Message {
            payload: payload.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(payload: impl Into<Vec<u8>>, delay_ms: u64) -> Self {
        Self::Message {
            payload: payload.into(),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Plays back a fixed script; an exhausted script behaves like an empty queue.
pub struct ScriptedConsumer {
    topic: String,
    steps: Mutex<VecDeque<Step>>,
    next_offset: AtomicUsize,
    polls: AtomicUsize,
    fail_subscribe: bool,
    failing_seeks: AtomicUsize,
    commits: Mutex<Vec<Vec<MessagePosition>>>,
    seeks: Mutex<Vec<MessagePosition>>,
}

impl ScriptedConsumer {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            topic: "orders".to_string(),
            steps: Mutex::new(steps.into()),
            next_offset: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            fail_subscribe: false,
            failing_seeks: AtomicUsize::new(0),
            commits: Mutex::new(Vec::new()),
            seeks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_messages(topic: &str, payloads: &[&str]) -> Self {
        let mut consumer = Self::new(payloads.iter().map(|p| Step::message(p.as_bytes())).collect());
        consumer.topic = topic.to_string();
        consumer
    }

    pub fn failing_subscribe() -> Self {
        Self {
            fail_subscribe: true,
            ..Self::new(Vec::new())
        }
    }

    /// Make the next `count` seeks fail; failed seeks are not recorded.
    pub fn with_failing_seeks(self, count: usize) -> Self {
        self.failing_seeks.store(count, Ordering::SeqCst);
        self
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> Vec<Vec<MessagePosition>> {
        self.commits.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<MessagePosition> {
        self.seeks.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageConsumer for ScriptedConsumer {
    fn subscribe(&self) -> Result<(), ConsumerError> {
        if self.fail_subscribe {
            return Err(ConsumerError::subscription("broker unreachable"));
        }
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> Result<Option<ConsumedMessage>, ConsumerError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Message { payload, delay }) => {
                tokio::time::sleep(delay).await;
                let offset = self.next_offset.fetch_add(1, Ordering::SeqCst) as i64;
                Ok(Some(ConsumedMessage::new(
                    MessagePosition::new(self.topic.clone(), 0, offset),
                    payload,
                )))
            }
            Some(Step::Error) => Err(ConsumerError::read("broker transport failure")),
            Some(Step::Timeout) | None => {
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
        }
    }

    fn commit(&self, positions: &[MessagePosition]) -> Result<(), ConsumerError> {
        self.commits.lock().unwrap().push(positions.to_vec());
        Ok(())
    }

    fn seek(&self, position: &MessagePosition) -> Result<(), ConsumerError> {
        if self
            .failing_seeks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ConsumerError::seek("partition not assigned"));
        }
        self.seeks.lock().unwrap().push(position.clone());
        Ok(())
    }
}

/// Order lookup answering from a fixed table; unknown ids fail with a
/// transport error unless listed as missing or failing.
#[derive(Default)]
pub struct MockLookup {
    documents: HashMap<String, OrderDocument>,
    missing: Vec<String>,
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl MockLookup {
    pub fn with(mut self, document: OrderDocument) -> Self {
        self.documents.insert(document.id.clone(), document);
        self
    }

    pub fn missing(mut self, order_id: &str) -> Self {
        self.missing.push(order_id.to_string());
        self
    }

    /// The order service answers 500 for this order every time.
    pub fn failing(mut self, order_id: &str) -> Self {
        self.failing.push(order_id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderLookup for MockLookup {
    async fn resolve(&self, order_id: &str) -> Result<OrderDocument, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing.iter().any(|id| id == order_id) {
            return Err(LookupError::not_found(order_id));
        }
        if self.failing.iter().any(|id| id == order_id) {
            return Err(LookupError::UnexpectedStatus {
                order_id: order_id.to_string(),
                status: 500,
            });
        }
        self.documents
            .get(order_id)
            .cloned()
            .ok_or_else(|| LookupError::transport("connection refused"))
    }
}

/// Records published payloads; keys listed in `reject` fail to enqueue.
#[derive(Default)]
pub struct MockPublisher {
    pub published: Mutex<Vec<(String, Vec<u8>)>>,
    reject: Vec<String>,
}

impl MockPublisher {
    pub fn rejecting(key: &str) -> Self {
        Self {
            reject: vec![key.to_string()],
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.published.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }
}

#[async_trait]
impl DocumentPublisher for MockPublisher {
    async fn publish(&self, key: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if self.reject.iter().any(|k| k == key) {
            return Err(PublishError::Enqueue("queue full".to_string()));
        }
        self.published.lock().unwrap().push((key.to_string(), payload));
        Ok(())
    }
}

/// Index keeping documents in a map; ids listed in `fail_ids` fail to write.
#[derive(Default)]
pub struct MockIndex {
    pub documents: Mutex<HashMap<String, OrderDocument>>,
    pub upserts: AtomicUsize,
    pub deletes: AtomicUsize,
    fail_ids: Vec<String>,
}

impl MockIndex {
    pub fn failing_for(order_id: &str) -> Self {
        Self {
            fail_ids: vec![order_id.to_string()],
            ..Self::default()
        }
    }

    pub fn insert(&self, document: OrderDocument) {
        self.documents.lock().unwrap().insert(document.id.clone(), document);
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.documents.lock().unwrap().contains_key(order_id)
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

#[async_trait]
impl OrderIndex for MockIndex {
    async fn upsert(&self, document: &OrderDocument) -> Result<(), SearchIndexError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_ids.contains(&document.id) {
            return Err(SearchIndexError::index("shard unavailable"));
        }
        self.insert(document.clone());
        Ok(())
    }

    async fn delete_by_id(&self, order_id: &str) -> Result<(), SearchIndexError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_ids.iter().any(|id| id == order_id) {
            return Err(SearchIndexError::delete("shard unavailable"));
        }
        self.documents.lock().unwrap().remove(order_id);
        Ok(())
    }

    async fn get_by_id(&self, order_id: &str) -> Result<Option<OrderDocument>, SearchIndexError> {
        Ok(self.documents.lock().unwrap().get(order_id).cloned())
    }

    async fn search(&self, _query: &SearchEngineQuery) -> Result<SearchResponse, SearchIndexError> {
        Ok(SearchResponse::empty())
    }

    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchIndexError> {
        Ok(true)
    }
}
