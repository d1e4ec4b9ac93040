//! Storage abstraction for the mastery sample log.
//!
//! The log is append-only: samples for a (user, topic) pair are kept in
//! arrival order and never edited or removed. A user's topic set is derived
//! from the same map that holds the samples, so the two cannot diverge.
//!
//! The tracker and the adaptive engine only see [`MasteryStore`], which lets
//! a durable backend such as [`crate::jsonl::JsonlStore`] replace the
//! in-memory one without touching the algorithms.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::MasterySample;

/// Append-only log of mastery samples keyed by (user, topic).
pub trait MasteryStore: Send + Sync {
    /// Append a sample to its (user, topic) log and register the topic for
    /// the user.
    fn append_mastery_sample(&self, sample: MasterySample) -> Result<(), StoreError>;

    /// Full log for a (user, topic) pair in arrival order. Empty if the pair
    /// has never been recorded. Returns a copy; the stored history cannot be
    /// altered through it.
    fn get_samples(&self, user_id: &str, topic_id: &str) -> Vec<MasterySample>;

    /// Topics with at least one recorded sample for the user.
    fn get_topics(&self, user_id: &str) -> BTreeSet<String>;

    /// Like [`MasteryStore::get_samples`] but stably sorted by timestamp.
    /// The stored log itself is left in arrival order.
    fn get_samples_by_time(&self, user_id: &str, topic_id: &str) -> Vec<MasterySample> {
        let mut samples = self.get_samples(user_id, topic_id);
        samples.sort_by_key(|s| s.timestamp());
        samples
    }
}

type Log = HashMap<String, BTreeMap<String, Vec<MasterySample>>>;

/// Process-lifetime in-memory store.
///
/// A single lock covers the whole log, so an append (sample plus topic
/// registration) is atomic and every read observes a complete history.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    log: RwLock<Log>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of samples across all users and topics.
    pub fn len(&self) -> usize {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        log.values().flat_map(|topics| topics.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MasteryStore for InMemoryStore {
    fn append_mastery_sample(&self, sample: MasterySample) -> Result<(), StoreError> {
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        let history = log
            .entry(sample.user_id().to_string())
            .or_default()
            .entry(sample.topic_id().to_string())
            .or_default();
        tracing::debug!(
            user = sample.user_id(),
            topic = sample.topic_id(),
            score = sample.score(),
            position = history.len(),
            "appending mastery sample"
        );
        history.push(sample);
        Ok(())
    }

    fn get_samples(&self, user_id: &str, topic_id: &str) -> Vec<MasterySample> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        log.get(user_id)
            .and_then(|topics| topics.get(topic_id))
            .cloned()
            .unwrap_or_default()
    }

    fn get_topics(&self, user_id: &str) -> BTreeSet<String> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        log.get(user_id)
            .map(|topics| topics.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Document retrieval
// ---------------------------------------------------------------------------

/// A chunk of parsed course material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Where the chunk came from (file name, page).
    pub source: String,
    pub text: String,
}

/// Similarity search over course material, used by the question generator.
///
/// Implemented outside this crate on top of a vector store.
pub trait DocumentIndex: Send + Sync {
    /// Index a batch of chunks, returning how many were stored.
    fn add_chunks(&self, chunks: Vec<DocumentChunk>) -> anyhow::Result<usize>;

    /// Return up to `k` chunks most similar to `query`, with their scores.
    fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<(DocumentChunk, f32)>>;
}
