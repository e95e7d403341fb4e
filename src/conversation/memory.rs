// Per-user conversation memory - bounded FIFO transcripts

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::transcript::{Speaker, Transcript, TranscriptEntry};
use crate::config::constants::MAX_MEMORY_LENGTH;

/// Process-lifetime store of each user's recent transcript.
///
/// Every `append` runs under the bucket's shard lock, so a push and its
/// eviction are observed together. Whole triggers from the same user are
/// serialised separately through [`MemoryStore::lock_user`].
pub struct MemoryStore {
    buckets: DashMap<String, VecDeque<TranscriptEntry>>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
    max_length: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_length(MAX_MEMORY_LENGTH)
    }

    /// Store keeping at most `max_length` entries per user (minimum 1)
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            buckets: DashMap::new(),
            user_locks: DashMap::new(),
            max_length: max_length.max(1),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Snapshot of the user's transcript; empty for unknown users
    pub fn get(&self, user_id: &str) -> Transcript {
        self.buckets
            .get(user_id)
            .map(|bucket| Transcript::from_entries(bucket.iter().cloned()))
            .unwrap_or_default()
    }

    /// Append an entry, evicting from the front once the cap is exceeded
    pub fn append(&self, user_id: &str, speaker: Speaker, text: impl Into<String>) {
        let mut bucket = self.buckets.entry(user_id.to_string()).or_default();
        bucket.push_back(TranscriptEntry::new(speaker, text));
        while bucket.len() > self.max_length {
            bucket.pop_front();
        }
    }

    /// Empty the user's transcript. Returns false if the user had none.
    ///
    /// The user key stays present with an empty transcript.
    pub fn clear(&self, user_id: &str) -> bool {
        match self.buckets.get_mut(user_id) {
            Some(mut bucket) => {
                bucket.clear();
                tracing::info!(user = %user_id, "Conversation memory cleared");
                true
            }
            None => false,
        }
    }

    pub fn len(&self, user_id: &str) -> usize {
        self.buckets.get(user_id).map(|b| b.len()).unwrap_or(0)
    }

    /// Acquire the user's conversation lock.
    ///
    /// Held for the duration of one trigger so two triggers from the same
    /// user cannot interleave their reads and appends. Other users are
    /// unaffected.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
