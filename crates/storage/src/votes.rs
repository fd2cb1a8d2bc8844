//! Durable vote storage
//!
//! Votes are keyed by (locale, path, voter). A record with no value is an
//! explicit abstention. Values that lost all their votes are kept as
//! "alternates" so they stay visible as candidates.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use vetting_core::{LocaleId, VoterId};

use crate::{StorageError, StorageResult};

/// A stored vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub locale: LocaleId,
    pub path: String,
    pub voter: VoterId,
    /// None records an abstention
    pub value: Option<String>,
    pub override_votes: Option<u32>,
    pub last_mod: DateTime<Utc>,
}

impl VoteRecord {
    pub fn new(locale: LocaleId, path: &str, voter: VoterId, value: Option<&str>) -> Self {
        Self {
            locale,
            path: path.to_string(),
            voter,
            value: value.map(str::to_string),
            override_votes: None,
            last_mod: Utc::now(),
        }
    }
}

/// Durable storage for votes.
///
/// Every write must be committed when the call returns.
#[async_trait]
pub trait VoteStore: Send + Sync + 'static {
    /// Insert or replace the vote of `record.voter` on `record.path`
    async fn put_vote(&self, record: &VoteRecord) -> StorageResult<()>;

    /// Remove a vote entirely; returns whether one existed
    async fn delete_vote(&self, locale: &LocaleId, path: &str, voter: VoterId) -> StorageResult<bool>;

    /// Remove every vote on a path; returns how many were removed
    async fn delete_path(&self, locale: &LocaleId, path: &str) -> StorageResult<usize>;

    /// All votes for a locale
    async fn votes_for_locale(&self, locale: &LocaleId) -> StorageResult<Vec<VoteRecord>>;

    /// Remember a value that was proposed on a path
    async fn put_alternate(&self, locale: &LocaleId, path: &str, value: &str) -> StorageResult<()>;

    /// Remembered values per path
    async fn alternates_for_locale(&self, locale: &LocaleId) -> StorageResult<BTreeMap<String, BTreeSet<String>>>;
}

type VoteKey = (LocaleId, String, VoterId);

/// In-memory vote store
#[derive(Debug, Default)]
pub struct MemoryVoteStore {
    votes: RwLock<BTreeMap<VoteKey, VoteRecord>>,
    alternates: RwLock<BTreeMap<(LocaleId, String), BTreeSet<String>>>,
    fail_writes: AtomicBool,
}

impl MemoryVoteStore {
    /// Create a new memory vote store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise durability failures
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.votes.read().await.len()
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("vote store is rejecting writes".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn put_vote(&self, record: &VoteRecord) -> StorageResult<()> {
        self.check_writable()?;
        let mut votes = self.votes.write().await;
        votes.insert(
            (record.locale.clone(), record.path.clone(), record.voter),
            record.clone(),
        );
        Ok(())
    }

    async fn delete_vote(&self, locale: &LocaleId, path: &str, voter: VoterId) -> StorageResult<bool> {
        self.check_writable()?;
        let mut votes = self.votes.write().await;
        Ok(votes
            .remove(&(locale.clone(), path.to_string(), voter))
            .is_some())
    }

    async fn delete_path(&self, locale: &LocaleId, path: &str) -> StorageResult<usize> {
        self.check_writable()?;
        let mut votes = self.votes.write().await;
        let before = votes.len();
        votes.retain(|(l, p, _), _| !(l == locale && p == path));
        self.alternates
            .write()
            .await
            .remove(&(locale.clone(), path.to_string()));
        Ok(before - votes.len())
    }

    async fn votes_for_locale(&self, locale: &LocaleId) -> StorageResult<Vec<VoteRecord>> {
        let votes = self.votes.read().await;
        Ok(votes
            .values()
            .filter(|record| &record.locale == locale)
            .cloned()
            .collect())
    }

    async fn put_alternate(&self, locale: &LocaleId, path: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut alternates = self.alternates.write().await;
        alternates
            .entry((locale.clone(), path.to_string()))
            .or_default()
            .insert(value.to_string());
        Ok(())
    }

    async fn alternates_for_locale(&self, locale: &LocaleId) -> StorageResult<BTreeMap<String, BTreeSet<String>>> {
        let alternates = self.alternates.read().await;
        Ok(alternates
            .iter()
            .filter(|((l, _), _)| l == locale)
            .map(|((_, path), values)| (path.clone(), values.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "//ldml/localeDisplayNames/languages/language[@type=\"oc\"]";

    fn fr() -> LocaleId {
        LocaleId::new("fr").unwrap()
    }

    #[tokio::test]
    async fn test_memory_vote_store_basic_operations() {
        let store = MemoryVoteStore::new();

        // Test put
        store.put_vote(&VoteRecord::new(fr(), PATH, VoterId(1), Some("occitan"))).await.unwrap();
        store.put_vote(&VoteRecord::new(fr(), PATH, VoterId(2), None)).await.unwrap();
        store
            .put_vote(&VoteRecord::new(LocaleId::new("de").unwrap(), PATH, VoterId(1), Some("Okzitanisch")))
            .await
            .unwrap();

        // Test overwrite
        store.put_vote(&VoteRecord::new(fr(), PATH, VoterId(1), Some("occitane"))).await.unwrap();

        let votes = store.votes_for_locale(&fr()).await.unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].value.as_deref(), Some("occitane"));
        assert!(votes[1].value.is_none());

        // Test delete
        assert!(store.delete_vote(&fr(), PATH, VoterId(2)).await.unwrap());
        assert!(!store.delete_vote(&fr(), PATH, VoterId(2)).await.unwrap());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_alternates_and_path_removal() {
        let store = MemoryVoteStore::new();
        store.put_alternate(&fr(), PATH, "occitan").await.unwrap();
        store.put_alternate(&fr(), PATH, "occitane").await.unwrap();
        store.put_vote(&VoteRecord::new(fr(), PATH, VoterId(1), Some("oc"))).await.unwrap();

        let alternates = store.alternates_for_locale(&fr()).await.unwrap();
        assert_eq!(alternates[PATH].len(), 2);

        assert_eq!(store.delete_path(&fr(), PATH).await.unwrap(), 1);
        assert!(store.alternates_for_locale(&fr()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_write_failure() {
        let store = MemoryVoteStore::new();
        store.set_fail_writes(true);
        let result = store.put_vote(&VoteRecord::new(fr(), PATH, VoterId(1), Some("x"))).await;
        assert!(matches!(result, Err(StorageError::WriteFailed(_))));
        assert_eq!(store.len().await, 0);

        store.set_fail_writes(false);
        store.put_vote(&VoteRecord::new(fr(), PATH, VoterId(1), Some("x"))).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
