//! Vote store backed by an embedded sled database
//!
//! Keys are `locale \0 path \0 voter` so that a prefix scan on the locale
//! returns every vote for it. Each write is flushed before returning.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use vetting_core::{LocaleId, VoterId};

use crate::votes::{VoteRecord, VoteStore};
use crate::{StorageError, StorageResult};

const VOTES_TREE: &str = "votes";
const ALTERNATES_TREE: &str = "alternates";

pub struct SledVoteStore {
    db: sled::Db,
    votes: sled::Tree,
    alternates: sled::Tree,
}

impl SledVoteStore {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path.as_ref())?;
        debug!("Opened vote database at {}", path.as_ref().display());
        Self::from_db(db)
    }

    /// A database that is deleted when dropped
    pub fn temporary() -> StorageResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StorageResult<Self> {
        let votes = db.open_tree(VOTES_TREE)?;
        let alternates = db.open_tree(ALTERNATES_TREE)?;
        Ok(Self { db, votes, alternates })
    }

    async fn flush(&self) -> StorageResult<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

fn locale_prefix(locale: &LocaleId) -> Vec<u8> {
    format!("{}\0", locale).into_bytes()
}

fn path_prefix(locale: &LocaleId, path: &str) -> Vec<u8> {
    format!("{}\0{}\0", locale, path).into_bytes()
}

fn vote_key(locale: &LocaleId, path: &str, voter: VoterId) -> Vec<u8> {
    format!("{}\0{}\0{:010}", locale, path, voter.0).into_bytes()
}

fn alternate_key(locale: &LocaleId, path: &str, value: &str) -> Vec<u8> {
    format!("{}\0{}\0{}", locale, path, value).into_bytes()
}

fn remove_prefix(tree: &sled::Tree, prefix: &[u8]) -> StorageResult<usize> {
    let keys: Vec<sled::IVec> = tree.scan_prefix(prefix).keys().collect::<Result<_, _>>()?;
    let mut removed = 0;
    for key in keys {
        if tree.remove(&key)?.is_some() {
            removed += 1;
        }
    }
    Ok(removed)
}

#[async_trait]
impl VoteStore for SledVoteStore {
    async fn put_vote(&self, record: &VoteRecord) -> StorageResult<()> {
        let bytes = bincode::serialize(record)?;
        self.votes
            .insert(vote_key(&record.locale, &record.path, record.voter), bytes)?;
        self.flush().await
    }

    async fn delete_vote(&self, locale: &LocaleId, path: &str, voter: VoterId) -> StorageResult<bool> {
        let existed = self.votes.remove(vote_key(locale, path, voter))?.is_some();
        self.flush().await?;
        Ok(existed)
    }

    async fn delete_path(&self, locale: &LocaleId, path: &str) -> StorageResult<usize> {
        let prefix = path_prefix(locale, path);
        let removed = remove_prefix(&self.votes, &prefix)?;
        remove_prefix(&self.alternates, &prefix)?;
        self.flush().await?;
        Ok(removed)
    }

    async fn votes_for_locale(&self, locale: &LocaleId) -> StorageResult<Vec<VoteRecord>> {
        let mut records = Vec::new();
        for item in self.votes.scan_prefix(locale_prefix(locale)) {
            let (_, bytes) = item?;
            records.push(bincode::deserialize::<VoteRecord>(&bytes)?);
        }
        Ok(records)
    }

    async fn put_alternate(&self, locale: &LocaleId, path: &str, value: &str) -> StorageResult<()> {
        self.alternates
            .insert(alternate_key(locale, path, value), Vec::<u8>::new())?;
        self.flush().await
    }

    async fn alternates_for_locale(&self, locale: &LocaleId) -> StorageResult<BTreeMap<String, BTreeSet<String>>> {
        let mut alternates: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for key in self.alternates.scan_prefix(locale_prefix(locale)).keys() {
            let key = key?;
            let text = String::from_utf8(key.to_vec())
                .map_err(|e| StorageError::Corrupt(format!("alternate key is not UTF-8: {}", e)))?;
            let mut parts = text.splitn(3, '\0');
            let (_, Some(path), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
                return Err(StorageError::Corrupt(format!("malformed alternate key: {:?}", text)));
            };
            alternates
                .entry(path.to_string())
                .or_default()
                .insert(value.to_string());
        }
        Ok(alternates)
    }
}
