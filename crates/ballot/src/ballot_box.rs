//! The live vote overlay for one locale
//!
//! Votes are held in memory per path and written through to the
//! [`VoteStore`] before they become visible. Resolved values are computed on
//! first read and cached until a vote on that path changes them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use vetting_config::VettingConfig;
use vetting_core::{path, LocaleId, Status, VoterDirectory, VoterId};
use vetting_resolver::{BallotEntry, ResolutionInput, ResolutionResult, Resolver, INHERITANCE_MARKER};
use vetting_storage::{
    BaselineFactory, BaselineStore, CacheKey, CacheRecord, LocaleCacheStore, StorageError, VoteRecord, VoteStore,
};

use crate::permissions;
use crate::source::LocaleSource;
use crate::validate::ValueValidator;
use crate::{BallotError, BallotResult};

/// Collaborators shared by every ballot box in a context
pub(crate) struct Services {
    pub config: Arc<VettingConfig>,
    pub voters: Arc<dyn VoterDirectory>,
    pub baselines: Arc<dyn BaselineFactory>,
    pub store: Arc<dyn VoteStore>,
    pub cache: Option<Arc<LocaleCacheStore>>,
    pub validator: Arc<dyn ValueValidator>,
    pub resolver: Resolver,
}

/// A voter's current vote on one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVote {
    /// None is an abstention
    pub value: Option<String>,
    pub override_votes: Option<u32>,
    pub when: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct PathVotes {
    users: BTreeMap<VoterId, UserVote>,
    alternates: BTreeSet<String>,
    last_mod: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedEntry {
    value: Option<String>,
    full_path: Option<String>,
    winning_path: Option<String>,
}

pub struct BallotBox {
    locale: LocaleId,
    parent: Option<Arc<BallotBox>>,
    baseline: Arc<dyn BaselineStore>,
    services: Arc<Services>,
    read_only: bool,
    votes: DashMap<String, PathVotes>,
    resolved: DashMap<String, ResolvedEntry>,
    write_lock: Mutex<()>,
    cache_lock: std::sync::Mutex<()>,
    stamp: AtomicU64,
}

impl BallotBox {
    /// Build the overlay for `locale`: read its baseline, replay stored
    /// votes, then warm resolved values from the cache or rebuild it.
    pub(crate) async fn load(
        locale: LocaleId,
        parent: Option<Arc<BallotBox>>,
        services: Arc<Services>,
    ) -> BallotResult<Arc<Self>> {
        let started = Instant::now();
        let baseline = services.baselines.open(&locale)?;
        let read_only = services.config.is_read_only(locale.as_str());

        let ballot_box = Arc::new(Self {
            locale,
            parent,
            baseline,
            services,
            read_only,
            votes: DashMap::new(),
            resolved: DashMap::new(),
            write_lock: Mutex::new(()),
            cache_lock: std::sync::Mutex::new(()),
            stamp: AtomicU64::new(0),
        });

        let loaded = if read_only { 0 } else { ballot_box.load_votes().await? };
        let warming = ballot_box.clone();
        tokio::task::spawn_blocking(move || warming.warm_from_cache())
            .await
            .map_err(|e| BallotError::LocaleUnavailable(format!("cache task failed: {}", e)))?;

        info!(
            locale = %ballot_box.locale,
            votes = loaded,
            paths = ballot_box.votes.len(),
            read_only,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded ballot box"
        );
        Ok(ballot_box)
    }

    async fn load_votes(&self) -> BallotResult<usize> {
        let _guard = self.write_lock.lock().await;
        let records = self.services.store.votes_for_locale(&self.locale).await?;
        let alternates = self.services.store.alternates_for_locale(&self.locale).await?;

        let mut loaded = 0;
        let mut unknown = BTreeSet::new();
        let mut invalid_paths = BTreeSet::new();
        for record in records {
            if !self.is_known_path(&record.path) {
                invalid_paths.insert(record.path);
                continue;
            }
            let Some(voter) = self.services.voters.get(record.voter) else {
                unknown.insert(record.voter);
                continue;
            };
            if let Err(e) = permissions::check_locale_access(&voter, &self.locale) {
                info!(locale = %self.locale, voter = %record.voter, "Skipping stored vote: {}", e);
                continue;
            }
            self.apply_vote(
                &record.path,
                record.voter,
                UserVote {
                    value: record.value,
                    override_votes: record.override_votes,
                    when: record.last_mod,
                },
            );
            loaded += 1;
        }

        for (path, values) in alternates {
            if self.is_known_path(&path) {
                self.votes.entry(path).or_default().alternates.extend(values);
            }
        }

        if !unknown.is_empty() {
            warn!(locale = %self.locale, voters = ?unknown, "Skipped votes from unknown voters");
        }
        for path in invalid_paths {
            match self.services.store.delete_path(&self.locale, &path).await {
                Ok(removed) => info!(locale = %self.locale, "Deleted {} votes on invalid path {}", removed, path),
                Err(e) => warn!(locale = %self.locale, "Could not delete votes on invalid path {}: {}", path, e),
            }
        }
        Ok(loaded)
    }

    fn warm_from_cache(&self) {
        let Some(cache) = self.cache_store() else {
            return;
        };
        let key = self.cache_key();
        match cache.load(&self.locale, &key) {
            Ok(Some(records)) => {
                let count = records.len();
                for record in records {
                    self.resolved.insert(
                        record.path,
                        ResolvedEntry {
                            value: record.value,
                            full_path: record.full_path,
                            winning_path: record.winning_path,
                        },
                    );
                }
                // Inheritance votes depend on the parent, which may have moved
                for path in self.paths_voting_to_inherit() {
                    self.resolved.remove(&path);
                }
                debug!(locale = %self.locale, rows = count, "Warmed from locale cache");
            }
            Ok(None) => self.rebuild_cache(cache, &key),
            Err(e) => {
                warn!(locale = %self.locale, error = %e, "Discarding unreadable locale cache");
                if let Err(e) = cache.remove(&self.locale, &key) {
                    warn!(locale = %self.locale, error = %e, "Could not remove locale cache");
                }
                self.rebuild_cache(cache, &key);
            }
        }
    }

    fn rebuild_cache(&self, cache: &LocaleCacheStore, key: &CacheKey) {
        let records = self.snapshot();
        match cache.save(&self.locale, key, &records) {
            Ok(file) => debug!(locale = %self.locale, "Rebuilt locale cache at {}", file.display()),
            Err(e) => warn!(locale = %self.locale, error = %e, "Could not write locale cache"),
        }
    }

    fn cache_store(&self) -> Option<&LocaleCacheStore> {
        if !self.services.config.cache_enabled {
            return None;
        }
        self.services.cache.as_deref()
    }

    /// Key of the cache file matching the current baseline and votes
    pub(crate) fn cache_key(&self) -> CacheKey {
        let token = self.baseline.identity_token();
        if self.read_only {
            CacheKey::raw(token)
        } else {
            CacheKey::winning(token, self.votes_digest())
        }
    }

    /// Digest of everything besides the baseline that feeds resolution
    fn votes_digest(&self) -> String {
        let votes: BTreeMap<String, PathVotes> = self
            .votes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut hasher = Sha256::new();
        let config = &self.services.config;
        hasher.update(format!("{:?}", config.thresholds));
        hasher.update(format!("{:?}{:?}", config.established_locales, config.high_bar_paths));
        for (path, path_votes) in &votes {
            hasher.update(path.as_bytes());
            for (voter, vote) in &path_votes.users {
                let standing = self
                    .services
                    .voters
                    .get(*voter)
                    .map(|info| format!("{}:{:?}", info.organization, info.level));
                hasher.update(format!(
                    "\0{}\0{:?}\0{:?}\0{:?}\0{}",
                    voter,
                    standing,
                    vote.value,
                    vote.override_votes,
                    vote.when.timestamp_micros()
                ));
            }
            hasher.update(b"\n");
        }
        hex::encode(&hasher.finalize()[..8])
    }

    fn paths_voting_to_inherit(&self) -> Vec<String> {
        self.votes
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .users
                    .values()
                    .any(|vote| vote.value.as_deref() == Some(INHERITANCE_MARKER))
            })
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Whether votes may be held on `path`
    fn is_known_path(&self, path: &str) -> bool {
        if !path::is_well_formed(path) {
            return false;
        }
        self.services.config.allow_new_paths || self.resolved_baseline_contains(path)
    }

    /// Whether this locale or any ancestor has a baseline entry for `path`
    /// or for the path it proposes an alternate of
    fn resolved_baseline_contains(&self, path: &str) -> bool {
        let base = path::base_path(path);
        let mut current = Some(self);
        while let Some(ballot_box) = current {
            if ballot_box.baseline.contains(path) || ballot_box.baseline.contains(&base) {
                return true;
            }
            current = ballot_box.parent.as_deref();
        }
        false
    }

    fn check_path(&self, path: &str) -> BallotResult<()> {
        path::validate(path).map_err(|e| BallotError::InvalidPath(e.to_string()))?;
        if !self.is_known_path(path) {
            return Err(BallotError::InvalidPath(format!(
                "{} is not a path of {}",
                path, self.locale
            )));
        }
        Ok(())
    }

    fn check_value(&self, value: &str) -> BallotResult<()> {
        let units = value.encode_utf16().count();
        let limit = self.services.config.max_value_length;
        if units > limit {
            return Err(BallotError::BadValue(format!(
                "value has {} code units, limit is {}",
                units, limit
            )));
        }
        Ok(())
    }

    fn apply_vote(&self, path: &str, voter: VoterId, vote: UserVote) {
        let mut entry = self.votes.entry(path.to_string()).or_default();
        entry.last_mod = entry.last_mod.max(Some(vote.when));
        entry.users.insert(voter, vote);
    }

    /// Every path with a baseline value or a vote
    fn paths(&self) -> Vec<String> {
        let mut paths: BTreeSet<String> = self.baseline.paths().into_iter().collect();
        paths.extend(self.votes.iter().map(|entry| entry.key().clone()));
        paths.into_iter().collect()
    }

    /// Paths of the resolved locale: this locale's and its ancestors'
    /// baseline paths, plus every path holding votes here
    fn resolved_paths(&self) -> Vec<String> {
        let mut paths: BTreeSet<String> = self.votes.iter().map(|entry| entry.key().clone()).collect();
        let mut current = Some(self);
        while let Some(ballot_box) = current {
            paths.extend(ballot_box.baseline.paths());
            current = ballot_box.parent.as_deref();
        }
        paths.into_iter().collect()
    }

    fn resolution_input(&self, path: &str) -> ResolutionInput {
        let config = &self.services.config;
        let baseline_value = self.baseline.value(path);
        let bailey = self.inherited_value(path).map(|(value, _)| value);

        let mut input = ResolutionInput::new(path)
            .baseline(baseline_value.as_deref(), self.baseline.status(path))
            .bailey(bailey.as_deref())
            .high_bar(config.is_high_bar(path))
            .established(config.is_established(self.locale.as_str()));
        input.last_release = self.baseline.last_release(path);

        if let Some(path_votes) = self.votes.get(path) {
            input.votes = path_votes
                .users
                .iter()
                .map(|(voter, vote)| BallotEntry {
                    voter: *voter,
                    value: vote.value.clone(),
                    references: None,
                    override_votes: vote.override_votes,
                    when: vote.when,
                })
                .collect();
        }

        let mut values: BTreeSet<String> = input.votes.iter().filter_map(|ballot| ballot.value.clone()).collect();
        values.extend(baseline_value);
        for value in values {
            if self.services.validator.disqualifies(&self.locale, path, &value) {
                input.disqualified.insert(value);
            }
        }
        input
    }

    fn resolve(&self, path: &str) -> ResolutionResult {
        self.services
            .resolver
            .resolve(&self.resolution_input(path), self.services.voters.as_ref())
    }

    fn entry_from(&self, path: &str, result: &ResolutionResult) -> ResolvedEntry {
        let Some(value) = result.winning_value.clone() else {
            return ResolvedEntry {
                value: None,
                full_path: None,
                winning_path: None,
            };
        };
        let base_full = self.baseline.full_path(path).unwrap_or_else(|| path.to_string());
        ResolvedEntry {
            full_path: path::with_draft(&base_full, result.status),
            winning_path: Some(path::base_path(path)),
            value: Some(value),
        }
    }

    fn baseline_entry(&self, path: &str) -> ResolvedEntry {
        let value = self.baseline.value(path);
        ResolvedEntry {
            full_path: value.as_ref().and_then(|_| self.baseline.full_path(path)),
            winning_path: value.as_ref().map(|_| path.to_string()),
            value,
        }
    }

    fn entry(&self, path: &str) -> ResolvedEntry {
        if let Some(entry) = self.resolved.get(path) {
            return entry.clone();
        }
        // Computed under the shard lock so a concurrent vote's invalidation
        // cannot be overwritten by a stale result
        self.resolved
            .entry(path.to_string())
            .or_insert_with(|| {
                if self.read_only {
                    self.baseline_entry(path)
                } else {
                    let result = self.resolve(path);
                    self.entry_from(path, &result)
                }
            })
            .clone()
    }

    fn current_value(&self, path: &str) -> Option<String> {
        self.entry(path).value
    }

    /// Value the path inherits from the nearest ancestor that has one
    fn inherited_value(&self, path: &str) -> Option<(String, LocaleId)> {
        let mut current = self.parent.clone();
        while let Some(parent) = current {
            if let Some(value) = parent.current_value(path) {
                if value != INHERITANCE_MARKER {
                    return Some((value, parent.locale.clone()));
                }
            }
            current = parent.parent.clone();
        }
        None
    }

    fn snapshot(&self) -> Vec<CacheRecord> {
        self.paths()
            .into_iter()
            .map(|path| {
                let entry = self.entry(&path);
                CacheRecord {
                    path,
                    full_path: entry.full_path,
                    winning_path: entry.winning_path,
                    value: entry.value,
                }
            })
            .collect()
    }

    fn user_vote(&self, voter: VoterId, path: &str) -> Option<UserVote> {
        self.votes
            .get(path)
            .and_then(|path_votes| path_votes.users.get(&voter).cloned())
    }

    fn durability_failure(&self, e: StorageError) -> BallotError {
        error!(locale = %self.locale, error = %e, "Vote store write failed, vote discarded");
        BallotError::DurabilityFailure(e.to_string())
    }

    fn invalidate(&self, path: &str) {
        self.resolved.remove(path);
        self.stamp.fetch_add(1, Ordering::SeqCst);
    }

    async fn cast(
        self: &Arc<Self>,
        voter_id: VoterId,
        path: &str,
        value: Option<&str>,
        override_votes: Option<u32>,
    ) -> BallotResult<ResolutionResult> {
        if self.read_only {
            return Err(BallotError::ReadOnlyLocale(self.locale.clone()));
        }
        let voter = self
            .services
            .voters
            .get(voter_id)
            .ok_or(BallotError::UnknownVoter(voter_id))?;
        permissions::check_vote_permission(&voter, &self.locale, &self.services.config)?;
        let override_votes = permissions::check_override(&voter, override_votes)?;
        self.check_path(path)?;
        if let Some(value) = value {
            self.check_value(value)?;
        }

        let guard = self.write_lock.lock().await;
        let now = Utc::now();
        let replaced = self
            .user_vote(voter_id, path)
            .and_then(|previous| previous.value)
            .filter(|previous| Some(previous.as_str()) != value);

        if let Some(previous) = &replaced {
            self.services
                .store
                .put_alternate(&self.locale, path, previous)
                .await
                .map_err(|e| self.durability_failure(e))?;
        }
        let record = VoteRecord {
            locale: self.locale.clone(),
            path: path.to_string(),
            voter: voter_id,
            value: value.map(str::to_string),
            override_votes,
            last_mod: now,
        };
        self.services
            .store
            .put_vote(&record)
            .await
            .map_err(|e| self.durability_failure(e))?;

        self.apply_vote(
            path,
            voter_id,
            UserVote {
                value: record.value,
                override_votes,
                when: now,
            },
        );
        if let Some(previous) = replaced {
            if let Some(mut path_votes) = self.votes.get_mut(path) {
                path_votes.alternates.insert(previous);
            }
        }
        self.invalidate(path);
        let result = self.resolve(path);
        self.resolved.insert(path.to_string(), self.entry_from(path, &result));
        drop(guard);

        debug!(
            locale = %self.locale,
            voter = %voter_id,
            path,
            winner = ?result.winning_value,
            status = %result.status,
            "Recorded vote"
        );
        self.schedule_cache_save();
        Ok(result)
    }

    async fn withdraw(self: &Arc<Self>, voter_id: VoterId, path: &str) -> BallotResult<bool> {
        if self.read_only {
            return Err(BallotError::ReadOnlyLocale(self.locale.clone()));
        }
        let voter = self
            .services
            .voters
            .get(voter_id)
            .ok_or(BallotError::UnknownVoter(voter_id))?;
        permissions::check_vote_permission(&voter, &self.locale, &self.services.config)?;

        let guard = self.write_lock.lock().await;
        let previous = self.user_vote(voter_id, path);
        if let Some(value) = previous.as_ref().and_then(|vote| vote.value.as_deref()) {
            self.services
                .store
                .put_alternate(&self.locale, path, value)
                .await
                .map_err(|e| self.durability_failure(e))?;
        }
        let stored = self
            .services
            .store
            .delete_vote(&self.locale, path, voter_id)
            .await
            .map_err(|e| self.durability_failure(e))?;

        let removed = previous.is_some() || stored;
        if let Some(previous) = previous {
            if let Some(mut path_votes) = self.votes.get_mut(path) {
                path_votes.users.remove(&voter_id);
                path_votes.alternates.extend(previous.value);
                path_votes.last_mod = Some(Utc::now());
            }
            self.invalidate(path);
        }
        drop(guard);

        if removed {
            debug!(locale = %self.locale, voter = %voter_id, path, "Withdrew vote");
            self.schedule_cache_save();
        }
        Ok(removed)
    }

    fn schedule_cache_save(self: &Arc<Self>) {
        if self.cache_store().is_none() {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.save_cache().await {
                warn!(locale = %this.locale, error = %e, "Could not save locale cache");
            }
        });
    }

    /// Write the cache file for the current state. Returns false when there
    /// is no cache or a newer vote superseded this snapshot.
    pub(crate) async fn save_cache(self: &Arc<Self>) -> BallotResult<bool> {
        if self.cache_store().is_none() {
            return Ok(false);
        }
        let this = self.clone();
        let stamp = self.stamp();
        tokio::task::spawn_blocking(move || {
            let Some(cache) = this.cache_store() else {
                return Ok(false);
            };
            // Saves run one at a time so an older snapshot never prunes a newer file
            let _lock = this.cache_lock.lock().unwrap_or_else(|e| e.into_inner());
            let key = this.cache_key();
            let records = this.snapshot();
            if this.stamp() != stamp {
                return Ok(false);
            }
            cache
                .save(&this.locale, &key, &records)
                .map(|_| true)
                .map_err(|e| BallotError::Storage(e.into()))
        })
        .await
        .map_err(|e| BallotError::LocaleUnavailable(format!("cache task failed: {}", e)))?
    }

    pub(crate) fn locale(&self) -> &LocaleId {
        &self.locale
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) fn stamp(&self) -> u64 {
        self.stamp.load(Ordering::SeqCst)
    }
}

/// Read access to a locale's overlay
#[derive(Clone)]
pub struct BallotReader {
    inner: Arc<BallotBox>,
}

impl BallotReader {
    pub(crate) fn new(inner: Arc<BallotBox>) -> Self {
        Self { inner }
    }

    pub fn locale(&self) -> &LocaleId {
        self.inner.locale()
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    pub fn baseline(&self) -> &Arc<dyn BaselineStore> {
        &self.inner.baseline
    }

    pub(crate) fn validator(&self) -> &dyn ValueValidator {
        self.inner.services.validator.as_ref()
    }

    /// Every value anyone proposed for `path`, plus the baseline value
    pub fn get_values(&self, path: &str) -> BTreeSet<String> {
        let mut values = BTreeSet::new();
        if let Some(path_votes) = self.inner.votes.get(path) {
            values.extend(path_votes.users.values().filter_map(|vote| vote.value.clone()));
            values.extend(path_votes.alternates.iter().cloned());
        }
        values.extend(self.inner.baseline.value(path));
        values
    }

    /// Voters whose current vote is `value`
    pub fn get_votes_for_value(&self, path: &str, value: &str) -> BTreeSet<VoterId> {
        self.inner
            .votes
            .get(path)
            .map(|path_votes| {
                path_votes
                    .users
                    .iter()
                    .filter(|(_, vote)| vote.value.as_deref() == Some(value))
                    .map(|(voter, _)| *voter)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The voter's value, None when they abstained or never voted
    pub fn get_vote_value(&self, voter: VoterId, path: &str) -> Option<String> {
        self.inner.user_vote(voter, path).and_then(|vote| vote.value)
    }

    pub fn get_user_vote(&self, voter: VoterId, path: &str) -> Option<UserVote> {
        self.inner.user_vote(voter, path)
    }

    /// True for abstentions too
    pub fn user_did_vote(&self, voter: VoterId, path: &str) -> bool {
        self.inner.user_vote(voter, path).is_some()
    }

    /// Values that were proposed and later left
    pub fn alternates(&self, path: &str) -> BTreeSet<String> {
        self.inner
            .votes
            .get(path)
            .map(|path_votes| path_votes.alternates.clone())
            .unwrap_or_default()
    }

    /// Full resolution of `path` against the current votes
    pub fn get_resolver(&self, path: &str) -> ResolutionResult {
        if self.inner.read_only {
            let mut input = ResolutionInput::new(path).baseline(
                self.inner.baseline.value(path).as_deref(),
                self.inner.baseline.status(path),
            );
            input.last_release = self.inner.baseline.last_release(path);
            return self
                .inner
                .services
                .resolver
                .resolve(&input, self.inner.services.voters.as_ref());
        }
        self.inner.resolve(path)
    }

    pub fn last_modified(&self, path: &str) -> Option<DateTime<Utc>> {
        self.inner.votes.get(path).and_then(|path_votes| path_votes.last_mod)
    }

    /// Counter bumped on every accepted change
    pub fn stamp(&self) -> u64 {
        self.inner.stamp()
    }

    /// Paths holding at least one vote, sorted
    pub fn voted_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .inner
            .votes
            .iter()
            .filter(|entry| !entry.value().users.is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        paths.sort();
        paths
    }

    /// Every path a row can be shown for, inherited ones included, sorted
    pub fn resolved_paths(&self) -> Vec<String> {
        self.inner.resolved_paths()
    }

    /// Value and source locale the path would inherit
    pub fn inherited_value(&self, path: &str) -> Option<(String, LocaleId)> {
        self.inner.inherited_value(path)
    }

    /// Current resolved status of `path`
    pub fn status(&self, path: &str) -> Status {
        LocaleSource::status(self, path)
    }

    /// Resolved rows in the cache layout
    pub fn snapshot(&self) -> Vec<CacheRecord> {
        self.inner.snapshot()
    }
}

impl LocaleSource for BallotReader {
    fn locale(&self) -> &LocaleId {
        self.inner.locale()
    }

    fn value(&self, path: &str) -> Option<String> {
        self.inner.current_value(path)
    }

    fn full_path(&self, path: &str) -> Option<String> {
        self.inner.entry(path).full_path
    }

    fn paths(&self) -> Vec<String> {
        self.inner.paths()
    }
}

/// Write access to a locale's overlay. Only issued for writable locales.
#[derive(Clone)]
pub struct BallotWriter {
    inner: Arc<BallotBox>,
}

impl BallotWriter {
    pub(crate) fn new(inner: Arc<BallotBox>) -> Self {
        Self { inner }
    }

    pub fn reader(&self) -> BallotReader {
        BallotReader::new(self.inner.clone())
    }

    /// Record `voter`'s vote for `value` on `path`. `None` abstains.
    pub async fn vote_for_value(
        &self,
        voter: VoterId,
        path: &str,
        value: Option<&str>,
    ) -> BallotResult<ResolutionResult> {
        self.inner.cast(voter, path, value, None).await
    }

    /// Vote at a reduced weight; needs a level that may override
    pub async fn vote_with_override(
        &self,
        voter: VoterId,
        path: &str,
        value: Option<&str>,
        override_votes: u32,
    ) -> BallotResult<ResolutionResult> {
        self.inner.cast(voter, path, value, Some(override_votes)).await
    }

    /// Record an explicit abstention
    pub async fn abstain(&self, voter: VoterId, path: &str) -> BallotResult<ResolutionResult> {
        self.inner.cast(voter, path, None, None).await
    }

    /// Remove the voter's vote entirely. Returns whether there was one.
    pub async fn unvote(&self, voter: VoterId, path: &str) -> BallotResult<bool> {
        self.inner.withdraw(voter, path).await
    }

    /// Cast the voter's current vote again, refreshing its time and weight
    pub async fn revote(&self, voter: VoterId, path: &str) -> BallotResult<ResolutionResult> {
        let current = self
            .inner
            .user_vote(voter, path)
            .ok_or_else(|| BallotError::BadValue(format!("voter {} has no vote on {}", voter, path)))?;
        self.inner
            .cast(voter, path, current.value.as_deref(), current.override_votes)
            .await
    }
}
