//! Process-wide registry of per-locale overlays
//!
//! Each locale is loaded at most once, after its parent chain. Concurrent
//! requests for the same locale wait on the same load. A failed load leaves
//! the locale unloaded so the next request retries it.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use vetting_config::VettingConfig;
use vetting_core::{LocaleId, MemoryVoterDirectory, VoterDirectory};
use vetting_resolver::Resolver;
use vetting_storage::{BaselineFactory, DirectoryBaselines, LocaleCacheStore, SledVoteStore, StorageError, VoteStore};

use crate::ballot_box::{BallotBox, BallotReader, BallotWriter, Services};
use crate::hash::ValueHashRegistry;
use crate::section::{DataRow, DataSection};
use crate::source::{CachedLocale, LocaleView};
use crate::validate::{BasicValidator, ValueValidator};
use crate::{BallotError, BallotResult};

type OverlayCell = Arc<OnceCell<Arc<BallotBox>>>;

pub struct VettingContext {
    services: Arc<Services>,
    overlays: DashMap<LocaleId, OverlayCell>,
    hashes: ValueHashRegistry,
}

pub struct VettingContextBuilder {
    config: VettingConfig,
    voters: Arc<dyn VoterDirectory>,
    baselines: Arc<dyn BaselineFactory>,
    store: Arc<dyn VoteStore>,
    cache: Option<Arc<LocaleCacheStore>>,
    validator: Option<Arc<dyn ValueValidator>>,
}

impl VettingContextBuilder {
    pub fn cache(mut self, cache: Arc<LocaleCacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn ValueValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn build(self) -> VettingContext {
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(BasicValidator::new(self.config.max_value_length)));
        let services = Services {
            resolver: Resolver::new(self.config.thresholds.clone()),
            config: Arc::new(self.config),
            voters: self.voters,
            baselines: self.baselines,
            store: self.store,
            cache: self.cache,
            validator,
        };
        VettingContext {
            services: Arc::new(services),
            overlays: DashMap::new(),
            hashes: ValueHashRegistry::new(),
        }
    }
}

impl VettingContext {
    pub fn builder(
        config: VettingConfig,
        voters: Arc<dyn VoterDirectory>,
        baselines: Arc<dyn BaselineFactory>,
        store: Arc<dyn VoteStore>,
    ) -> VettingContextBuilder {
        VettingContextBuilder {
            config,
            voters,
            baselines,
            store,
            cache: None,
            validator: None,
        }
    }

    /// Open the on-disk layout under the configured data directory
    pub fn open(config: VettingConfig) -> BallotResult<Self> {
        let voters_file = config.voters_file();
        let voters = if voters_file.exists() {
            MemoryVoterDirectory::from_yaml_file(&voters_file)?
        } else {
            warn!("No voter directory at {}, every vote will be rejected", voters_file.display());
            MemoryVoterDirectory::new()
        };
        let store = SledVoteStore::open(config.votes_db())?;
        let baselines = DirectoryBaselines::new(config.baseline_dir());

        let mut builder = Self::builder(config.clone(), Arc::new(voters), Arc::new(baselines), Arc::new(store));
        if config.cache_enabled {
            let cache = LocaleCacheStore::open(config.cache_path()).map_err(StorageError::from)?;
            builder = builder.cache(Arc::new(cache));
        }
        info!("Opened vetting data at {}", config.data_dir.display());
        Ok(builder.build())
    }

    pub fn config(&self) -> &VettingConfig {
        &self.services.config
    }

    pub fn voters(&self) -> &Arc<dyn VoterDirectory> {
        &self.services.voters
    }

    pub fn hashes(&self) -> &ValueHashRegistry {
        &self.hashes
    }

    fn overlay<'a>(&'a self, locale: &'a LocaleId) -> BoxFuture<'a, BallotResult<Arc<BallotBox>>> {
        async move {
            let cell = self
                .overlays
                .entry(locale.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            let ballot_box = cell
                .get_or_try_init(|| async {
                    let parent = match locale.parent() {
                        Some(parent) => Some(self.overlay(&parent).await?),
                        None => None,
                    };
                    BallotBox::load(locale.clone(), parent, self.services.clone())
                        .await
                        .map_err(|e| {
                            warn!(locale = %locale, error = %e, "Failed to load locale");
                            BallotError::LocaleUnavailable(format!("{}: {}", locale, e))
                        })
                })
                .await?;
            Ok(ballot_box.clone())
        }
        .boxed()
    }

    pub async fn reader(&self, locale: &LocaleId) -> BallotResult<BallotReader> {
        Ok(BallotReader::new(self.overlay(locale).await?))
    }

    /// Writer for a locale; read-only locales never get one
    pub async fn writer(&self, locale: &LocaleId) -> BallotResult<BallotWriter> {
        if self.services.config.is_read_only(locale.as_str()) {
            return Err(BallotError::ReadOnlyLocale(locale.clone()));
        }
        Ok(BallotWriter::new(self.overlay(locale).await?))
    }

    /// The live view of a locale: the overlay, or the bare baseline when
    /// the locale is read-only
    pub async fn view(&self, locale: &LocaleId) -> BallotResult<LocaleView> {
        let reader = self.reader(locale).await?;
        if reader.is_read_only() {
            return Ok(LocaleView::Baseline(reader.baseline().clone()));
        }
        Ok(LocaleView::Overlay(reader))
    }

    /// The locale as stored in its current cache file, if one exists
    pub async fn cached_view(&self, locale: &LocaleId) -> BallotResult<Option<LocaleView>> {
        let Some(cache) = self.services.cache.clone() else {
            return Ok(None);
        };
        let ballot_box = self.overlay(locale).await?;
        let key = ballot_box.cache_key();
        let records = cache.load(locale, &key).map_err(StorageError::from)?;
        Ok(records.map(|records| LocaleView::Cached(Arc::new(CachedLocale::from_records(locale.clone(), records)))))
    }

    pub async fn data_section(&self, locale: &LocaleId, prefix: Option<&str>) -> BallotResult<DataSection> {
        let reader = self.reader(locale).await?;
        Ok(DataSection::build(&reader, prefix, &self.hashes))
    }

    pub async fn data_row(&self, locale: &LocaleId, path: &str) -> BallotResult<DataRow> {
        let reader = self.reader(locale).await?;
        Ok(DataRow::build(&reader, path, &self.hashes))
    }

    /// Value behind a hash handed out in a row
    pub fn lookup_value_hash(&self, hash: &str) -> BallotResult<Option<String>> {
        self.hashes.lookup(hash)
    }

    /// Drop a locale's overlay so the next request reloads it. Children
    /// already loaded keep the old parent until they are evicted too.
    pub fn evict(&self, locale: &LocaleId) -> bool {
        let removed = self.overlays.remove(locale).is_some();
        if removed {
            debug!(locale = %locale, "Evicted ballot box");
        }
        removed
    }

    pub fn loaded_locales(&self) -> Vec<LocaleId> {
        let mut locales: Vec<LocaleId> = self
            .overlays
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        locales.sort();
        locales
    }

    /// Write the cache file of every loaded locale; returns how many were written
    pub async fn save_caches(&self) -> BallotResult<usize> {
        let loaded: Vec<Arc<BallotBox>> = self
            .overlays
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect();
        let mut saved = 0;
        for ballot_box in loaded {
            if ballot_box.save_cache().await? {
                saved += 1;
            }
        }
        Ok(saved)
    }
}
