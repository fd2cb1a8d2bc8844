use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{tempdir, TempDir};
use vetting::ballot::{LocaleSource, LocaleView, VettingContext};
use vetting::config::VettingConfig;
use vetting::core::{Level, LocaleId, MemoryVoterDirectory, Organization, Status, VoterId, VoterInfo};
use vetting::storage::{LocaleCacheStore, MemoryBaseline, MemoryBaselines, MemoryVoteStore};

const OC: &str = "//ldml/localeDisplayNames/languages/language[@type=\"oc\"]";
const KEY: &str = "//ldml/localeDisplayNames/keys/key[@type=\"calendar\"]";
const MONTH: &str = "//ldml/dates/calendars/calendar[@type=\"gregorian\"]/months/monthContext[@type=\"format\"]/monthWidth[@type=\"wide\"]/month[@type=\"1\"]";

fn locale(id: &str) -> LocaleId {
    LocaleId::new(id).unwrap()
}

fn build_context(dir: &Path, store: Arc<MemoryVoteStore>) -> VettingContext {
    let baselines = MemoryBaselines::new();
    baselines.insert(MemoryBaseline::builder(locale("root")).entry(OC, "oc").entry(MONTH, "M01").build());
    baselines.insert(
        MemoryBaseline::builder(locale("fr"))
            .entry(OC, "occitan")
            .entry_with_status(KEY, "calendrier", Status::Provisional)
            .entry_with_status(MONTH, "janvier", Status::Unconfirmed)
            .build(),
    );
    let voters = MemoryVoterDirectory::with_voters(vec![
        VoterInfo::new(1, Organization::Mozilla, Level::Vetter),
        VoterInfo::new(2, Organization::Sil, Level::Street),
    ]);
    let config = VettingConfig::with_data_dir(dir);
    let cache = LocaleCacheStore::open(config.cache_path()).unwrap();
    VettingContext::builder(config, Arc::new(voters), Arc::new(baselines), store)
        .cache(Arc::new(cache))
        .build()
}

// Helper function to set up test environment
async fn setup_test_environment() -> (VettingContext, Arc<MemoryVoteStore>, TempDir) {
    let dir = tempdir().unwrap();
    let store = Arc::new(MemoryVoteStore::new());
    let context = build_context(dir.path(), store.clone());

    let writer = context.writer(&locale("fr")).await.unwrap();
    writer.vote_for_value(VoterId(1), OC, Some("occitane")).await.unwrap();
    writer.vote_for_value(VoterId(2), KEY, Some("calendrier grégorien")).await.unwrap();
    writer.vote_for_value(VoterId(1), MONTH, None).await.unwrap();
    context.save_caches().await.unwrap();
    (context, store, dir)
}

fn cache_files(root: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.starts_with(prefix))
            {
                found.push(path);
            }
        }
    }
    found
}

fn assert_same_view(live: &LocaleView, cached: &LocaleView) {
    assert_eq!(live.paths(), cached.paths());
    for path in live.paths() {
        assert_eq!(live.value(&path), cached.value(&path), "value of {}", path);
        assert_eq!(live.full_path(&path), cached.full_path(&path), "full path of {}", path);
        assert_eq!(live.status(&path), cached.status(&path), "status of {}", path);
    }
}

#[tokio::test]
async fn test_cache_round_trip_matches_overlay() {
    let (context, _store, _dir) = setup_test_environment().await;
    let fr = locale("fr");

    let live = context.view(&fr).await.unwrap();
    let cached = context.cached_view(&fr).await.unwrap().expect("cache file written");
    assert_same_view(&live, &cached);
    assert_eq!(cached.value(OC).as_deref(), Some("occitane"));

    // Every row keeps its winning path
    let reader = context.reader(&fr).await.unwrap();
    let LocaleView::Cached(decoded) = cached else {
        panic!("expected a cached view");
    };
    for record in reader.snapshot() {
        assert_eq!(decoded.winning_path(&record.path), record.winning_path);
    }
}

#[tokio::test]
async fn test_one_winning_file_per_locale() {
    let (context, _store, dir) = setup_test_environment().await;
    let root = context.config().cache_path();

    let winning = cache_files(&root, "w.fr.");
    assert_eq!(winning.len(), 1, "stale winning caches were not pruned: {:?}", winning);

    // The read-only root locale gets a raw cache
    assert_eq!(cache_files(&root, "root.xpt").len(), 1);
    assert!(dir.path().join("cache").join("paths.bin").exists());
}

#[tokio::test]
async fn test_corrupt_cache_is_rebuilt() {
    let (context, _store, _dir) = setup_test_environment().await;
    let fr = locale("fr");
    let root = context.config().cache_path();
    let before = context.view(&fr).await.unwrap();

    for file in cache_files(&root, "w.fr.") {
        fs::write(&file, b"definitely not a cache").unwrap();
    }

    // Reloading the locale discards the broken file and writes a fresh one
    assert!(context.evict(&fr));
    let after = context.view(&fr).await.unwrap();
    assert_same_view(&before, &after);

    let cached = context.cached_view(&fr).await.unwrap().expect("cache rebuilt");
    assert_same_view(&after, &cached);
}

#[tokio::test]
async fn test_restart_reads_existing_cache() {
    let (context, store, dir) = setup_test_environment().await;
    let fr = locale("fr");
    let before = context.view(&fr).await.unwrap();
    let written = cache_files(&context.config().cache_path(), "w.fr.");
    drop(context);

    let restarted = build_context(dir.path(), store);
    let after = restarted.view(&fr).await.unwrap();
    assert_same_view(&before, &after);
    assert_eq!(cache_files(&restarted.config().cache_path(), "w.fr."), written);
}

#[tokio::test]
async fn test_cache_disabled_writes_nothing() {
    let dir = tempdir().unwrap();
    let mut config = VettingConfig::with_data_dir(dir.path());
    config.cache_enabled = false;
    let context = VettingContext::builder(
        config,
        Arc::new(MemoryVoterDirectory::new()),
        Arc::new(MemoryBaselines::new()),
        Arc::new(MemoryVoteStore::new()),
    )
    .build();

    context.reader(&locale("fr")).await.unwrap();
    assert_eq!(context.save_caches().await.unwrap(), 0);
    assert!(context.cached_view(&locale("fr")).await.unwrap().is_none());
    assert!(!dir.path().join("cache").exists());
}
