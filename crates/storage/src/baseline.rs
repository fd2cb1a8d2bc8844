//! Read-only baseline data, frozen from the prior release
//!
//! A baseline never changes while the process runs. Its identity token
//! changes whenever its content does, which is what invalidates caches.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use vetting_core::{path, LocaleId, ReleasedValue, Status};

use crate::StorageResult;

/// One baseline entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub value: String,
    /// Path with the `draft` attribute describing the baseline status
    pub full_path: String,
    /// Release value and status when they differ from the baseline
    #[serde(default)]
    pub last_release: Option<ReleasedValue>,
}

/// Read interface of a locale's baseline
pub trait BaselineStore: Send + Sync + Debug {
    fn locale(&self) -> &LocaleId;

    fn value(&self, path: &str) -> Option<String>;

    fn full_path(&self, path: &str) -> Option<String>;

    /// All paths with a baseline value, sorted
    fn paths(&self) -> Vec<String>;

    /// Baseline status of a path, missing when it has no value
    fn status(&self, path: &str) -> Status {
        self.full_path(path)
            .map_or(Status::Missing, |full| path::status_of(&full))
    }

    /// Value and status published in the last release
    fn last_release(&self, path: &str) -> Option<ReleasedValue>;

    /// Token that changes whenever the baseline content changes
    fn identity_token(&self) -> u64;

    fn contains(&self, path: &str) -> bool {
        self.value(path).is_some()
    }
}

/// Baseline held in memory
#[derive(Debug, Clone)]
pub struct MemoryBaseline {
    locale: LocaleId,
    records: BTreeMap<String, BaselineRecord>,
    token: u64,
}

impl MemoryBaseline {
    pub fn builder(locale: LocaleId) -> MemoryBaselineBuilder {
        MemoryBaselineBuilder {
            locale,
            records: BTreeMap::new(),
        }
    }

    /// A baseline with no data
    pub fn empty(locale: LocaleId) -> Self {
        Self::builder(locale).build()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a baseline from its YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(file: P) -> StorageResult<Self> {
        let contents = fs::read_to_string(file.as_ref())?;
        let parsed: BaselineFile = serde_yaml::from_str(&contents)?;
        let mut builder = Self::builder(parsed.locale);
        for entry in parsed.entries {
            builder = builder.entry_with_status(&entry.path, &entry.value, entry.status.unwrap_or(Status::Approved));
            if let Some(release) = entry.last_release {
                builder = builder.last_release(&entry.path, release.value.as_deref(), release.status);
            }
        }
        let baseline = builder.build();
        debug!(
            "Loaded baseline for {} with {} paths from {}",
            baseline.locale,
            baseline.len(),
            file.as_ref().display()
        );
        Ok(baseline)
    }

    /// Serialize to the YAML layout read by [`MemoryBaseline::from_yaml_file`]
    pub fn to_yaml(&self) -> StorageResult<String> {
        let file = BaselineFile {
            locale: self.locale.clone(),
            entries: self
                .records
                .iter()
                .map(|(path, record)| BaselineEntry {
                    path: path.clone(),
                    value: record.value.clone(),
                    status: Some(path::status_of(&record.full_path)),
                    last_release: record.last_release.clone(),
                })
                .collect(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}

impl BaselineStore for MemoryBaseline {
    fn locale(&self) -> &LocaleId {
        &self.locale
    }

    fn value(&self, path: &str) -> Option<String> {
        self.records.get(path).map(|r| r.value.clone())
    }

    fn full_path(&self, path: &str) -> Option<String> {
        self.records.get(path).map(|r| r.full_path.clone())
    }

    fn paths(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    fn last_release(&self, path: &str) -> Option<ReleasedValue> {
        let record = self.records.get(path)?;
        Some(record.last_release.clone().unwrap_or_else(|| ReleasedValue {
            value: Some(record.value.clone()),
            status: path::status_of(&record.full_path),
        }))
    }

    fn identity_token(&self) -> u64 {
        self.token
    }
}

/// Builder for [`MemoryBaseline`]
#[derive(Debug)]
pub struct MemoryBaselineBuilder {
    locale: LocaleId,
    records: BTreeMap<String, BaselineRecord>,
}

impl MemoryBaselineBuilder {
    /// Add an approved value
    pub fn entry(self, path: &str, value: &str) -> Self {
        self.entry_with_status(path, value, Status::Approved)
    }

    pub fn entry_with_status(mut self, path: &str, value: &str, status: Status) -> Self {
        let distinguishing = path::distinguishing(path);
        let status = if status == Status::Missing { Status::Unconfirmed } else { status };
        let full_path = path::with_draft(path, status).unwrap_or_else(|| path.to_string());
        self.records.insert(
            distinguishing,
            BaselineRecord {
                value: value.to_string(),
                full_path,
                last_release: None,
            },
        );
        self
    }

    /// Record a release value that differs from the baseline
    pub fn last_release(mut self, path: &str, value: Option<&str>, status: Status) -> Self {
        if let Some(record) = self.records.get_mut(&path::distinguishing(path)) {
            record.last_release = Some(ReleasedValue::new(value, status));
        }
        self
    }

    pub fn build(self) -> MemoryBaseline {
        let token = content_token(&self.locale, &self.records);
        MemoryBaseline {
            locale: self.locale,
            records: self.records,
            token,
        }
    }
}

fn content_token(locale: &LocaleId, records: &BTreeMap<String, BaselineRecord>) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(locale.as_str().as_bytes());
    for (path, record) in records {
        hasher.update([0u8]);
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.value.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.full_path.as_bytes());
        if let Some(release) = &record.last_release {
            hasher.update([1u8]);
            hasher.update(release.value.as_deref().unwrap_or("").as_bytes());
            hasher.update(release.status.name().as_bytes());
        }
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[derive(Debug, Serialize, Deserialize)]
struct BaselineFile {
    locale: LocaleId,
    #[serde(default)]
    entries: Vec<BaselineEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BaselineEntry {
    path: String,
    value: String,
    #[serde(default)]
    status: Option<Status>,
    #[serde(default)]
    last_release: Option<ReleasedValue>,
}

/// Opens the baseline of a locale
pub trait BaselineFactory: Send + Sync {
    /// The baseline for `locale`; locales without data get an empty baseline
    fn open(&self, locale: &LocaleId) -> StorageResult<Arc<dyn BaselineStore>>;
}

/// Baselines read from `<dir>/<locale>.yaml`
#[derive(Debug, Clone)]
pub struct DirectoryBaselines {
    dir: PathBuf,
}

impl DirectoryBaselines {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_for(&self, locale: &LocaleId) -> PathBuf {
        self.dir.join(format!("{}.yaml", locale))
    }

    /// Locales with a baseline file
    pub fn locales(&self) -> StorageResult<Vec<LocaleId>> {
        let mut locales = Vec::new();
        if !self.dir.exists() {
            return Ok(locales);
        }
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(stem) = name.strip_suffix(".yaml") {
                if let Ok(locale) = LocaleId::new(stem) {
                    locales.push(locale);
                }
            }
        }
        locales.sort();
        Ok(locales)
    }
}

impl BaselineFactory for DirectoryBaselines {
    fn open(&self, locale: &LocaleId) -> StorageResult<Arc<dyn BaselineStore>> {
        let file = self.file_for(locale);
        if !file.exists() {
            info!("No baseline file for {}, using an empty baseline", locale);
            return Ok(Arc::new(MemoryBaseline::empty(locale.clone())));
        }
        Ok(Arc::new(MemoryBaseline::from_yaml_file(file)?))
    }
}

/// Baselines registered in memory
#[derive(Debug, Default)]
pub struct MemoryBaselines {
    baselines: DashMap<LocaleId, Arc<MemoryBaseline>>,
}

impl MemoryBaselines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, baseline: MemoryBaseline) {
        self.baselines.insert(baseline.locale.clone(), Arc::new(baseline));
    }
}

impl BaselineFactory for MemoryBaselines {
    fn open(&self, locale: &LocaleId) -> StorageResult<Arc<dyn BaselineStore>> {
        let baseline = self
            .baselines
            .get(locale)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| Arc::new(MemoryBaseline::empty(locale.clone())));
        Ok(baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const OC: &str = "//ldml/localeDisplayNames/languages/language[@type=\"oc\"]";
    const BR: &str = "//ldml/localeDisplayNames/languages/language[@type=\"br\"]";

    fn fr_ca() -> LocaleId {
        LocaleId::new("fr_CA").unwrap()
    }

    #[test]
    fn test_memory_baseline() {
        let baseline = MemoryBaseline::builder(fr_ca())
            .entry(OC, "occitan")
            .entry_with_status(BR, "breton", Status::Provisional)
            .last_release(BR, Some("bretonne"), Status::Approved)
            .build();

        assert_eq!(baseline.value(OC).as_deref(), Some("occitan"));
        assert_eq!(baseline.full_path(OC).as_deref(), Some(OC));
        assert_eq!(baseline.status(OC), Status::Approved);
        assert_eq!(baseline.status(BR), Status::Provisional);
        assert_eq!(baseline.status("//ldml/none"), Status::Missing);
        assert_eq!(baseline.paths(), vec![BR.to_string(), OC.to_string()]);

        let release = baseline.last_release(BR).unwrap();
        assert_eq!(release.value.as_deref(), Some("bretonne"));
        let release = baseline.last_release(OC).unwrap();
        assert_eq!(release.status, Status::Approved);
    }

    #[test]
    fn test_token_tracks_content() {
        let a = MemoryBaseline::builder(fr_ca()).entry(OC, "occitan").build();
        let b = MemoryBaseline::builder(fr_ca()).entry(OC, "occitan").build();
        let c = MemoryBaseline::builder(fr_ca()).entry(OC, "occitane").build();
        assert_eq!(a.identity_token(), b.identity_token());
        assert_ne!(a.identity_token(), c.identity_token());
    }

    #[test]
    fn test_directory_baselines() {
        let dir = tempdir().unwrap();
        let baseline = MemoryBaseline::builder(fr_ca())
            .entry_with_status(OC, "occitan", Status::Contributed)
            .build();
        fs::write(dir.path().join("fr_CA.yaml"), baseline.to_yaml().unwrap()).unwrap();

        let factory = DirectoryBaselines::new(dir.path());
        let loaded = factory.open(&fr_ca()).unwrap();
        assert_eq!(loaded.value(OC).as_deref(), Some("occitan"));
        assert_eq!(loaded.status(OC), Status::Contributed);
        assert_eq!(loaded.identity_token(), baseline.identity_token());

        let empty = factory.open(&LocaleId::new("de").unwrap()).unwrap();
        assert!(empty.paths().is_empty());
        assert_eq!(factory.locales().unwrap(), vec![fr_ca()]);
    }
}
