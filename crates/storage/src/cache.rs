//! Binary snapshot of a resolved locale
//!
//! File layout, all integers big-endian:
//!
//! ```text
//! int32 cookie
//! repeated:
//!   int32 pathId
//!   int32 fullPathId      (-1 if absent)
//!   int32 winningPathId   (-1 if absent)
//!   int16 valueLength     (-1 if no value)
//!   valueLength UTF-16 code units
//! sentinel: -1, recordCount, -1, -1 (int16)
//! ```
//!
//! Paths are stored as ids from the shared [`PathTable`], which is persisted
//! next to the caches. Files are written to a temporary file in the target
//! directory and renamed into place.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};
use vetting_core::{LocaleId, PathTable};

/// Magic number at the start of every cache file
pub const CACHE_COOKIE: i32 = 9295467;

const ABSENT: i32 = -1;
const NO_VALUE: i16 = -1;
const PATH_TABLE_FILE: &str = "paths.bin";
const CACHE_SUFFIX: &str = ".xpt";
const WINNING_PREFIX: &str = "w.";

/// Errors reading or writing cache files
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Bad cookie: expected {expected}, found {found}")]
    BadCookie { expected: i32, found: i32 },

    #[error("Cache file is truncated")]
    Truncated,

    #[error("Record count mismatch: trailer says {expected}, read {found}")]
    CountMismatch { expected: i32, found: usize },

    #[error("Unknown path id: {0}")]
    UnknownPathId(i32),

    #[error("Value of {0} code units does not fit in a cache record")]
    ValueTooLong(usize),

    #[error("Value is not valid UTF-16")]
    InvalidValue,

    #[error("Unexpected data after the trailer")]
    TrailingData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl CacheError {
    /// Whether the error means the file content cannot be trusted
    pub fn is_corruption(&self) -> bool {
        !matches!(self, CacheError::Io(_) | CacheError::ValueTooLong(_))
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// One resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub path: String,
    pub full_path: Option<String>,
    pub winning_path: Option<String>,
    pub value: Option<String>,
}

/// Encode records into the cache layout, interning their paths
pub fn encode_records(records: &[CacheRecord], table: &PathTable) -> CacheResult<Vec<u8>> {
    let mut out = Vec::with_capacity(16 + records.len() * 32);
    out.extend_from_slice(&CACHE_COOKIE.to_be_bytes());

    let intern = |path: &Option<String>| path.as_deref().map_or(ABSENT, |p| table.intern(p));
    for record in records {
        out.extend_from_slice(&table.intern(&record.path).to_be_bytes());
        out.extend_from_slice(&intern(&record.full_path).to_be_bytes());
        out.extend_from_slice(&intern(&record.winning_path).to_be_bytes());
        match &record.value {
            None => out.extend_from_slice(&NO_VALUE.to_be_bytes()),
            Some(value) => {
                let units: Vec<u16> = value.encode_utf16().collect();
                let len = i16::try_from(units.len()).map_err(|_| CacheError::ValueTooLong(units.len()))?;
                out.extend_from_slice(&len.to_be_bytes());
                for unit in units {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
    }

    let count = i32::try_from(records.len()).map_err(|_| CacheError::ValueTooLong(records.len()))?;
    out.extend_from_slice(&ABSENT.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&ABSENT.to_be_bytes());
    out.extend_from_slice(&NO_VALUE.to_be_bytes());
    Ok(out)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> CacheResult<[u8; N]> {
        let end = self.pos.checked_add(N).ok_or(CacheError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(CacheError::Truncated)?;
        self.pos = end;
        let mut buf = [0u8; N];
        buf.copy_from_slice(slice);
        Ok(buf)
    }

    fn i32(&mut self) -> CacheResult<i32> {
        Ok(i32::from_be_bytes(self.take::<4>()?))
    }

    fn i16(&mut self) -> CacheResult<i16> {
        Ok(i16::from_be_bytes(self.take::<2>()?))
    }

    fn u16(&mut self) -> CacheResult<u16> {
        Ok(u16::from_be_bytes(self.take::<2>()?))
    }

    fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// Decode a cache file, resolving path ids through `table`
pub fn decode_records(bytes: &[u8], table: &PathTable) -> CacheResult<Vec<CacheRecord>> {
    let mut reader = Reader { bytes, pos: 0 };
    let cookie = reader.i32()?;
    if cookie != CACHE_COOKIE {
        return Err(CacheError::BadCookie {
            expected: CACHE_COOKIE,
            found: cookie,
        });
    }

    let lookup = |id: i32| -> CacheResult<Option<String>> {
        if id == ABSENT {
            return Ok(None);
        }
        table.lookup(id).map(Some).ok_or(CacheError::UnknownPathId(id))
    };

    let mut records = Vec::new();
    loop {
        let path_id = reader.i32()?;
        let full_id = reader.i32()?;
        let winning_id = reader.i32()?;
        let len = reader.i16()?;

        if path_id == ABSENT {
            if full_id < 0 || full_id as usize != records.len() {
                return Err(CacheError::CountMismatch {
                    expected: full_id,
                    found: records.len(),
                });
            }
            if !reader.at_end() {
                return Err(CacheError::TrailingData);
            }
            return Ok(records);
        }

        let path = lookup(path_id)?.ok_or(CacheError::UnknownPathId(path_id))?;
        let value = if len == NO_VALUE {
            None
        } else if len < 0 {
            return Err(CacheError::InvalidValue);
        } else {
            let mut units = Vec::with_capacity(len as usize);
            for _ in 0..len {
                units.push(reader.u16()?);
            }
            Some(String::from_utf16(&units).map_err(|_| CacheError::InvalidValue)?)
        };

        records.push(CacheRecord {
            path,
            full_path: lookup(full_id)?,
            winning_path: lookup(winning_id)?,
            value,
        });
    }
}

/// Which view of a locale a cache file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Baseline only, no votes applied
    Raw,
    /// Resolved against live votes
    Winning,
}

/// Everything a cache file's validity depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub baseline_token: u64,
    /// Digest of the vote set, for the winning kind
    pub votes_digest: Option<String>,
}

impl CacheKey {
    pub fn raw(baseline_token: u64) -> Self {
        Self {
            kind: CacheKind::Raw,
            baseline_token,
            votes_digest: None,
        }
    }

    pub fn winning(baseline_token: u64, votes_digest: String) -> Self {
        Self {
            kind: CacheKind::Winning,
            baseline_token,
            votes_digest: Some(votes_digest),
        }
    }

    fn file_name(&self, locale: &LocaleId) -> String {
        match (self.kind, &self.votes_digest) {
            (CacheKind::Raw, _) => format!("{}{}", locale, CACHE_SUFFIX),
            (CacheKind::Winning, Some(digest)) => {
                format!("{}{}.{}{}", WINNING_PREFIX, locale, digest, CACHE_SUFFIX)
            }
            (CacheKind::Winning, None) => format!("{}{}{}", WINNING_PREFIX, locale, CACHE_SUFFIX),
        }
    }

    /// Whether `name` is a file of the same locale and kind
    fn same_kind(&self, locale: &LocaleId, name: &str) -> bool {
        match self.kind {
            CacheKind::Raw => name == format!("{}{}", locale, CACHE_SUFFIX),
            CacheKind::Winning => {
                name.starts_with(&format!("{}{}.", WINNING_PREFIX, locale))
                    && name.ends_with(CACHE_SUFFIX)
            }
        }
    }
}

/// Cache files under `<root>/<locale>/<baseline token>/`
#[derive(Debug)]
pub struct LocaleCacheStore {
    root: PathBuf,
    paths: Arc<PathTable>,
    table_lock: Mutex<usize>,
}

impl LocaleCacheStore {
    /// Open a cache root, reloading its persisted path table
    pub fn open<P: Into<PathBuf>>(root: P) -> CacheResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let table_file = root.join(PATH_TABLE_FILE);
        let paths = if table_file.exists() {
            match fs::read(&table_file)
                .map_err(CacheError::from)
                .and_then(|bytes| bincode::deserialize::<Vec<(i32, String)>>(&bytes).map_err(CacheError::from))
            {
                Ok(entries) => PathTable::from_entries(entries),
                Err(e) => {
                    warn!("Discarding unreadable path table {}: {}", table_file.display(), e);
                    PathTable::new()
                }
            }
        } else {
            PathTable::new()
        };
        let persisted = paths.len();
        debug!("Opened cache root {} with {} interned paths", root.display(), persisted);
        Ok(Self {
            root,
            paths: Arc::new(paths),
            table_lock: Mutex::new(persisted),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> &Arc<PathTable> {
        &self.paths
    }

    fn dir_for(&self, locale: &LocaleId, key: &CacheKey) -> PathBuf {
        self.root
            .join(locale.as_str())
            .join(format!("{:016x}", key.baseline_token))
    }

    pub fn cache_file(&self, locale: &LocaleId, key: &CacheKey) -> PathBuf {
        self.dir_for(locale, key).join(key.file_name(locale))
    }

    /// Read a cache file; `Ok(None)` when it does not exist
    pub fn load(&self, locale: &LocaleId, key: &CacheKey) -> CacheResult<Option<Vec<CacheRecord>>> {
        let file = self.cache_file(locale, key);
        if !file.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&file)?;
        let records = decode_records(&bytes, &self.paths)?;
        debug!("Read {} cached rows from {}", records.len(), file.display());
        Ok(Some(records))
    }

    /// Write a cache file atomically, then remove files it supersedes
    pub fn save(&self, locale: &LocaleId, key: &CacheKey, records: &[CacheRecord]) -> CacheResult<PathBuf> {
        let bytes = encode_records(records, &self.paths)?;
        self.save_path_table()?;

        let dir = self.dir_for(locale, key);
        fs::create_dir_all(&dir)?;
        let target = dir.join(key.file_name(locale));
        write_atomically(&dir, &target, &bytes)?;
        debug!("Wrote {} cached rows to {}", records.len(), target.display());

        self.prune(locale, key, &target);
        Ok(target)
    }

    /// Delete a cache file, for example after it failed to load
    pub fn remove(&self, locale: &LocaleId, key: &CacheKey) -> CacheResult<bool> {
        let file = self.cache_file(locale, key);
        match fs::remove_file(&file) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the path table if it grew since the last save
    pub fn save_path_table(&self) -> CacheResult<()> {
        let mut persisted = self.table_lock.lock().unwrap_or_else(|e| e.into_inner());
        let entries = self.paths.entries();
        if entries.len() == *persisted && self.root.join(PATH_TABLE_FILE).exists() {
            return Ok(());
        }
        let bytes = bincode::serialize(&entries)?;
        write_atomically(&self.root, &self.root.join(PATH_TABLE_FILE), &bytes)?;
        *persisted = entries.len();
        Ok(())
    }

    /// Remove other baseline generations of the locale and older files of
    /// the same kind. Failures only leave stale files behind.
    fn prune(&self, locale: &LocaleId, key: &CacheKey, keep: &Path) {
        let locale_dir = self.root.join(locale.as_str());
        let current = self.dir_for(locale, key);
        if let Ok(entries) = fs::read_dir(&locale_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() && path != current {
                    if let Err(e) = fs::remove_dir_all(&path) {
                        warn!("Failed to remove stale cache directory {}: {}", path.display(), e);
                    }
                }
            }
        }
        if let Ok(entries) = fs::read_dir(&current) {
            for entry in entries.flatten() {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if path != keep && key.same_kind(locale, &name) {
                    let _ = fs::remove_file(&path);
                }
            }
        }
    }
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> CacheResult<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}
