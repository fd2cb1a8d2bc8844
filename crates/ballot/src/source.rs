//! Uniform read access to locale data
//!
//! Consumers read a locale through [`LocaleSource`] without caring whether
//! they see the frozen baseline, the live overlay, or a decoded cache file.

use std::collections::BTreeMap;
use std::sync::Arc;

use vetting_core::{path, LocaleId, Status};
use vetting_storage::{BaselineStore, CacheRecord};

use crate::ballot_box::BallotReader;

pub trait LocaleSource: Send + Sync {
    fn locale(&self) -> &LocaleId;

    /// Current value at a distinguishing path
    fn value(&self, path: &str) -> Option<String>;

    /// Full path, carrying the draft attribute, for the current value
    fn full_path(&self, path: &str) -> Option<String>;

    /// Every path with a value or a vote, sorted
    fn paths(&self) -> Vec<String>;

    fn status(&self, path: &str) -> Status {
        self.full_path(path)
            .map(|full| path::status_of(&full))
            .unwrap_or(Status::Missing)
    }
}

/// A locale decoded from its cache file
#[derive(Debug, Clone)]
pub struct CachedLocale {
    locale: LocaleId,
    rows: BTreeMap<String, CacheRecord>,
}

impl CachedLocale {
    pub fn from_records(locale: LocaleId, records: Vec<CacheRecord>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| (record.path.clone(), record))
            .collect();
        Self { locale, rows }
    }

    /// The path whose value won, when it differs from the one asked for
    pub fn winning_path(&self, path: &str) -> Option<String> {
        self.rows.get(path).and_then(|row| row.winning_path.clone())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl LocaleSource for CachedLocale {
    fn locale(&self) -> &LocaleId {
        &self.locale
    }

    fn value(&self, path: &str) -> Option<String> {
        self.rows.get(path).and_then(|row| row.value.clone())
    }

    fn full_path(&self, path: &str) -> Option<String> {
        self.rows.get(path).and_then(|row| row.full_path.clone())
    }

    fn paths(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }
}

/// One of the three ways a locale can be read
#[derive(Clone)]
pub enum LocaleView {
    Baseline(Arc<dyn BaselineStore>),
    Overlay(BallotReader),
    Cached(Arc<CachedLocale>),
}

impl LocaleSource for LocaleView {
    fn locale(&self) -> &LocaleId {
        match self {
            LocaleView::Baseline(baseline) => baseline.locale(),
            LocaleView::Overlay(reader) => reader.locale(),
            LocaleView::Cached(cached) => cached.locale(),
        }
    }

    fn value(&self, path: &str) -> Option<String> {
        match self {
            LocaleView::Baseline(baseline) => baseline.value(path),
            LocaleView::Overlay(reader) => LocaleSource::value(reader, path),
            LocaleView::Cached(cached) => cached.value(path),
        }
    }

    fn full_path(&self, path: &str) -> Option<String> {
        match self {
            LocaleView::Baseline(baseline) => baseline.full_path(path),
            LocaleView::Overlay(reader) => LocaleSource::full_path(reader, path),
            LocaleView::Cached(cached) => cached.full_path(path),
        }
    }

    fn paths(&self) -> Vec<String> {
        match self {
            LocaleView::Baseline(baseline) => baseline.paths(),
            LocaleView::Overlay(reader) => LocaleSource::paths(reader),
            LocaleView::Cached(cached) => cached.paths(),
        }
    }
}
