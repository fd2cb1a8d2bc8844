//! Candidate views for display
//!
//! A [`DataRow`] gathers everything a voting page shows for one path: the
//! winner, every candidate with its voters and findings, the baseline and the
//! inherited value. A [`DataSection`] is the rows under a path prefix.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use vetting_core::{LocaleId, Organization, Status, VoterId};
use vetting_resolver::INHERITANCE_MARKER;

use crate::ballot_box::BallotReader;
use crate::hash::ValueHashRegistry;
use crate::validate::Finding;

/// One candidate value on a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateItem {
    pub value: String,
    pub value_hash: String,
    pub voters: BTreeSet<VoterId>,
    pub weight: u64,
    /// False when a finding disqualifies the value
    pub counted: bool,
    pub is_winner: bool,
    pub is_baseline: bool,
    /// The value stands for inheritance from the parent locale
    pub is_inherited: bool,
    pub findings: Vec<Finding>,
}

impl CandidateItem {
    fn new(value: &str, hashes: &ValueHashRegistry) -> Self {
        Self {
            value: value.to_string(),
            value_hash: hashes.record(value),
            voters: BTreeSet::new(),
            weight: 0,
            counted: true,
            is_winner: false,
            is_baseline: false,
            is_inherited: false,
            findings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRow {
    pub path: String,
    pub winning_value: Option<String>,
    pub status: Status,
    pub disputed: bool,
    pub conflicted_organizations: BTreeSet<Organization>,
    pub baseline_value: Option<String>,
    pub baseline_status: Status,
    pub inherited_value: Option<String>,
    pub inherited_from: Option<LocaleId>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Winner first, then by weight, then by value
    pub items: Vec<CandidateItem>,
}

impl DataRow {
    pub fn build(reader: &BallotReader, path: &str, hashes: &ValueHashRegistry) -> Self {
        let result = reader.get_resolver(path);
        let baseline_value = reader.baseline().value(path);
        let inherited = reader.inherited_value(path);

        let mut items: BTreeMap<String, CandidateItem> = BTreeMap::new();
        for tally in &result.candidates {
            let item = items
                .entry(tally.value.clone())
                .or_insert_with(|| CandidateItem::new(&tally.value, hashes));
            item.voters = tally.voters.clone();
            item.weight = tally.weight;
            item.counted = tally.counted;
        }
        for value in reader.get_values(path) {
            items
                .entry(value.clone())
                .or_insert_with(|| CandidateItem::new(&value, hashes));
        }
        if let Some((value, _)) = &inherited {
            items
                .entry(value.clone())
                .or_insert_with(|| CandidateItem::new(value, hashes));
        }

        let locale = reader.locale().clone();
        for item in items.values_mut() {
            item.is_winner = result.is_winner(&item.value);
            item.is_baseline = baseline_value.as_deref() == Some(item.value.as_str());
            item.is_inherited = item.value == INHERITANCE_MARKER
                || inherited.as_ref().map(|(value, _)| value) == Some(&item.value);
            item.findings = reader.validator().check(&locale, path, &item.value);
            if item.findings.iter().any(Finding::is_error) {
                item.counted = false;
            }
        }

        let mut items: Vec<CandidateItem> = items.into_values().collect();
        items.sort_by(|a, b| {
            b.is_winner
                .cmp(&a.is_winner)
                .then(b.weight.cmp(&a.weight))
                .then_with(|| a.value.cmp(&b.value))
        });

        Self {
            path: path.to_string(),
            winning_value: result.winning_value.clone(),
            status: result.status,
            disputed: result.disputed,
            conflicted_organizations: result.conflicted_organizations.clone(),
            baseline_status: reader.baseline().status(path),
            baseline_value,
            inherited_value: inherited.as_ref().map(|(value, _)| value.clone()),
            inherited_from: inherited.map(|(_, locale)| locale),
            last_modified: reader.last_modified(path),
            items,
        }
    }

    pub fn item(&self, value: &str) -> Option<&CandidateItem> {
        self.items.iter().find(|item| item.value == value)
    }

    pub fn item_by_hash(&self, hash: &str) -> Option<&CandidateItem> {
        self.items.iter().find(|item| item.value_hash == hash)
    }

    pub fn winner(&self) -> Option<&CandidateItem> {
        self.items.first().filter(|item| item.is_winner)
    }
}

/// Rows for every path under a prefix
#[derive(Debug, Clone, Serialize)]
pub struct DataSection {
    pub locale: LocaleId,
    pub prefix: Option<String>,
    pub rows: Vec<DataRow>,
}

impl DataSection {
    pub fn build(reader: &BallotReader, prefix: Option<&str>, hashes: &ValueHashRegistry) -> Self {
        let rows = reader
            .resolved_paths()
            .into_iter()
            .filter(|path| prefix.map_or(true, |prefix| path.starts_with(prefix)))
            .map(|path| DataRow::build(reader, &path, hashes))
            .collect();
        Self {
            locale: reader.locale().clone(),
            prefix: prefix.map(str::to_string),
            rows,
        }
    }

    pub fn row(&self, path: &str) -> Option<&DataRow> {
        self.rows.iter().find(|row| row.path == path)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
