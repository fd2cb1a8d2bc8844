use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vetting_core::{Organization, ReleasedValue, Status, VoterId};

/// Value meaning "inherit whatever the parent locale has"
pub const INHERITANCE_MARKER: &str = "↑↑↑";

/// One voter's ballot on a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotEntry {
    pub voter: VoterId,
    /// Proposed value; none is an explicit abstention
    pub value: Option<String>,
    /// Reference attribute attached to the proposal
    pub references: Option<String>,
    /// Reduced weight requested by the voter
    pub override_votes: Option<u32>,
    pub when: DateTime<Utc>,
}

impl BallotEntry {
    pub fn new(voter: VoterId, value: Option<&str>) -> Self {
        Self {
            voter,
            value: value.map(str::to_string),
            references: None,
            override_votes: None,
            when: Utc::now(),
        }
    }

    pub fn at(mut self, when: DateTime<Utc>) -> Self {
        self.when = when;
        self
    }

    pub fn with_references(mut self, references: &str) -> Self {
        self.references = Some(references.to_string());
        self
    }

    pub fn with_override(mut self, votes: u32) -> Self {
        self.override_votes = Some(votes);
        self
    }
}

/// Everything the resolver needs to know about one path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionInput {
    pub path: String,
    /// Value currently in the baseline
    pub baseline_value: Option<String>,
    pub baseline_status: Status,
    /// Value and status from the last release, when known separately
    pub last_release: Option<ReleasedValue>,
    /// Value the path would inherit from the parent locale
    pub bailey_value: Option<String>,
    pub votes: Vec<BallotEntry>,
    /// Values that failed validation; they are shown but never counted
    pub disqualified: BTreeSet<String>,
    /// Values cast on behalf of organizations that did not vote themselves
    pub default_votes: BTreeMap<Organization, String>,
    /// The path needs the high bar to be approved
    pub high_bar: bool,
    /// The locale uses the raised approval bar
    pub established: bool,
}

impl ResolutionInput {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn baseline(mut self, value: Option<&str>, status: Status) -> Self {
        self.baseline_value = value.map(str::to_string);
        self.baseline_status = if value.is_some() { status } else { Status::Missing };
        self
    }

    pub fn last_release(mut self, value: Option<&str>, status: Status) -> Self {
        self.last_release = Some(ReleasedValue::new(value, status));
        self
    }

    pub fn bailey(mut self, value: Option<&str>) -> Self {
        self.bailey_value = value.map(str::to_string);
        self
    }

    pub fn vote(mut self, entry: BallotEntry) -> Self {
        self.votes.push(entry);
        self
    }

    pub fn votes<I: IntoIterator<Item = BallotEntry>>(mut self, entries: I) -> Self {
        self.votes.extend(entries);
        self
    }

    pub fn disqualify(mut self, value: &str) -> Self {
        self.disqualified.insert(value.to_string());
        self
    }

    pub fn default_vote(mut self, organization: Organization, value: &str) -> Self {
        self.default_votes.insert(organization, value.to_string());
        self
    }

    pub fn high_bar(mut self, high_bar: bool) -> Self {
        self.high_bar = high_bar;
        self
    }

    pub fn established(mut self, established: bool) -> Self {
        self.established = established;
        self
    }

    pub fn is_disqualified(&self, value: &str) -> bool {
        self.disqualified.contains(value)
    }
}
