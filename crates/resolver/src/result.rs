use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vetting_core::{Organization, Status, VoterId};

/// Non-fatal problems noticed while resolving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionWarning {
    /// A ballot names a voter missing from the directory; it carries no weight
    UnknownVoter(VoterId),
    /// A voter appeared more than once; only the latest ballot was kept
    DuplicateBallot(VoterId),
}

/// Tally for one candidate value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub value: String,
    /// Weight counted toward the outcome
    pub weight: u64,
    /// Weight before disqualification
    pub raw_weight: u64,
    /// Organizations whose vote went to this value
    pub organizations: BTreeSet<Organization>,
    /// Voters whose ballot names this value
    pub voters: BTreeSet<VoterId>,
    /// False when the value is disqualified
    pub counted: bool,
}

/// Outcome of resolving one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub path: String,
    /// Winning value, none when the path is missing
    pub winning_value: Option<String>,
    /// Reference attribute carried by the heaviest ballots for the winner
    pub winning_references: Option<String>,
    pub status: Status,
    /// Whether one more organization could flip the winner
    pub disputed: bool,
    /// Organizations opposing the winner on a disputed path
    pub conflicted_organizations: BTreeSet<Organization>,
    /// Organizations whose members are evenly split between values
    pub split_organizations: BTreeSet<Organization>,
    /// Strongest counted candidate other than the winner
    pub runner_up: Option<String>,
    /// Other values with exactly the winner's weight
    pub tied_values: Vec<String>,
    /// Every candidate, in rank order
    pub candidates: Vec<CandidateTally>,
    /// The value each organization's vote went to
    pub organization_votes: BTreeMap<Organization, String>,
    /// Organizations counted through a default vote
    pub defaulted_organizations: BTreeSet<Organization>,
    /// Values whose ballots disagree on the reference attribute
    pub reference_conflicts: BTreeSet<String>,
    /// Disqualified value that would otherwise have won
    pub disqualified_winner: Option<String>,
    pub warnings: Vec<ResolutionWarning>,
}

impl ResolutionResult {
    pub fn is_missing(&self) -> bool {
        self.winning_value.is_none()
    }

    pub fn candidate(&self, value: &str) -> Option<&CandidateTally> {
        self.candidates.iter().find(|c| c.value == value)
    }

    /// Counted weight of `value`, zero for unknown values
    pub fn weight_of(&self, value: &str) -> u64 {
        self.candidate(value).map_or(0, |c| c.weight)
    }

    pub fn voters_for(&self, value: &str) -> BTreeSet<VoterId> {
        self.candidate(value)
            .map(|c| c.voters.clone())
            .unwrap_or_default()
    }

    pub fn is_winner(&self, value: &str) -> bool {
        self.winning_value.as_deref() == Some(value)
    }
}
