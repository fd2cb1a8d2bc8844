use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use vetting_config::Thresholds;
use vetting_core::{Level, Organization, Status, VoterDirectory, VoterId};

use crate::input::{BallotEntry, ResolutionInput, INHERITANCE_MARKER};
use crate::result::{CandidateTally, ResolutionResult, ResolutionWarning};

/// Strongest vote an organization has cast for one value
#[derive(Debug, Clone, Copy)]
struct OrgVote {
    weight: u32,
    when: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Candidate {
    voters: BTreeSet<VoterId>,
}

/// Weighted vote resolver
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    thresholds: Thresholds,
}

impl Resolver {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Resolve one path
    pub fn resolve(&self, input: &ResolutionInput, voters: &dyn VoterDirectory) -> ResolutionResult {
        let mut warnings = Vec::new();
        let ballots = latest_ballots(&input.votes, &mut warnings);

        let mut candidates: BTreeMap<String, Candidate> = BTreeMap::new();
        let mut org_values: BTreeMap<Organization, BTreeMap<String, OrgVote>> = BTreeMap::new();
        let mut references: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

        for (voter_id, ballot) in &ballots {
            // Abstentions are not candidates
            let Some(value) = ballot.value.as_deref() else {
                continue;
            };
            candidates
                .entry(value.to_string())
                .or_default()
                .voters
                .insert(*voter_id);

            let Some(info) = voters.get(*voter_id) else {
                warn!(voter = %voter_id, path = %input.path, "Ballot from unknown voter counted at zero weight");
                warnings.push(ResolutionWarning::UnknownVoter(*voter_id));
                continue;
            };

            let full = info.votes();
            let weight = ballot.override_votes.map_or(full, |requested| requested.min(full));
            if weight == 0 {
                continue;
            }

            let slot = org_values
                .entry(info.organization)
                .or_default()
                .entry(value.to_string())
                .or_insert(OrgVote { weight: 0, when: ballot.when });
            if weight > slot.weight {
                *slot = OrgVote { weight, when: ballot.when };
            } else if weight == slot.weight && ballot.when > slot.when {
                slot.when = ballot.when;
            }

            if let Some(refs) = &ballot.references {
                *references
                    .entry(value.to_string())
                    .or_default()
                    .entry(refs.clone())
                    .or_default() += u64::from(weight);
            }
        }

        // Each organization counts once, for its heaviest value
        let mut organization_votes: BTreeMap<Organization, (String, u32)> = BTreeMap::new();
        let mut split_organizations = BTreeSet::new();
        for (org, values) in &org_values {
            let mut ranked: Vec<(&String, &OrgVote)> = values.iter().collect();
            ranked.sort_by(|a, b| {
                b.1.weight
                    .cmp(&a.1.weight)
                    .then(b.1.when.cmp(&a.1.when))
                    .then(a.0.cmp(b.0))
            });
            if ranked.len() > 1 && ranked[0].1.weight == ranked[1].1.weight {
                split_organizations.insert(*org);
            }
            let (value, vote) = ranked[0];
            organization_votes.insert(*org, (value.clone(), vote.weight));
        }

        let mut defaulted_organizations = BTreeSet::new();
        for (org, value) in &input.default_votes {
            if organization_votes.contains_key(org) {
                continue;
            }
            organization_votes.insert(*org, (value.clone(), Level::Vetter.votes(*org)));
            candidates.entry(value.clone()).or_default();
            defaulted_organizations.insert(*org);
        }

        let mut totals: BTreeMap<String, u64> = BTreeMap::new();
        let mut backers: BTreeMap<String, BTreeSet<Organization>> = BTreeMap::new();
        for (org, (value, weight)) in &organization_votes {
            *totals.entry(value.clone()).or_default() += u64::from(*weight);
            backers.entry(value.clone()).or_default().insert(*org);
        }
        let raw_totals = totals.clone();

        if let Some(bailey) = input.bailey_value.as_deref() {
            combine_inheritance(bailey, &mut totals, &mut backers);
        }

        if let Some(baseline) = &input.baseline_value {
            candidates.entry(baseline.clone()).or_default();
        }

        let last_release_value = input.last_release.as_ref().and_then(|r| r.value.as_deref());
        let baseline_value = input.baseline_value.as_deref();
        let weight_of = |value: &str| totals.get(value).copied().unwrap_or(0);

        let mut ranked: Vec<(String, u64)> = candidates
            .keys()
            .map(|value| (value.clone(), weight_of(value)))
            .collect();
        ranked.sort_by_key(|(value, weight)| {
            (
                Reverse(*weight),
                Some(value.as_str()) != last_release_value,
                Some(value.as_str()) != baseline_value,
                value.clone(),
            )
        });

        let disqualified_winner = ranked
            .first()
            .filter(|(value, weight)| *weight > 0 && input.is_disqualified(value))
            .map(|(value, _)| value.clone());
        if let Some(value) = &disqualified_winner {
            debug!(path = %input.path, value = %value, "Leading value is disqualified, resolving without it");
        }

        let eligible: Vec<&(String, u64)> = ranked
            .iter()
            .filter(|(value, _)| !input.is_disqualified(value))
            .collect();
        let has_votes = eligible.iter().any(|(_, weight)| *weight > 0);
        let floor = self.fallback(input);

        let (mut winning_value, mut status) = match eligible.first() {
            Some((value, o)) if has_votes => {
                let n = eligible.get(1).map_or(0, |(_, weight)| *weight);
                let backing = backers.get(value).map_or(0, BTreeSet::len);
                let opposed = eligible
                    .iter()
                    .any(|(other, weight)| other != value && *weight > 0);
                (Some(value.clone()), self.compute_status(input, *o, n, backing, opposed))
            }
            _ => floor.clone(),
        };

        // Votes never leave a path weaker than its baseline
        if has_votes {
            if let (Some(value), floor_status) = &floor {
                if status < *floor_status {
                    winning_value = Some(value.clone());
                    status = *floor_status;
                }
            }
        }
        if winning_value.is_some() && status == Status::Missing {
            status = Status::Unconfirmed;
        }

        let winner_weight = winning_value.as_deref().map_or(0, weight_of);
        let others: Vec<&&(String, u64)> = eligible
            .iter()
            .filter(|(value, weight)| Some(value.as_str()) != winning_value.as_deref() && *weight > 0)
            .collect();
        let strongest_other = others.iter().map(|(_, weight)| *weight).max().unwrap_or(0);

        let opposing: BTreeSet<Organization> = others
            .iter()
            .filter_map(|(value, _)| backers.get(value))
            .flat_map(|orgs| orgs.iter().copied())
            .collect();

        let margin = self.thresholds.dispute_margin.map(u64::from).unwrap_or_else(|| {
            organization_votes
                .values()
                .map(|(_, weight)| u64::from(*weight))
                .max()
                .unwrap_or(0)
        });
        let disputed = winning_value.is_some()
            && !opposing.is_empty()
            && (winner_weight as i128 - strongest_other as i128) < margin as i128;

        let runner_up = others.first().map(|(value, _)| value.clone());
        let tied_values = if winner_weight > 0 {
            others
                .iter()
                .filter(|(_, weight)| *weight == winner_weight)
                .map(|(value, _)| value.clone())
                .collect()
        } else {
            Vec::new()
        };

        let winning_references = winning_value.as_ref().and_then(|value| {
            references.get(value).and_then(|refs| {
                refs.iter()
                    .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                    .map(|(refs, _)| refs.clone())
            })
        });
        let reference_conflicts = references
            .iter()
            .filter(|(_, refs)| refs.len() > 1)
            .map(|(value, _)| value.clone())
            .collect();

        let candidates = ranked
            .iter()
            .map(|(value, weight)| {
                let counted = !input.is_disqualified(value);
                CandidateTally {
                    value: value.clone(),
                    weight: if counted { *weight } else { 0 },
                    raw_weight: raw_totals.get(value).copied().unwrap_or(0),
                    organizations: backers.get(value).cloned().unwrap_or_default(),
                    voters: candidates
                        .get(value)
                        .map(|c| c.voters.clone())
                        .unwrap_or_default(),
                    counted,
                }
            })
            .collect();

        ResolutionResult {
            path: input.path.clone(),
            winning_value,
            winning_references,
            status,
            disputed,
            conflicted_organizations: if disputed { opposing } else { BTreeSet::new() },
            split_organizations,
            runner_up,
            tied_values,
            candidates,
            organization_votes: organization_votes
                .into_iter()
                .map(|(org, (value, _))| (org, value))
                .collect(),
            defaulted_organizations,
            reference_conflicts,
            disqualified_winner,
            warnings,
        }
    }

    /// Outcome when no counted votes exist: the baseline value, else the
    /// last released value. The status is the released one when the value
    /// matches the release.
    fn fallback(&self, input: &ResolutionInput) -> (Option<String>, Status) {
        let release = input.last_release.as_ref();
        let released_status = |value: &str| match release {
            Some(r) if r.value.as_deref() == Some(value) => Some(r.status),
            _ => None,
        };

        if let Some(baseline) = input
            .baseline_value
            .as_deref()
            .filter(|v| !input.is_disqualified(v))
        {
            let status = released_status(baseline).unwrap_or(input.baseline_status);
            return (Some(baseline.to_string()), status);
        }
        if let Some(release) = release {
            if let Some(value) = release.value.as_deref().filter(|v| !input.is_disqualified(v)) {
                return (Some(value.to_string()), release.status);
            }
        }
        (None, Status::Missing)
    }

    /// Status for a winner of weight `o` over a runner-up of weight `n`,
    /// backed by `backing` organizations
    fn compute_status(&self, input: &ResolutionInput, o: u64, n: u64, backing: usize, opposed: bool) -> Status {
        let t = &self.thresholds;
        let bar = u64::from(t.required_for(input.established, input.high_bar));

        if o > n && o >= bar {
            return Status::Approved;
        }
        if input.high_bar {
            return Status::Unconfirmed;
        }
        if o > n && !opposed && backing >= t.unanimous_organizations {
            return Status::Approved;
        }
        let contributed = u64::from(t.contributed_votes);
        let provisional = u64::from(t.provisional_votes);
        if o > n
            && ((o >= contributed && input.baseline_status < Status::Contributed)
                || (o >= provisional && backing >= 2))
        {
            return Status::Contributed;
        }
        if o >= n && o >= provisional {
            return Status::Provisional;
        }
        Status::Unconfirmed
    }
}

/// Keep the latest ballot per voter
fn latest_ballots<'a>(
    votes: &'a [BallotEntry],
    warnings: &mut Vec<ResolutionWarning>,
) -> BTreeMap<VoterId, &'a BallotEntry> {
    let mut latest: BTreeMap<VoterId, &BallotEntry> = BTreeMap::new();
    for ballot in votes {
        match latest.get(&ballot.voter) {
            Some(existing) => {
                warnings.push(ResolutionWarning::DuplicateBallot(ballot.voter));
                if ballot.when >= existing.when {
                    latest.insert(ballot.voter, ballot);
                }
            }
            None => {
                latest.insert(ballot.voter, ballot);
            }
        }
    }
    latest
}

/// Votes to inherit and votes for the inherited value are the same choice;
/// pool them on whichever side is heavier, the marker winning ties.
fn combine_inheritance(
    bailey: &str,
    totals: &mut BTreeMap<String, u64>,
    backers: &mut BTreeMap<String, BTreeSet<Organization>>,
) {
    if bailey == INHERITANCE_MARKER {
        return;
    }
    let soft = totals.get(INHERITANCE_MARKER).copied().unwrap_or(0);
    let hard = totals.get(bailey).copied().unwrap_or(0);
    if soft == 0 || hard == 0 {
        return;
    }
    let (keep, drop) = if soft >= hard {
        (INHERITANCE_MARKER, bailey)
    } else {
        (bailey, INHERITANCE_MARKER)
    };
    totals.insert(keep.to_string(), soft + hard);
    totals.insert(drop.to_string(), 0);
    let moved = backers.remove(drop).unwrap_or_default();
    backers.entry(keep.to_string()).or_default().extend(moved);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use vetting_core::{MemoryVoterDirectory, VoterInfo};

    const PATH: &str = "//ldml/localeDisplayNames/languages/language[@type=\"oc\"]";

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn directory() -> MemoryVoterDirectory {
        MemoryVoterDirectory::with_voters(vec![
            VoterInfo::new(1, Organization::Guest, Level::Vetter),
            VoterInfo::new(2, Organization::Mozilla, Level::Vetter),
            VoterInfo::new(3, Organization::Sil, Level::Vetter),
            VoterInfo::new(4, Organization::Wikimedia, Level::Vetter),
            VoterInfo::new(5, Organization::Guest, Level::Street),
            VoterInfo::new(6, Organization::Guest, Level::Street),
            VoterInfo::new(7, Organization::Guest, Level::Street),
            VoterInfo::new(8, Organization::Guest, Level::Vetter),
            VoterInfo::new(10, Organization::Google, Level::Vetter),
            VoterInfo::new(11, Organization::Apple, Level::Tc),
            VoterInfo::new(12, Organization::Cldr, Level::Street),
        ])
    }

    fn ballot(voter: u32, value: &str, minute: i64) -> BallotEntry {
        BallotEntry::new(VoterId(voter), Some(value)).at(t(minute))
    }

    #[test]
    fn test_no_votes_keeps_baseline() {
        let input = ResolutionInput::new(PATH)
            .baseline(Some("occitan"), Status::Contributed)
            .last_release(Some("occitan"), Status::Approved);
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.winning_value.as_deref(), Some("occitan"));
        assert_eq!(result.status, Status::Approved);
        assert!(!result.disputed);
        assert!(result.conflicted_organizations.is_empty());
        assert_eq!(result.candidates.len(), 1);
    }

    #[test]
    fn test_no_votes_and_no_baseline_is_missing() {
        let input = ResolutionInput::new(PATH);
        let result = Resolver::default().resolve(&input, &directory());
        assert!(result.is_missing());
        assert_eq!(result.status, Status::Missing);
    }

    #[test]
    fn test_majority_of_organizations_wins() {
        let input = ResolutionInput::new(PATH).votes(vec![
            ballot(1, "A", 0),
            ballot(2, "A", 1),
            ballot(3, "B", 2),
        ]);
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.winning_value.as_deref(), Some("A"));
        assert_eq!(result.weight_of("A"), 8);
        assert_eq!(result.weight_of("B"), 4);
        assert_eq!(result.status, Status::Approved);
        assert!(!result.disputed);
        assert_eq!(result.runner_up.as_deref(), Some("B"));
    }

    #[test]
    fn test_fixed_margin_makes_close_lead_disputed() {
        let thresholds = Thresholds {
            dispute_margin: Some(5),
            ..Thresholds::default()
        };
        let input = ResolutionInput::new(PATH).votes(vec![
            ballot(1, "A", 0),
            ballot(2, "A", 1),
            ballot(3, "B", 2),
        ]);
        let result = Resolver::new(thresholds).resolve(&input, &directory());
        assert!(result.disputed);
        assert_eq!(
            result.conflicted_organizations,
            [Organization::Sil].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_tie_is_disputed_and_provisional() {
        let input = ResolutionInput::new(PATH).votes(vec![ballot(1, "B", 0), ballot(2, "A", 1)]);
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.winning_value.as_deref(), Some("A"));
        assert_eq!(result.status, Status::Provisional);
        assert!(result.disputed);
        assert_eq!(result.tied_values, vec!["B".to_string()]);
        assert!(result.conflicted_organizations.contains(&Organization::Guest));
    }

    #[test]
    fn test_ties_prefer_release_then_baseline() {
        let input = ResolutionInput::new(PATH)
            .baseline(Some("B"), Status::Unconfirmed)
            .votes(vec![ballot(1, "A", 0), ballot(2, "B", 1)]);
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.winning_value.as_deref(), Some("B"));

        let input = input.clone().last_release(Some("A"), Status::Approved);
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.winning_value.as_deref(), Some("A"));
    }

    #[test]
    fn test_organization_counts_its_strongest_member_once() {
        // One vetter outweighs three street voters of the same organization
        let input = ResolutionInput::new(PATH).votes(vec![
            ballot(1, "A", 0),
            ballot(5, "B", 1),
            ballot(6, "B", 2),
            ballot(7, "B", 3),
            ballot(12, "B", 4),
        ]);
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.organization_votes[&Organization::Guest], "A");
        assert_eq!(result.weight_of("A"), 4);
        assert_eq!(result.weight_of("B"), 1);
        assert_eq!(result.voters_for("B").len(), 4);
        assert!(result.split_organizations.is_empty());
        assert_eq!(result.winning_value.as_deref(), Some("A"));
    }

    #[test]
    fn test_split_organization_uses_latest_vote() {
        let input = ResolutionInput::new(PATH).votes(vec![ballot(1, "A", 5), ballot(8, "B", 9)]);
        let result = Resolver::default().resolve(&input, &directory());

        assert!(result.split_organizations.contains(&Organization::Guest));
        assert_eq!(result.organization_votes[&Organization::Guest], "B");
        assert_eq!(result.winning_value.as_deref(), Some("B"));
        assert_eq!(result.weight_of("A"), 0);
    }

    #[test]
    fn test_high_bar_path_stays_unconfirmed() {
        let input = ResolutionInput::new(PATH)
            .high_bar(true)
            .votes(vec![ballot(10, "X", 0), ballot(2, "X", 1)]);
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.winning_value.as_deref(), Some("X"));
        assert_eq!(result.status, Status::Unconfirmed);

        let input = input.vote(ballot(11, "X", 2));
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.status, Status::Approved);
    }

    #[test]
    fn test_unknown_voter_is_visible_but_weightless() {
        let input = ResolutionInput::new(PATH)
            .baseline(Some("base"), Status::Approved)
            .vote(ballot(99, "ghost", 0));
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.winning_value.as_deref(), Some("base"));
        assert_eq!(result.warnings, vec![ResolutionWarning::UnknownVoter(VoterId(99))]);
        let ghost = result.candidate("ghost").unwrap();
        assert_eq!(ghost.weight, 0);
        assert!(ghost.voters.contains(&VoterId(99)));
    }

    #[test]
    fn test_disqualified_leader_is_excluded() {
        let input = ResolutionInput::new(PATH)
            .votes(vec![ballot(1, "bad", 0), ballot(2, "bad", 1), ballot(3, "good", 2)])
            .disqualify("bad");
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.winning_value.as_deref(), Some("good"));
        assert_eq!(result.disqualified_winner.as_deref(), Some("bad"));
        let bad = result.candidate("bad").unwrap();
        assert!(!bad.counted);
        assert_eq!(bad.weight, 0);
        assert_eq!(bad.raw_weight, 8);
        assert!(!result.disputed);
    }

    #[test]
    fn test_disqualified_baseline_cannot_win() {
        let input = ResolutionInput::new(PATH)
            .baseline(Some(""), Status::Approved)
            .disqualify("");
        let result = Resolver::default().resolve(&input, &directory());
        assert!(result.is_missing());
    }

    #[test]
    fn test_default_votes_fill_in_for_silent_organizations() {
        let input = ResolutionInput::new(PATH)
            .vote(ballot(2, "A", 0))
            .default_vote(Organization::Mozilla, "B")
            .default_vote(Organization::Sil, "C")
            .default_vote(Organization::Wikimedia, "C");
        let result = Resolver::default().resolve(&input, &directory());

        assert!(!result.defaulted_organizations.contains(&Organization::Mozilla));
        assert!(result.defaulted_organizations.contains(&Organization::Sil));
        assert_eq!(result.weight_of("C"), 8);
        assert_eq!(result.winning_value.as_deref(), Some("C"));
        assert!(result.candidate("B").is_none());
    }

    #[test]
    fn test_inheritance_votes_combine_with_inherited_value() {
        let input = ResolutionInput::new(PATH)
            .bailey(Some("occitan"))
            .votes(vec![
                ballot(1, INHERITANCE_MARKER, 0),
                ballot(2, "occitan", 1),
                ballot(10, "other", 2),
            ]);
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.winning_value.as_deref(), Some(INHERITANCE_MARKER));
        assert_eq!(result.weight_of(INHERITANCE_MARKER), 8);
        assert_eq!(result.weight_of("occitan"), 0);
        assert_eq!(result.weight_of("other"), 6);
    }

    #[test]
    fn test_reference_disambiguation() {
        let input = ResolutionInput::new(PATH).votes(vec![
            ballot(1, "A", 0).with_references("R1"),
            ballot(2, "A", 1).with_references("R2"),
            ballot(10, "A", 2).with_references("R2"),
        ]);
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.weight_of("A"), 14);
        assert_eq!(result.winning_references.as_deref(), Some("R2"));
        assert!(result.reference_conflicts.contains("A"));
    }

    #[test]
    fn test_baseline_floor() {
        let input = ResolutionInput::new(PATH)
            .baseline(Some("base"), Status::Approved)
            .vote(ballot(5, "weak", 0));
        let result = Resolver::default().resolve(&input, &directory());

        assert_eq!(result.winning_value.as_deref(), Some("base"));
        assert_eq!(result.status, Status::Approved);
    }

    #[test]
    fn test_unanimity_and_contributed() {
        let thresholds = Thresholds {
            required_votes: 20,
            established_required_votes: 20,
            ..Thresholds::default()
        };
        let resolver = Resolver::new(thresholds);

        let two = ResolutionInput::new(PATH).votes(vec![ballot(1, "A", 0), ballot(2, "A", 1)]);
        assert_eq!(resolver.resolve(&two, &directory()).status, Status::Contributed);

        let three = two.vote(ballot(3, "A", 2));
        assert_eq!(resolver.resolve(&three, &directory()).status, Status::Approved);

        let opposed = three.vote(ballot(4, "B", 3));
        assert_eq!(resolver.resolve(&opposed, &directory()).status, Status::Contributed);
    }

    #[test]
    fn test_established_locale_raises_bar() {
        let input = ResolutionInput::new(PATH)
            .established(true)
            .votes(vec![ballot(1, "A", 0)]);
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.status, Status::Contributed);
    }

    #[test]
    fn test_override_reduces_weight() {
        let input = ResolutionInput::new(PATH).votes(vec![
            ballot(11, "A", 0).with_override(4),
            ballot(2, "B", 1),
            ballot(3, "B", 2),
        ]);
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.weight_of("A"), 4);
        assert_eq!(result.winning_value.as_deref(), Some("B"));
    }

    #[test]
    fn test_abstention_is_not_a_candidate() {
        let input = ResolutionInput::new(PATH)
            .baseline(Some("base"), Status::Provisional)
            .vote(BallotEntry::new(VoterId(1), None).at(t(0)));
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.winning_value.as_deref(), Some("base"));
        assert_eq!(result.status, Status::Provisional);
    }

    #[test]
    fn test_duplicate_ballots_keep_latest() {
        let input = ResolutionInput::new(PATH).votes(vec![ballot(1, "new", 5), ballot(1, "old", 1)]);
        let result = Resolver::default().resolve(&input, &directory());
        assert_eq!(result.winning_value.as_deref(), Some("new"));
        assert_eq!(result.warnings, vec![ResolutionWarning::DuplicateBallot(VoterId(1))]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let input = ResolutionInput::new(PATH)
            .baseline(Some("base"), Status::Unconfirmed)
            .votes(vec![ballot(1, "A", 0), ballot(2, "B", 1), ballot(3, "C", 2)]);
        let resolver = Resolver::default();
        let first = resolver.resolve(&input, &directory());
        let second = resolver.resolve(&input, &directory());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
