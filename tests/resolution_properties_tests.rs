use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use vetting::config::Thresholds;
use vetting::core::{Level, MemoryVoterDirectory, Organization, Status, VoterId, VoterInfo};
use vetting::resolver::{BallotEntry, ResolutionInput, ResolutionWarning, Resolver};

const PATH: &str = "//ldml/localeDisplayNames/territories/territory[@type=\"CA\"]";

const ORGANIZATIONS: [Organization; 6] = [
    Organization::Mozilla,
    Organization::Sil,
    Organization::Wikimedia,
    Organization::Guest,
    Organization::Cldr,
    Organization::Gnome,
];

fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// Voter `n` is a vetter of the n-th organization; voter `10 + n` is a
/// street-level member of the same organization. Voters 20 to 22 are extra
/// guests.
fn directory() -> MemoryVoterDirectory {
    let mut voters = Vec::new();
    for (n, org) in ORGANIZATIONS.iter().enumerate() {
        let n = n as u32 + 1;
        voters.push(VoterInfo::new(n, *org, Level::Vetter));
        voters.push(VoterInfo::new(10 + n, *org, Level::Street));
    }
    for id in 20..=22 {
        voters.push(VoterInfo::new(id, Organization::Guest, Level::Street));
    }
    MemoryVoterDirectory::with_voters(voters)
}

fn ballot(voter: u32, value: Option<&str>, minute: i64) -> BallotEntry {
    BallotEntry::new(VoterId(voter), value).at(t(minute))
}

#[test]
fn test_resolution_is_deterministic() {
    let input = ResolutionInput::new(PATH)
        .baseline(Some("Canada"), Status::Approved)
        .votes(vec![
            ballot(1, Some("Canada"), 0),
            ballot(2, Some("Kanada"), 1),
            ballot(13, Some("Kanada"), 2),
            ballot(4, None, 3),
        ]);
    let resolver = Resolver::default();
    let directory = directory();

    let first = resolver.resolve(&input, &directory);
    for _ in 0..5 {
        assert_eq!(resolver.resolve(&input, &directory), first);
    }

    // Ballot order does not matter
    let mut reversed = input.clone();
    reversed.votes.reverse();
    assert_eq!(resolver.resolve(&reversed, &directory), first);
}

#[test]
fn test_equal_weights_break_ties_deterministically() {
    let resolver = Resolver::default();
    let directory = directory();

    // Prefer the last release, then the baseline, then value order
    let input = ResolutionInput::new(PATH)
        .baseline(Some("B"), Status::Provisional)
        .last_release(Some("C"), Status::Approved)
        .votes(vec![ballot(1, Some("C"), 0), ballot(2, Some("B"), 1), ballot(3, Some("A"), 2)]);
    assert_eq!(resolver.resolve(&input, &directory).winning_value.as_deref(), Some("C"));

    let input = ResolutionInput::new(PATH)
        .baseline(Some("B"), Status::Provisional)
        .votes(vec![ballot(2, Some("B"), 1), ballot(3, Some("A"), 2)]);
    assert_eq!(resolver.resolve(&input, &directory).winning_value.as_deref(), Some("B"));

    let input = ResolutionInput::new(PATH).votes(vec![ballot(2, Some("Z"), 1), ballot(3, Some("A"), 2)]);
    let result = resolver.resolve(&input, &directory);
    assert_eq!(result.winning_value.as_deref(), Some("A"));
    assert_eq!(result.tied_values, vec!["Z".to_string()]);
}

#[test]
fn test_promotion_is_monotonic() {
    let resolver = Resolver::default();
    let directory = directory();

    let mut votes = vec![ballot(11, Some("B"), 0)];
    let mut previous: Option<Status> = None;
    for n in 2..=6 {
        votes.push(ballot(n, Some("A"), n as i64));
        let input = ResolutionInput::new(PATH)
            .baseline(Some("B"), Status::Unconfirmed)
            .votes(votes.clone());
        let result = resolver.resolve(&input, &directory);

        if result.winning_value.as_deref() != Some("A") {
            previous = None;
            continue;
        }
        if let Some(previous) = previous {
            assert!(
                result.status >= previous,
                "status fell from {} to {} after {} organizations",
                previous,
                result.status,
                n - 1
            );
        }
        previous = Some(result.status);
    }
    assert!(previous.is_some(), "A never took the lead");
}

#[test]
fn test_removing_opponents_clears_dispute() {
    let resolver = Resolver::default();
    let directory = directory();

    let supporters = vec![ballot(1, Some("A"), 0), ballot(2, Some("A"), 1)];
    let opponents = vec![ballot(3, Some("B"), 2), ballot(14, Some("B"), 3)];

    let input = ResolutionInput::new(PATH).votes(supporters.iter().chain(&opponents).cloned());
    let result = resolver.resolve(&input, &directory);
    assert_eq!(result.winning_value.as_deref(), Some("A"));
    assert!(result.disputed);
    assert_eq!(
        result.conflicted_organizations,
        [Organization::Wikimedia, Organization::Guest].into_iter().collect::<BTreeSet<_>>()
    );

    let input = ResolutionInput::new(PATH).votes(supporters);
    let result = resolver.resolve(&input, &directory);
    assert_eq!(result.winning_value.as_deref(), Some("A"));
    assert!(!result.disputed);
    assert!(result.conflicted_organizations.is_empty());
}

#[test]
fn test_three_organizations_with_configured_margin() {
    let votes = vec![ballot(1, Some("A"), 0), ballot(2, Some("A"), 1), ballot(3, Some("B"), 2)];
    let input = ResolutionInput::new(PATH).votes(votes);
    let directory = directory();

    let result = Resolver::default().resolve(&input, &directory);
    assert_eq!(result.winning_value.as_deref(), Some("A"));
    assert!(!result.disputed);

    // A wider margin treats a one-organization lead as contested
    let sensitive = Resolver::new(Thresholds {
        dispute_margin: Some(5),
        ..Thresholds::default()
    });
    let result = sensitive.resolve(&input, &directory);
    assert_eq!(result.winning_value.as_deref(), Some("A"));
    assert!(result.disputed);
}

#[test]
fn test_high_bar_path_stays_unconfirmed() {
    let input = ResolutionInput::new(PATH)
        .high_bar(true)
        .votes(vec![ballot(1, Some("A"), 0), ballot(2, Some("A"), 1), ballot(3, Some("B"), 2)]);
    let result = Resolver::default().resolve(&input, &directory());
    assert_eq!(result.winning_value.as_deref(), Some("A"));
    assert_eq!(result.status, Status::Unconfirmed);
}

#[test]
fn test_disqualified_winner_is_replaced() {
    let input = ResolutionInput::new(PATH)
        .baseline(Some("Canada"), Status::Approved)
        .votes(vec![ballot(1, Some("bad"), 0), ballot(2, Some("bad"), 1), ballot(3, Some("Kanada"), 2)])
        .disqualify("bad");
    let result = Resolver::default().resolve(&input, &directory());

    assert_eq!(result.winning_value.as_deref(), Some("Kanada"));
    assert_eq!(result.disqualified_winner.as_deref(), Some("bad"));
    let bad = result.candidate("bad").unwrap();
    assert!(!bad.counted);
    assert_eq!(bad.weight, 0);
    assert_eq!(bad.voters.len(), 2);
}

#[test]
fn test_unknown_voter_is_reported_not_counted() {
    let input = ResolutionInput::new(PATH)
        .baseline(Some("Canada"), Status::Approved)
        .votes(vec![ballot(99, Some("Kanada"), 0)]);
    let result = Resolver::default().resolve(&input, &directory());

    assert_eq!(result.winning_value.as_deref(), Some("Canada"));
    assert_eq!(result.weight_of("Kanada"), 0);
    assert!(result.warnings.contains(&ResolutionWarning::UnknownVoter(VoterId(99))));
}

#[test]
fn test_one_organization_counts_once() {
    // Several street members of one organization cannot outvote one vetter
    let input = ResolutionInput::new(PATH).votes(vec![
        ballot(1, Some("A"), 0),
        ballot(14, Some("B"), 1),
        ballot(20, Some("B"), 2),
        ballot(21, Some("B"), 3),
        ballot(22, Some("B"), 4),
    ]);
    let result = Resolver::default().resolve(&input, &directory());
    assert_eq!(result.weight_of("B"), 1);
    assert_eq!(result.winning_value.as_deref(), Some("A"));
}
