//! Who may vote where

use vetting_config::VettingConfig;
use vetting_core::{Level, LocaleId, VoterInfo};

use crate::{BallotError, BallotResult};

/// Whether the voter's level and locale assignment allow working in
/// `locale`, regardless of the current phase
pub fn check_locale_access(voter: &VoterInfo, locale: &LocaleId) -> BallotResult<()> {
    if voter.level < Level::Street {
        return Err(BallotError::PermissionDenied(format!(
            "voter {} at level {:?} may not vote",
            voter.id, voter.level
        )));
    }
    if voter.level.can_vote_anywhere() || locale.is_undetermined() || voter.covers_locale(locale) {
        return Ok(());
    }
    Err(BallotError::PermissionDenied(format!(
        "voter {} is not assigned to {}",
        voter.id, locale
    )))
}

/// Full check for a new vote: the locale must be writable, the phase open
/// to the voter, and the voter assigned to the locale
pub fn check_vote_permission(voter: &VoterInfo, locale: &LocaleId, config: &VettingConfig) -> BallotResult<()> {
    if config.is_read_only(locale.as_str()) {
        return Err(BallotError::ReadOnlyLocale(locale.clone()));
    }
    if !config.phase.is_open() && voter.level < Level::Tc {
        return Err(BallotError::PermissionDenied(format!(
            "voting is closed in phase {:?}",
            config.phase
        )));
    }
    check_locale_access(voter, locale)
}

/// Validate a request to vote at reduced weight. The only weight on offer
/// is the vetter weight of the voter's organization.
pub fn check_override(voter: &VoterInfo, override_votes: Option<u32>) -> BallotResult<Option<u32>> {
    match override_votes {
        None => Ok(None),
        Some(votes) if voter.level.can_override() && votes == voter.level.reduced_votes(voter.organization) => {
            Ok(Some(votes))
        }
        Some(votes) => Err(BallotError::PermissionDenied(format!(
            "voter {} may not vote with weight {}",
            voter.id, votes
        ))),
    }
}
