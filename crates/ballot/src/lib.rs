//! Per-locale vote overlays
//!
//! A [`BallotBox`] holds the live votes for one locale on top of that
//! locale's read-only baseline and resolves each path on demand. Readers get
//! a [`BallotReader`]; only the voting entry point gets a [`BallotWriter`].
//! The [`VettingContext`] owns one ballot box per locale and wires them to
//! their parents for inheritance.

use thiserror::Error;
use vetting_core::{CoreError, LocaleId, VoterId};
use vetting_storage::StorageError;

mod ballot_box;
mod context;
pub mod hash;
pub mod permissions;
mod section;
mod source;
pub mod validate;

pub use ballot_box::{BallotBox, BallotReader, BallotWriter, UserVote};
pub use context::{VettingContext, VettingContextBuilder};
pub use hash::{decode_value_hash, value_hash, ValueHashRegistry};
pub use section::{CandidateItem, DataRow, DataSection};
pub use source::{CachedLocale, LocaleSource, LocaleView};
pub use validate::{BasicValidator, Finding, Severity, ValueValidator};

/// Errors returned by ballot operations
#[derive(Debug, Error)]
pub enum BallotError {
    /// The voter may not vote here
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The vote store did not commit the write; nothing changed
    #[error("Vote was not stored: {0}")]
    DurabilityFailure(String),

    #[error("Unknown voter: {0}")]
    UnknownVoter(VoterId),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Bad value: {0}")]
    BadValue(String),

    #[error("Locale is read-only: {0}")]
    ReadOnlyLocale(LocaleId),

    /// The locale's overlay could not be built
    #[error("Locale unavailable: {0}")]
    LocaleUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for ballot operations
pub type BallotResult<T> = Result<T, BallotError>;
