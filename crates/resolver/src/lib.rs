//! Vote resolution for locale data
//!
//! Given the baseline value of a path, the value published in the last
//! release and the live ballots cast on the path, the [`Resolver`] computes a
//! winning value, its status and whether the outcome is disputed. The
//! resolver is a pure function of its input: it performs no I/O and never
//! fails.

mod input;
mod resolver;
mod result;

pub use input::{BallotEntry, ResolutionInput, INHERITANCE_MARKER};
pub use resolver::Resolver;
pub use result::{CandidateTally, ResolutionResult, ResolutionWarning};
