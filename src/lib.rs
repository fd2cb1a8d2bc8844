//! Vetting engine
//!
//! Weighted vote resolution and per-locale data overlays for a shared,
//! hierarchical locale dataset.

/// Module version information
pub mod version {
    /// The current version of the vetting library
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

pub use vetting_ballot as ballot;
pub use vetting_config as config;
pub use vetting_core as core;
pub use vetting_resolver as resolver;
pub use vetting_storage as storage;

pub use vetting_ballot::{BallotError, BallotReader, BallotWriter, DataRow, DataSection, LocaleSource, VettingContext};
pub use vetting_config::VettingConfig;
pub use vetting_core::{LocaleId, Status, VoterId};
pub use vetting_resolver::{ResolutionInput, ResolutionResult, Resolver};

#[cfg(test)]
mod tests {
    #[test]
    fn version_is_available() {
        assert!(!super::version::VERSION.is_empty());
    }
}
