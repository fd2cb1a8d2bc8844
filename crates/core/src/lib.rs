//! Core vetting types
//!
//! This crate provides the vocabulary shared by the resolver, the storage
//! layer and the per-locale overlays: locale identifiers and their parent
//! chain, path helpers, the process-wide path interning table, voters with
//! their organizations and levels, and the status scale.

pub mod error;
pub mod locale;
pub mod path;
pub mod paths;
pub mod status;
pub mod voter;

// Re-export key components
pub use error::{CoreError, CoreResult};
pub use locale::LocaleId;
pub use paths::PathTable;
pub use status::{ReleasedValue, Status};
pub use voter::{Level, MemoryVoterDirectory, Organization, VoterDirectory, VoterId, VoterInfo};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Package description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize tracing for the vetting engine.
///
/// `RUST_LOG` wins when it is set; otherwise `default_level` is used.
/// Installing a second subscriber is a no-op.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
