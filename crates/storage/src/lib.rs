//! Storage for the vetting engine
//!
//! This crate provides:
//! - the read-only baseline store, one per locale
//! - the durable vote store, in memory or backed by sled
//! - the binary locale data cache and the persisted path table

use thiserror::Error;

pub mod baseline;
pub mod cache;
pub mod sled_store;
pub mod votes;

pub use baseline::{
    BaselineFactory, BaselineRecord, BaselineStore, DirectoryBaselines, MemoryBaseline,
    MemoryBaselineBuilder, MemoryBaselines,
};
pub use cache::{CacheError, CacheKey, CacheKind, CacheRecord, CacheResult, LocaleCacheStore, CACHE_COOKIE};
pub use sled_store::SledVoteStore;
pub use votes::{MemoryVoteStore, VoteRecord, VoteStore};

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Core error: {0}")]
    Core(#[from] vetting_core::CoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
