//! Core types, configuration, errors, and the sharded secret cache for tempurl.
//!
//! This crate provides the building blocks shared by every other tempurl
//! crate: the [`ShardedCache`] holding signing secrets (and replay nonces),
//! the [`CacheSweeper`] background task, the service-level [`TempUrlError`],
//! and the env-driven [`TempUrlConfig`].

pub mod cache;
pub mod config;
pub mod error;
pub mod sweeper;
pub mod types;

pub use cache::{SHARD_COUNT, SecretCache, ShardedCache};
pub use config::TempUrlConfig;
pub use error::{TempUrlError, TempUrlErrorCode, TempUrlResult};
pub use sweeper::{CacheSweeper, Sweep};
pub use types::{Account, AccountView, KeyRequest, RuleGrant, TempUrl, UrlRequest};
