//! # querycache
//!
//! Fixed-capacity LRU cache and a query agent that uses it to remember
//! answers to client finance questions.
//!
//! ## Modules
//!
//! - [`cache`] - LRU cache (arena + sentinels) and its shared, lock-guarded handle
//! - [`agent`] - Query agent: key normalizers, value resolver, history
//! - [`dataset`] - Client finance dataset loader
//! - [`cli`] - Command line interface
//! - [`types`] - Shared types (configuration, errors)

pub mod agent;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod dataset;
pub mod types;

pub use cache::{CacheError, LruCache, SharedCache};
pub use types::config::Config;
pub use types::errors::{QueryCacheError, QueryCacheResult};
