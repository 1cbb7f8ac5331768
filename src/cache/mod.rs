//! LRU cache for query answers.
//!
//! [`LruCache`] is a fixed-capacity least-recently-used cache built on an
//! index-linked arena with head and tail sentinels. [`SharedCache`] wraps one
//! behind a single lock for use from several tasks.

mod lru;
mod shared;

pub use lru::{CacheError, CacheStats, Iter, LruCache};
pub use shared::SharedCache;
