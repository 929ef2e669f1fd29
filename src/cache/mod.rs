//! Caching subsystem.
//!
//! - [`RatingCache`]: title → rating / "missing" tombstone, time-bounded,
//!   persisted through a [`KeyValueStore`]. Owned by the engine; only the
//!   [`RequestCoordinator`](crate::coordinator::RequestCoordinator) writes it.
//!
//! - [`store`]: the durable key-value seam ([`FileStore`], [`MemoryStore`])
//!   shared with the block-list.

pub mod rating;
pub mod store;

pub use rating::{CACHE_STORE_KEY, CacheEntry, DEFAULT_TTL, RatingCache, RatingCacheConfig};
pub use store::{FileStore, KeyValueStore, MemoryStore};
