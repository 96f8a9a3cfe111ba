//! Two-backend cache store with per-entry TTLs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 CacheStore                  │
//! │  (backend chosen once at startup, no        │
//! │   re-probing; errors degrade to misses)     │
//! └───────────────┬─────────────────────────────┘
//!         ┌───────┴────────┐
//!         ▼                ▼
//! ┌──────────────┐  ┌──────────────┐
//! │  RedisCache  │  │ MemoryCache  │
//! │ • shared     │  │ • DashMap    │
//! │ • native TTL │  │ • lazy expiry│
//! │ • PING probe │  │ • sweep task │
//! └──────────────┘  └──────────────┘
//! ```
//!
//! # Contract
//!
//! No backend failure ever crosses this module's boundary:
//!
//! - [`CacheStore::get`] returns `None` on any backend error (logged)
//! - [`CacheStore::set`] / [`CacheStore::delete`] return `false` on error
//! - [`CacheStore::delete_matching`] returns the count actually removed
//!
//! A caching outage therefore degrades the deployment to "always miss"
//! (more upstream load), never to a caller-visible failure.
//!
//! # Pattern matching
//!
//! [`CacheStore::delete_matching`] uses naive substring matching on both
//! backends. The Redis backend lists keys and filters client-side so the
//! matched set is identical to the in-memory backend's.
//!
//! # Expiry
//!
//! Entries are immutable once written; a new write under the same key
//! replaces the entry and resets its expiry. Expiry is checked at read
//! time (lazy); the in-memory backend additionally sweeps expired entries
//! in a background task.

pub mod keys;
pub mod memory;
pub mod redis;
pub mod store;

pub use keys::CacheTtls;
pub use memory::MemoryCache;
pub use store::CacheStore;
