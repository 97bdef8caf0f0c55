//! Persistent project cache.
//!
//! The store supports range-paginated reads ordered newest first, upsert keyed
//! by external id, delete-all, and an atomic replace used by forced refreshes.

mod storage;
mod traits;

pub use storage::SqliteStore;
pub use traits::ProjectStore;
