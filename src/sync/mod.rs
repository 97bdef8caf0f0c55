//! Server side: page requests are answered from the store or by pulling
//! upstream, backfilling and persisting.

pub mod backfill;
pub mod http;
mod service;

pub use service::{ProjectSyncService, SyncOptions};
