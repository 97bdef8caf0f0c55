//! Project domain model: the record type, wire types, and the pure
//! filter/sort/aggregate functions the dashboard is built on.

pub mod filter;
pub mod seed;
pub mod stats;
mod types;

pub use filter::{ProjectFilter, SortKey};
pub use types::*;
