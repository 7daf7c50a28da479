/*!
 * Core Module
 * Shared types, limits, and shard configuration
 */

pub mod limits;
pub mod shards;
pub mod types;

pub use shards::{shard_count, Contention};
pub use types::{Address, RefCountValue, Size};
