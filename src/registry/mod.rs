/*!
 * Allocation Registry
 *
 * Single source of truth for "is this address currently a live,
 * subsystem-managed object?". A sharded map keyed by address holds one
 * record per live allocation (size plus a type-erased destructor);
 * atomic counters keep the running byte totals. All operations are
 * total: untracked addresses yield "not tracked", never an error.
 *
 * Mutation is serialized per shard, and the deallocation winner is
 * whoever removes the record - the map hands an entry to exactly one
 * caller, so double frees cannot happen. Liveness queries are brief
 * snapshot reads and always reflect a committed registration or removal.
 */

mod ops;
mod record;
mod traits;

pub use record::RegistryStats;
pub use traits::{RegistryInfo, Tracker};

use crate::core::shards::{shard_count, Contention};
use crate::core::types::{Address, Size};
use ahash::RandomState;
use dashmap::DashMap;
use record::Allocation;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, OnceLock};

/// The process-wide registry instance
static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Allocation registry
///
/// Cheap to clone: clones share the same underlying state.
pub struct Registry {
    records: Arc<DashMap<Address, Allocation, RandomState>>,
    tracked_bytes: Arc<AtomicU64>,
    peak_tracked_bytes: Arc<AtomicU64>,
    total_allocations: Arc<AtomicU64>,
    total_deallocations: Arc<AtomicU64>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_shards(shard_count(Contention::High))
    }

    /// Create a registry with an explicit shard count (useful for testing)
    pub fn with_shards(shards: usize) -> Self {
        Self {
            records: Arc::new(DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                shards,
            )),
            tracked_bytes: Arc::new(AtomicU64::new(0)),
            peak_tracked_bytes: Arc::new(AtomicU64::new(0)),
            total_allocations: Arc::new(AtomicU64::new(0)),
            total_deallocations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The process-wide registry all handles resolve against.
    ///
    /// Created on first use; lives until process exit (teardown is the
    /// diagnostics module's leak check, not destruction).
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }
}

impl Tracker for Registry {
    fn is_live(&self, address: Address) -> bool {
        Registry::is_live(self, address)
    }

    fn size_of(&self, address: Address) -> Option<Size> {
        Registry::size_of(self, address)
    }

    fn deallocate(&self, address: Address) -> bool {
        Registry::deallocate(self, address)
    }
}

impl RegistryInfo for Registry {
    fn stats(&self) -> RegistryStats {
        Registry::stats(self)
    }

    fn tracked_bytes(&self) -> u64 {
        Registry::tracked_bytes(self)
    }
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            tracked_bytes: Arc::clone(&self.tracked_bytes),
            peak_tracked_bytes: Arc::clone(&self.peak_tracked_bytes),
            total_allocations: Arc::clone(&self.total_allocations),
            total_deallocations: Arc::clone(&self.total_deallocations),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
