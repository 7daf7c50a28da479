/*!
 * Registry Traits
 * Narrow seams consumed by the rest of the engine
 */

use super::record::RegistryStats;
use crate::core::types::{Address, Size};

/// Liveness and deallocation surface of an allocation registry
pub trait Tracker: Send + Sync {
    /// Check whether an address is currently a live, tracked object
    fn is_live(&self, address: Address) -> bool;

    /// Get the recorded size of a tracked allocation
    fn size_of(&self, address: Address) -> Option<Size>;

    /// Destroy a tracked allocation; a no-op on untracked addresses
    fn deallocate(&self, address: Address) -> bool;
}

/// Registry observability surface
pub trait RegistryInfo: Send + Sync {
    /// Get registry statistics
    fn stats(&self) -> RegistryStats;

    /// Get the running total of tracked bytes
    fn tracked_bytes(&self) -> u64;
}
