/*!
 * Allocation Records
 * Per-address bookkeeping and registry statistics
 */

use crate::core::types::{Address, Size};
use serde::{Deserialize, Serialize};

/// Type-erased destructor thunk, captured at the typed registration site.
/// Lets `deallocate(address)` destroy an object without knowing its type.
pub(crate) type DropFn = unsafe fn(Address);

unsafe fn drop_boxed<T>(address: Address) {
    drop(Box::from_raw(address as *mut T));
}

/// Record for one live, registry-managed allocation
#[derive(Clone, Copy)]
pub(crate) struct Allocation {
    pub size: Size,
    pub drop_fn: DropFn,
}

impl Allocation {
    pub fn of<T>() -> Self {
        Self {
            size: std::mem::size_of::<T>(),
            drop_fn: drop_boxed::<T>,
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistryStats {
    /// Bytes currently tracked across all live allocations
    pub tracked_bytes: u64,
    /// High-water mark of tracked bytes
    pub peak_tracked_bytes: u64,
    /// Number of live allocations
    pub live_allocations: usize,
    /// Cumulative allocations since creation
    pub total_allocations: u64,
    /// Cumulative deallocations since creation
    pub total_deallocations: u64,
}
