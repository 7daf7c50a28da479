/*!
 * Registry Operations
 * Allocation, tracking, deallocation, and liveness queries
 */

use super::record::{Allocation, RegistryStats};
use super::Registry;
use crate::core::types::{Address, Size};
use dashmap::mapref::entry::Entry;
use log::{debug, trace};
use std::ptr::NonNull;
use std::sync::atomic::Ordering;

impl Registry {
    /// Construct and register a new heap allocation.
    ///
    /// The record (address, size, destructor) is committed before the
    /// pointer is handed out, so the address is live from the caller's
    /// point of view the moment this returns.
    pub fn allocate<T: Send + 'static>(&self, value: T) -> NonNull<T> {
        let size = std::mem::size_of::<T>();
        let ptr = Box::into_raw(Box::new(value));
        let address = ptr as Address;

        let previous = self.records.insert(address, Allocation::of::<T>());
        debug_assert!(previous.is_none(), "allocator returned a live address");
        self.add_bytes(size);
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
        debug!("Allocated {} B at {:#x}", size, address);

        // SAFETY: Box::into_raw never returns null
        unsafe { NonNull::new_unchecked(ptr) }
    }

    /// Register an externally-constructed allocation.
    ///
    /// First registration wins: tracking an already-tracked address is a
    /// no-op and never overwrites the recorded size.
    ///
    /// # Safety
    /// `ptr` must come from `Box::into_raw`, and the allocation must from
    /// now on be released only through [`deallocate`](Self::deallocate).
    pub unsafe fn track<T: Send + 'static>(&self, ptr: NonNull<T>) {
        let address = ptr.as_ptr() as Address;
        match self.records.entry(address) {
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                let size = std::mem::size_of::<T>();
                slot.insert(Allocation::of::<T>());
                self.add_bytes(size);
                self.total_allocations.fetch_add(1, Ordering::Relaxed);
                debug!("Tracking {} B at {:#x}", size, address);
            }
        }
    }

    /// Destroy the object at `address` if it is tracked.
    ///
    /// The record is removed before the destructor runs: liveness never
    /// observes a destroyed object, and the destructor may itself drop
    /// handles (recursively deallocating) without any registry lock held.
    /// Untracked addresses are a no-op; double frees are impossible.
    pub fn deallocate(&self, address: Address) -> bool {
        match self.records.remove(&address) {
            Some((_, record)) => {
                self.tracked_bytes
                    .fetch_sub(record.size as u64, Ordering::Relaxed);
                self.total_deallocations.fetch_add(1, Ordering::Relaxed);
                // SAFETY: the record was committed by a typed registration
                // and can only be removed once.
                unsafe { (record.drop_fn)(address) };
                debug!("Deallocated {} B at {:#x}", record.size, address);
                true
            }
            None => {
                trace!("Ignoring deallocate of untracked address {:#x}", address);
                false
            }
        }
    }

    /// True iff `address` is currently tracked. O(1) expected.
    pub fn is_live(&self, address: Address) -> bool {
        self.records.contains_key(&address)
    }

    /// Recorded size of a tracked allocation
    pub fn size_of(&self, address: Address) -> Option<Size> {
        self.records.get(&address).map(|entry| entry.value().size)
    }

    /// Run `f` while holding the record guard for `address`, if live.
    ///
    /// Removal of the record waits for the guard, which is what orders a
    /// weak upgrade against a concurrent deallocation.
    pub(crate) fn while_live<R>(&self, address: Address, f: impl FnOnce() -> R) -> Option<R> {
        let guard = self.records.get(&address)?;
        let result = f();
        drop(guard);
        Some(result)
    }

    /// Up to `limit` live (address, size) pairs, in no particular order
    pub fn sample_live(&self, limit: usize) -> Vec<(Address, Size)> {
        self.records
            .iter()
            .take(limit)
            .map(|entry| (*entry.key(), entry.value().size))
            .collect()
    }

    /// Bytes currently tracked across all live allocations
    pub fn tracked_bytes(&self) -> u64 {
        self.tracked_bytes.load(Ordering::Relaxed)
    }

    /// Number of live allocations
    pub fn live_allocations(&self) -> usize {
        self.records.len()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            tracked_bytes: self.tracked_bytes.load(Ordering::Relaxed),
            peak_tracked_bytes: self.peak_tracked_bytes.load(Ordering::Relaxed),
            live_allocations: self.records.len(),
            total_allocations: self.total_allocations.load(Ordering::Relaxed),
            total_deallocations: self.total_deallocations.load(Ordering::Relaxed),
        }
    }

    fn add_bytes(&self, size: Size) {
        let now = self.tracked_bytes.fetch_add(size as u64, Ordering::Relaxed) + size as u64;
        self.peak_tracked_bytes.fetch_max(now, Ordering::Relaxed);
    }
}
