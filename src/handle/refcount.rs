/*!
 * Reference-Counted Capability
 *
 * The minimal surface an object must expose to be owned by a `Handle`:
 * an embedded atomic count of outstanding strong owners. A process-wide
 * diagnostic total is maintained alongside; it is advisory only and is
 * never consulted for deallocation decisions.
 */

use crate::core::types::RefCountValue;
use log::trace;
use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};

/// Process-wide total of outstanding strong references, across all objects.
/// Telemetry only; the per-object count is the authoritative one.
static OUTSTANDING_REFS: AtomicU64 = AtomicU64::new(0);

/// Snapshot of the global outstanding-reference total
pub fn outstanding_refs() -> u64 {
    OUTSTANDING_REFS.load(Ordering::Relaxed)
}

/// Atomic count of outstanding strong owners, embedded in each
/// reference-counted object. Starts at zero; rises only through handle
/// acquisition and falls only through handle release.
#[derive(Debug, Default)]
pub struct RefCount {
    strong: AtomicU32,
}

impl RefCount {
    pub const fn new() -> Self {
        Self {
            strong: AtomicU32::new(0),
        }
    }

    /// Non-blocking snapshot of the current count
    #[inline]
    pub fn get(&self) -> RefCountValue {
        self.strong.load(Ordering::Acquire)
    }

    /// Increment the count by one, returning the new value
    #[inline]
    pub fn retain(&self) -> RefCountValue {
        let count = self.strong.fetch_add(1, Ordering::Relaxed) + 1;
        let total = OUTSTANDING_REFS.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("Retained ref (count {count}, {total} outstanding)");
        count
    }

    /// Decrement the count by one, returning the new value.
    ///
    /// The returned value IS the zero detection: it comes from the same
    /// atomic read-modify-write as the decrement, so exactly one releaser
    /// observes zero. Callers must hold a matching prior `retain`.
    #[inline]
    pub fn release(&self) -> RefCountValue {
        let previous = self.strong.fetch_sub(1, Ordering::Release);
        debug_assert!(previous != 0, "release without a matching retain");
        let count = previous - 1;
        if count == 0 {
            // Synchronize with every other release before the object is
            // torn down (the `Arc` discipline).
            fence(Ordering::Acquire);
        }
        let total = OUTSTANDING_REFS.fetch_sub(1, Ordering::Relaxed) - 1;
        trace!("Released ref (count {count}, {total} outstanding)");
        count
    }

    /// Increment the count only if it has not already reached zero.
    ///
    /// Used by weak-handle upgrade: a count that has hit zero is condemned
    /// and must never be revived.
    pub fn retain_if_nonzero(&self) -> bool {
        let mut count = self.strong.load(Ordering::Relaxed);
        loop {
            if count == 0 {
                return false;
            }
            match self.strong.compare_exchange_weak(
                count,
                count + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    OUTSTANDING_REFS.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(actual) => count = actual,
            }
        }
    }
}

// A copied object starts unowned: the count tracks handles to one
// particular allocation, not the value inside it.
impl Clone for RefCount {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Capability an object exposes to participate in strong-handle counting.
/// Implemented by embedding a [`RefCount`] field and returning it here.
pub trait RefCounted {
    fn ref_count(&self) -> &RefCount;
}
