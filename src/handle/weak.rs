/*!
 * Weak Handle
 *
 * Non-owning observer over a reference-counted object. Holds an address
 * and nothing else: no count is touched at construction or drop, and
 * validity is answered by the registry, not by the object. Because
 * liveness is keyed purely by address, a recycled address can alias a
 * stale observer; `is_valid` is a point-in-time answer, not a guarantee.
 */

use super::refcount::RefCounted;
use super::strong::Handle;
use crate::core::types::Address;
use crate::registry::Registry;
use std::fmt;
use std::ptr::NonNull;

/// Non-owning observer handle. Never extends the object's lifetime.
pub struct WeakHandle<T: RefCounted + ?Sized> {
    ptr: Option<NonNull<T>>,
}

unsafe impl<T: RefCounted + Send + Sync + ?Sized> Send for WeakHandle<T> {}
unsafe impl<T: RefCounted + Send + Sync + ?Sized> Sync for WeakHandle<T> {}

impl<T: RefCounted + ?Sized> WeakHandle<T> {
    /// An observer of nothing; never valid, never upgrades
    pub fn new() -> Self {
        Self { ptr: None }
    }

    pub(crate) fn observing(ptr: NonNull<T>) -> Self {
        Self { ptr: Some(ptr) }
    }

    /// Address this observer holds, if any
    pub fn address(&self) -> Option<Address> {
        self.ptr.map(|ptr| ptr.as_ptr().cast::<()>() as Address)
    }

    /// True iff the held address is currently registry-tracked.
    ///
    /// Point-in-time answer: the object may be gone by the time the caller
    /// acts on it. Use [`upgrade`](Self::upgrade) to act on liveness.
    pub fn is_valid(&self) -> bool {
        match self.address() {
            Some(address) => Registry::global().is_live(address),
            None => false,
        }
    }

    /// Upgrade to an owning handle if the object is still live.
    ///
    /// Liveness is re-checked at the moment of upgrade: the registry
    /// record guard is held across a conditional retain, so the upgrade
    /// cannot revive a count that a releaser has already driven to zero,
    /// and deallocation cannot slip in between the check and the retain.
    pub fn upgrade(&self) -> Option<Handle<T>> {
        let ptr = self.ptr?;
        let address = ptr.as_ptr().cast::<()>() as Address;
        let retained = Registry::global()
            .while_live(address, || unsafe { ptr.as_ref() }.ref_count().retain_if_nonzero())
            .unwrap_or(false);
        if retained {
            Some(unsafe { Handle::from_parts(ptr) })
        } else {
            None
        }
    }
}

impl<T: RefCounted + ?Sized> Default for WeakHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RefCounted + ?Sized> Clone for WeakHandle<T> {
    fn clone(&self) -> Self {
        Self { ptr: self.ptr }
    }
}

impl<T: RefCounted + ?Sized> From<&Handle<T>> for WeakHandle<T> {
    fn from(handle: &Handle<T>) -> Self {
        handle.downgrade()
    }
}

impl<T: RefCounted + ?Sized> fmt::Debug for WeakHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address() {
            Some(address) => f
                .debug_struct("WeakHandle")
                .field("address", &format_args!("{:#x}", address))
                .field("valid", &self.is_valid())
                .finish(),
            None => f.write_str("WeakHandle(empty)"),
        }
    }
}
