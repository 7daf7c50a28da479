/*!
 * Strong Handle
 *
 * Owning smart handle over a reference-counted object. Clones retain,
 * drops release; the release that observes zero removes the object's
 * registry entry and destroys it. The object's lifetime is the union of
 * all strong handles pointing at it.
 */

use super::refcount::{RefCount, RefCounted};
use super::weak::WeakHandle;
use crate::core::types::{Address, RefCountValue};
use crate::registry::Registry;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::ptr::NonNull;

/// Owning handle over a reference-counted object.
///
/// A handle always references a live object; "no object" is expressed as
/// `Option<Handle<T>>` (what [`WeakHandle::upgrade`] returns). Moves
/// transfer the counting stake without touching the counter.
pub struct Handle<T: RefCounted + ?Sized> {
    ptr: NonNull<T>,
}

// Handles hand out shared references from any thread they travel to, so
// the pointee must be both Send and Sync, as with `Arc`.
unsafe impl<T: RefCounted + Send + Sync + ?Sized> Send for Handle<T> {}
unsafe impl<T: RefCounted + Send + Sync + ?Sized> Sync for Handle<T> {}

impl<T: RefCounted + Send + Sync + 'static> Handle<T> {
    /// Allocate `value` through the global registry and wrap it.
    ///
    /// Equivalent to allocate-then-wrap: the registry records the address
    /// and size before the first retain happens.
    pub fn new(value: T) -> Self {
        let ptr = Registry::global().allocate(value);
        unsafe { ptr.as_ref() }.ref_count().retain();
        Self { ptr }
    }

    /// Wrap a pre-existing heap object.
    ///
    /// Registers the address with the registry (first registration wins,
    /// so wrapping an already-tracked address is fine) and retains.
    ///
    /// # Safety
    /// `ptr` must come from `Box::into_raw`, must point to a live object
    /// that is only ever deallocated through this subsystem, and must not
    /// be tracked under a different type.
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Registry::global().track(ptr);
        ptr.as_ref().ref_count().retain();
        Self { ptr }
    }
}

impl<T: RefCounted + ?Sized> Handle<T> {
    /// Adopt a pointer whose counting stake the caller already holds.
    ///
    /// # Safety
    /// The caller transfers exactly one retained reference; the object
    /// must be live.
    pub(crate) unsafe fn from_parts(ptr: NonNull<T>) -> Self {
        Self { ptr }
    }

    /// Release the pointer without touching the counter
    pub(crate) fn into_parts(self) -> NonNull<T> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }

    pub(crate) fn counter(&self) -> &RefCount {
        unsafe { self.ptr.as_ref() }.ref_count()
    }

    /// Address identity of the referenced object
    #[inline]
    pub fn address(&self) -> Address {
        self.ptr.as_ptr().cast::<()>() as Address
    }

    /// Raw pointer to the referenced object
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Snapshot of the object's strong count
    pub fn strong_count(&self) -> RefCountValue {
        self.counter().get()
    }

    /// Create a non-owning observer for this object
    pub fn downgrade(&self) -> WeakHandle<T> {
        WeakHandle::observing(self.ptr)
    }

    /// Identity comparison: true iff both handles reference the same
    /// object, regardless of the pointee's value
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }

    /// Deep comparison of the referenced objects' values
    pub fn object_eq(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        **self == **other
    }
}

impl<T: RefCounted + ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        // Retain before adopting the address, so the count can never
        // transiently hit zero while both handles reference the object.
        self.counter().retain();
        Self { ptr: self.ptr }
    }
}

impl<T: RefCounted + ?Sized> Drop for Handle<T> {
    fn drop(&mut self) {
        // The release's return value is the zero detection; exactly one
        // releaser observes zero and wins deallocation.
        if self.counter().release() == 0 {
            Registry::global().deallocate(self.address());
        }
    }
}

impl<T: RefCounted + ?Sized> Deref for Handle<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Live for as long as this handle holds its stake.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: RefCounted + ?Sized> AsRef<T> for Handle<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

// Equality is address identity; deep equality is `object_eq`.
impl<T: RefCounted + ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: RefCounted + ?Sized> Eq for Handle<T> {}

impl<T: RefCounted + ?Sized> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl<T: RefCounted + ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("strong_count", &self.strong_count())
            .finish()
    }
}
