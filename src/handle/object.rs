/*!
 * Handle Families
 *
 * Cross-type conversion within a family of reference-counted objects:
 * any concrete handle can be widened to `Handle<dyn Object>`, and a
 * widened handle can be narrowed back with a checked downcast. Upcasting
 * has copy semantics (retain, then adopt); downcasting transfers the
 * existing stake and hands the handle back unchanged on a type mismatch.
 */

use super::refcount::RefCounted;
use super::strong::Handle;
use std::any::Any;

/// A reference-counted object that can participate in family casts
pub trait Object: RefCounted + Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: RefCounted + Any + Send + Sync> Object for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: Object> Handle<T> {
    /// Widen to a type-erased handle over the same object
    pub fn upcast(&self) -> Handle<dyn Object> {
        self.counter().retain();
        let ptr: *mut dyn Object = self.as_ptr() as *mut T;
        // SAFETY: `as_ptr` is non-null and we just retained a stake for
        // the new handle.
        unsafe { Handle::from_parts(std::ptr::NonNull::new_unchecked(ptr)) }
    }
}

impl Handle<dyn Object> {
    /// Narrow to a concrete handle, consuming this one.
    ///
    /// On a type mismatch the original handle is returned untouched, so
    /// no counting stake is gained or lost either way.
    pub fn downcast<T: Object>(self) -> Result<Handle<T>, Handle<dyn Object>> {
        if (*self).as_any().is::<T>() {
            let ptr = self.into_parts().cast::<T>();
            // SAFETY: the type check passed and the stake moves with the
            // pointer.
            Ok(unsafe { Handle::from_parts(ptr) })
        } else {
            Err(self)
        }
    }

    /// Borrowing variant of [`downcast`](Self::downcast)
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        (**self).as_any().downcast_ref::<T>()
    }
}
