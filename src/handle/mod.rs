/*!
 * Handle Module
 * Strong/weak handles and the reference-counted capability
 */

pub mod object;
pub mod refcount;
pub mod strong;
pub mod weak;

pub use object::Object;
pub use refcount::{outstanding_refs, RefCount, RefCounted};
pub use strong::Handle;
pub use weak::WeakHandle;
