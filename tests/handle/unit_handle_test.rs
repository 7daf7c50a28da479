/*!
 * Strong Handle Tests
 * Ownership, counting, identity, and family casts
 */

use liveness::{Buffer, Handle, RefCount, RefCounted, Registry};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::ptr::NonNull;

/// 64-byte reference-counted block (4-byte count + 60-byte payload)
struct Block {
    count: RefCount,
    payload: [u8; 60],
}

impl Block {
    fn new() -> Self {
        Self {
            count: RefCount::new(),
            payload: [0; 60],
        }
    }
}

impl RefCounted for Block {
    fn ref_count(&self) -> &RefCount {
        &self.count
    }
}

#[test]
#[serial]
fn test_create_tracks_address() {
    let handle = Handle::new(Buffer::copy_from(b"hello"));
    let address = handle.address();

    assert_eq!(handle.strong_count(), 1);
    assert!(Registry::global().is_live(address));
    assert_eq!(
        Registry::global().size_of(address),
        Some(std::mem::size_of::<Buffer>())
    );

    drop(handle);
    assert!(!Registry::global().is_live(address));
}

#[test]
#[serial]
fn test_clone_counts_live_handles() {
    let first = Handle::new(Buffer::with_size(16));
    let second = first.clone();
    let third = second.clone();

    assert_eq!(first.strong_count(), 3);
    assert!(first.ptr_eq(&second));
    assert!(second.ptr_eq(&third));

    drop(third);
    assert_eq!(first.strong_count(), 2);
    drop(second);
    assert_eq!(first.strong_count(), 1);
}

#[test]
#[serial]
fn test_move_does_not_touch_count() {
    let first = Handle::new(Buffer::with_size(8));
    let address = first.address();

    let moved = first;
    assert_eq!(moved.strong_count(), 1);
    assert_eq!(moved.address(), address);
}

#[test]
#[serial]
fn test_last_drop_deallocates_exactly_once() {
    let n = 5;
    let first = Handle::new(Block::new());
    let address = first.address();
    let mut handles: Vec<_> = (0..n - 1).map(|_| first.clone()).collect();
    handles.push(first);
    assert_eq!(handles[0].strong_count(), n as u32);

    // Destroying N-1 handles leaves the object live and tracked
    for _ in 0..n - 1 {
        handles.pop();
    }
    assert_eq!(handles[0].strong_count(), 1);
    assert!(Registry::global().is_live(address));

    // The Nth removes the entry
    handles.pop();
    assert!(!Registry::global().is_live(address));
    assert!(!Registry::global().deallocate(address));
}

#[test]
#[serial]
fn test_deref_reads_object() {
    let handle = Handle::new(Buffer::copy_from(b"payload"));
    assert_eq!(handle.as_slice(), b"payload");
    assert_eq!(handle.len(), 7);
}

#[test]
#[serial]
fn test_identity_vs_value_equality() {
    let first = Handle::new(Buffer::copy_from(b"same"));
    let second = Handle::new(Buffer::copy_from(b"same"));
    let alias = first.clone();

    // Handles are equal iff they reference the same object
    assert_eq!(first, alias);
    assert_ne!(first, second);

    // Deep equality compares the pointees
    assert!(first.object_eq(&second));
    assert!(first.object_eq(&alias));

    let different = Handle::new(Buffer::copy_from(b"other"));
    assert!(!first.object_eq(&different));
}

#[test]
#[serial]
fn test_from_raw_wraps_existing_allocation() {
    let raw = NonNull::new(Box::into_raw(Box::new(Buffer::with_size(32)))).unwrap();
    let first = unsafe { Handle::from_raw(raw) };
    let address = first.address();
    assert!(Registry::global().is_live(address));
    assert_eq!(first.strong_count(), 1);

    // Wrapping the same pointer again registers nothing new but adds a stake
    let second = unsafe { Handle::from_raw(raw) };
    assert_eq!(first.strong_count(), 2);
    assert_eq!(
        Registry::global().size_of(address),
        Some(std::mem::size_of::<Buffer>())
    );

    drop(first);
    assert!(Registry::global().is_live(address));
    drop(second);
    assert!(!Registry::global().is_live(address));
}

#[test]
#[serial]
fn test_upcast_downcast_roundtrip() {
    let concrete = Handle::new(Buffer::copy_from(b"cast me"));
    let erased = concrete.upcast();
    assert_eq!(concrete.strong_count(), 2);
    assert_eq!(erased.address(), concrete.address());

    // Correct downcast transfers the stake without touching the count
    let back = erased.downcast::<Buffer>().expect("type matches");
    assert_eq!(concrete.strong_count(), 2);
    assert!(back.ptr_eq(&concrete));
    assert_eq!(back.as_slice(), b"cast me");
}

#[test]
#[serial]
fn test_downcast_mismatch_returns_original() {
    let handle = Handle::new(Buffer::copy_from(b"not a block"));
    let erased = handle.upcast();

    let erased = match erased.downcast::<Block>() {
        Ok(_) => panic!("downcast to the wrong type succeeded"),
        Err(original) => original,
    };
    assert_eq!(handle.strong_count(), 2);
    assert!(erased.downcast_ref::<Buffer>().is_some());
    assert!(erased.downcast_ref::<Block>().is_none());
}

#[test]
#[serial]
fn test_sixty_four_byte_scenario() {
    let registry = Registry::global();
    let bytes_before = registry.tracked_bytes();

    // Allocate a 64-byte object: total tracked bytes rises by 64
    let first = Handle::new(Block::new());
    let address = first.address();
    assert_eq!(std::mem::size_of::<Block>(), 64);
    assert_eq!(first.payload, [0; 60]);
    assert_eq!(registry.tracked_bytes(), bytes_before + 64);

    // Two strong handles: count 2
    let second = first.clone();
    assert_eq!(first.strong_count(), 2);

    // Drop one: count 1, still tracked
    drop(first);
    assert_eq!(second.strong_count(), 1);
    assert!(registry.is_live(address));

    // Drop the second: untracked, total back down by 64
    drop(second);
    assert!(!registry.is_live(address));
    assert_eq!(registry.tracked_bytes(), bytes_before);
}
