/*!
 * Weak Handle Tests
 * Observation without ownership, validity, and upgrade semantics
 */

use liveness::{Buffer, Handle, Registry, WeakHandle};
use pretty_assertions::assert_eq;
use serial_test::serial;

#[test]
#[serial]
fn test_valid_while_live_invalid_after() {
    let strong = Handle::new(Buffer::copy_from(b"observed"));
    let weak = strong.downgrade();

    assert!(weak.is_valid());
    assert_eq!(weak.address(), Some(strong.address()));

    drop(strong);

    // The weak handle was never mutated, yet reports the death
    assert!(!weak.is_valid());
}

#[test]
#[serial]
fn test_weak_does_not_extend_lifetime() {
    let strong = Handle::new(Buffer::with_size(4));
    let address = strong.address();
    let weak = strong.downgrade();

    // Observation costs nothing: the count is untouched
    assert_eq!(strong.strong_count(), 1);

    drop(weak);
    assert_eq!(strong.strong_count(), 1);
    assert!(Registry::global().is_live(address));
}

#[test]
#[serial]
fn test_upgrade_while_live() {
    let strong = Handle::new(Buffer::copy_from(b"upgrade me"));
    let weak = strong.downgrade();

    let upgraded = weak.upgrade().expect("object is live");
    assert_eq!(strong.strong_count(), 2);
    assert!(upgraded.ptr_eq(&strong));
    assert_eq!(upgraded.as_slice(), b"upgrade me");
}

#[test]
#[serial]
fn test_upgrade_after_death() {
    let strong = Handle::new(Buffer::with_size(4));
    let weak = strong.downgrade();
    drop(strong);

    assert!(weak.upgrade().is_none());
}

#[test]
#[serial]
fn test_upgrade_keeps_object_alive_past_original() {
    let strong = Handle::new(Buffer::copy_from(b"survivor"));
    let address = strong.address();
    let weak = strong.downgrade();

    let upgraded = weak.upgrade().expect("object is live");
    drop(strong);

    assert!(Registry::global().is_live(address));
    assert_eq!(upgraded.as_slice(), b"survivor");

    drop(upgraded);
    assert!(!Registry::global().is_live(address));
    assert!(!weak.is_valid());
}

#[test]
#[serial]
fn test_empty_weak() {
    let weak: WeakHandle<Buffer> = WeakHandle::new();
    assert!(!weak.is_valid());
    assert!(weak.upgrade().is_none());
    assert_eq!(weak.address(), None);

    let default: WeakHandle<Buffer> = WeakHandle::default();
    assert!(!default.is_valid());
}

#[test]
#[serial]
fn test_weak_clone_observes_same_object() {
    let strong = Handle::new(Buffer::with_size(2));
    let weak = strong.downgrade();
    let cloned = weak.clone();

    assert_eq!(weak.address(), cloned.address());
    drop(strong);
    assert!(!weak.is_valid());
    assert!(!cloned.is_valid());
}

#[test]
#[serial]
fn test_weak_from_handle_ref() {
    let strong = Handle::new(Buffer::with_size(2));
    let weak = WeakHandle::from(&strong);
    assert!(weak.is_valid());
}
