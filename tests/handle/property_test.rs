/*!
 * Handle Property Tests
 * The count always equals the number of live handles, for arbitrary
 * clone/drop sequences
 */

use liveness::{Buffer, Handle, Registry};
use proptest::prelude::*;
use serial_test::serial;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    #[serial]
    fn prop_count_tracks_live_handles(ops in prop::collection::vec(any::<bool>(), 1..100)) {
        let root = Handle::new(Buffer::with_size(16));
        let address = root.address();
        let mut handles = vec![root];

        for clone_next in ops {
            if clone_next {
                let clone = handles[0].clone();
                handles.push(clone);
            } else if handles.len() > 1 {
                handles.pop();
            }
            prop_assert_eq!(handles[0].strong_count() as usize, handles.len());
            prop_assert!(Registry::global().is_live(address));
        }

        handles.clear();
        prop_assert!(!Registry::global().is_live(address));
    }

    #[test]
    #[serial]
    fn prop_n_clones_then_teardown(n in 1usize..64) {
        let root = Handle::new(Buffer::with_size(32));
        let address = root.address();
        let clones: Vec<_> = (0..n).map(|_| root.clone()).collect();

        prop_assert_eq!(root.strong_count() as usize, n + 1);

        drop(clones);
        prop_assert_eq!(root.strong_count(), 1);
        prop_assert!(Registry::global().is_live(address));

        drop(root);
        prop_assert!(!Registry::global().is_live(address));
        prop_assert!(!Registry::global().deallocate(address));
    }
}
