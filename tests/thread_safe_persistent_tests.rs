//! Integration tests for the thread-safe persistent tree.
//!
//! These tests verify that `PersistentBst` works correctly with the `arc`
//! feature enabled, providing access to immutable trees across multiple
//! threads.

#![cfg(feature = "arc")]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use persistent_bst::persistent::PersistentBst;
use rstest::rstest;
use std::sync::Arc;
use std::thread;

#[rstest]
fn test_tree_shared_across_threads() {
    let tree: Arc<PersistentBst<i32>> = Arc::new([3, 2, 1, 0, 4, 5].into_iter().collect());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tree_clone = Arc::clone(&tree);
            thread::spawn(move || {
                assert_eq!(tree_clone.num_nodes(), 6);
                assert_eq!(tree_clone.path_to(&0), Some(vec![&3, &2, &1, &0]));
                assert!(!tree_clone.balanced_everywhere());
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}

#[rstest]
fn test_tree_moved_between_threads_without_arc_wrapper() {
    let tree: PersistentBst<i32> = [4, 2, 6].into_iter().collect();
    let copy = tree.clone();

    let moved = thread::spawn(move || copy.insert(5))
        .join()
        .expect("Thread panicked");

    assert_eq!(moved.inorder(), vec![&2, &4, &5, &6]);
    assert_eq!(tree.inorder(), vec![&2, &4, &6]);
    let (Some(old_left), Some(new_left)) = (tree.left(), moved.left()) else {
        panic!("both trees have a root");
    };
    assert!(new_left.ptr_eq(old_left));
}

#[rstest]
fn test_concurrent_insert_creates_independent_versions() {
    let base = PersistentBst::singleton(0);

    let results: Vec<_> = (1..=4)
        .map(|index| {
            let base_clone = base.clone();
            thread::spawn(move || {
                let updated = base_clone.insert(index).insert(-index);
                assert_eq!(updated.num_nodes(), 3);
                assert!(updated.balanced_everywhere());
                updated
            })
        })
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    for (index, tree) in results.iter().enumerate() {
        let key = (index + 1) as i32;
        assert_eq!(tree.inorder(), vec![&-key, &0, &key]);
    }

    assert_eq!(base.num_nodes(), 1);
}

#[rstest]
fn test_concurrent_shift_of_shared_tree() {
    let tree: PersistentBst<i64> = (0..1000).collect();

    let handles: Vec<_> = (0..4_i64)
        .map(|delta| {
            let tree_clone = tree.clone();
            thread::spawn(move || tree_clone.add_to_all(delta))
        })
        .collect();

    for (delta, handle) in handles.into_iter().enumerate() {
        let shifted = handle.join().expect("Thread panicked");
        assert_eq!(shifted.height(), 1000);
        assert_eq!(shifted.min_item(), Some(&(delta as i64)));
    }
    assert_eq!(tree.min_item(), Some(&0));
}

#[rstest]
fn test_last_owner_drops_on_another_thread() {
    let tree: PersistentBst<String> = (0..2_000).map(|index| format!("{index:05}")).collect();
    let newer = tree.insert("zzzzz".to_string());

    let handle = thread::spawn(move || drop(tree));
    handle.join().expect("Thread panicked");

    assert_eq!(newer.num_nodes(), 2_001);
    assert_eq!(newer.max_item().map(String::as_str), Some("zzzzz"));
}
