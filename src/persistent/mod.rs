//! Persistent (immutable) search tree.
//!
//! This module provides [`PersistentBst`], an unbalanced binary search tree
//! that uses structural sharing to avoid copying:
//!
//! - `insert` rebuilds only the nodes on the search path; every other
//!   subtree is shared with the previous version.
//! - `add_to_all` rebuilds the whole tree with the same shape.
//!
//! # Examples
//!
//! ```rust
//! use persistent_bst::persistent::PersistentBst;
//!
//! let tree = PersistentBst::new().insert(4).insert(2).insert(6);
//! assert!(tree.contains(&2));
//! assert_eq!(tree.inorder(), vec![&2, &4, &6]);
//!
//! // Structural sharing: the original tree is preserved
//! let extended = tree.insert(5);
//! assert_eq!(tree.num_nodes(), 3);     // Original unchanged
//! assert_eq!(extended.num_nodes(), 4); // New tree
//!
//! // The left subtree was not on the search path for 5, so it is shared
//! let (Some(old_left), Some(new_left)) = (tree.left(), extended.left()) else {
//!     panic!("both trees have a root");
//! };
//! assert!(new_left.ptr_eq(old_left));
//! ```
//!
//! ## Shape Diagnostics
//!
//! ```rust
//! use persistent_bst::persistent::PersistentBst;
//!
//! let balanced: PersistentBst<i32> = [4, 2, 6, 1, 3, 5, 7].into_iter().collect();
//! assert!(balanced.balanced_everywhere());
//! assert_eq!(balanced.balance_factor(), Some(0));
//!
//! let chain: PersistentBst<i32> = (0..4).collect();
//! assert!(!chain.balanced_everywhere());
//! assert_eq!(chain.balance_factor(), Some(3));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod search_tree;

pub use search_tree::PersistentBst;
pub use search_tree::PersistentBstIntoIterator;
pub use search_tree::PersistentBstIterator;
pub use search_tree::PersistentBstPreorderIterator;
pub use search_tree::TreeView;

// =============================================================================
// Tests
// =============================================================================
