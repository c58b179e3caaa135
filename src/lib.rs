//! # persistent-bst
//!
//! A persistent (immutable) binary search tree for Rust.
//!
//! ## Overview
//!
//! [`PersistentBst`](persistent::PersistentBst) is an unbalanced binary search
//! tree over any totally ordered key type. Every operation that looks like an
//! update (`insert`, `add_to_all`) returns a new tree and leaves the original
//! untouched; unchanged subtrees are shared between the two versions.
//!
//! Besides the usual queries (size, height, membership, min/max) the tree
//! reports shape diagnostics: balance factors and whether the tree is
//! AVL-balanced at every node. It never rebalances itself.
//!
//! ## Feature Flags
//!
//! - `persistent`: The persistent tree (enabled by default)
//! - `arc`: Use `Arc` instead of `Rc` so trees are `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` implementations
//! - `full`: Enable `persistent` and `serde`
//!
//! ## Example
//!
//! ```rust
//! use persistent_bst::prelude::*;
//!
//! let tree: PersistentBst<i32> = [3, 2, 1, 0, 4, 5].into_iter().collect();
//!
//! assert_eq!(tree.num_nodes(), 6);
//! assert_eq!(tree.height(), 4);
//! assert_eq!(tree.path_to(&0), Some(vec![&3, &2, &1, &0]));
//! assert_eq!(tree.path_to(&8), None);
//! assert!(!tree.balanced_everywhere());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use persistent_bst::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "persistent")]
    pub use crate::persistent::*;
}

#[cfg(feature = "persistent")]
pub mod persistent;
