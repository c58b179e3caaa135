//! Persistent (immutable) unbalanced binary search tree.
//!
//! This module provides [`PersistentBst`], an immutable ordered set of keys
//! stored in a plain binary search tree that uses structural sharing for
//! its updates.
//!
//! # Overview
//!
//! A tree is either `Empty` or a `Node` holding one key and two subtrees.
//! Every key in the left subtree is strictly less than the node's key and
//! every key in the right subtree is strictly greater.
//!
//! - O(height) `contains`, `insert`, `min_item`, `max_item`, `path_to`
//! - O(1) `num_nodes`, `height`, `balance_factor`, `is_leaf`
//! - O(N) `balanced_everywhere`, `add_to_all`, traversals
//!
//! The tree never rebalances. Inserting keys in ascending order builds a
//! chain whose height equals its size, so none of the operations here use
//! the call stack in proportion to the height: searches are loops and
//! traversals keep their own explicit stacks.
//!
//! # Examples
//!
//! ```rust
//! use persistent_bst::persistent::PersistentBst;
//!
//! let tree = PersistentBst::new()
//!     .insert(3)
//!     .insert(2)
//!     .insert(1)
//!     .insert(0)
//!     .insert(4)
//!     .insert(5);
//!
//! assert_eq!(tree.inorder(), vec![&0, &1, &2, &3, &4, &5]);
//! assert_eq!(tree.min_item(), Some(&0));
//! assert_eq!(tree.max_item(), Some(&5));
//! assert_eq!(tree.to_string(), "((((Empty) 0 (Empty)) 1 (Empty)) 2 (Empty)) 3 ((Empty) 4 ((Empty) 5 (Empty)))");
//! ```
//!
//! # Internal Structure
//!
//! Each node caches the height and the size of the subtree it roots. Both
//! are computed once when the node is built from its children, which is the
//! only time a node is ever written.

use super::ReferenceCounter;
use num_traits::CheckedAdd;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;

/// Rendering of the empty tree.
const EMPTY_MARKER: &str = "Empty";

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure of the tree.
struct Node<K> {
    key: K,
    left: PersistentBst<K>,
    right: PersistentBst<K>,
    /// Height of the subtree rooted here (at least 1)
    height: usize,
    /// Number of keys in the subtree rooted here (at least 1)
    size: usize,
}

impl<K> Node<K> {
    /// Creates a node and derives its shape metadata from the children.
    fn new(key: K, left: PersistentBst<K>, right: PersistentBst<K>) -> Self {
        let height = 1 + left.height().max(right.height());
        let size = 1 + left.num_nodes() + right.num_nodes();
        Self {
            key,
            left,
            right,
            height,
            size,
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn balance_factor(&self) -> isize {
        self.right.height() as isize - self.left.height() as isize
    }
}

// =============================================================================
// PersistentBst Definition
// =============================================================================

/// A persistent (immutable) binary search tree.
///
/// `PersistentBst` is an immutable data structure that uses structural
/// sharing: `insert` copies only the nodes on the search path and reuses
/// every other subtree of the original tree.
///
/// Keys must implement `Ord`. Duplicate keys are never stored; inserting a
/// key that is already present returns the same tree.
///
/// # Time Complexity
///
/// | Operation             | Complexity |
/// |-----------------------|------------|
/// | `new`                 | O(1)       |
/// | `contains`            | O(height)  |
/// | `insert`              | O(height)  |
/// | `min_item`/`max_item` | O(height)  |
/// | `path_to`             | O(height)  |
/// | `num_nodes`/`height`  | O(1)       |
/// | `balance_factor`      | O(1)       |
/// | `balanced_everywhere` | O(N)       |
/// | `add_to_all`          | O(N)       |
/// | `inorder`             | O(N)       |
///
/// # Examples
///
/// ```rust
/// use persistent_bst::persistent::PersistentBst;
///
/// let tree = PersistentBst::singleton(42);
/// assert!(tree.contains(&42));
/// assert!(tree.is_leaf());
///
/// let tree: PersistentBst<i32> = [4, 2, 6, 1, 3, 5, 7].into_iter().collect();
/// assert_eq!(tree.height(), 3);
/// assert!(tree.balanced_everywhere());
/// ```
pub struct PersistentBst<K> {
    /// Root node, `None` for the empty tree
    root: Option<ReferenceCounter<Node<K>>>,
}

/// A borrowed view of the two shapes a [`PersistentBst`] can take.
///
/// # Examples
///
/// ```rust
/// use persistent_bst::persistent::{PersistentBst, TreeView};
///
/// fn sum(tree: &PersistentBst<i32>) -> i32 {
///     match tree.view() {
///         TreeView::Empty => 0,
///         TreeView::Node { key, left, right } => key + sum(left) + sum(right),
///     }
/// }
///
/// let tree: PersistentBst<i32> = [2, 1, 3].into_iter().collect();
/// assert_eq!(sum(&tree), 6);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub enum TreeView<'a, K> {
    /// The tree holds no keys.
    Empty,
    /// The tree has a root key and two subtrees.
    Node {
        /// The root key
        key: &'a K,
        /// Subtree of keys less than `key`
        left: &'a PersistentBst<K>,
        /// Subtree of keys greater than `key`
        right: &'a PersistentBst<K>,
    },
}

impl<K> PersistentBst<K> {
    /// Creates a new empty tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = PersistentBst::new();
    /// assert!(tree.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None }
    }

    /// Creates a tree containing a single key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree = PersistentBst::singleton("root");
    /// assert_eq!(tree.num_nodes(), 1);
    /// assert_eq!(tree.height(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K) -> Self {
        Self::from_node(Node::new(key, Self::new(), Self::new()))
    }

    fn from_node(node: Node<K>) -> Self {
        Self {
            root: Some(ReferenceCounter::new(node)),
        }
    }

    fn root_node(&self) -> Option<&Node<K>> {
        self.root.as_deref()
    }

    /// Returns `true` if the tree contains no keys.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns `true` if the tree is a single node with two empty children.
    ///
    /// The empty tree is not a leaf.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// assert!(!PersistentBst::<i32>::new().is_leaf());
    /// assert!(PersistentBst::singleton(1).is_leaf());
    /// assert!(!PersistentBst::singleton(1).insert(2).is_leaf());
    /// ```
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.root_node()
            .is_some_and(|node| node.left.is_empty() && node.right.is_empty())
    }

    /// Returns the number of keys in the tree.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.root_node().map_or(0, |node| node.size)
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    ///
    /// The empty tree has height 0 and a single node has height 1.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let chain: PersistentBst<i32> = (0..10).collect();
    /// assert_eq!(chain.height(), 10);
    /// ```
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.root_node().map_or(0, |node| node.height)
    }

    /// Returns the root key, or `None` for the empty tree.
    #[inline]
    #[must_use]
    pub fn root_key(&self) -> Option<&K> {
        self.root_node().map(|node| &node.key)
    }

    /// Returns the left subtree, or `None` for the empty tree.
    #[inline]
    #[must_use]
    pub fn left(&self) -> Option<&Self> {
        self.root_node().map(|node| &node.left)
    }

    /// Returns the right subtree, or `None` for the empty tree.
    #[inline]
    #[must_use]
    pub fn right(&self) -> Option<&Self> {
        self.root_node().map(|node| &node.right)
    }

    /// Returns a borrowed view of the root suitable for pattern matching.
    #[must_use]
    pub fn view(&self) -> TreeView<'_, K> {
        match self.root_node() {
            None => TreeView::Empty,
            Some(node) => TreeView::Node {
                key: &node.key,
                left: &node.left,
                right: &node.right,
            },
        }
    }

    /// Returns `true` if both trees are the same allocation.
    ///
    /// Two empty trees are always the same. This observes structural
    /// sharing; it is not an equality test.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree = PersistentBst::new().insert(2).insert(1);
    /// let same = tree.insert(2);
    /// assert!(same.ptr_eq(&tree));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(node), Some(other_node)) => ReferenceCounter::ptr_eq(node, other_node),
            _ => false,
        }
    }

    /// Returns the smallest key, or `None` for the empty tree.
    ///
    /// # Complexity
    ///
    /// O(height)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = [3, 2, 1, 0, 4, 5].into_iter().collect();
    /// assert_eq!(tree.min_item(), Some(&0));
    /// assert_eq!(PersistentBst::<i32>::new().min_item(), None);
    /// ```
    #[must_use]
    pub fn min_item(&self) -> Option<&K> {
        let mut node = self.root_node()?;
        while let Some(left) = node.left.root_node() {
            node = left;
        }
        Some(&node.key)
    }

    /// Returns the largest key, or `None` for the empty tree.
    ///
    /// # Complexity
    ///
    /// O(height)
    #[must_use]
    pub fn max_item(&self) -> Option<&K> {
        let mut node = self.root_node()?;
        while let Some(right) = node.right.root_node() {
            node = right;
        }
        Some(&node.key)
    }

    /// Returns `height(right) - height(left)` at the root.
    ///
    /// Positive values mean the tree is right-heavy. The empty tree has no
    /// balance factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = [3, 2, 1, 0, 4, 5].into_iter().collect();
    /// assert_eq!(tree.balance_factor(), Some(-1));
    /// assert_eq!(PersistentBst::<i32>::new().balance_factor(), None);
    /// ```
    #[must_use]
    pub fn balance_factor(&self) -> Option<isize> {
        self.root_node().map(Node::balance_factor)
    }

    /// Returns `true` if every node has a balance factor in `[-1, 1]`.
    ///
    /// This is the AVL balance condition checked at every node, not only at
    /// the root. The empty tree is balanced.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// // The root is within bounds but the left subtree is a chain.
    /// let tree: PersistentBst<i32> = [3, 2, 1, 0, 4, 5].into_iter().collect();
    /// assert_eq!(tree.balance_factor(), Some(-1));
    /// assert!(!tree.balanced_everywhere());
    /// ```
    #[must_use]
    pub fn balanced_everywhere(&self) -> bool {
        self.nodes()
            .all(|node| (-1..=1).contains(&node.balance_factor()))
    }

    /// Returns an iterator over keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = [2, 3, 1].into_iter().collect();
    /// let keys: Vec<&i32> = tree.iter().collect();
    /// assert_eq!(keys, vec![&1, &2, &3]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentBstIterator<'_, K> {
        let mut iterator = PersistentBstIterator {
            stack: Vec::with_capacity(self.height()),
            remaining: self.num_nodes(),
        };
        iterator.push_left_spine(self.root_node());
        iterator
    }

    /// Returns all keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = [3, 2, 1, 0, 4, 5].into_iter().collect();
    /// assert_eq!(tree.inorder(), vec![&0, &1, &2, &3, &4, &5]);
    /// ```
    #[must_use]
    pub fn inorder(&self) -> Vec<&K> {
        self.iter().collect()
    }

    /// Returns an iterator over keys in root-first order.
    ///
    /// Inserting the keys of this iterator into an empty tree, in order,
    /// rebuilds a tree of exactly the same shape.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = [2, 3, 1].into_iter().collect();
    /// let keys: Vec<&i32> = tree.preorder().collect();
    /// assert_eq!(keys, vec![&2, &1, &3]);
    /// ```
    #[must_use]
    pub fn preorder(&self) -> PersistentBstPreorderIterator<'_, K> {
        PersistentBstPreorderIterator {
            nodes: self.nodes(),
            remaining: self.num_nodes(),
        }
    }

    /// Walks every node in root-first order.
    fn nodes(&self) -> Nodes<'_, K> {
        Nodes {
            stack: self.root_node().into_iter().collect(),
        }
    }

    /// Rebuilds the tree with the same shape, mapping every key.
    ///
    /// Stops at the first key the transform rejects. The caller is
    /// responsible for the transform preserving key order.
    fn try_rebuild<L, E, F>(&self, mut transform: F) -> Result<PersistentBst<L>, E>
    where
        F: FnMut(&K) -> Result<L, E>,
    {
        let mut frames: Vec<RebuildFrame<'_, K, L>> = Vec::with_capacity(self.height());
        let mut current = self.root_node();

        loop {
            while let Some(node) = current {
                frames.push(RebuildFrame { node, left: None });
                current = node.left.root_node();
            }

            let mut finished = PersistentBst::new();
            loop {
                match frames.pop() {
                    None => return Ok(finished),
                    Some(RebuildFrame { node, left: None }) => {
                        frames.push(RebuildFrame {
                            node,
                            left: Some(finished),
                        });
                        current = node.right.root_node();
                        break;
                    }
                    Some(RebuildFrame {
                        node,
                        left: Some(left),
                    }) => {
                        let key = transform(&node.key)?;
                        finished = PersistentBst::from_node(Node::new(key, left, finished));
                    }
                }
            }
        }
    }

    /// Returns a new tree with `delta` added to every key.
    ///
    /// The shape of the tree is preserved. Integer addition is strictly
    /// monotonic, so the search order is preserved as long as no key
    /// overflows; an overflow panics in debug builds and wraps in release
    /// builds. Use [`checked_add_to_all`](Self::checked_add_to_all) when
    /// overflow is possible.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = [3, 2, 1, 0, 4, 5].into_iter().collect();
    /// let shifted = tree.add_to_all(1);
    ///
    /// assert_eq!(shifted.inorder(), vec![&1, &2, &3, &4, &5, &6]);
    /// assert_eq!(shifted.height(), tree.height());
    /// assert_eq!(tree.min_item(), Some(&0)); // Original unchanged
    /// ```
    #[must_use]
    pub fn add_to_all(&self, delta: K) -> Self
    where
        K: Clone + Add<Output = K>,
    {
        let shifted = self.try_rebuild(|key| Ok::<_, Infallible>(key.clone() + delta.clone()));
        match shifted {
            Ok(tree) => tree,
            Err(never) => match never {},
        }
    }

    /// Returns a new tree with `delta` added to every key, or `None` if any
    /// key would overflow.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<u8> = [10, 200, 250].into_iter().collect();
    /// assert_eq!(tree.checked_add_to_all(&5).map(|t| t.num_nodes()), Some(3));
    /// assert!(tree.checked_add_to_all(&6).is_none());
    /// ```
    #[must_use]
    pub fn checked_add_to_all(&self, delta: &K) -> Option<Self>
    where
        K: CheckedAdd,
    {
        self.try_rebuild(|key| key.checked_add(delta).ok_or(()))
            .ok()
    }
}

impl<K: Ord> PersistentBst<K> {
    /// Composes a tree from a root key and two existing subtrees.
    ///
    /// Returns `None` unless every key of `left` is less than `key` and
    /// every key of `right` is greater. Both subtrees are shared, not
    /// copied.
    ///
    /// # Complexity
    ///
    /// O(height of the subtrees)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let left = PersistentBst::singleton(1);
    /// let right = PersistentBst::singleton(3);
    ///
    /// let tree = PersistentBst::from_parts(left.clone(), 2, right.clone()).unwrap();
    /// assert_eq!(tree.inorder(), vec![&1, &2, &3]);
    ///
    /// assert!(PersistentBst::from_parts(right, 2, left).is_none());
    /// ```
    #[must_use]
    pub fn from_parts(left: Self, key: K, right: Self) -> Option<Self> {
        let left_in_order = left.max_item().is_none_or(|largest| *largest < key);
        let right_in_order = right.min_item().is_none_or(|smallest| *smallest > key);
        (left_in_order && right_in_order).then(|| Self::from_node(Node::new(key, left, right)))
    }

    /// Returns `true` if the tree contains the key.
    ///
    /// The key may be any borrowed form of the tree's key type, but the
    /// ordering on the borrowed form must match the ordering on the key type.
    ///
    /// # Complexity
    ///
    /// O(height)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree = PersistentBst::new().insert("hello".to_string());
    /// assert!(tree.contains("hello"));
    /// assert!(!tree.contains("world"));
    /// ```
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root_node();
        while let Some(node) = current {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left.root_node(),
                Ordering::Greater => node.right.root_node(),
                Ordering::Equal => return true,
            };
        }
        false
    }

    /// Returns the keys visited from the root down to `target`, inclusive.
    ///
    /// Returns `None` when `target` is absent; a partial path is never
    /// returned. A present target always yields at least one key.
    ///
    /// # Complexity
    ///
    /// O(height)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree: PersistentBst<i32> = [3, 2, 1, 0, 4, 5].into_iter().collect();
    /// assert_eq!(tree.path_to(&0), Some(vec![&3, &2, &1, &0]));
    /// assert_eq!(tree.path_to(&3), Some(vec![&3]));
    /// assert_eq!(tree.path_to(&8), None);
    /// ```
    #[must_use]
    pub fn path_to<Q>(&self, target: &Q) -> Option<Vec<&K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut path = Vec::new();
        let mut current = self.root_node();
        while let Some(node) = current {
            path.push(&node.key);
            current = match target.cmp(node.key.borrow()) {
                Ordering::Less => node.left.root_node(),
                Ordering::Greater => node.right.root_node(),
                Ordering::Equal => return Some(path),
            };
        }
        None
    }
}

impl<K: Clone + Ord> PersistentBst<K> {
    /// Inserts a key into the tree.
    ///
    /// Only the nodes on the search path are copied; the subtree on the
    /// other side of each of them is shared with `self`. Inserting a key
    /// that is already present returns `self` unchanged. The tree is never
    /// rebalanced.
    ///
    /// # Complexity
    ///
    /// O(height)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree1 = PersistentBst::new().insert(2).insert(1);
    /// let tree2 = tree1.insert(3);
    ///
    /// assert_eq!(tree1.num_nodes(), 2); // Original unchanged
    /// assert_eq!(tree2.num_nodes(), 3); // New version
    /// assert!(tree2.insert(3).ptr_eq(&tree2));
    /// ```
    #[must_use]
    pub fn insert(&self, key: K) -> Self {
        let mut search_path: Vec<(&Node<K>, Ordering)> = Vec::with_capacity(self.height());
        let mut current = self.root_node();

        while let Some(node) = current {
            let direction = key.cmp(&node.key);
            current = match direction {
                Ordering::Less => node.left.root_node(),
                Ordering::Greater => node.right.root_node(),
                Ordering::Equal => return self.clone(),
            };
            search_path.push((node, direction));
        }

        search_path
            .into_iter()
            .rev()
            .fold(Self::singleton(key), |child, (node, direction)| {
                let (left, right) = if direction == Ordering::Less {
                    (child, node.right.clone())
                } else {
                    (node.left.clone(), child)
                };
                Self::from_node(Node::new(node.key.clone(), left, right))
            })
    }
}

impl<K: fmt::Display> PersistentBst<K> {
    /// Renders the fully parenthesized structure of the tree.
    ///
    /// The empty tree renders as `Empty` and a node as
    /// `(left) key (right)`. Same as the [`Display`](fmt::Display) output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_bst::persistent::PersistentBst;
    ///
    /// let tree = PersistentBst::new().insert(2).insert(1);
    /// assert_eq!(tree.render(), "((Empty) 1 (Empty)) 2 (Empty)");
    /// assert_eq!(PersistentBst::<i32>::new().render(), "Empty");
    /// ```
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

// =============================================================================
// Traversal Helpers
// =============================================================================

/// A node whose left subtree may already have been rebuilt.
struct RebuildFrame<'a, K, L> {
    node: &'a Node<K>,
    left: Option<PersistentBst<L>>,
}

/// Root-first walk over the nodes of a tree.
struct Nodes<'a, K> {
    stack: Vec<&'a Node<K>>,
}

impl<'a, K> Iterator for Nodes<'a, K> {
    type Item = &'a Node<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.right.root_node());
        self.stack.extend(node.left.root_node());
        Some(node)
    }
}

/// One unit of rendering output.
enum RenderStep<'a, K> {
    Tree(&'a PersistentBst<K>),
    Key(&'a K),
    Text(&'static str),
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the keys of a [`PersistentBst`] in ascending order.
pub struct PersistentBstIterator<'a, K> {
    stack: Vec<&'a Node<K>>,
    remaining: usize,
}

impl<'a, K> PersistentBstIterator<'a, K> {
    fn push_left_spine(&mut self, mut current: Option<&'a Node<K>>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.root_node();
        }
    }
}

impl<'a, K> Iterator for PersistentBstIterator<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.root_node());
        self.remaining -= 1;
        Some(&node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for PersistentBstIterator<'_, K> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An iterator over the keys of a [`PersistentBst`] in root-first order.
pub struct PersistentBstPreorderIterator<'a, K> {
    nodes: Nodes<'a, K>,
    remaining: usize,
}

impl<'a, K> Iterator for PersistentBstPreorderIterator<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.next()?;
        self.remaining -= 1;
        Some(&node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for PersistentBstPreorderIterator<'_, K> {
    fn len(&self) -> usize {
        self.remaining
    }
}

/// An owning iterator over the keys of a [`PersistentBst`] in ascending order.
///
/// Nodes still shared with other trees are kept alive while iterating, so
/// keys are cloned out rather than moved.
pub struct PersistentBstIntoIterator<K> {
    stack: Vec<ReferenceCounter<Node<K>>>,
    remaining: usize,
}

impl<K> PersistentBstIntoIterator<K> {
    fn push_left_spine(&mut self, mut current: Option<&ReferenceCounter<Node<K>>>) {
        while let Some(node) = current {
            self.stack.push(ReferenceCounter::clone(node));
            current = node.left.root.as_ref();
        }
    }
}

impl<K: Clone> Iterator for PersistentBstIntoIterator<K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.root.as_ref());
        self.remaining -= 1;
        Some(node.key.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone> ExactSizeIterator for PersistentBstIntoIterator<K> {
    fn len(&self) -> usize {
        self.remaining
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K> Clone for PersistentBst<K> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K> Default for PersistentBst<K> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Dismantles uniquely owned nodes one at a time.
///
/// The derived drop would recurse once per level, which overflows the stack
/// on long chains.
impl<K> Drop for PersistentBst<K> {
    fn drop(&mut self) {
        let mut pending: Vec<ReferenceCounter<Node<K>>> = self.root.take().into_iter().collect();
        while let Some(node) = pending.pop() {
            if let Ok(mut node) = ReferenceCounter::try_unwrap(node) {
                pending.extend(node.left.root.take());
                pending.extend(node.right.root.take());
            }
        }
    }
}

impl<K: Clone + Ord> FromIterator<K> for PersistentBst<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |tree, key| tree.insert(key))
    }
}

impl<K: Clone + Ord> Extend<K> for PersistentBst<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            *self = self.insert(key);
        }
    }
}

impl<K: Clone> IntoIterator for PersistentBst<K> {
    type Item = K;
    type IntoIter = PersistentBstIntoIterator<K>;

    fn into_iter(self) -> Self::IntoIter {
        let mut iterator = PersistentBstIntoIterator {
            stack: Vec::with_capacity(self.height()),
            remaining: self.num_nodes(),
        };
        iterator.push_left_spine(self.root.as_ref());
        iterator
    }
}

impl<'a, K> IntoIterator for &'a PersistentBst<K> {
    type Item = &'a K;
    type IntoIter = PersistentBstIterator<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Structural equality: same shape and same keys at the same positions.
///
/// Two trees holding the same keys but built in a different insertion order
/// may differ in shape and are then not equal. Compare
/// [`inorder`](PersistentBst::inorder) results to compare contents only.
impl<K: PartialEq> PartialEq for PersistentBst<K> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((tree, other_tree)) = pending.pop() {
            if tree.ptr_eq(other_tree) {
                continue;
            }
            match (tree.root_node(), other_tree.root_node()) {
                (Some(node), Some(other_node)) => {
                    if node.size != other_node.size
                        || node.height != other_node.height
                        || node.key != other_node.key
                    {
                        return false;
                    }
                    pending.push((&node.right, &other_node.right));
                    pending.push((&node.left, &other_node.left));
                }
                _ => return false,
            }
        }
        true
    }
}

impl<K: Eq> Eq for PersistentBst<K> {}

/// Hashes the size followed by the root-first sequence of keys, with a
/// marker for every empty subtree.
///
/// Consistent with the structural [`PartialEq`] implementation.
impl<K: Hash> Hash for PersistentBst<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.num_nodes().hash(state);
        let mut pending = vec![self];
        while let Some(tree) = pending.pop() {
            tree.root_key().hash(state);
            if let Some(node) = tree.root_node() {
                pending.push(&node.right);
                pending.push(&node.left);
            }
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for PersistentBst<K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display> fmt::Display for PersistentBst<K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![RenderStep::Tree(self)];
        while let Some(step) = pending.pop() {
            match step {
                RenderStep::Text(text) => formatter.write_str(text)?,
                RenderStep::Key(key) => write!(formatter, "{key}")?,
                RenderStep::Tree(tree) => match tree.root_node() {
                    None => formatter.write_str(EMPTY_MARKER)?,
                    Some(node) => pending.extend([
                        RenderStep::Text(")"),
                        RenderStep::Tree(&node.right),
                        RenderStep::Text(" ("),
                        RenderStep::Key(&node.key),
                        RenderStep::Text(") "),
                        RenderStep::Tree(&node.left),
                        RenderStep::Text("("),
                    ]),
                },
            }
        }
        Ok(())
    }
}

// =============================================================================
// Serde Support
// =============================================================================

/// Serialized as the sequence of keys in root-first order, which rebuilds
/// the same shape when deserialized.
#[cfg(feature = "serde")]
impl<K> serde::Serialize for PersistentBst<K>
where
    K: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut sequence = serializer.serialize_seq(Some(self.num_nodes()))?;
        for key in self.preorder() {
            sequence.serialize_element(key)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentBstVisitor<K> {
    marker: std::marker::PhantomData<K>,
}

#[cfg(feature = "serde")]
impl<K> PersistentBstVisitor<K> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K> serde::de::Visitor<'de> for PersistentBstVisitor<K>
where
    K: serde::Deserialize<'de> + Clone + Ord,
{
    type Value = PersistentBst<K>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence of keys")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut tree = PersistentBst::new();
        while let Some(key) = access.next_element()? {
            tree = tree.insert(key);
        }
        Ok(tree)
    }
}

#[cfg(feature = "serde")]
impl<'de, K> serde::Deserialize<'de> for PersistentBst<K>
where
    K: serde::Deserialize<'de> + Clone + Ord,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentBstVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Send + Sync Tests (arc feature only)
// =============================================================================


#[cfg(all(test, not(feature = "arc")))]
mod local_only_tests {
    use super::*;

    static_assertions::assert_not_impl_any!(PersistentBst<i32>: Send, Sync);
}
