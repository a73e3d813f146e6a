//! Parameterization for [`IndexedTree`]
//!
//! There are two knobs: the node size limits ([`NodeLimits`]), which are chosen per tree at
//! construction, and the rebalancing policy ([`SizePolicy`]), which is the same for every tree.
//! The collections in [`collections`] all pick their own defaults, but accept custom limits:
//!
//! ```
//! use hyperion::param::NodeLimits;
//! use hyperion::AList;
//!
//! let list: AList<u32> = AList::with_limits(NodeLimits::new(16, 8));
//! assert_eq!(list.limits().max_leaf(), 16);
//! ```
//!
//! [`IndexedTree`]: crate::IndexedTree
//! [`collections`]: crate::collections

use crate::error::TreeError;

/// The default maximum number of elements in a leaf node
///
/// This wasn't chosen for any *particular* reason. Larger
/// leaves make sequential access faster and the tree shallower, but every insertion in the middle
/// of a leaf moves up to this many elements.
pub const DEFAULT_MAX_LEAF: u16 = 48;

/// The default maximum number of children in an inner node
pub const DEFAULT_MAX_INNER: u16 = 64;

/// The smallest permitted limit for either kind of node
///
/// Splitting a node of size `n` produces halves of size `n / 2` and `n - n / 2`; with fewer than
/// three slots the halves of an overfull node could not both be within bounds.
pub const MIN_NODE_SIZE: u16 = 3;

/// Maximum sizes for the nodes of a tree
///
/// Two trees can only exchange whole subtrees (e.g. with [`append`]) if their limits are equal;
/// otherwise the operation falls back to copying elements one at a time.
///
/// [`append`]: crate::IndexedTree::append
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeLimits {
    max_leaf: u16,
    max_inner: u16,
}

impl NodeLimits {
    /// Creates a new set of limits
    ///
    /// ## Panics
    ///
    /// This method panics if either limit is less than [`MIN_NODE_SIZE`]. For a non-panicking
    /// version, see [`try_new`](Self::try_new).
    pub const fn new(max_leaf: u16, max_inner: u16) -> Self {
        if max_leaf < MIN_NODE_SIZE || max_inner < MIN_NODE_SIZE {
            panic!("cannot construct NodeLimits: both limits must be >= 3");
        }

        NodeLimits {
            max_leaf,
            max_inner,
        }
    }

    /// Creates a new set of limits, returning an error if either is less than [`MIN_NODE_SIZE`]
    pub fn try_new(max_leaf: u16, max_inner: u16) -> Result<Self, TreeError> {
        if max_leaf < MIN_NODE_SIZE || max_inner < MIN_NODE_SIZE {
            return Err(TreeError::InvalidLimits {
                max_leaf,
                max_inner,
            });
        }

        Ok(NodeLimits {
            max_leaf,
            max_inner,
        })
    }

    pub const fn max_leaf(&self) -> u16 {
        self.max_leaf
    }

    pub const fn max_inner(&self) -> u16 {
        self.max_inner
    }
}

/// Generates small limits, so that short command sequences still build several levels
#[cfg(feature = "fuzz")]
impl<'d> arbitrary::Arbitrary<'d> for NodeLimits {
    fn arbitrary(u: &mut arbitrary::Unstructured<'d>) -> arbitrary::Result<Self> {
        let max_leaf = u.int_in_range(MIN_NODE_SIZE..=8)?;
        let max_inner = u.int_in_range(MIN_NODE_SIZE..=8)?;
        Ok(NodeLimits::new(max_leaf, max_inner))
    }
}

impl Default for NodeLimits {
    fn default() -> Self {
        NodeLimits::new(DEFAULT_MAX_LEAF, DEFAULT_MAX_INNER)
    }
}

/// The rebalancing thresholds shared by all trees
///
/// These are tuning constants rather than anything derived from an amortized cost bound, so they
/// live here instead of being spread through the algorithms in `tree::fix`. Any replacement must
/// keep `is_undersized(n, max)` false for every `n > max / 2`, so that the two halves of a split
/// never count as undersized.
pub struct SizePolicy;

impl SizePolicy {
    /// Returns whether a node with `local` slots out of `max` should be merged or refilled
    ///
    /// The threshold is a third rather than a half so that alternating insertions and removals at
    /// a node boundary don't repeatedly split and merge the same pair of nodes.
    #[inline]
    pub const fn is_undersized(local: usize, max: usize) -> bool {
        local * 3 <= max
    }

    /// The size that an undersized node (with `local` slots) should be brought up to when it
    /// borrows from siblings holding `left` and `right` slots
    #[inline]
    pub const fn redistribution_target(left: usize, right: usize, local: usize) -> usize {
        (left + right + local + 2) / 3
    }

    /// Minimum free slots a sibling must have before we shift elements into it to avoid a split
    pub const SHIFT_MIN_FREE: usize = 2;
}
