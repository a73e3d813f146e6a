//! Error types returned by the tree and its observers

use thiserror::Error;

/// Errors produced by the mutating (and some reading) operations on an [`IndexedTree`]
///
/// None of these are retried internally. Every error is reported *before* the tree changes, with
/// the exception of the ones documented on [`IndexedTree::force_clear`] and
/// [`IndexedTree::insert_range`] (which only fails up-front).
///
/// [`IndexedTree`]: crate::IndexedTree
/// [`IndexedTree::force_clear`]: crate::IndexedTree::force_clear
/// [`IndexedTree::insert_range`]: crate::IndexedTree::insert_range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The index was outside the valid range for the operation: `[0, len]` for insertions,
    /// `[0, len)` for everything else
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: u64, len: u32 },

    /// The tree was frozen with [`freeze`](crate::IndexedTree::freeze) and cannot be modified
    #[error("tree is frozen and cannot be modified")]
    Frozen,

    /// Another operation was already in progress, or the tree was structurally changed while a
    /// [`Cursor`](crate::Cursor) was observing it
    #[error("tree was modified concurrently")]
    ConcurrentModification,

    /// The element count would no longer fit in a `u32`
    #[error("tree would exceed the maximum of {} elements", u32::MAX)]
    CapacityOverflow,

    /// A pre-change listener refused the change
    #[error("change was vetoed: {0}")]
    Vetoed(Veto),

    /// An observer's checkpoint failed at the end of an otherwise successful operation
    #[error("observer checkpoint failed: {0}")]
    Observer(#[from] ObserverError),

    /// Node limits below the supported minimum
    #[error("invalid node limits (leaf {max_leaf}, inner {max_inner}); both must be at least 3")]
    InvalidLimits { max_leaf: u16, max_inner: u16 },

    /// A key-ordered operation was requested on a tree that has no key order
    #[error("tree has no key order")]
    NotSorted,

    /// An operation on empty space was requested on a tree with dense leaves
    #[error("tree does not support empty space")]
    NotSparse,
}

/// The reason given by a pre-change listener for refusing a change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Veto {
    pub reason: String,
}

impl Veto {
    pub fn new(reason: impl Into<String>) -> Self {
        Veto {
            reason: reason.into(),
        }
    }
}

/// Failure reported by a [`TreeObserver`](crate::TreeObserver)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// Generic failure with a message from the observer
    #[error("{0}")]
    Failed(String),
    /// The observer is already attached to another tree
    #[error("observer is already attached to a tree")]
    AlreadyAttached,
    /// The observer was already borrowed when the tree tried to notify it
    #[error("observer was borrowed during notification")]
    Reentrant,
}

impl ObserverError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ObserverError::Failed(msg.into())
    }
}

/// Result type used by every [`TreeObserver`](crate::TreeObserver) method
pub type ObserverResult = Result<(), ObserverError>;
