//! # Hyperion -- indexable trees that clone in constant time
//!
//! This crate provides a single engine -- [`IndexedTree`] -- and a handful of collections built on
//! top of it. The engine is a B+ tree in which every element has a position, so that it can serve
//! as a list, a sorted list, a sorted map, or a list with holes in it, all with the same
//! O(log n) bounds on access, insertion, and removal anywhere in the sequence.
//!
//! ### Notable features
//!
//! * Values are retrieved by global index; every inner node records the offset of each child
//! * O(1) cloning -- clones share every node with the original, and nodes are only copied (one
//!     path at a time) when one side modifies them
//! * Sparse leaves, where runs of empty indexes cost nothing to store and can be inserted or
//!     cleared in O(log n) time
//! * Key-ordered trees, where every inner node caches the highest key beneath each child, so that
//!     searches only ever touch one leaf
//! * A structural change notification protocol ([`TreeObserver`]), precise enough to maintain
//!     external indexes such as [`LookupIndex`] without a second copy of the positions
//! * Splicing -- whole trees can be appended or prepended (and sections cut out) in O(log n)
//!     time, sharing nodes rather than copying elements
//!
//! ### Collections
//!
//! Most uses will want one of the wrappers in [`collections`]: [`AList`], [`BList`],
//! [`BDictionary`], or [`SparseAList`]. Each of them exposes its tree through `as_tree`.
//!
//! ### Feature flags
//!
//! * `serde` -- implements `Serialize` and `Deserialize` for the collections and [`NodeLimits`]
//! * `fuzz` -- exposes `IndexedTree::validate` and derives `Arbitrary` where useful, for the
//!     fuzzing harness in `fuzz/`
//!
//! ### Naming
//!
//! This library is named after [Hyperion], a coast redwood in California that's the tallest known
//! living tree.
//!
//! [Hyperion]: https://en.wikipedia.org/wiki/Hyperion_(tree)
//! [`NodeLimits`]: param::NodeLimits

#![deny(unsafe_code)]

#[macro_use]
mod macros;

pub mod collections;
pub mod param;

mod cursor;
mod error;
mod indexer;
pub mod observer;
mod tree;

#[cfg(any(test, feature = "fuzz"))]
pub mod mock;

#[cfg(feature = "serde")]
mod serde;

pub use collections::{AList, BDictionary, BList, SparseAList};
pub use cursor::Cursor;
pub use error::{ObserverError, ObserverResult, TreeError, Veto};
pub use indexer::LookupIndex;
pub use observer::{Dispatcher, ObserverFailure, Populate, SharedObserver, TreeObserver};
pub use tree::{
    ChangeAction, ChangeListener, FreezeMode, IndexedTree, Iter, KeyOrder, LeafItems,
    ListChangeInfo, Node, NodeId, OnEqual, SparseIter,
};
