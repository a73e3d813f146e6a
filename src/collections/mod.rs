//! The collection types built on [`IndexedTree`]
//!
//! Each of these is a thin wrapper that picks a leaf kind and (possibly) a key order, and
//! translates between `usize` positions and the tree's `u32` indexes. They all clone in O(1), and
//! all of them expose the underlying tree with `as_tree` for the operations they don't wrap.
//!
//! * [`AList`] -- a plain list, with fast insertion and removal anywhere
//! * [`BList`] -- a list kept in sorted order
//! * [`BDictionary`] -- a map kept in key order, indexable by position
//! * [`SparseAList`] -- a list where most indexes may be empty
//!
//! [`IndexedTree`]: crate::IndexedTree

use std::ops::Range;

use crate::error::TreeError;

mod alist;
mod bdictionary;
mod blist;
mod sparse_alist;

pub use alist::AList;
pub use bdictionary::BDictionary;
pub use blist::BList;
pub use sparse_alist::SparseAList;

/// Converts a position for a tree of length `len`
fn to_index(index: usize, len: u32) -> Result<u32, TreeError> {
    u32::try_from(index).map_err(|_| TreeError::IndexOutOfBounds {
        index: index as u64,
        len,
    })
}

/// Converts a range of positions into a start index and a count
fn to_span(range: Range<usize>, len: u32) -> Result<(u32, u32), TreeError> {
    let start = to_index(range.start, len)?;
    let end = to_index(range.end, len)?;
    match end.checked_sub(start) {
        Some(n) => Ok((start, n)),
        None => Err(TreeError::IndexOutOfBounds {
            index: range.start as u64,
            len,
        }),
    }
}

/// Key extractor for collections whose items are their own keys
fn clone_key<T: Clone>(item: &T) -> T {
    item.clone()
}
