//! Wrapper module for [`Cursor`]

/// A position in an [`IndexedTree`], tied to the tree's structure at the time it was created
///
/// Cursors don't borrow the tree, so they can be kept across mutations. Any structural change
/// (an insertion or removal, or anything else that bumps [`version`]) invalidates every existing
/// cursor: using one afterwards fails with [`TreeError::ConcurrentModification`]. Replacing an
/// item in a dense tree doesn't.
///
/// A cursor is only meaningful for the tree that created it. Clones of a tree start with a fresh
/// version, so a cursor from the original may happen to pass the check on a clone.
///
/// [`IndexedTree`]: crate::IndexedTree
/// [`version`]: crate::IndexedTree::version
/// [`TreeError::ConcurrentModification`]: crate::TreeError::ConcurrentModification
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    index: u32,
    version: u32,
}

impl Cursor {
    pub(crate) fn new(index: u32, version: u32) -> Self {
        Cursor { index, version }
    }

    /// Returns the index the cursor points at
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn version(&self) -> u32 {
        self.version
    }

    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
    }
}
