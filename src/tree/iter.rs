//! Wrapper module for [`IndexedTree`](crate::IndexedTree) iterator types -- [`Iter`] and
//! [`SparseIter`]

use std::iter::FusedIterator;
use std::slice;

use super::inner::Entry;
use super::node::{Body, LeafItems, Node};

/// Shared machinery for both iterators: a stack of the remaining siblings at each level above the
/// current leaf
struct Walker<'t, T, K> {
    /// For each inner node on the path to the current leaf, the absolute index of the node's
    /// first slot and the children after the one we're in
    stack: Vec<(u32, slice::Iter<'t, Entry<T, K>>)>,
    leaf_base: u32,
    leaf: LeafItems<'t, T>,
}

impl<'t, T, K> Walker<'t, T, K> {
    fn empty() -> Self {
        Walker {
            stack: Vec::new(),
            leaf_base: 0,
            leaf: LeafItems::Empty,
        }
    }

    /// Creates a walker whose first item is the first one at or after `start`
    fn new(root: &'t Node<T, K>, start: u32) -> Self {
        let mut walker = Walker::empty();
        let (mut node, mut base, mut offset) = (root, 0, start);

        loop {
            match &node.body {
                Body::Inner(n) => {
                    if n.entries.is_empty() {
                        return walker;
                    }
                    let c = n.binary_search_by_offset(offset);
                    let entry = &n.entries[c];
                    walker.stack.push((base, n.entries[c + 1..].iter()));
                    base += entry.base;
                    offset -= entry.base;
                    node = &*entry.node;
                }
                Body::Leaf(l) => {
                    let mut items = l.items.iter().enumerate();
                    if offset > 0 {
                        items.nth(offset as usize - 1);
                    }
                    walker.leaf = LeafItems::Dense(items);
                    walker.leaf_base = base;
                    return walker;
                }
                Body::Sparse(s) => {
                    let mut pairs = s.pairs.iter();
                    let p = s.lower_bound(offset);
                    if p > 0 {
                        pairs.nth(p - 1);
                    }
                    walker.leaf = LeafItems::Sparse(pairs);
                    walker.leaf_base = base;
                    return walker;
                }
            }
        }
    }

    /// Moves to the leftmost leaf of `node`, whose first slot is at `base`
    fn push_leftmost(&mut self, mut node: &'t Node<T, K>, mut base: u32) {
        while let Body::Inner(n) = &node.body {
            let mut rest = n.entries.iter();
            let Some(first) = rest.next() else {
                return;
            };
            self.stack.push((base, rest));
            base += first.base;
            node = &*first.node;
        }
        self.leaf = node.leaf_items();
        self.leaf_base = base;
    }

    fn next(&mut self) -> Option<(u32, &'t T)> {
        loop {
            if let Some((offset, item)) = self.leaf.next() {
                return Some((self.leaf_base + offset, item));
            }

            // Current leaf is exhausted; find the next sibling up the stack.
            self.leaf = LeafItems::Empty;
            let (base, rest) = self.stack.last_mut()?;
            match rest.next() {
                None => {
                    self.stack.pop();
                }
                Some(entry) => {
                    let child_base = *base + entry.base;
                    self.push_leftmost(&entry.node, child_base);
                }
            }
        }
    }
}

/// An iterator over the items of an [`IndexedTree`](crate::IndexedTree), in order
///
/// Empty slots in sparse trees are skipped. Produced by the [`iter`] and [`iter_from`] methods.
///
/// [`iter`]: crate::IndexedTree::iter
/// [`iter_from`]: crate::IndexedTree::iter_from
pub struct Iter<'t, T, K = ()> {
    walker: Walker<'t, T, K>,
    /// Number of indexes (set or not) from the next position to the end of the tree
    remaining: u32,
    dense: bool,
}

impl<'t, T, K> Iter<'t, T, K> {
    pub(super) fn new(root: Option<&'t Node<T, K>>, start: u32, count: u32) -> Self {
        match root {
            Some(root) if start < count => Iter {
                walker: Walker::new(root, start),
                remaining: count - start,
                dense: !matches!(root_leaf_kind(root), Some(true)),
            },
            _ => Iter {
                walker: Walker::empty(),
                remaining: 0,
                dense: true,
            },
        }
    }
}

/// Returns whether the leaves under `node` are sparse
fn root_leaf_kind<T, K>(mut node: &Node<T, K>) -> Option<bool> {
    loop {
        match &node.body {
            Body::Inner(n) => node = &*n.entries.first()?.node,
            Body::Leaf(_) => return Some(false),
            Body::Sparse(_) => return Some(true),
        }
    }
}

impl<'t, T, K> Iterator for Iter<'t, T, K> {
    type Item = &'t T;

    fn next(&mut self) -> Option<&'t T> {
        let (_, item) = self.walker.next()?;
        if self.dense {
            self.remaining = self.remaining.saturating_sub(1);
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        match self.dense {
            true => (n, Some(n)),
            false => (0, Some(n)),
        }
    }
}

impl<T, K> FusedIterator for Iter<'_, T, K> {}

/// An iterator over the set slots of an [`IndexedTree`](crate::IndexedTree), yielding each item
/// with its index
///
/// Produced by [`IndexedTree::sparse_iter`](crate::IndexedTree::sparse_iter). For dense trees this
/// is the same as `iter().enumerate()`, modulo the index type.
pub struct SparseIter<'t, T, K = ()> {
    walker: Walker<'t, T, K>,
}

impl<'t, T, K> SparseIter<'t, T, K> {
    pub(super) fn new(root: Option<&'t Node<T, K>>) -> Self {
        let walker = match root {
            Some(root) => Walker::new(root, 0),
            None => Walker::empty(),
        };
        SparseIter { walker }
    }
}

impl<'t, T, K> Iterator for SparseIter<'t, T, K> {
    type Item = (u32, &'t T);

    fn next(&mut self) -> Option<(u32, &'t T)> {
        self.walker.next()
    }
}

impl<T, K> FusedIterator for SparseIter<'_, T, K> {}
