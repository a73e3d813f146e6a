//! Management of nodes
//!
//! Every node is reference-counted, and a node is *shared* (or "frozen") exactly when its count is
//! greater than one. Shared nodes are never modified in place: before any mutation, the path from
//! the root down to the changed node is made unique with [`auto_clone`], which replaces a shared
//! node in its parent's slot with a fresh copy.
//!
//! There are three kinds of node, distinguished by [`Body`]:
//!
//! * [`DenseLeaf`] -- a plain list of items, where an item's offset is its position in the list
//! * [`SparseLeaf`] -- a list of `(offset, item)` pairs within a span of `total` indexes, where
//!   any offset without a pair is an empty slot
//! * [`InnerNode`] -- a list of children, each with the base offset of its first index
//!
//! All leaves in a tree are at the same depth, and all leaves are either dense or sparse.
//!
//! [`auto_clone`]: super::cow::auto_clone

use std::fmt::{self, Debug, Formatter};
use std::iter::Enumerate;
use std::rc::Rc;
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};

use super::inner::InnerNode;
use super::leaf::DenseLeaf;
use super::sorted::KeyOrder;
use super::sparse::SparseLeaf;
use crate::param::SizePolicy;

/// Helper alias for a shared pointer to a node
pub(crate) type NodeRef<T, K> = Rc<Node<T, K>>;

/// Unique identity of a node, stable for as long as the node exists
///
/// Cloning a node (including copy-on-write clones) always produces a node with a new `NodeId`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

impl NodeId {
    fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A single node in an [`IndexedTree`](crate::IndexedTree)
///
/// Nodes are only ever exposed by shared reference. They're given to observers, so that observers
/// can inspect the parts of the tree they're notified about.
pub struct Node<T, K = ()> {
    id: NodeId,
    pub(super) max_size: u16,
    pub(super) body: Body<T, K>,
}

pub(super) enum Body<T, K> {
    Leaf(DenseLeaf<T>),
    Sparse(SparseLeaf<T>),
    Inner(InnerNode<T, K>),
}

impl<T, K> Node<T, K> {
    pub(super) fn new(body: Body<T, K>, max_size: u16) -> Self {
        Node {
            id: NodeId::fresh(),
            max_size,
            body,
        }
    }

    pub(super) fn empty_leaf(sparse: bool, max_size: u16) -> Self {
        let body = match sparse {
            true => Body::Sparse(SparseLeaf::new()),
            false => Body::Leaf(DenseLeaf::new()),
        };
        Node::new(body, max_size)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Maximum number of items (for leaves) or children (for inner nodes)
    pub fn max_size(&self) -> usize {
        self.max_size as usize
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.body, Body::Inner(_))
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self.body, Body::Sparse(_))
    }

    /// Number of slots used in this node: items in a leaf, or children in an inner node
    pub fn local_count(&self) -> usize {
        match &self.body {
            Body::Leaf(l) => l.len(),
            Body::Sparse(s) => s.len(),
            Body::Inner(n) => n.len(),
        }
    }

    /// Number of indexes spanned by the subtree rooted at this node, including empty slots
    pub fn total_count(&self) -> u32 {
        match &self.body {
            Body::Leaf(l) => l.len() as u32,
            Body::Sparse(s) => s.total(),
            Body::Inner(n) => n.total(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.local_count() >= self.max_size()
    }

    pub fn is_undersized(&self) -> bool {
        SizePolicy::is_undersized(self.local_count(), self.max_size())
    }

    pub(super) fn free_slots(&self) -> usize {
        self.max_size().saturating_sub(self.local_count())
    }

    /// Iterates over the children of an inner node; empty for leaves
    pub fn children(&self) -> impl Iterator<Item = &Node<T, K>> + '_ {
        self.child_entries().map(|(_, node)| node)
    }

    /// Iterates over the children of an inner node, along with the offset of each child's first
    /// index relative to this node
    pub fn child_entries(&self) -> impl Iterator<Item = (u32, &Node<T, K>)> + '_ {
        let entries = match &self.body {
            Body::Inner(n) => n.entries.as_slice(),
            _ => &[],
        };
        entries.iter().map(|e| (e.base, &*e.node))
    }

    /// Iterates over the items stored directly in a leaf, with their offsets relative to the leaf;
    /// empty for inner nodes
    pub fn leaf_items(&self) -> LeafItems<'_, T> {
        match &self.body {
            Body::Leaf(l) => LeafItems::Dense(l.items.iter().enumerate()),
            Body::Sparse(s) => LeafItems::Sparse(s.pairs.iter()),
            Body::Inner(_) => LeafItems::Empty,
        }
    }

    /// Returns the item at `index` relative to the start of this node, if there is one
    pub fn get(&self, mut index: u32) -> Option<&T> {
        let mut node = self;
        loop {
            match &node.body {
                Body::Leaf(l) => return l.items.get(index as usize),
                Body::Sparse(s) => return s.get(index),
                Body::Inner(n) => {
                    if n.entries.is_empty() {
                        return None;
                    }
                    let c = n.binary_search_by_offset(index);
                    index -= n.entries[c].base;
                    node = &n.entries[c].node;
                }
            }
        }
    }

    pub(super) fn as_inner(&self) -> Option<&InnerNode<T, K>> {
        match &self.body {
            Body::Inner(n) => Some(n),
            _ => None,
        }
    }

    pub(super) fn as_inner_mut(&mut self) -> Option<&mut InnerNode<T, K>> {
        match &mut self.body {
            Body::Inner(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the rightmost item in the subtree
    pub(super) fn last_item(&self) -> Option<&T> {
        match &self.body {
            Body::Leaf(l) => l.items.last(),
            Body::Sparse(s) => s.pairs.last().map(|(_, v)| v),
            Body::Inner(n) => n.entries.last().and_then(|e| e.node.last_item()),
        }
    }

    /// Computes the value to cache as this node's highest key in its parent
    pub(super) fn highest_key(&self, order: &KeyOrder<T, K>) -> Option<K>
    where
        K: Clone,
    {
        match &self.body {
            Body::Inner(n) => n.entries.last().and_then(|e| e.key.clone()),
            _ => self.last_item().map(|item| order.key_of(item)),
        }
    }
}

impl<T: Clone, K: Clone> Node<T, K> {
    /// Produces an unshared copy of this node, with a fresh [`NodeId`]
    ///
    /// Leaves copy their items. Inner nodes copy their entries, which means that the children
    /// become shared between the original and the copy.
    pub(super) fn detached_clone(&self) -> Self {
        let body = match &self.body {
            Body::Leaf(l) => Body::Leaf(l.clone()),
            Body::Sparse(s) => Body::Sparse(s.clone()),
            Body::Inner(n) => Body::Inner(n.clone()),
        };
        Node::new(body, self.max_size)
    }
}

/// Iterator over the items directly inside a leaf, returned by [`Node::leaf_items`]
pub enum LeafItems<'n, T> {
    Dense(Enumerate<slice::Iter<'n, T>>),
    Sparse(slice::Iter<'n, (u32, T)>),
    Empty,
}

impl<'n, T> Iterator for LeafItems<'n, T> {
    type Item = (u32, &'n T);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            LeafItems::Dense(it) => it.next().map(|(i, v)| (i as u32, v)),
            LeafItems::Sparse(it) => it.next().map(|(i, v)| (*i, v)),
            LeafItems::Empty => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            LeafItems::Dense(it) => it.size_hint(),
            LeafItems::Sparse(it) => it.size_hint(),
            LeafItems::Empty => (0, Some(0)),
        }
    }
}

///////////////////
// Debug helpers //
///////////////////

impl<T: Debug, K> Debug for Node<T, K> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        fn write_node<T: Debug, K>(
            node: &Node<T, K>,
            base: u32,
            depth: usize,
            f: &mut Formatter,
        ) -> fmt::Result {
            let pad = depth * 4;
            match &node.body {
                Body::Leaf(l) => writeln!(
                    f,
                    "{:pad$}leaf {:?} @ {base}, {} items: {:?}",
                    "",
                    node.id,
                    l.len(),
                    l.items,
                ),
                Body::Sparse(s) => writeln!(
                    f,
                    "{:pad$}sparse {:?} @ {base}, total {}: {:?}",
                    "",
                    node.id,
                    s.total(),
                    s.pairs,
                ),
                Body::Inner(n) => {
                    writeln!(
                        f,
                        "{:pad$}inner {:?} @ {base}, total {}",
                        "",
                        node.id,
                        n.total()
                    )?;
                    for e in &n.entries {
                        write_node(&e.node, base + e.base, depth + 1, f)?;
                    }
                    Ok(())
                }
            }
        }

        write_node(self, 0, 0, f)
    }
}
