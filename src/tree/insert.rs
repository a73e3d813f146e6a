//! Insertion, replacement, and the growth of the tree
//!
//! All of the insertion-like operations share the same shape: find the child containing the
//! target index, make it unique, recurse into it, then deal with whatever split it returned. That
//! shape is captured once, in [`InnerNode::descend`]. Splits propagate upwards as return values;
//! when the root itself splits, [`Core::grow`] puts a new inner node above it.

use std::rc::Rc;

use super::cow::auto_clone;
use super::inner::InnerNode;
use super::node::{Body, Node, NodeId};
use super::{Core, Ctx};

impl<T: Clone, K: Clone> Core<T, K> {
    /// Returns the root, creating an empty leaf if the tree is empty, and making it unique
    pub(super) fn root_mut(&mut self, ctx: &mut Ctx<T, K>) -> &mut Node<T, K> {
        let root = self.root.get_or_insert_with(|| {
            let leaf = Rc::new(Node::empty_leaf(self.sparse, self.limits.max_leaf()));
            ctx.notify.root_changed(Some(&leaf), false);
            self.height = 1;
            leaf
        });
        auto_clone(root, None, ctx)
    }

    /// Puts a new inner node above the current root, with the root and `right` as its children
    pub(super) fn grow(&mut self, right: Node<T, K>, ctx: &mut Ctx<T, K>) {
        let left = match self.root.take() {
            Some(r) => r,
            None => {
                weak_unreachable!("cannot grow an empty tree");
                self.root = Some(Rc::new(right));
                self.height = 1;
                return;
            }
        };

        let right = Rc::new(right);
        ctx.notify.content_added(&right);

        let mut inner = InnerNode::new();
        let left_total = left.total_count();
        let (left_id, right_id) = (left.id(), right.id());
        inner.entries.push(inner.make_entry(0, left, ctx));
        inner.entries.push(inner.make_entry(left_total, right, ctx));

        let root = Rc::new(Node::new(Body::Inner(inner), self.inner_max()));
        ctx.notify.root_changed(Some(&root), false);
        ctx.notify.node_added(left_id, root.id());
        ctx.notify.node_added(right_id, root.id());

        tracing::trace!(height = self.height + 1, "root split; tree grew");
        self.root = Some(root);
        self.height += 1;
    }

    pub(super) fn insert(&mut self, index: u32, item: T, ctx: &mut Ctx<T, K>) {
        let root = self.root_mut(ctx);
        if let Some(right) = root.insert(index, item, ctx) {
            self.grow(right, ctx);
        }
        self.count += 1;
    }

    /// Inserts the items of `items` at `index`, filling one leaf per descent from the root
    ///
    /// Each descent costs O(log n) and places up to a leaf's worth of items, so the whole insertion
    /// costs O(m + (m / leaf size) * log n) rather than O(m * log n).
    pub(super) fn insert_range<I: Iterator<Item = T>>(
        &mut self,
        mut index: u32,
        mut items: I,
        ctx: &mut Ctx<T, K>,
    ) {
        loop {
            let root = self.root_mut(ctx);
            let (n, split) = root.insert_from(index, &mut items, ctx);
            if let Some(right) = split {
                self.grow(right, ctx);
            }
            if n == 0 {
                break;
            }
            self.count += n;
            index += n;
        }
        self.fix_root(ctx);
    }

    pub(super) fn set(&mut self, index: u32, item: T, ctx: &mut Ctx<T, K>) -> Option<T> {
        let root = self.root_mut(ctx);
        let (old, split) = root.set(index, item, ctx);
        if let Some(right) = split {
            self.grow(right, ctx);
        }
        old
    }

    pub(super) fn insert_space(&mut self, index: u32, n: u32, ctx: &mut Ctx<T, K>) {
        let root = self.root_mut(ctx);
        root.insert_space(index, n, ctx);
        self.count += n;
    }
}

impl<T: Clone, K: Clone> Node<T, K> {
    /// Inserts an item at `index` (relative to this node), returning the split-off right half of
    /// this node if it overflowed
    pub(super) fn insert(&mut self, index: u32, item: T, ctx: &mut Ctx<T, K>) -> Option<Self> {
        let (id, max, max_size) = (self.id(), self.max_size(), self.max_size);
        let body = match &mut self.body {
            Body::Leaf(l) => l.insert(id, max, index, item, ctx).map(Body::Leaf),
            Body::Sparse(s) => s.insert(id, max, index, item, ctx).map(Body::Sparse),
            Body::Inner(n) => {
                let ((), split) = n.descend(id, max, index, true, ctx, |child, offset, ctx| {
                    ((), 1, child.insert(offset, item, ctx))
                });
                split.map(Body::Inner)
            }
        };
        body.map(|b| Node::new(b, max_size))
    }

    /// Inserts as many items from `src` as fit in one leaf, returning the number inserted along
    /// with the split-off right half of this node, if any
    pub(super) fn insert_from<I: Iterator<Item = T>>(
        &mut self,
        index: u32,
        src: &mut I,
        ctx: &mut Ctx<T, K>,
    ) -> (u32, Option<Self>) {
        let (id, max, max_size) = (self.id(), self.max_size(), self.max_size);
        let (n, body) = match &mut self.body {
            Body::Leaf(l) => {
                let (n, split) = l.insert_from(id, max, index, src, ctx);
                (n, split.map(Body::Leaf))
            }
            Body::Sparse(s) => {
                let (n, split) = s.insert_from(id, max, index, src, ctx);
                (n, split.map(Body::Sparse))
            }
            Body::Inner(inner) => {
                let (n, split) = inner.descend(id, max, index, true, ctx, |child, offset, ctx| {
                    let (n, split) = child.insert_from(offset, src, ctx);
                    (n, n, split)
                });
                (n, split.map(Body::Inner))
            }
        };
        (n, body.map(|b| Node::new(b, max_size)))
    }

    /// Replaces the item at `index`, returning the old item along with the split-off right half
    /// of this node (only possible when filling an empty slot in a sparse tree)
    pub(super) fn set(&mut self, index: u32, item: T, ctx: &mut Ctx<T, K>) -> (Option<T>, Option<Self>) {
        let (id, max, max_size) = (self.id(), self.max_size(), self.max_size);
        let (old, body) = match &mut self.body {
            Body::Leaf(l) => (Some(l.set(id, index, item, ctx)), None),
            Body::Sparse(s) => {
                let (old, split) = s.set(id, max, index, item, ctx);
                (old, split.map(Body::Sparse))
            }
            Body::Inner(n) => {
                let (old, split) = n.descend(id, max, index, false, ctx, |child, offset, ctx| {
                    let (old, split) = child.set(offset, item, ctx);
                    (old, 0, split)
                });
                (old, split.map(Body::Inner))
            }
        };
        (old, body.map(|b| Node::new(b, max_size)))
    }

    /// Adds `n` empty slots at `index`; only valid in sparse trees. Never splits.
    pub(super) fn insert_space(&mut self, index: u32, n: u32, ctx: &mut Ctx<T, K>) {
        let (id, max) = (self.id(), self.max_size());
        match &mut self.body {
            Body::Sparse(s) => s.insert_space(index, n),
            Body::Leaf(_) => weak_unreachable!("dense leaves have no empty space"),
            Body::Inner(inner) => {
                let ((), split) = inner.descend(id, max, index, false, ctx, |child, offset, ctx| {
                    child.insert_space(offset, n, ctx);
                    ((), n, None)
                });
                weak_assert!(split.is_none());
            }
        }
    }
}

impl<T: Clone, K: Clone> InnerNode<T, K> {
    /// Applies `op` to the child containing `index`, then absorbs its effects on this node
    ///
    /// `op` is given the (unique) child, the index relative to it, and the context; it returns its
    /// result, the number of indexes it added to the child, and the child's split-off right half.
    /// When `may_grow` is true and the child is full, we first try to make room by shifting some
    /// of its contents to a sibling. Returns the result of `op` and this node's own right half, if
    /// it overflowed.
    pub(super) fn descend<R>(
        &mut self,
        id: NodeId,
        max: usize,
        index: u32,
        may_grow: bool,
        ctx: &mut Ctx<T, K>,
        op: impl FnOnce(&mut Node<T, K>, u32, &mut Ctx<T, K>) -> (R, u32, Option<Node<T, K>>),
    ) -> (R, Option<Self>) {
        let mut c = self.binary_search_by_offset(index);
        if may_grow && self.entries[c].node.is_full() && self.try_shift_to_siblings(id, c, ctx) {
            c = self.binary_search_by_offset(index);
        }

        let offset = index - self.entries[c].base;
        let child = auto_clone(&mut self.entries[c].node, Some(id), ctx);
        let (result, added, split) = op(child, offset, ctx);

        self.add_to_bases_after(c, added);
        self.refresh_key(c, ctx);
        if let Some(right) = split {
            self.handle_child_split(id, c, right, ctx);
        }

        (result, self.split_if_overfull(id, max, ctx))
    }

    /// Links the right half of the child at `c`, which just split, as a new sibling after it
    pub(super) fn handle_child_split(&mut self, id: NodeId, c: usize, right: Node<T, K>, ctx: &mut Ctx<T, K>) {
        let right = Rc::new(right);
        tracing::trace!(left = ?self.entries[c].node.id(), right = ?right.id(), "child split");
        ctx.notify.content_added(&right);
        self.link_child(id, c + 1, right, ctx);
    }

    /// Splits this node in half if it has more than `max` children
    pub(super) fn split_if_overfull(&mut self, id: NodeId, max: usize, ctx: &mut Ctx<T, K>) -> Option<Self> {
        if self.entries.len() <= max {
            return None;
        }
        let at = self.entries.len() / 2;
        Some(self.split_off(id, at, ctx))
    }
}
