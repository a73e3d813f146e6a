//! Whole-subtree operations: concatenating trees and copying sections out of them
//!
//! Appending a tree of `m` items to a tree of `n` items links the other tree's root into this one
//! at the level where the heights match, so the cost is O(log n + log m) rather than O(m). The
//! other tree's nodes end up shared between both trees, exactly as if one had been cloned from
//! the other. Copying a section works the same way in reverse: any subtree that's entirely inside
//! the section is shared rather than copied, so only the two edges of the section are new nodes.

use std::rc::Rc;

use super::cow::{auto_clone, deep_copy};
use super::fix::Side;
use super::inner::{Entry, InnerNode};
use super::leaf::DenseLeaf;
use super::node::{Body, Node, NodeRef};
use super::sorted::KeyOrder;
use super::sparse::SparseLeaf;
use super::{ChangeAction, Core, Ctx, IndexedTree, ListChangeInfo};
use crate::error::TreeError;
use crate::observer::Notify;

impl<T: Clone, K: Clone> IndexedTree<T, K> {
    /// Adds the contents of `other` to the end of this tree
    ///
    /// When both trees have the same node limits, this shares the nodes of `other` instead of
    /// copying its items. Small trees (fitting in a single leaf) are always copied item by item.
    /// While an observer is attached, the nodes of `other` are copied (keeping their shape) so
    /// that every node in this tree has its own [`NodeId`](crate::NodeId).
    pub fn append(&mut self, other: &IndexedTree<T, K>) -> Result<(), TreeError> {
        self.splice(other, Side::Right)
    }

    /// Adds the contents of `other` to the start of this tree
    ///
    /// Like [`append`](Self::append), nodes are shared where possible.
    pub fn prepend(&mut self, other: &IndexedTree<T, K>) -> Result<(), TreeError> {
        self.splice(other, Side::Left)
    }

    fn splice(&mut self, other: &IndexedTree<T, K>, side: Side) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        if other.core.sparse && !self.core.sparse {
            return Err(TreeError::NotSparse);
        }

        let m = other.len();
        self.check_growth(m as u64)?;
        let sub = match &other.core.root {
            Some(r) if m > 0 => Rc::clone(r),
            _ => return Ok(()),
        };

        let index = match side {
            Side::Right => self.len(),
            Side::Left => 0,
        };
        let items: Vec<T> = match self.listeners.is_empty() || other.core.sparse {
            true => Vec::new(),
            false => other.iter().cloned().collect(),
        };
        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Add,
            index,
            size_change: m as i64,
            new_items: &items,
        })?;

        let shareable = self.core.limits == other.core.limits
            && self.core.sparse == other.core.sparse
            && m > self.core.leaf_max() as u32;

        if shareable {
            tracing::trace!(side = ?side, len = m, "splicing whole subtree");
            // `other` may share nodes with this tree, and observers can't tell two links to the
            // same node apart.
            let sub = match self.observer.is_some() {
                true => deep_copy(&sub),
                false => sub,
            };
            self.mutate(true, |core, ctx| core.splice(sub, other.core.height, side, ctx))
        } else {
            self.mutate(true, |core, ctx| match other.core.sparse {
                false => core.insert_range(index, other.iter().cloned(), ctx),
                true => {
                    core.insert_space(index, m, ctx);
                    for (i, item) in other.sparse_iter() {
                        core.set(index + i, item.clone(), ctx);
                    }
                }
            })
        }
    }

    /// Returns a new tree containing the indexes `start .. start + n`, leaving this tree unchanged
    ///
    /// Subtrees entirely within the section are shared with this tree rather than copied.
    pub fn copy_section(&self, start: u32, n: u32) -> Result<IndexedTree<T, K>, TreeError> {
        self.check_range(start, n)?;
        let mut out = IndexedTree::with_parts(self.core.limits, self.core.sparse, self.order.clone());

        let root = match &self.core.root {
            Some(r) if n > 0 => r,
            _ => return Ok(out),
        };

        let mut node = copy_range(root, start, n, self.order.as_ref());
        let mut height = self.core.height;
        while let Some(only) = node.as_inner().filter(|n| n.entries.len() == 1) {
            let child = Rc::clone(&only.entries[0].node);
            node = child;
            height -= 1;
        }

        tracing::trace!(start, n, height, "copied section");
        out.core.root = Some(node);
        out.core.count = n;
        out.core.height = height;
        Ok(out)
    }

    /// Removes the indexes `start .. start + n`, returning them as a new tree
    pub fn remove_section(&mut self, start: u32, n: u32) -> Result<IndexedTree<T, K>, TreeError> {
        self.mode.get().check_mutable()?;
        let section = self.copy_section(start, n)?;
        self.remove_range(start, n)?;
        Ok(section)
    }
}

impl<T: Clone, K: Clone> Core<T, K> {
    /// Links the tree rooted at `sub` (of height `sub_height`) onto one side of this tree
    fn splice(&mut self, sub: NodeRef<T, K>, sub_height: u8, side: Side, ctx: &mut Ctx<T, K>) {
        let sub_total = sub.total_count();
        let old_root = match self.root.take() {
            Some(r) => r,
            None => {
                ctx.notify.root_changed(Some(&sub), false);
                ctx.notify.add_all(&sub);
                self.root = Some(sub);
                self.height = sub_height;
                self.count = sub_total;
                return;
            }
        };

        if self.height > sub_height {
            let depth = self.height - sub_height - 1;
            let root = auto_clone(self.root.insert(old_root), None, ctx);
            if let Some(right) = root.splice_edge(sub, depth, side, ctx) {
                self.grow(right, ctx);
            }
        } else if self.height == sub_height {
            ctx.notify.add_all(&sub);
            let (left, right) = match side {
                Side::Right => (old_root, sub),
                Side::Left => (sub, old_root),
            };

            let mut inner = InnerNode::new();
            let left_total = left.total_count();
            let (left_id, right_id) = (left.id(), right.id());
            inner.entries.push(inner.make_entry(0, left, ctx));
            inner.entries.push(inner.make_entry(left_total, right, ctx));

            let root = Rc::new(Node::new(Body::Inner(inner), self.inner_max()));
            ctx.notify.root_changed(Some(&root), false);
            ctx.notify.node_added(left_id, root.id());
            ctx.notify.node_added(right_id, root.id());
            self.root = Some(root);
            self.height += 1;
        } else {
            // The other tree is taller, so our root goes inside a copy of its edge instead. Doing
            // that with notifications would report most of the other tree piece by piece; it's
            // simpler to build it silently and then report the whole thing at once.
            let depth = sub_height - self.height - 1;
            let mut silent = Ctx {
                notify: Notify::silent(),
                order: ctx.order,
            };

            let reported = ctx.notify.is_active().then(|| Rc::clone(&old_root));
            let root = auto_clone(self.root.insert(sub), None, &mut silent);
            let split = root.splice_edge(old_root, depth, side.opposite(), &mut silent);
            self.height = sub_height;
            if let Some(right) = split {
                self.grow(right, &mut silent);
            }

            if let (Some(old), Some(new)) = (reported, &self.root) {
                ctx.notify.remove_all(&old);
                ctx.notify.root_changed(Some(new), false);
                ctx.notify.add_all(new);
            }
        }

        self.count += sub_total;
    }
}

impl<T: Clone, K: Clone> Node<T, K> {
    /// Links `sub` as a new child on the `side` edge of the subtree rooted at this (inner) node,
    /// `depth` levels down. Returns the split-off right half of this node, if it overflowed.
    fn splice_edge(&mut self, sub: NodeRef<T, K>, depth: u8, side: Side, ctx: &mut Ctx<T, K>) -> Option<Self> {
        let (id, max, max_size) = (self.id(), self.max_size(), self.max_size);
        let inner = match self.as_inner_mut() {
            Some(n) if !n.entries.is_empty() => n,
            _ => {
                weak_unreachable!("splicing into a leaf");
                return None;
            }
        };

        if depth == 0 {
            let at = match side {
                Side::Right => inner.entries.len(),
                Side::Left => 0,
            };
            ctx.notify.add_all(&sub);
            inner.link_child(id, at, sub, ctx);
        } else {
            let c = match side {
                Side::Right => inner.entries.len() - 1,
                Side::Left => 0,
            };
            let sub_total = sub.total_count();
            let child = auto_clone(&mut inner.entries[c].node, Some(id), ctx);
            let split = child.splice_edge(sub, depth - 1, side, ctx);

            inner.add_to_bases_after(c, sub_total);
            inner.refresh_key(c, ctx);
            if let Some(right) = split {
                inner.handle_child_split(id, c, right, ctx);
            }
        }

        inner
            .split_if_overfull(id, max, ctx)
            .map(|right| Node::new(Body::Inner(right), max_size))
    }
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Produces a node covering `start .. start + n` of `node`, sharing every child that's entirely
/// within the range
fn copy_range<T: Clone, K: Clone>(
    node: &NodeRef<T, K>,
    start: u32,
    n: u32,
    order: Option<&KeyOrder<T, K>>,
) -> NodeRef<T, K> {
    if start == 0 && n == node.total_count() {
        return Rc::clone(node);
    }

    let end = start + n;
    let body = match &node.body {
        Body::Leaf(l) => Body::Leaf(DenseLeaf::from_vec(
            l.items[start as usize..end as usize].to_vec(),
        )),
        Body::Sparse(s) => {
            let pairs = s
                .pairs
                .iter()
                .filter(|(o, _)| (start..end).contains(o))
                .map(|(o, v)| (o - start, v.clone()))
                .collect();
            Body::Sparse(SparseLeaf::from_parts(pairs, n))
        }
        Body::Inner(inner) => {
            let mut out = InnerNode::new();
            let mut base = 0;
            let first = inner.binary_search_by_offset(start);
            for e in &inner.entries[first..] {
                let (child_start, child_end) = (e.base, e.base + e.node.total_count());
                if child_start >= end {
                    break;
                }
                let (lo, hi) = (start.max(child_start), end.min(child_end));
                if lo >= hi {
                    continue;
                }

                let child = copy_range(&e.node, lo - child_start, hi - lo, order);
                let key = order.and_then(|o| child.highest_key(o));
                out.entries.push(Entry {
                    base,
                    node: child,
                    key,
                });
                base += hi - lo;
            }
            Body::Inner(out)
        }
    };

    Rc::new(Node::new(body, node.max_size))
}
