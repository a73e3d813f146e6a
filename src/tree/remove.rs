//! Removal of ranges, and the shrinking of the tree

use super::cow::auto_clone;
use super::inner::InnerNode;
use super::node::{Body, Node, NodeId};
use super::{Core, Ctx};

/// What to do with a range of indexes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum RangeOp {
    /// Remove the indexes entirely, shifting everything after them
    Remove,
    /// Remove only the items, leaving empty space behind (sparse trees only)
    Clear,
}

impl<T: Clone, K: Clone> Core<T, K> {
    pub(super) fn remove_range(&mut self, index: u32, n: u32, op: RangeOp, ctx: &mut Ctx<T, K>) {
        let root = match self.root.as_mut() {
            Some(r) => auto_clone(r, None, ctx),
            None => return,
        };
        root.remove_range(index, n, op, ctx);
        if op == RangeOp::Remove {
            self.count -= n;
        }
        self.fix_root(ctx);
    }

    /// Removes single-child inner nodes from the top of the tree, and the root itself if it's
    /// empty
    pub(super) fn fix_root(&mut self, ctx: &mut Ctx<T, K>) {
        while let Some(root) = &self.root {
            match &root.body {
                Body::Inner(inner) if inner.entries.len() == 1 => {
                    let child = inner.entries[0].node.clone();
                    ctx.notify.node_removed(child.id(), root.id());
                    ctx.notify.root_changed(Some(&child), false);
                    tracing::trace!(height = self.height - 1, "root collapsed");
                    self.root = Some(child);
                    self.height -= 1;
                }
                _ if root.total_count() == 0 && root.local_count() == 0 => {
                    ctx.notify.root_changed(None, false);
                    self.root = None;
                    self.height = 0;
                }
                _ => break,
            }
        }
    }

    pub(super) fn clear(&mut self, ctx: &mut Ctx<T, K>) {
        self.root = None;
        self.count = 0;
        self.height = 0;
        ctx.notify.root_changed(None, true);
    }
}

impl<T: Clone, K: Clone> Node<T, K> {
    /// Removes (or clears) the indexes `index .. index + n`, returning whether this node is
    /// undersized afterwards
    pub(super) fn remove_range(&mut self, index: u32, n: u32, op: RangeOp, ctx: &mut Ctx<T, K>) -> bool {
        let (id, max) = (self.id(), self.max_size());
        match (&mut self.body, op) {
            (Body::Leaf(l), RangeOp::Remove) => l.remove_range(id, index, n, ctx),
            (Body::Leaf(_), RangeOp::Clear) => weak_unreachable!("dense leaves have no empty space"),
            (Body::Sparse(s), RangeOp::Remove) => s.remove_range(id, index, n, ctx),
            (Body::Sparse(s), RangeOp::Clear) => {
                s.clear_space(id, index, n, ctx);
            }
            (Body::Inner(inner), op) => inner.remove_range(id, max, index, n, op, ctx),
        }
        self.is_undersized()
    }
}

impl<T: Clone, K: Clone> InnerNode<T, K> {
    fn remove_range(
        &mut self,
        id: NodeId,
        max: usize,
        mut index: u32,
        mut n: u32,
        op: RangeOp,
        ctx: &mut Ctx<T, K>,
    ) {
        while n > 0 && !self.entries.is_empty() {
            // The children shift around as we go, so the position is re-derived on each pass.
            let c = self.binary_search_by_offset(index);
            let entry = &self.entries[c];
            let offset = index - entry.base;
            let child_total = entry.node.total_count();
            let k = n.min(child_total.saturating_sub(offset));
            if k == 0 {
                weak_unreachable!("range extends past the end of the node");
                break;
            }

            if op == RangeOp::Remove && offset == 0 && k == child_total {
                ctx.notify.remove_all(&self.entries[c].node);
                self.unlink_child(id, c, ctx);
            } else {
                let child = auto_clone(&mut self.entries[c].node, Some(id), ctx);
                let undersized = child.remove_range(offset, k, op, ctx);
                if op == RangeOp::Remove {
                    self.sub_from_bases_after(c, k);
                }
                self.refresh_key(c, ctx);
                if undersized {
                    self.handle_undersized(id, max, c, ctx);
                }
            }

            n -= k;
            if op == RangeOp::Clear {
                index += k;
            }
        }
    }
}
