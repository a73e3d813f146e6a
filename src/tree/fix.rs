//! Common tools for rebalancing the children of an inner node
//!
//! A brief summary of items here:
//!
//! * [`InnerNode::try_shift_to_siblings`] - makes room in a full child before inserting into it,
//!   avoiding a split when a neighbor has spare capacity
//! * [`InnerNode::handle_undersized`] - merges an undersized child into its siblings, or refills it
//!   from them, after a removal
//! * [`Node::take_from`] - the single primitive both of the above are built on, which moves items
//!   (or children) between two adjacent nodes of the same kind
//!
//! The thresholds for "undersized" and the size to refill to are in [`SizePolicy`].

use std::rc::Rc;

use super::cow::auto_clone;
use super::inner::{pair_mut, InnerNode};
use super::node::{Body, Node, NodeId, NodeRef};
use super::Ctx;
use crate::param::SizePolicy;

/// Which neighbor of a node to move things to or from
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum Side {
    Left,
    Right,
}

impl<T: Clone, K: Clone> Node<T, K> {
    /// Moves up to `n` slots into this node from its neighbor `src`, which is on `side` of it.
    /// Returns the number of slots moved.
    ///
    /// Both nodes must be the same kind. The amount moved is limited by the free space in `self`.
    pub(super) fn take_from(&mut self, src: &mut Self, side: Side, n: usize, ctx: &mut Ctx<T, K>) -> usize {
        let (id, max, src_id) = (self.id(), self.max_size(), src.id());
        match (&mut self.body, &mut src.body, side) {
            (Body::Leaf(d), Body::Leaf(s), Side::Right) => d.take_from_right(id, max, s, src_id, n, ctx),
            (Body::Leaf(d), Body::Leaf(s), Side::Left) => d.take_from_left(id, max, s, src_id, n, ctx),
            (Body::Sparse(d), Body::Sparse(s), Side::Right) => d.take_from_right(id, max, s, src_id, n, ctx),
            (Body::Sparse(d), Body::Sparse(s), Side::Left) => d.take_from_left(id, max, s, src_id, n, ctx),
            (Body::Inner(d), Body::Inner(s), Side::Right) => d.take_from_right(id, max, s, src_id, n, ctx),
            (Body::Inner(d), Body::Inner(s), Side::Left) => d.take_from_left(id, max, s, src_id, n, ctx),
            _ => {
                weak_unreachable!("sibling nodes of different kinds");
                0
            }
        }
    }
}

/// Moves up to `n` slots from `src` into `dst`, returning the number moved
///
/// Nothing happens (and zero is returned) if either node is shared.
fn transfer<T: Clone, K: Clone>(
    dst: &mut NodeRef<T, K>,
    src: &mut NodeRef<T, K>,
    src_side: Side,
    n: usize,
    ctx: &mut Ctx<T, K>,
) -> usize {
    let (Some(dst), Some(src)) = (Rc::get_mut(dst), Rc::get_mut(src)) else {
        return 0;
    };
    dst.take_from(src, src_side, n, ctx)
}

impl<T: Clone, K: Clone> InnerNode<T, K> {
    fn local_at(&self, c: Option<usize>) -> usize {
        c.and_then(|c| self.entries.get(c))
            .map(|e| e.node.local_count())
            .unwrap_or(0)
    }

    fn free_at(&self, c: Option<usize>) -> usize {
        c.and_then(|c| self.entries.get(c))
            .map(|e| e.node.free_slots())
            .unwrap_or(0)
    }

    /// Moves up to `n` slots from the child at `from` into its neighbor at `to`, returning the
    /// number moved
    fn shift(&mut self, id: NodeId, from: usize, to: usize, n: usize, ctx: &mut Ctx<T, K>) -> usize {
        weak_assert!(from.abs_diff(to) == 1);

        let (src, dst) = pair_mut(&mut self.entries, from, to);
        auto_clone(&mut src.node, Some(id), ctx);
        auto_clone(&mut dst.node, Some(id), ctx);

        let src_side = match from > to {
            true => Side::Right,
            false => Side::Left,
        };
        let moved = transfer(&mut dst.node, &mut src.node, src_side, n, ctx);

        self.recompute_bases(from.min(to) + 1);
        self.refresh_key(from, ctx);
        self.refresh_key(to, ctx);
        moved
    }

    /// Before inserting into the full child at `c`, tries to move some of its contents into a
    /// neighbor that has room. Returns whether anything moved.
    pub(super) fn try_shift_to_siblings(&mut self, id: NodeId, c: usize, ctx: &mut Ctx<T, K>) -> bool {
        let neighbors = [c.checked_sub(1), Some(c + 1).filter(|&r| r < self.entries.len())];
        for sibling in neighbors.into_iter().flatten() {
            let free = self.free_at(Some(sibling));
            if free >= SizePolicy::SHIFT_MIN_FREE && self.shift(id, c, sibling, free / 2, ctx) > 0 {
                tracing::trace!(from = c, to = sibling, "shifted into sibling to avoid a split");
                return true;
            }
        }
        false
    }

    /// Fixes up the undersized child at `c`: either its contents are spread across its siblings
    /// and it's removed, or it borrows from a sibling
    ///
    /// Returns whether this node (with room for `max` children) is undersized afterwards.
    pub(super) fn handle_undersized(&mut self, id: NodeId, max: usize, c: usize, ctx: &mut Ctx<T, K>) -> bool {
        let child = &self.entries[c].node;
        let local = child.local_count();
        if local == 0 && child.total_count() == 0 {
            self.unlink_child(id, c, ctx);
            return SizePolicy::is_undersized(self.entries.len(), max);
        }

        let n = self.entries.len();
        if n == 1 {
            return SizePolicy::is_undersized(n, max);
        }

        let left = c.checked_sub(1);
        let right = Some(c + 1).filter(|&r| r < n);
        let (left_local, right_local) = (self.local_at(left), self.local_at(right));
        let (left_free, right_free) = (self.free_at(left), self.free_at(right));

        if left_free + right_free >= local {
            // Aim for both siblings ending up the same size, within what each has room for.
            let min_left = local.saturating_sub(right_free);
            let max_left = left_free.min(local);
            let even = (right_local + local).saturating_sub(left_local) / 2;
            let to_left = even.clamp(min_left, max_left);

            // The last move always takes everything that's left, so that any empty space in a
            // sparse child goes with it.
            match (left, right) {
                (Some(l), Some(r)) => {
                    if to_left < local {
                        self.shift(id, c, r, local - to_left, ctx);
                    }
                    self.shift(id, c, l, to_left, ctx);
                }
                (Some(l), None) => {
                    self.shift(id, c, l, local, ctx);
                }
                (None, Some(r)) => {
                    self.shift(id, c, r, local, ctx);
                }
                (None, None) => {}
            }

            let child = &self.entries[c].node;
            weak_assert!(child.local_count() == 0 && child.total_count() == 0);
            tracing::trace!(child = ?child.id(), "merged undersized child into siblings");
            self.unlink_child(id, c, ctx);
        } else {
            let target = SizePolicy::redistribution_target(left_local, right_local, local);
            let mut need = target.saturating_sub(local);
            let order = match left_local >= right_local {
                true => [left, right],
                false => [right, left],
            };

            for sibling in order.into_iter().flatten() {
                if need == 0 {
                    break;
                }
                let spare = self.local_at(Some(sibling)).saturating_sub(target);
                let k = spare.min(need);
                if k > 0 {
                    need -= self.shift(id, sibling, c, k, ctx).min(need);
                }
            }
            tracing::trace!(target, "refilled undersized child from siblings");
        }

        SizePolicy::is_undersized(self.entries.len(), max)
    }
}
