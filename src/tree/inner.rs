//! Inner nodes: bounded lists of children, indexed by offset (and optionally by key)

use std::cmp::Ordering;
use std::rc::Rc;

use super::node::{NodeId, NodeRef};
use super::sorted::KeyOrder;
use super::Ctx;

/// A single child of an [`InnerNode`]
pub(crate) struct Entry<T, K> {
    /// Offset of the child's first index, relative to the start of the parent
    pub(super) base: u32,
    pub(super) node: NodeRef<T, K>,
    /// Cached highest key in the child; always `None` in trees without a key order
    pub(super) key: Option<K>,
}

impl<T, K: Clone> Clone for Entry<T, K> {
    fn clone(&self) -> Self {
        Entry {
            base: self.base,
            node: Rc::clone(&self.node),
            key: self.key.clone(),
        }
    }
}

pub(crate) struct InnerNode<T, K> {
    pub(super) entries: Vec<Entry<T, K>>,
}

impl<T, K: Clone> Clone for InnerNode<T, K> {
    fn clone(&self) -> Self {
        InnerNode {
            entries: self.entries.clone(),
        }
    }
}

impl<T, K> InnerNode<T, K> {
    pub(super) fn new() -> Self {
        InnerNode {
            entries: Vec::new(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn total(&self) -> u32 {
        match self.entries.last() {
            Some(e) => e.base + e.node.total_count(),
            None => 0,
        }
    }

    /// Returns the position of the child containing `index`: the last child whose base is
    /// `<= index`
    ///
    /// An `index` equal to the total count of the node gives the last child.
    pub(super) fn binary_search_by_offset(&self, index: u32) -> usize {
        let entries = &self.entries;
        let n = entries.len();
        if n <= 1 {
            return 0;
        }

        // The step halves each time round, starting from the largest power of two below `n`. The
        // first entry always has a base of zero, so `i` starts as a valid answer.
        let mut i = 0;
        let mut step = n.next_power_of_two() >> 1;
        while step > 0 {
            let next = i + step;
            if next < n && entries[next].base <= index {
                i = next;
            }
            step >>= 1;
        }
        i
    }

    /// Returns the position of the first child whose highest key is `>= key` (or `> key`, if
    /// `upper` is true). If there is no such child, returns the last one.
    pub(super) fn binary_search_by_key(&self, key: &K, upper: bool, order: &KeyOrder<T, K>) -> usize {
        let p = self.entries.partition_point(|e| match &e.key {
            None => true,
            Some(k) => match order.compare(k, key) {
                Ordering::Less => true,
                Ordering::Equal => upper,
                Ordering::Greater => false,
            },
        });
        p.min(self.entries.len().saturating_sub(1))
    }

    /// Resets the base offsets of every entry from `from` onwards, using the totals of the entries
    /// before them
    pub(super) fn recompute_bases(&mut self, from: usize) {
        let mut base = match from {
            0 => 0,
            f => match self.entries.get(f - 1) {
                Some(prev) => prev.base + prev.node.total_count(),
                None => return,
            },
        };

        for e in self.entries.iter_mut().skip(from) {
            e.base = base;
            base += e.node.total_count();
        }
    }

    pub(super) fn add_to_bases_after(&mut self, c: usize, n: u32) {
        for e in self.entries.iter_mut().skip(c + 1) {
            e.base += n;
        }
    }

    pub(super) fn sub_from_bases_after(&mut self, c: usize, n: u32) {
        for e in self.entries.iter_mut().skip(c + 1) {
            e.base -= n;
        }
    }
}

impl<T, K: Clone> InnerNode<T, K> {
    /// Recomputes the cached highest key for the entry at `c`, if the tree is key-ordered
    pub(super) fn refresh_key(&mut self, c: usize, ctx: &Ctx<T, K>) {
        if let (Some(order), Some(e)) = (ctx.order, self.entries.get_mut(c)) {
            e.key = e.node.highest_key(order);
        }
    }

    pub(super) fn make_entry(&self, base: u32, node: NodeRef<T, K>, ctx: &Ctx<T, K>) -> Entry<T, K> {
        let key = ctx.order.and_then(|o| node.highest_key(o));
        Entry { base, node, key }
    }

    /// Links `node` as a new child at position `at`, resetting the bases of the children from `at`
    /// onwards
    ///
    /// The contents of `node` are *not* reported to observers; only its link to this node.
    pub(super) fn link_child(&mut self, id: NodeId, at: usize, node: NodeRef<T, K>, ctx: &mut Ctx<T, K>) {
        ctx.notify.node_added(node.id(), id);
        let entry = self.make_entry(0, node, ctx);
        self.entries.insert(at, entry);
        self.recompute_bases(at);
    }

    /// Unlinks the child at position `c`, shifting the bases of the children after it
    ///
    /// Like [`link_child`](Self::link_child), only the link itself is reported to observers.
    pub(super) fn unlink_child(&mut self, id: NodeId, c: usize, ctx: &mut Ctx<T, K>) -> NodeRef<T, K> {
        let entry = self.entries.remove(c);
        ctx.notify.node_removed(entry.node.id(), id);
        self.recompute_bases(c);
        entry.node
    }

    /// Moves the entries from position `at` onwards into a new inner node
    pub(super) fn split_off(&mut self, id: NodeId, at: usize, ctx: &mut Ctx<T, K>) -> Self {
        let mut moved = self.entries.split_off(at);
        let boundary = moved.first().map(|e| e.base).unwrap_or(0);
        for e in &mut moved {
            ctx.notify.node_removed(e.node.id(), id);
            e.base -= boundary;
        }
        InnerNode { entries: moved }
    }

    /// Moves the first `n` children of `right` onto the end of `self`, returning the number moved
    pub(super) fn take_from_right(
        &mut self,
        id: NodeId,
        max: usize,
        right: &mut Self,
        right_id: NodeId,
        n: usize,
        ctx: &mut Ctx<T, K>,
    ) -> usize {
        let n = n.min(right.entries.len()).min(max.saturating_sub(self.entries.len()));
        let start = self.entries.len();
        for e in right.entries.drain(..n) {
            ctx.notify.node_removed(e.node.id(), right_id);
            ctx.notify.node_added(e.node.id(), id);
            self.entries.push(e);
        }
        self.recompute_bases(start);
        right.recompute_bases(0);
        n
    }

    /// Moves the last `n` children of `left` onto the start of `self`, returning the number moved
    pub(super) fn take_from_left(
        &mut self,
        id: NodeId,
        max: usize,
        left: &mut Self,
        left_id: NodeId,
        n: usize,
        ctx: &mut Ctx<T, K>,
    ) -> usize {
        let n = n.min(left.entries.len()).min(max.saturating_sub(self.entries.len()));
        let start = left.entries.len() - n;
        let moved: Vec<_> = left.entries.drain(start..).collect();
        for e in &moved {
            ctx.notify.node_removed(e.node.id(), left_id);
            ctx.notify.node_added(e.node.id(), id);
        }
        self.entries.splice(0..0, moved);
        self.recompute_bases(0);
        n
    }
}

/// Returns mutable references to two distinct entries
pub(super) fn pair_mut<T, K>(
    entries: &mut [Entry<T, K>],
    a: usize,
    b: usize,
) -> (&mut Entry<T, K>, &mut Entry<T, K>) {
    weak_assert!(a != b);
    if a < b {
        let (lo, hi) = entries.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = entries.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
