//! Sparse leaves: a span of indexes, only some of which hold items
//!
//! A sparse leaf stores `(offset, item)` pairs sorted by offset, plus the `total` number of
//! indexes it covers. Indexes without a pair are empty slots. The node's *local* size (which
//! decides splitting and merging) is the number of pairs, so a leaf can span any number of empty
//! indexes without growing.
//!
//! When pairs move between siblings, the empty space between them has to go somewhere. The rule
//! here is that the space before the first moved pair (or after the last, when moving leftwards)
//! goes with the pairs, *unless* every pair is moved -- in which case all of the source's space
//! goes too, leaving it with a `total` of zero.

use super::node::NodeId;
use super::Ctx;

#[derive(Clone)]
pub(crate) struct SparseLeaf<T> {
    pub(super) pairs: Vec<(u32, T)>,
    total: u32,
}

impl<T> SparseLeaf<T> {
    pub(super) fn new() -> Self {
        SparseLeaf {
            pairs: Vec::new(),
            total: 0,
        }
    }

    pub(super) fn from_parts(pairs: Vec<(u32, T)>, total: u32) -> Self {
        weak_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        weak_assert!(pairs.last().map(|p| p.0 < total).unwrap_or(true));
        SparseLeaf { pairs, total }
    }

    pub(super) fn len(&self) -> usize {
        self.pairs.len()
    }

    pub(super) fn total(&self) -> u32 {
        self.total
    }

    /// Position of the first pair at or after `offset`
    pub(super) fn lower_bound(&self, offset: u32) -> usize {
        self.pairs.partition_point(|(o, _)| *o < offset)
    }

    pub(super) fn get(&self, offset: u32) -> Option<&T> {
        self.pairs
            .binary_search_by_key(&offset, |(o, _)| *o)
            .ok()
            .map(|p| &self.pairs[p].1)
    }

    /// The first item strictly after `after` (or the first item at all, given `None`)
    pub(super) fn next_higher(&self, after: Option<u32>) -> Option<(u32, &T)> {
        let p = match after {
            None => 0,
            Some(a) => self.pairs.partition_point(|(o, _)| *o <= a),
        };
        self.pairs.get(p).map(|(o, v)| (*o, v))
    }

    /// The last item strictly before `before` (or the last item at all, given `None`)
    pub(super) fn next_lower(&self, before: Option<u32>) -> Option<(u32, &T)> {
        let p = match before {
            None => self.pairs.len(),
            Some(b) => self.lower_bound(b),
        };
        p.checked_sub(1)
            .and_then(|p| self.pairs.get(p))
            .map(|(o, v)| (*o, v))
    }

    /// Adds `n` empty slots at `offset`, shifting everything after it
    ///
    /// Only the span grows, so this never requires a split.
    pub(super) fn insert_space(&mut self, offset: u32, n: u32) {
        let p = self.lower_bound(offset);
        for (o, _) in &mut self.pairs[p..] {
            *o += n;
        }
        self.total += n;
    }
}

impl<T: Clone> SparseLeaf<T> {
    /// Sets the slot at `offset`, returning the previous item (if the slot wasn't empty) and the
    /// split-off right half of the leaf (if filling an empty slot made it overflow)
    pub(super) fn set<K>(
        &mut self,
        id: NodeId,
        max: usize,
        offset: u32,
        item: T,
        ctx: &mut Ctx<T, K>,
    ) -> (Option<T>, Option<Self>) {
        match self.pairs.binary_search_by_key(&offset, |(o, _)| *o) {
            Ok(p) => {
                ctx.notify.item_removed(&self.pairs[p].1, id);
                ctx.notify.item_added(&item, id);
                let old = std::mem::replace(&mut self.pairs[p].1, item);
                (Some(old), None)
            }
            Err(p) => {
                ctx.notify.item_added(&item, id);
                self.pairs.insert(p, (offset, item));
                (None, self.split_if_overfull(id, max, false, ctx))
            }
        }
    }

    /// Inserts an item at `offset`, shifting everything after it
    pub(super) fn insert<K>(
        &mut self,
        id: NodeId,
        max: usize,
        offset: u32,
        item: T,
        ctx: &mut Ctx<T, K>,
    ) -> Option<Self> {
        let appended = offset == self.total;
        self.insert_space(offset, 1);

        ctx.notify.item_added(&item, id);
        let p = self.lower_bound(offset);
        self.pairs.insert(p, (offset, item));

        self.split_if_overfull(id, max, appended, ctx)
    }

    /// Inserts consecutive items from `src` at `offset`, as many as will fit. Returns the number
    /// inserted and the split-off right half, if any.
    pub(super) fn insert_from<K, I: Iterator<Item = T>>(
        &mut self,
        id: NodeId,
        max: usize,
        offset: u32,
        src: &mut I,
        ctx: &mut Ctx<T, K>,
    ) -> (u32, Option<Self>) {
        let free = max.saturating_sub(self.pairs.len());
        if free == 0 {
            return match src.next() {
                Some(item) => (1, self.insert(id, max, offset, item, ctx)),
                None => (0, None),
            };
        }

        let p = self.lower_bound(offset);
        let mut tail = self.pairs.split_off(p);
        let mut n = 0;
        for item in src.by_ref().take(free) {
            ctx.notify.item_added(&item, id);
            self.pairs.push((offset + n, item));
            n += 1;
        }
        for (o, _) in &mut tail {
            *o += n;
        }
        self.pairs.append(&mut tail);
        self.total += n;
        (n, None)
    }

    /// Removes the indexes `offset .. offset + n` entirely, along with any items in them
    pub(super) fn remove_range<K>(&mut self, id: NodeId, offset: u32, n: u32, ctx: &mut Ctx<T, K>) {
        weak_assert!(offset + n <= self.total);
        let end = self.clear_space(id, offset, n, ctx);
        for (o, _) in &mut self.pairs[end..] {
            *o -= n;
        }
        self.total -= n;
    }

    /// Removes the items in `offset .. offset + n`, leaving the span unchanged. Returns the
    /// position of the first pair after the cleared range.
    pub(super) fn clear_space<K>(
        &mut self,
        id: NodeId,
        offset: u32,
        n: u32,
        ctx: &mut Ctx<T, K>,
    ) -> usize {
        let start = self.lower_bound(offset);
        let end = self.lower_bound(offset + n);
        if ctx.notify.is_active() {
            for (_, item) in &self.pairs[start..end] {
                ctx.notify.item_removed(item, id);
            }
        }
        self.pairs.drain(start..end);
        start
    }

    fn split_if_overfull<K>(
        &mut self,
        id: NodeId,
        max: usize,
        appended: bool,
        ctx: &mut Ctx<T, K>,
    ) -> Option<Self> {
        if self.pairs.len() <= max {
            return None;
        }

        let at = match appended {
            true => max,
            false => self.pairs.len() / 2,
        };
        Some(self.split_off(id, at, ctx))
    }

    /// Moves the pairs from position `at` onwards into a new leaf. The boundary between the two
    /// halves is the offset of the first moved pair.
    pub(super) fn split_off<K>(&mut self, id: NodeId, at: usize, ctx: &mut Ctx<T, K>) -> Self {
        let boundary = self.pairs[at].0;
        let mut moved = self.pairs.split_off(at);
        for (o, item) in &mut moved {
            ctx.notify.item_removed(item, id);
            *o -= boundary;
        }

        let right = SparseLeaf {
            pairs: moved,
            total: self.total - boundary,
        };
        self.total = boundary;
        right
    }

    /// Moves the first `n` pairs of `right` onto the end of `self`, returning the number moved
    pub(super) fn take_from_right<K>(
        &mut self,
        id: NodeId,
        max: usize,
        right: &mut Self,
        right_id: NodeId,
        n: usize,
        ctx: &mut Ctx<T, K>,
    ) -> usize {
        let n = n.min(right.pairs.len()).min(max.saturating_sub(self.pairs.len()));
        let boundary = right.pairs.get(n).map(|(o, _)| *o).unwrap_or(right.total);

        let shift = self.total;
        for (o, item) in right.pairs.drain(..n) {
            ctx.notify.item_removed(&item, right_id);
            ctx.notify.item_added(&item, id);
            self.pairs.push((o + shift, item));
        }
        for (o, _) in &mut right.pairs {
            *o -= boundary;
        }
        self.total += boundary;
        right.total -= boundary;
        n
    }

    /// Moves the last `n` pairs of `left` onto the start of `self`, returning the number moved
    pub(super) fn take_from_left<K>(
        &mut self,
        id: NodeId,
        max: usize,
        left: &mut Self,
        left_id: NodeId,
        n: usize,
        ctx: &mut Ctx<T, K>,
    ) -> usize {
        let n = n.min(left.pairs.len()).min(max.saturating_sub(self.pairs.len()));
        let start = left.pairs.len() - n;
        let boundary = match start {
            0 => 0,
            s => left.pairs[s].0,
        };
        let moved_span = left.total - boundary;

        let mut moved: Vec<(u32, T)> = left.pairs.drain(start..).collect();
        for (o, item) in &mut moved {
            ctx.notify.item_removed(item, left_id);
            ctx.notify.item_added(item, id);
            *o -= boundary;
        }
        for (o, _) in &mut self.pairs {
            *o += moved_span;
        }
        self.pairs.splice(0..0, moved);
        self.total += moved_span;
        left.total = boundary;
        n
    }
}
