//! Dense leaves: a plain, bounded list of items

use super::node::NodeId;
use super::Ctx;

#[derive(Clone)]
pub(crate) struct DenseLeaf<T> {
    pub(super) items: Vec<T>,
}

impl<T> DenseLeaf<T> {
    pub(super) fn new() -> Self {
        DenseLeaf { items: Vec::new() }
    }

    pub(super) fn from_vec(items: Vec<T>) -> Self {
        DenseLeaf { items }
    }

    pub(super) fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T: Clone> DenseLeaf<T> {
    /// Replaces the item at `index`, returning the old one
    pub(super) fn set<K>(&mut self, id: NodeId, index: u32, item: T, ctx: &mut Ctx<T, K>) -> T {
        let slot = &mut self.items[index as usize];
        ctx.notify.item_removed(slot, id);
        ctx.notify.item_added(&item, id);
        std::mem::replace(slot, item)
    }

    /// Inserts a single item, returning the right half of the leaf if it had to be split
    ///
    /// Leaves that overflow from an append at their end are split unevenly, keeping the leaf full
    /// and moving only the new item to the right-hand side. This makes building a list by repeated
    /// appends produce full leaves instead of half-full ones.
    pub(super) fn insert<K>(
        &mut self,
        id: NodeId,
        max: usize,
        index: u32,
        item: T,
        ctx: &mut Ctx<T, K>,
    ) -> Option<Self> {
        let index = index as usize;
        let appended = index == self.items.len();

        ctx.notify.item_added(&item, id);
        self.items.insert(index, item);

        if self.items.len() <= max {
            return None;
        }

        let at = match appended {
            true => max,
            false => self.items.len() / 2,
        };
        Some(self.split_off(id, at, ctx))
    }

    /// Inserts as many items from `src` as will fit, starting at `index`, returning the number
    /// inserted and the split-off right half (if any)
    ///
    /// A full leaf still accepts a single item (and splits), so that callers always make progress.
    pub(super) fn insert_from<K, I: Iterator<Item = T>>(
        &mut self,
        id: NodeId,
        max: usize,
        index: u32,
        src: &mut I,
        ctx: &mut Ctx<T, K>,
    ) -> (u32, Option<Self>) {
        let free = max.saturating_sub(self.items.len());
        if free == 0 {
            return match src.next() {
                Some(item) => (1, self.insert(id, max, index, item, ctx)),
                None => (0, None),
            };
        }

        let mut tail = self.items.split_off(index as usize);
        let mut n = 0;
        for item in src.by_ref().take(free) {
            ctx.notify.item_added(&item, id);
            self.items.push(item);
            n += 1;
        }
        self.items.append(&mut tail);
        (n, None)
    }

    /// Removes the items in `index .. index + n`
    pub(super) fn remove_range<K>(&mut self, id: NodeId, index: u32, n: u32, ctx: &mut Ctx<T, K>) {
        let start = index as usize;
        let end = start + n as usize;
        weak_assert!(end <= self.items.len());

        if ctx.notify.is_active() {
            for item in &self.items[start..end] {
                ctx.notify.item_removed(item, id);
            }
        }
        self.items.drain(start..end);
    }

    /// Moves the items from `at` onwards into a new leaf
    pub(super) fn split_off<K>(&mut self, id: NodeId, at: usize, ctx: &mut Ctx<T, K>) -> Self {
        let moved = self.items.split_off(at);
        if ctx.notify.is_active() {
            for item in &moved {
                ctx.notify.item_removed(item, id);
            }
        }
        DenseLeaf { items: moved }
    }

    /// Moves the first `n` items of `right` onto the end of `self`, returning the number moved
    pub(super) fn take_from_right<K>(
        &mut self,
        id: NodeId,
        max: usize,
        right: &mut Self,
        right_id: NodeId,
        n: usize,
        ctx: &mut Ctx<T, K>,
    ) -> usize {
        let n = n.min(right.items.len()).min(max.saturating_sub(self.items.len()));
        for item in right.items.drain(..n) {
            ctx.notify.item_removed(&item, right_id);
            ctx.notify.item_added(&item, id);
            self.items.push(item);
        }
        n
    }

    /// Moves the last `n` items of `left` onto the start of `self`, returning the number moved
    pub(super) fn take_from_left<K>(
        &mut self,
        id: NodeId,
        max: usize,
        left: &mut Self,
        left_id: NodeId,
        n: usize,
        ctx: &mut Ctx<T, K>,
    ) -> usize {
        let n = n.min(left.items.len()).min(max.saturating_sub(self.items.len()));
        let start = left.items.len() - n;
        let moved: Vec<T> = left.items.drain(start..).collect();
        if ctx.notify.is_active() {
            for item in &moved {
                ctx.notify.item_removed(item, left_id);
                ctx.notify.item_added(item, id);
            }
        }
        self.items.splice(0..0, moved);
        n
    }
}
