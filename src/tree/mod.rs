//! Wrapper module containing the tree itself

use std::cell::Cell;
use std::fmt::{self, Debug, Formatter};

use crate::cursor::Cursor;
use crate::error::{ObserverError, TreeError, Veto};
use crate::observer::{self, Notify, ObserverFailure, ObserverSlot, SharedObserver};
use crate::param::NodeLimits;

pub(crate) mod cow;
mod fix;
mod inner;
mod insert;
mod iter;
mod leaf;
mod node;
mod remove;
mod sorted;
mod splice;
mod sparse;
#[cfg(test)]
mod tests;

pub use cow::FreezeMode;
pub use iter::{Iter, SparseIter};
pub use node::{LeafItems, Node, NodeId};
pub use sorted::{KeyOrder, OnEqual};

use cow::ModeGuard;
use node::NodeRef;
use remove::RangeOp;

/// (*Internal*) Context passed down through every tree operation
pub(crate) struct Ctx<'a, T, K> {
    pub(crate) notify: Notify<'a, T, K>,
    pub(crate) order: Option<&'a KeyOrder<T, K>>,
}

/// The kind of change described by a [`ListChangeInfo`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Remove,
    Replace,
    Clear,
}

/// Description of a change that is about to happen, given to pre-change listeners
#[derive(Debug)]
pub struct ListChangeInfo<'a, T> {
    pub action: ChangeAction,
    /// Index of the first affected element
    pub index: u32,
    /// Change in the length of the tree
    pub size_change: i64,
    /// The incoming items, for additions and replacements. Empty when the change only involves
    /// empty space.
    pub new_items: &'a [T],
}

/// A pre-change listener, registered with [`IndexedTree::on_changing`]
pub type ChangeListener<T> = Box<dyn FnMut(&ListChangeInfo<'_, T>) -> Result<(), Veto>>;

/// An indexable B+ tree, with O(1) cloning and structural change notifications
///
/// Every element has a position in `0 .. len()`, and insertion or removal anywhere in the tree
/// takes O(log n) time. The tree comes in three flavors, picked at construction:
///
/// * Plain lists ([`new`]), which store every element in dense leaves
/// * Sparse lists ([`new_sparse`]), where most indexes may be empty -- these only pay for the
///   indexes that hold an item, and support inserting or clearing runs of empty space
/// * Key-ordered lists ([`new_sorted`]), which additionally cache the highest key of every subtree
///   so that [`find_by_key`] only has to look at one leaf
///
/// ## Cloning
///
/// Cloning is O(1): the clone shares all of its nodes with the original. Shared nodes are never
/// modified; instead, the path to any modified node is copied first (see the [`cow`] module
/// docs). The clone starts out mutable, without any of the original's observers or listeners.
///
/// ## Observers and listeners
///
/// There are two kinds of hooks. Pre-change listeners ([`on_changing`]) are called before each
/// change, with the opportunity to veto it. Observers ([`observe`]) are told about every
/// structural change as it happens, at the level of nodes and items -- see the [`observer`]
/// module for the details.
///
/// [`new`]: Self::new
/// [`new_sparse`]: Self::new_sparse
/// [`new_sorted`]: Self::new_sorted
/// [`find_by_key`]: Self::find_by_key
/// [`on_changing`]: Self::on_changing
/// [`observe`]: Self::observe
/// [`observer`]: crate::observer
pub struct IndexedTree<T, K = ()> {
    core: Core<T, K>,
    order: Option<KeyOrder<T, K>>,
    version: u32,
    mode: Cell<FreezeMode>,
    observer: Option<ObserverSlot<T, K>>,
    listeners: Vec<ChangeListener<T>>,
}

/// (*Internal*) The parts of the tree that the algorithms in this module operate on
struct Core<T, K> {
    root: Option<NodeRef<T, K>>,
    count: u32,
    /// Zero when empty; one when the root is a leaf
    height: u8,
    limits: NodeLimits,
    sparse: bool,
}

impl<T, K> Core<T, K> {
    fn leaf_max(&self) -> u16 {
        self.limits.max_leaf()
    }

    fn inner_max(&self) -> u16 {
        self.limits.max_inner()
    }
}

impl<T, K> Clone for Core<T, K> {
    fn clone(&self) -> Self {
        Core {
            root: self.root.clone(),
            count: self.count,
            height: self.height,
            limits: self.limits,
            sparse: self.sparse,
        }
    }
}

impl<T, K> IndexedTree<T, K> {
    /// Creates a new, empty tree with dense leaves
    pub fn new(limits: NodeLimits) -> Self {
        Self::with_parts(limits, false, None)
    }

    /// Creates a new, empty tree with sparse leaves
    pub fn new_sparse(limits: NodeLimits) -> Self {
        Self::with_parts(limits, true, None)
    }

    /// Creates a new, empty key-ordered tree
    pub fn new_sorted(limits: NodeLimits, order: KeyOrder<T, K>) -> Self {
        Self::with_parts(limits, false, Some(order))
    }

    fn with_parts(limits: NodeLimits, sparse: bool, order: Option<KeyOrder<T, K>>) -> Self {
        IndexedTree {
            core: Core {
                root: None,
                count: 0,
                height: 0,
                limits,
                sparse,
            },
            order,
            version: 0,
            mode: Cell::new(FreezeMode::Mutable),
            observer: None,
            listeners: Vec::new(),
        }
    }

    /// Returns the number of indexes in the tree (for sparse trees, including empty ones)
    pub fn len(&self) -> u32 {
        self.core.count
    }

    pub fn is_empty(&self) -> bool {
        self.core.count == 0
    }

    /// Returns the height of the tree: zero when empty, one if the root is a leaf
    pub fn height(&self) -> u8 {
        self.core.height
    }

    pub fn limits(&self) -> NodeLimits {
        self.core.limits
    }

    /// Returns the structural version of the tree, which changes with every mutation of its
    /// contents (including [`set`](Self::set))
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_sparse(&self) -> bool {
        self.core.sparse
    }

    pub fn key_order(&self) -> Option<&KeyOrder<T, K>> {
        self.order.as_ref()
    }

    pub fn freeze_mode(&self) -> FreezeMode {
        self.mode.get()
    }

    /// Returns whether the tree currently refuses modification, either permanently or because an
    /// operation is in progress
    pub fn is_frozen(&self) -> bool {
        self.mode.get() != FreezeMode::Mutable
    }

    /// Makes the tree permanently read-only
    ///
    /// Clones of a frozen tree are mutable.
    pub fn freeze(&mut self) {
        tracing::debug!(len = self.core.count, "freezing tree");
        self.mode.set(FreezeMode::Frozen);
    }

    /// Returns the root node, if the tree isn't empty
    pub fn root(&self) -> Option<&Node<T, K>> {
        self.core.root.as_deref()
    }

    /// Returns the item at `index`, or `None` if the index is out of bounds (or, for sparse trees,
    /// empty)
    pub fn get(&self, index: u32) -> Option<&T> {
        if index >= self.core.count {
            return None;
        }
        self.root()?.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.next_higher(None).map(|(_, v)| v)
    }

    pub fn last(&self) -> Option<&T> {
        self.next_lower(None).map(|(_, v)| v)
    }

    /// Returns whether the slot at `index` holds an item
    pub fn is_set(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Returns the first item at an index strictly greater than `after` (or the first item at
    /// all, given `None`), along with its index
    pub fn next_higher(&self, after: Option<u32>) -> Option<(u32, &T)> {
        next_higher_in(self.root()?, after)
    }

    /// Returns the last item at an index strictly less than `before` (or the last item at all,
    /// given `None`), along with its index
    pub fn next_lower(&self, before: Option<u32>) -> Option<(u32, &T)> {
        next_lower_in(self.root()?, before)
    }

    /// Searches a key-ordered tree for `key`
    ///
    /// With `lower_bound == true`, returns the index of the first item whose key is `>= key`, or
    /// the length of the tree if there is none. With `lower_bound == false`, returns the index of
    /// the first item whose key is `> key` instead. The boolean reports whether any item has a key
    /// equal to `key`.
    pub fn find_by_key(&self, key: &K, lower_bound: bool) -> Result<(u32, bool), TreeError> {
        let order = self.order.as_ref().ok_or(TreeError::NotSorted)?;
        match self.root() {
            None => Ok((0, false)),
            Some(root) => Ok(sorted::find_by_key(root, key, !lower_bound, order)),
        }
    }

    /// Iterates over every item in the tree, in order
    ///
    /// For sparse trees, empty slots are skipped; use [`sparse_iter`](Self::sparse_iter) to get
    /// the indexes as well.
    pub fn iter(&self) -> Iter<'_, T, K> {
        Iter::new(self.root(), 0, self.core.count)
    }

    /// Iterates over the items from `start` onwards
    pub fn iter_from(&self, start: u32) -> Iter<'_, T, K> {
        Iter::new(self.root(), start, self.core.count)
    }

    /// Iterates over the set slots of the tree, with their indexes
    pub fn sparse_iter(&self) -> SparseIter<'_, T, K> {
        SparseIter::new(self.root())
    }

    /// Returns the notification failures recorded so far, when more than one observer is
    /// attached. (A single observer's failures are only logged.)
    pub fn observer_failures(&self) -> &[ObserverFailure] {
        match &self.observer {
            Some(slot) => slot.failures(),
            None => &[],
        }
    }

    /// Adds a pre-change listener, which is called before every change and may veto it
    ///
    /// The tree is frozen while the listener runs.
    pub fn on_changing(
        &mut self,
        listener: impl FnMut(&ListChangeInfo<'_, T>) -> Result<(), Veto> + 'static,
    ) {
        self.listeners.push(Box::new(listener));
    }

    /// Creates a cursor at `index`, which may be equal to the length of the tree
    pub fn cursor(&self, index: u32) -> Result<Cursor, TreeError> {
        if index > self.core.count {
            return Err(self.out_of_bounds(index as u64));
        }
        Ok(Cursor::new(index, self.version))
    }

    /// Returns the item at the cursor's position
    pub fn cursor_get(&self, cursor: &Cursor) -> Result<Option<&T>, TreeError> {
        self.check_cursor(cursor)?;
        Ok(self.get(cursor.index()))
    }

    /// Moves the cursor by `delta`, returning `false` (and leaving the cursor in place) if the new
    /// position would be out of bounds
    pub fn cursor_move(&self, cursor: &mut Cursor, delta: i64) -> Result<bool, TreeError> {
        self.check_cursor(cursor)?;
        let target = match (cursor.index() as i64).checked_add(delta) {
            Some(t) if (0..=self.core.count as i64).contains(&t) => t,
            _ => return Ok(false),
        };
        cursor.set_index(target as u32);
        Ok(true)
    }

    fn check_cursor(&self, cursor: &Cursor) -> Result<(), TreeError> {
        match cursor.version() == self.version {
            true => Ok(()),
            false => Err(TreeError::ConcurrentModification),
        }
    }

    fn out_of_bounds(&self, index: u64) -> TreeError {
        TreeError::IndexOutOfBounds {
            index,
            len: self.core.count,
        }
    }

    /// Checks that `index .. index + n` lies within the tree
    fn check_range(&self, index: u32, n: u32) -> Result<(), TreeError> {
        let end = index as u64 + n as u64;
        match end <= self.core.count as u64 && index <= self.core.count {
            true => Ok(()),
            false => Err(self.out_of_bounds(end.max(index as u64))),
        }
    }

    fn check_insert_index(&self, index: u32) -> Result<(), TreeError> {
        match index <= self.core.count {
            true => Ok(()),
            false => Err(self.out_of_bounds(index as u64)),
        }
    }

    fn check_growth(&self, n: u64) -> Result<u32, TreeError> {
        u32::try_from(n)
            .ok()
            .filter(|n| self.core.count.checked_add(*n).is_some())
            .ok_or(TreeError::CapacityOverflow)
    }

    fn check_sparse(&self) -> Result<(), TreeError> {
        match self.core.sparse {
            true => Ok(()),
            false => Err(TreeError::NotSparse),
        }
    }

    /// Runs the pre-change listeners, returning the first veto
    fn raise_changing(&mut self, info: &ListChangeInfo<'_, T>) -> Result<(), TreeError> {
        if self.listeners.is_empty() {
            return Ok(());
        }

        let _guard = ModeGuard::enter(&self.mode, FreezeMode::FrozenDuringCallback)?;
        for listener in &mut self.listeners {
            listener(info).map_err(|veto| {
                tracing::debug!(reason = %veto.reason, action = ?info.action, "change vetoed");
                TreeError::Vetoed(veto)
            })?;
        }
        Ok(())
    }

    /// Runs `op` on the tree with the mode set to [`FreezeMode::FrozenDuringMutation`], then
    /// checkpoints the observers
    ///
    /// The version is bumped when `structural` is true.
    fn mutate<R>(
        &mut self,
        structural: bool,
        op: impl FnOnce(&mut Core<T, K>, &mut Ctx<'_, T, K>) -> R,
    ) -> Result<R, TreeError> {
        let _guard = ModeGuard::enter(&self.mode, FreezeMode::FrozenDuringMutation)?;
        let mut ctx = Ctx {
            notify: Notify::new(self.observer.as_mut()),
            order: self.order.as_ref(),
        };

        let result = op(&mut self.core, &mut ctx);
        if structural {
            self.version = self.version.wrapping_add(1);
        }

        ctx.notify.checkpoint()?;
        Ok(result)
    }

    #[cfg(test)]
    fn set_mode(&self, mode: FreezeMode) {
        self.mode.set(mode);
    }
}

impl<T: Clone, K: Clone> IndexedTree<T, K> {
    /// Inserts `item` at its sorted position in a key-ordered tree, returning the index it ended up
    /// at and, with [`OnEqual::Replace`], the item it replaced
    ///
    /// This takes a single descent from the root. Pre-change listeners are told the index before
    /// anything changes, so with listeners attached the position is searched for first.
    pub fn insert_sorted(&mut self, item: T, on_equal: OnEqual) -> Result<(u32, Option<T>), TreeError> {
        self.mode.get().check_mutable()?;
        let order = self.order.as_ref().ok_or(TreeError::NotSorted)?;

        if !self.listeners.is_empty() || self.check_growth(1).is_err() {
            let key = order.key_of(&item);
            let (index, found) = self.find_by_key(&key, on_equal == OnEqual::Replace)?;
            return match (found, on_equal) {
                (true, OnEqual::Replace) => Ok((index, self.set(index, item)?)),
                _ => self.insert(index, item).map(|()| (index, None)),
            };
        }

        self.mutate(true, |core, ctx| core.insert_sorted(item, on_equal, ctx))
    }

    /// Inserts `item` at `index`, shifting everything after it
    pub fn insert(&mut self, index: u32, item: T) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        self.check_insert_index(index)?;
        self.check_growth(1)?;
        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Add,
            index,
            size_change: 1,
            new_items: std::slice::from_ref(&item),
        })?;

        self.mutate(true, |core, ctx| core.insert(index, item, ctx))
    }

    /// Inserts every item from `items` at `index`, in order
    ///
    /// The items are collected before the tree is touched, so that all errors are reported before
    /// any change is made. Inserting `m` items costs about O(m + (m / leaf size) * log n).
    pub fn insert_range(
        &mut self,
        index: u32,
        items: impl IntoIterator<Item = T>,
    ) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        self.check_insert_index(index)?;
        let items: Vec<T> = items.into_iter().collect();
        let n = self.check_growth(items.len() as u64)?;
        if n == 0 {
            return Ok(());
        }

        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Add,
            index,
            size_change: n as i64,
            new_items: &items,
        })?;

        self.mutate(true, |core, ctx| core.insert_range(index, items.into_iter(), ctx))
    }

    /// Removes the `n` indexes starting at `index`
    pub fn remove_range(&mut self, index: u32, n: u32) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        self.check_range(index, n)?;
        if n == 0 {
            return Ok(());
        }

        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Remove,
            index,
            size_change: -(n as i64),
            new_items: &[],
        })?;

        self.mutate(true, |core, ctx| core.remove_range(index, n, RangeOp::Remove, ctx))
    }

    /// Removes the index at `index`, returning the item that was there (if any)
    pub fn remove_at(&mut self, index: u32) -> Result<Option<T>, TreeError> {
        self.check_range(index, 1)?;
        let old = self.get(index).cloned();
        self.remove_range(index, 1)?;
        Ok(old)
    }

    /// Replaces the item at `index`, returning the previous one
    ///
    /// In a sparse tree, setting an empty slot fills it and returns `None`.
    pub fn set(&mut self, index: u32, item: T) -> Result<Option<T>, TreeError> {
        self.mode.get().check_mutable()?;
        self.check_range(index, 1)?;
        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Replace,
            index,
            size_change: 0,
            new_items: std::slice::from_ref(&item),
        })?;

        self.mutate(true, |core, ctx| core.set(index, item, ctx))
    }

    /// Removes everything from the tree
    pub fn clear(&mut self) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Clear,
            index: 0,
            size_change: -(self.core.count as i64),
            new_items: &[],
        })?;

        self.mutate(true, |core, ctx| core.clear(ctx))
    }

    /// Removes everything from the tree, even if a pre-change listener objects
    ///
    /// Unlike every other operation, a veto here is returned *after* the tree has been cleared.
    /// A frozen tree is still left untouched.
    pub fn force_clear(&mut self) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        let vetoed = self
            .raise_changing(&ListChangeInfo {
                action: ChangeAction::Clear,
                index: 0,
                size_change: -(self.core.count as i64),
                new_items: &[],
            })
            .err();

        self.mutate(true, |core, ctx| core.clear(ctx))?;
        match vetoed {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Inserts `n` empty slots at `index` in a sparse tree
    pub fn insert_space(&mut self, index: u32, n: u32) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        self.check_sparse()?;
        self.check_insert_index(index)?;
        self.check_growth(n as u64)?;
        if n == 0 {
            return Ok(());
        }

        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Add,
            index,
            size_change: n as i64,
            new_items: &[],
        })?;

        self.mutate(true, |core, ctx| core.insert_space(index, n, ctx))
    }

    /// Empties the slots `index .. index + n` of a sparse tree, without changing its length
    pub fn clear_space(&mut self, index: u32, n: u32) -> Result<(), TreeError> {
        self.mode.get().check_mutable()?;
        self.check_sparse()?;
        self.check_range(index, n)?;
        if n == 0 {
            return Ok(());
        }

        self.raise_changing(&ListChangeInfo {
            action: ChangeAction::Replace,
            index,
            size_change: 0,
            new_items: &[],
        })?;

        self.mutate(true, |core, ctx| core.remove_range(index, n, RangeOp::Clear, ctx))
    }

    /// Attaches an observer, which is first told about the current contents of the tree
    ///
    /// Fails if the observer refuses to attach (for example, because it's already attached to
    /// another tree) or is currently borrowed.
    pub fn observe(&mut self, observer: SharedObserver<T, K>) -> Result<(), TreeError> {
        if self.observer.is_none() && self.core.unalias() {
            tracing::debug!("copied nodes linked more than once before attaching observer");
        }

        {
            let mut obs = observer
                .try_borrow_mut()
                .map_err(|_| ObserverError::Reentrant)?;
            let populate = obs.attach(self.root())?;
            if let Err(error) = observer::populate(&mut *obs, self.root(), populate) {
                tracing::warn!(%error, "observer failed during population; ignoring");
            }
        }

        tracing::debug!(len = self.core.count, "observer attached");
        self.observer = Some(match self.observer.take() {
            None => ObserverSlot::Single(observer),
            Some(slot) => slot.with(observer),
        });
        Ok(())
    }

    /// Detaches an observer, returning whether it was attached to this tree
    pub fn unobserve(&mut self, observer: &SharedObserver<T, K>) -> bool {
        let found = match self.observer.take() {
            None => false,
            Some(slot) => {
                let (rest, found) = slot.without(observer);
                self.observer = rest;
                found
            }
        };

        if found {
            tracing::debug!("observer detached");
            if let Ok(mut obs) = observer.try_borrow_mut() {
                obs.detach();
            }
        }
        found
    }
}

/// Clones the tree in O(1) time, sharing every node with the original
///
/// The clone is always mutable, and has no observers or listeners.
impl<T, K> Clone for IndexedTree<T, K> {
    fn clone(&self) -> Self {
        tracing::debug!(len = self.core.count, "cloning tree");
        IndexedTree {
            core: self.core.clone(),
            order: self.order.clone(),
            version: 0,
            mode: Cell::new(FreezeMode::Mutable),
            observer: None,
            listeners: Vec::new(),
        }
    }
}

impl<T: Debug, K> Debug for IndexedTree<T, K> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        struct Nodes<'t, T, K>(Option<&'t Node<T, K>>);

        impl<T: Debug, K> Debug for Nodes<'_, T, K> {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                match self.0 {
                    None => f.write_str("<empty>"),
                    Some(root) => write!(f, "\n{root:?}"),
                }
            }
        }

        f.debug_struct("IndexedTree")
            .field("len", &self.core.count)
            .field("height", &self.core.height)
            .field("mode", &self.mode.get())
            .field("nodes", &Nodes(self.root()))
            .finish()
    }
}

fn next_higher_in<T, K>(node: &Node<T, K>, after: Option<u32>) -> Option<(u32, &T)> {
    use node::Body;

    match &node.body {
        Body::Leaf(l) => {
            let start = match after {
                None => 0,
                Some(a) => a.checked_add(1)?,
            };
            l.items.get(start as usize).map(|v| (start, v))
        }
        Body::Sparse(s) => s.next_higher(after),
        Body::Inner(n) => {
            let first = after.map(|a| n.binary_search_by_offset(a)).unwrap_or(0);
            n.entries.iter().skip(first).find_map(|e| {
                let rel = after.and_then(|a| a.checked_sub(e.base));
                next_higher_in(&e.node, rel).map(|(i, v)| (e.base + i, v))
            })
        }
    }
}

fn next_lower_in<T, K>(node: &Node<T, K>, before: Option<u32>) -> Option<(u32, &T)> {
    use node::Body;

    match &node.body {
        Body::Leaf(l) => {
            let end = before.map(|b| b as usize).unwrap_or(usize::MAX).min(l.items.len());
            let i = end.checked_sub(1)?;
            Some((i as u32, &l.items[i]))
        }
        Body::Sparse(s) => s.next_lower(before),
        Body::Inner(n) => {
            let last = match before {
                Some(b) => n.binary_search_by_offset(b),
                None => n.entries.len().checked_sub(1)?,
            };
            n.entries[..=last].iter().rev().find_map(|e| {
                let rel = before.map(|b| b.saturating_sub(e.base));
                next_lower_in(&e.node, rel).map(|(i, v)| (e.base + i, v))
            })
        }
    }
}

////////////////
// Validation //
////////////////

#[cfg(any(test, feature = "fuzz"))]
macro_rules! valid_assert {
    ($path:ident: $cond:expr) => {
        if !$cond {
            panic!(
                concat!("assertion failed: `", stringify!($cond), "` for path {:?}"),
                $path
            );
        }
    };
}

#[cfg(any(test, feature = "fuzz"))]
macro_rules! valid_assert_eq {
    ($path:ident: $lhs:expr, $rhs:expr) => {
        let left = $lhs;
        let right = $rhs;
        if left != right {
            panic!(
                concat!(
                    "assertion failed: `",
                    stringify!($lhs == $rhs),
                    "` for path {:?}:\n",
                    " left: {:?}\n",
                    "right: {:?}",
                ),
                $path, left, right,
            );
        }
    };
}

#[cfg(any(test, feature = "fuzz"))]
impl<T, K: Clone> IndexedTree<T, K> {
    /// (*Test-only*) Validates the tree, panicking if the counts, offsets, or cached keys don't
    /// add up
    ///
    /// This method basically exists for tests so that we can quickly narrow down exactly when a
    /// failure is introduced in a particular test case.
    pub fn validate(&self) {
        let path: Vec<usize> = Vec::new();
        let root = match self.root() {
            Some(r) => r,
            None => {
                valid_assert_eq!(path: self.core.count, 0);
                valid_assert_eq!(path: self.core.height, 0);
                return;
            }
        };

        valid_assert_eq!(path: root.total_count(), self.core.count);
        valid_assert!(path: root.total_count() > 0);
        self.validate_node(root, self.core.height, &mut Vec::new());

        if let Some(order) = &self.order {
            let mut prev: Option<K> = None;
            for (i, item) in self.iter().enumerate() {
                let key = order.key_of(item);
                if let Some(p) = &prev {
                    let path = vec![i];
                    valid_assert!(path: order.compare(p, &key).is_le());
                }
                prev = Some(key);
            }
        }
    }

    fn validate_node(&self, node: &Node<T, K>, height: u8, path: &mut Vec<usize>) {
        use node::Body;

        valid_assert!(path: height >= 1);
        valid_assert!(path: node.local_count() <= node.max_size());

        match &node.body {
            Body::Leaf(_) => {
                valid_assert_eq!(path: height, 1);
                valid_assert!(path: !self.core.sparse);
                valid_assert_eq!(path: node.max_size(), self.core.leaf_max() as usize);
            }
            Body::Sparse(s) => {
                valid_assert_eq!(path: height, 1);
                valid_assert!(path: self.core.sparse);
                valid_assert_eq!(path: node.max_size(), self.core.leaf_max() as usize);
                valid_assert!(path: s.pairs.windows(2).all(|w| w[0].0 < w[1].0));
                valid_assert!(path: s.pairs.last().map(|p| p.0 < s.total()).unwrap_or(true));
            }
            Body::Inner(n) => {
                valid_assert!(path: height > 1);
                valid_assert!(path: !n.entries.is_empty());
                valid_assert_eq!(path: node.max_size(), self.core.inner_max() as usize);

                let mut base = 0;
                for (i, e) in n.entries.iter().enumerate() {
                    path.push(i);
                    valid_assert_eq!(path: e.base, base);
                    base += e.node.total_count();

                    match &self.order {
                        None => valid_assert!(path: e.key.is_none()),
                        Some(order) => {
                            let expected = e.node.highest_key(order);
                            let matches = match (&e.key, &expected) {
                                (None, None) => true,
                                (Some(a), Some(b)) => order.compare(a, b).is_eq(),
                                _ => false,
                            };
                            valid_assert!(path: matches);
                        }
                    }

                    self.validate_node(&e.node, height - 1, path);
                    path.pop();
                }
            }
        }
    }
}
