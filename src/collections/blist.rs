//! Wrapper module for [`BList`]

use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};

use super::{clone_key, to_index};
use crate::error::TreeError;
use crate::observer::SharedObserver;
use crate::param::NodeLimits;
use crate::tree::{IndexedTree, Iter, KeyOrder, OnEqual};

/// A list that keeps its items in sorted order
///
/// Equal items are kept in the order they were added. Lookups are O(log n), and only ever look at
/// a single leaf, because every inner node caches the highest item beneath each of its children.
///
/// ```
/// use hyperion::BList;
///
/// let mut list = BList::new();
/// for x in [5, 1, 4, 1, 3] {
///     list.add(x).unwrap();
/// }
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 1, 3, 4, 5]);
/// assert_eq!(list.lower_bound(&4), 3);
/// assert_eq!(list.index_of(&2), None);
/// ```
pub struct BList<T> {
    tree: IndexedTree<T, T>,
}

impl<T: Clone + Ord> BList<T> {
    pub fn new() -> Self {
        Self::with_limits(NodeLimits::default())
    }

    pub fn with_limits(limits: NodeLimits) -> Self {
        BList {
            tree: IndexedTree::new_sorted(limits, KeyOrder::new(clone_key::<T>)),
        }
    }
}

impl<T: Clone> BList<T> {
    /// Creates a list ordered by `compare`, which must be a total order
    pub fn with_comparer(compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self::with_limits_and_comparer(NodeLimits::default(), compare)
    }

    pub fn with_limits_and_comparer(
        limits: NodeLimits,
        compare: impl Fn(&T, &T) -> Ordering + 'static,
    ) -> Self {
        let order = KeyOrder::with_comparer(clone_key::<T>, compare);
        BList {
            tree: IndexedTree::new_sorted(limits, order),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.tree.get(u32::try_from(index).ok()?)
    }

    pub fn first(&self) -> Option<&T> {
        self.tree.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.tree.last()
    }

    pub fn iter(&self) -> Iter<'_, T, T> {
        self.tree.iter()
    }

    fn search(&self, item: &T, lower_bound: bool) -> (usize, bool) {
        match self.tree.find_by_key(item, lower_bound) {
            Ok((i, found)) => (i as usize, found),
            Err(_) => {
                weak_unreachable!("BList without a key order");
                (0, false)
            }
        }
    }

    /// Returns the position of the first item that isn't less than `item`, or the length of the
    /// list if there is none
    pub fn lower_bound(&self, item: &T) -> usize {
        self.search(item, true).0
    }

    /// Returns the position of the first item greater than `item`, or the length of the list if
    /// there is none
    pub fn upper_bound(&self, item: &T) -> usize {
        self.search(item, false).0
    }

    /// Returns the position of the first item equal to `item`
    pub fn index_of(&self, item: &T) -> Option<usize> {
        match self.search(item, true) {
            (i, true) => Some(i),
            (_, false) => None,
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.search(item, true).1
    }

    /// Adds `item` after any equal items already in the list, returning its position
    pub fn add(&mut self, item: T) -> Result<usize, TreeError> {
        let (i, _) = self.tree.insert_sorted(item, OnEqual::InsertAfter)?;
        Ok(i as usize)
    }

    /// Removes the first item equal to `item`, returning whether there was one
    pub fn remove(&mut self, item: &T) -> Result<bool, TreeError> {
        match self.search(item, true) {
            (i, true) => {
                self.tree.remove_range(to_index(i, self.tree.len())?, 1)?;
                Ok(true)
            }
            (_, false) => Ok(false),
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T, TreeError> {
        let len = self.tree.len();
        self.tree
            .remove_at(to_index(index, len)?)?
            .ok_or(TreeError::IndexOutOfBounds {
                index: index as u64,
                len,
            })
    }

    pub fn clear(&mut self) -> Result<(), TreeError> {
        self.tree.clear()
    }

    pub fn freeze(&mut self) {
        self.tree.freeze();
    }

    pub fn observe(&mut self, observer: SharedObserver<T, T>) -> Result<(), TreeError> {
        self.tree.observe(observer)
    }

    pub fn as_tree(&self) -> &IndexedTree<T, T> {
        &self.tree
    }
}

impl<T: Clone + Ord> Default for BList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BList<T> {
    fn clone(&self) -> Self {
        BList {
            tree: self.tree.clone(),
        }
    }
}

impl<T: Debug> Debug for BList<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.tree.iter()).finish()
    }
}

impl<'t, T> IntoIterator for &'t BList<T> {
    type Item = &'t T;
    type IntoIter = Iter<'t, T, T>;

    fn into_iter(self) -> Iter<'t, T, T> {
        self.tree.iter()
    }
}
