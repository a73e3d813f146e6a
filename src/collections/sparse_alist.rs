//! Wrapper module for [`SparseAList`]

use std::fmt::{self, Debug, Formatter};
use std::ops::Range;

use super::{to_index, to_span};
use crate::error::TreeError;
use crate::observer::SharedObserver;
use crate::param::NodeLimits;
use crate::tree::IndexedTree;

/// A list where any index may be empty, storing only the indexes that hold an item
///
/// Runs of empty space cost nothing: inserting a million empty slots is a single O(log n)
/// operation, and leaves only ever store the items that are actually set.
///
/// ```
/// use hyperion::SparseAList;
///
/// let mut list = SparseAList::new();
/// list.insert_space(0, 1_000_000).unwrap();
/// list.set(500, 'x').unwrap();
/// list.set(900_000, 'y').unwrap();
///
/// let mut at = Some(500);
/// assert_eq!(list.next_higher_item(&mut at), Some(&'y'));
/// assert_eq!(at, Some(900_000));
/// assert_eq!(list.next_higher_item(&mut at), None);
/// assert_eq!(at, None);
/// ```
pub struct SparseAList<T> {
    tree: IndexedTree<T>,
}

impl<T> SparseAList<T> {
    pub fn new() -> Self {
        Self::with_limits(NodeLimits::default())
    }

    pub fn with_limits(limits: NodeLimits) -> Self {
        SparseAList {
            tree: IndexedTree::new_sparse(limits),
        }
    }

    /// Returns the number of indexes in the list, set or not
    pub fn len(&self) -> usize {
        self.tree.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the item at `index`, or `None` if the slot is empty or out of bounds
    pub fn get(&self, index: usize) -> Option<&T> {
        self.tree.get(u32::try_from(index).ok()?)
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Finds the first item after `*index` (or the first item at all, if it's `None`), moving
    /// `*index` to its position. When there is no such item, `*index` becomes `None`.
    pub fn next_higher_item(&self, index: &mut Option<usize>) -> Option<&T> {
        let after = match *index {
            None => None,
            Some(i) => match u32::try_from(i) {
                Ok(i) => Some(i),
                Err(_) => {
                    *index = None;
                    return None;
                }
            },
        };

        let found = self.tree.next_higher(after);
        *index = found.map(|(i, _)| i as usize);
        found.map(|(_, v)| v)
    }

    /// Finds the last item before `*index` (or the last item at all, if it's `None`), moving
    /// `*index` to its position. When there is no such item, `*index` becomes `None`.
    pub fn next_lower_item(&self, index: &mut Option<usize>) -> Option<&T> {
        let before = index.map(|i| u32::try_from(i).unwrap_or(u32::MAX));
        let found = self.tree.next_lower(before);
        *index = found.map(|(i, _)| i as usize);
        found.map(|(_, v)| v)
    }

    /// Iterates over the set slots, with their indexes
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.tree.sparse_iter().map(|(i, v)| (i as usize, v))
    }

    /// Returns the number of set slots. This is O(n).
    pub fn count_set(&self) -> usize {
        self.tree.iter().count()
    }

    pub fn freeze(&mut self) {
        self.tree.freeze();
    }

    pub fn as_tree(&self) -> &IndexedTree<T> {
        &self.tree
    }
}

impl<T: Clone> SparseAList<T> {
    /// Fills (or replaces) the slot at `index`, returning what was there
    pub fn set(&mut self, index: usize, item: T) -> Result<Option<T>, TreeError> {
        let index = to_index(index, self.tree.len())?;
        self.tree.set(index, item)
    }

    /// Inserts a set slot at `index`, shifting everything after it
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), TreeError> {
        let index = to_index(index, self.tree.len())?;
        self.tree.insert(index, item)
    }

    pub fn push(&mut self, item: T) -> Result<(), TreeError> {
        self.tree.insert(self.tree.len(), item)
    }

    /// Inserts `n` empty slots at `index`, shifting everything after them
    pub fn insert_space(&mut self, index: usize, n: usize) -> Result<(), TreeError> {
        let len = self.tree.len();
        let index = to_index(index, len)?;
        let n = u32::try_from(n).map_err(|_| TreeError::CapacityOverflow)?;
        self.tree.insert_space(index, n)
    }

    /// Empties the slots in `range`, without changing the length of the list
    pub fn clear_space(&mut self, range: Range<usize>) -> Result<(), TreeError> {
        let (start, n) = to_span(range, self.tree.len())?;
        self.tree.clear_space(start, n)
    }

    /// Removes the slots in `range`, shifting everything after them
    pub fn remove_range(&mut self, range: Range<usize>) -> Result<(), TreeError> {
        let (start, n) = to_span(range, self.tree.len())?;
        self.tree.remove_range(start, n)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Option<T>, TreeError> {
        let index = to_index(index, self.tree.len())?;
        self.tree.remove_at(index)
    }

    pub fn clear(&mut self) -> Result<(), TreeError> {
        self.tree.clear()
    }

    pub fn append(&mut self, other: &SparseAList<T>) -> Result<(), TreeError> {
        self.tree.append(&other.tree)
    }

    pub fn prepend(&mut self, other: &SparseAList<T>) -> Result<(), TreeError> {
        self.tree.prepend(&other.tree)
    }

    pub fn copy_section(&self, range: Range<usize>) -> Result<SparseAList<T>, TreeError> {
        let (start, n) = to_span(range, self.tree.len())?;
        Ok(SparseAList {
            tree: self.tree.copy_section(start, n)?,
        })
    }

    /// Attaches an observer, which only hears about the set slots
    pub fn observe(&mut self, observer: SharedObserver<T>) -> Result<(), TreeError> {
        self.tree.observe(observer)
    }

    pub fn unobserve(&mut self, observer: &SharedObserver<T>) -> bool {
        self.tree.unobserve(observer)
    }
}

impl<T> Default for SparseAList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SparseAList<T> {
    fn clone(&self) -> Self {
        SparseAList {
            tree: self.tree.clone(),
        }
    }
}

impl<T: Debug> Debug for SparseAList<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("SparseAList")
            .field("len", &self.len())
            .field("items", &DebugSet(self))
            .finish()
    }
}

struct DebugSet<'a, T>(&'a SparseAList<T>);

impl<T: Debug> Debug for DebugSet<'_, T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_map().entries(self.0.iter_set()).finish()
    }
}
