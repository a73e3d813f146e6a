//! Wrapper module for [`AList`]

use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::hash::Hash;
use std::ops::Range;
use std::rc::Rc;

use super::{to_index, to_span};
use crate::error::{TreeError, Veto};
use crate::indexer::LookupIndex;
use crate::observer::SharedObserver;
use crate::param::NodeLimits;
use crate::tree::{IndexedTree, Iter, ListChangeInfo};

/// A list with O(log n) insertion and removal at any position
///
/// ```
/// use hyperion::AList;
///
/// let mut list = AList::new();
/// list.insert_range(0, 0..10).unwrap();
/// list.insert(5, 100).unwrap();
/// assert_eq!(list.get(5), Some(&100));
/// assert_eq!(list.get(6), Some(&5));
///
/// let copy = list.clone();
/// list.remove_range(0..5).unwrap();
/// assert_eq!(list.len(), 6);
/// assert_eq!(copy.len(), 11);
/// ```
pub struct AList<T> {
    tree: IndexedTree<T>,
    index: Option<Rc<RefCell<LookupIndex<T>>>>,
}

impl<T> AList<T> {
    pub fn new() -> Self {
        Self::with_limits(NodeLimits::default())
    }

    pub fn with_limits(limits: NodeLimits) -> Self {
        AList {
            tree: IndexedTree::new(limits),
            index: None,
        }
    }

    pub fn limits(&self) -> NodeLimits {
        self.tree.limits()
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

    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    /// Returns the position of the first item matching `pred`, by linear scan
    pub fn position(&self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.tree.iter().position(pred)
    }

    /// Makes the list permanently read-only
    pub fn freeze(&mut self) {
        self.tree.freeze();
    }

    pub fn is_frozen(&self) -> bool {
        self.tree.is_frozen()
    }

    /// Adds a pre-change listener; see [`IndexedTree::on_changing`]
    pub fn on_changing(
        &mut self,
        listener: impl FnMut(&ListChangeInfo<'_, T>) -> Result<(), Veto> + 'static,
    ) {
        self.tree.on_changing(listener);
    }

    /// Returns the underlying tree
    pub fn as_tree(&self) -> &IndexedTree<T> {
        &self.tree
    }
}

impl<T: Clone> AList<T> {
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), TreeError> {
        let index = to_index(index, self.tree.len())?;
        self.tree.insert(index, item)
    }

    pub fn push(&mut self, item: T) -> Result<(), TreeError> {
        self.tree.insert(self.tree.len(), item)
    }

    pub fn insert_range(
        &mut self,
        index: usize,
        items: impl IntoIterator<Item = T>,
    ) -> Result<(), TreeError> {
        let index = to_index(index, self.tree.len())?;
        self.tree.insert_range(index, items)
    }

    /// Replaces the item at `index`, returning the old one
    pub fn set(&mut self, index: usize, item: T) -> Result<T, TreeError> {
        let len = self.tree.len();
        let i = to_index(index, len)?;
        self.tree.set(i, item)?.ok_or(TreeError::IndexOutOfBounds {
            index: index as u64,
            len,
        })
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T, TreeError> {
        let len = self.tree.len();
        let i = to_index(index, len)?;
        self.tree.remove_at(i)?.ok_or(TreeError::IndexOutOfBounds {
            index: index as u64,
            len,
        })
    }

    pub fn remove_range(&mut self, range: Range<usize>) -> Result<(), TreeError> {
        let (start, n) = to_span(range, self.tree.len())?;
        self.tree.remove_range(start, n)
    }

    pub fn clear(&mut self) -> Result<(), TreeError> {
        self.tree.clear()
    }

    /// Adds every item of `other` to the end of this list, sharing nodes where possible
    pub fn append(&mut self, other: &AList<T>) -> Result<(), TreeError> {
        self.tree.append(&other.tree)
    }

    /// Adds every item of `other` to the start of this list, sharing nodes where possible
    pub fn prepend(&mut self, other: &AList<T>) -> Result<(), TreeError> {
        self.tree.prepend(&other.tree)
    }

    pub fn copy_section(&self, range: Range<usize>) -> Result<AList<T>, TreeError> {
        let (start, n) = to_span(range, self.tree.len())?;
        Ok(AList {
            tree: self.tree.copy_section(start, n)?,
            index: None,
        })
    }

    pub fn remove_section(&mut self, range: Range<usize>) -> Result<AList<T>, TreeError> {
        let (start, n) = to_span(range, self.tree.len())?;
        Ok(AList {
            tree: self.tree.remove_section(start, n)?,
            index: None,
        })
    }

    /// Attaches an observer; see [`IndexedTree::observe`]
    pub fn observe(&mut self, observer: SharedObserver<T>) -> Result<(), TreeError> {
        self.tree.observe(observer)
    }

    pub fn unobserve(&mut self, observer: &SharedObserver<T>) -> bool {
        self.tree.unobserve(observer)
    }
}

impl<T: Clone + Hash + Eq + 'static> AList<T> {
    /// Attaches a [`LookupIndex`], so that [`index_of`](Self::index_of) takes O(log n) time
    /// instead of a linear scan. Does nothing if the index is already enabled.
    pub fn enable_index(&mut self) -> Result<(), TreeError> {
        if self.index.is_some() {
            return Ok(());
        }

        let index = Rc::new(RefCell::new(LookupIndex::new()));
        self.tree.observe(index.clone())?;
        self.index = Some(index);
        Ok(())
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Returns the position of the first occurrence of `item`
    pub fn index_of(&self, item: &T) -> Option<usize> {
        match &self.index {
            Some(index) => index
                .borrow()
                .index_of(item, self.tree.root())
                .map(|i| i as usize),
            None => self.position(|x| x == item),
        }
    }

    /// Returns whether `item` is in the list
    pub fn contains(&self, item: &T) -> bool {
        match &self.index {
            Some(index) => index.borrow().contains(item),
            None => self.iter().any(|x| x == item),
        }
    }
}

impl<T> Default for AList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones the list in O(1) time. The clone has no index, observers, or listeners.
impl<T> Clone for AList<T> {
    fn clone(&self) -> Self {
        AList {
            tree: self.tree.clone(),
            index: None,
        }
    }
}

impl<T: Debug> Debug for AList<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for AList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<'t, T> IntoIterator for &'t AList<T> {
    type Item = &'t T;
    type IntoIter = Iter<'t, T>;

    fn into_iter(self) -> Iter<'t, T> {
        self.iter()
    }
}
