//! Mock implementation with essentially the same API as [`IndexedTree`], but backed by a vector
//!
//! [`IndexedTree`]: crate::IndexedTree

use std::ops::Range;

/// A mock, inefficient implementation of the [`IndexedTree`](crate::IndexedTree) interface
///
/// Every slot is an `Option`, so the same type models both dense and sparse trees. Bounds are
/// checked with panics; callers are expected to have checked them against the real tree first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mock<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Mock<T> {
    fn default() -> Self {
        Mock { slots: Vec::new() }
    }
}

impl<T: Clone> Mock<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.as_ref()
    }

    pub fn insert(&mut self, index: usize, item: T) {
        if index > self.len() {
            panic!("index out of bounds");
        }
        self.slots.insert(index, Some(item));
    }

    pub fn insert_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) {
        if index > self.len() {
            panic!("index out of bounds");
        }
        self.slots.splice(index..index, items.into_iter().map(Some));
    }

    pub fn remove_range(&mut self, range: Range<usize>) {
        if range.start > range.end || range.end > self.len() {
            panic!("invalid range, or end index out of bounds");
        }
        self.slots.drain(range);
    }

    /// Replaces the slot at `index`, returning whatever was there
    pub fn set(&mut self, index: usize, item: T) -> Option<T> {
        match self.slots.get_mut(index) {
            Some(slot) => slot.replace(item),
            None => panic!("index out of bounds"),
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn insert_space(&mut self, index: usize, n: usize) {
        if index > self.len() {
            panic!("index out of bounds");
        }
        self.slots.splice(index..index, std::iter::repeat_with(|| None).take(n));
    }

    pub fn clear_space(&mut self, range: Range<usize>) {
        if range.start > range.end || range.end > self.len() {
            panic!("invalid range, or end index out of bounds");
        }
        self.slots[range].iter_mut().for_each(|s| *s = None);
    }

    pub fn append(&mut self, other: &Mock<T>) {
        self.slots.extend_from_slice(&other.slots);
    }

    pub fn prepend(&mut self, other: &Mock<T>) {
        self.slots.splice(0..0, other.slots.iter().cloned());
    }

    pub fn copy_section(&self, range: Range<usize>) -> Mock<T> {
        Mock {
            slots: self.slots[range].to_vec(),
        }
    }

    /// The first set slot strictly after `after`, or the first at all
    pub fn next_higher(&self, after: Option<usize>) -> Option<(usize, &T)> {
        let start = after.map(|a| a + 1).unwrap_or(0);
        self.iter_set().find(|(i, _)| *i >= start)
    }

    /// The last set slot strictly before `before`, or the last at all
    pub fn next_lower(&self, before: Option<usize>) -> Option<(usize, &T)> {
        let end = before.unwrap_or(self.len()).min(self.len());
        self.slots[..end]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().flatten()
    }

    pub fn iter_set(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }
}
