//! Wrapper module for [`BDictionary`]

use std::fmt::{self, Debug, Formatter};

use super::to_index;
use crate::error::TreeError;
use crate::param::NodeLimits;
use crate::tree::{IndexedTree, Iter, KeyOrder, OnEqual};

fn pair_key<K: Clone, V>(pair: &(K, V)) -> K {
    pair.0.clone()
}

/// A map kept in key order, where every entry also has a position
///
/// ```
/// use hyperion::BDictionary;
///
/// let mut dict = BDictionary::new();
/// dict.insert("pear", 3).unwrap();
/// dict.insert("apple", 5).unwrap();
/// assert_eq!(dict.insert("pear", 4), Ok(Some(3)));
///
/// assert_eq!(dict.get(&"pear"), Some(&4));
/// assert_eq!(dict.get_index(0), Some((&"apple", &5)));
/// assert_eq!(dict.find_lower_bound(&"banana"), (1, false));
/// ```
pub struct BDictionary<K, V> {
    tree: IndexedTree<(K, V), K>,
}

impl<K: Clone + Ord, V: Clone> BDictionary<K, V> {
    pub fn new() -> Self {
        Self::with_limits(NodeLimits::default())
    }

    pub fn with_limits(limits: NodeLimits) -> Self {
        BDictionary {
            tree: IndexedTree::new_sorted(limits, KeyOrder::new(pair_key::<K, V>)),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the position of the first entry whose key isn't less than `key`, and whether that
    /// entry's key is equal to `key`
    pub fn find_lower_bound(&self, key: &K) -> (usize, bool) {
        match self.tree.find_by_key(key, true) {
            Ok((i, found)) => (i as usize, found),
            Err(_) => {
                weak_unreachable!("BDictionary without a key order");
                (0, false)
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match self.find_lower_bound(key) {
            (i, true) => self.get_index(i).map(|(_, v)| v),
            (_, false) => None,
        }
    }

    /// Returns the entry at position `index`
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        let (k, v) = self.tree.get(u32::try_from(index).ok()?)?;
        Some((k, v))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_lower_bound(key).1
    }

    /// Inserts or replaces the value for `key`, returning the previous value
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TreeError> {
        let (_, old) = self.tree.insert_sorted((key, value), OnEqual::Replace)?;
        Ok(old.map(|(_, v)| v))
    }

    /// Replaces the value for an existing `key`, returning whether the key was present. Unlike
    /// [`insert`](Self::insert), this never adds an entry.
    pub fn set(&mut self, key: &K, value: V) -> Result<bool, TreeError> {
        match self.find_lower_bound(key) {
            (i, true) => {
                let i = to_index(i, self.tree.len())?;
                self.tree.set(i, (key.clone(), value))?;
                Ok(true)
            }
            (_, false) => Ok(false),
        }
    }

    /// Removes the entry for `key`, returning its value
    pub fn remove(&mut self, key: &K) -> Result<Option<V>, TreeError> {
        match self.find_lower_bound(key) {
            (i, true) => {
                let old = self.tree.remove_at(to_index(i, self.tree.len())?)?;
                Ok(old.map(|(_, v)| v))
            }
            (_, false) => Ok(None),
        }
    }

    pub fn clear(&mut self) -> Result<(), TreeError> {
        self.tree.clear()
    }

    pub fn freeze(&mut self) {
        self.tree.freeze();
    }

    pub fn as_tree(&self) -> &IndexedTree<(K, V), K> {
        &self.tree
    }
}

impl<K, V> BDictionary<K, V> {
    /// Iterates over the entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.tree.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.tree.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.tree.iter().map(|(_, v)| v)
    }

    /// Returns the underlying tree's iterator, yielding `&(K, V)`
    pub fn entries(&self) -> Iter<'_, (K, V), K> {
        self.tree.iter()
    }
}

impl<K: Clone + Ord, V: Clone> Default for BDictionary<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for BDictionary<K, V> {
    fn clone(&self) -> Self {
        BDictionary {
            tree: self.tree.clone(),
        }
    }
}

impl<K: Debug, V: Debug> Debug for BDictionary<K, V> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
