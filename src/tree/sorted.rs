//! Key-ordered trees
//!
//! A tree built with a [`KeyOrder`] keeps its items sorted by key (the tree itself doesn't enforce
//! this; the sorted collections do, by only inserting at positions found with
//! [`find_by_key`](crate::IndexedTree::find_by_key)). Each inner node caches the highest key of
//! each of its children, so that searches only need to look at a single leaf.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use super::cow::auto_clone;
use super::node::{Body, Node};
use super::{Core, Ctx};

/// What [`insert_sorted`](crate::IndexedTree::insert_sorted) does with an item whose key is
/// already in the tree
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OnEqual {
    /// Insert after every item with an equal key
    InsertAfter,
    /// Replace the first item with an equal key
    Replace,
}

/// How items are ordered in a key-ordered tree: the key extraction function and the comparison
/// on keys
pub struct KeyOrder<T, K> {
    key_of: fn(&T) -> K,
    compare: Comparer<K>,
}

enum Comparer<K> {
    Ord(fn(&K, &K) -> Ordering),
    Custom(Rc<dyn Fn(&K, &K) -> Ordering>),
}

impl<T, K: Ord> KeyOrder<T, K> {
    /// Orders items by their key's [`Ord`] implementation
    pub fn new(key_of: fn(&T) -> K) -> Self {
        KeyOrder {
            key_of,
            compare: Comparer::Ord(K::cmp),
        }
    }
}

impl<T, K> KeyOrder<T, K> {
    /// Orders items with a custom comparison on keys
    ///
    /// The comparison must be a total order, and must not change while any tree uses it.
    pub fn with_comparer(key_of: fn(&T) -> K, compare: impl Fn(&K, &K) -> Ordering + 'static) -> Self {
        KeyOrder {
            key_of,
            compare: Comparer::Custom(Rc::new(compare)),
        }
    }

    pub fn key_of(&self, item: &T) -> K {
        (self.key_of)(item)
    }

    pub fn compare(&self, a: &K, b: &K) -> Ordering {
        match &self.compare {
            Comparer::Ord(f) => f(a, b),
            Comparer::Custom(f) => f(a, b),
        }
    }

    /// Compares the key of `item` against `key`
    pub(super) fn compare_item(&self, item: &T, key: &K) -> Ordering {
        self.compare(&self.key_of(item), key)
    }
}

impl<T, K> Clone for KeyOrder<T, K> {
    fn clone(&self) -> Self {
        KeyOrder {
            key_of: self.key_of,
            compare: match &self.compare {
                Comparer::Ord(f) => Comparer::Ord(*f),
                Comparer::Custom(f) => Comparer::Custom(Rc::clone(f)),
            },
        }
    }
}

impl<T, K> Debug for KeyOrder<T, K> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let kind = match &self.compare {
            Comparer::Ord(_) => "Ord",
            Comparer::Custom(_) => "custom",
        };
        f.debug_struct("KeyOrder").field("compare", &kind).finish_non_exhaustive()
    }
}

/// Finds the position of `key` in the subtree rooted at `root`
///
/// With `upper == false`, returns the index of the first item whose key is `>= key`; otherwise
/// the index of the first item whose key is `> key`. Either way, the boolean is whether an item
/// with a key equal to `key` exists.
pub(super) fn find_by_key<T, K>(
    root: &Node<T, K>,
    key: &K,
    upper: bool,
    order: &KeyOrder<T, K>,
) -> (u32, bool) {
    // Whether the item immediately before the current subtree has a key equal to `key`. Only
    // needed for upper-bound searches that land at the start of a leaf.
    let mut left_neighbor_eq = false;
    let mut node = root;
    let mut base = 0;

    loop {
        match &node.body {
            Body::Inner(inner) => {
                if inner.entries.is_empty() {
                    return (base, false);
                }

                let c = inner.binary_search_by_key(key, upper, order);
                if c > 0 {
                    left_neighbor_eq = inner.entries[c - 1]
                        .key
                        .as_ref()
                        .map(|k| order.compare(k, key) == Ordering::Equal)
                        .unwrap_or(false);
                }
                base += inner.entries[c].base;
                node = &inner.entries[c].node;
            }
            Body::Leaf(leaf) => {
                let items = &leaf.items;
                return match upper {
                    false => {
                        let p = items.partition_point(|x| order.compare_item(x, key).is_lt());
                        let found = items
                            .get(p)
                            .map(|x| order.compare_item(x, key).is_eq())
                            .unwrap_or(false);
                        (base + p as u32, found)
                    }
                    true => {
                        let p = items.partition_point(|x| order.compare_item(x, key).is_le());
                        let found = match p {
                            0 => left_neighbor_eq,
                            p => order.compare_item(&items[p - 1], key).is_eq(),
                        };
                        (base + p as u32, found)
                    }
                };
            }
            Body::Sparse(_) => {
                weak_unreachable!("sparse trees have no key order");
                return (base, false);
            }
        }
    }
}

impl<T: Clone, K: Clone> Core<T, K> {
    /// Inserts `item` at its sorted position in a single descent, returning its index and the item
    /// it replaced, if any
    pub(super) fn insert_sorted(&mut self, item: T, on_equal: OnEqual, ctx: &mut Ctx<T, K>) -> (u32, Option<T>) {
        let root = self.root_mut(ctx);
        let (result, split) = root.insert_sorted(item, on_equal, ctx);
        if let Some(right) = split {
            self.grow(right, ctx);
        }
        if result.1.is_none() {
            self.count += 1;
        }
        result
    }
}

impl<T: Clone, K: Clone> Node<T, K> {
    /// Routes `item` by key down to its leaf, returning its index relative to this node, the item
    /// it replaced, and the split-off right half of this node if it overflowed
    fn insert_sorted(&mut self, item: T, on_equal: OnEqual, ctx: &mut Ctx<T, K>) -> ((u32, Option<T>), Option<Self>) {
        let Some(order) = ctx.order else {
            weak_unreachable!("sorted insertion without a key order");
            return ((0, None), None);
        };
        let key = order.key_of(&item);
        let upper = on_equal == OnEqual::InsertAfter;
        let (id, max, max_size) = (self.id(), self.max_size(), self.max_size);

        match &mut self.body {
            Body::Leaf(leaf) => {
                let p = match upper {
                    true => leaf.items.partition_point(|x| order.compare_item(x, &key).is_le()),
                    false => leaf.items.partition_point(|x| order.compare_item(x, &key).is_lt()),
                };
                let equal = !upper
                    && leaf
                        .items
                        .get(p)
                        .map(|x| order.compare_item(x, &key).is_eq())
                        .unwrap_or(false);
                if equal {
                    let old = leaf.set(id, p as u32, item, ctx);
                    return ((p as u32, Some(old)), None);
                }
                let split = leaf.insert(id, max, p as u32, item, ctx);
                ((p as u32, None), split.map(|l| Node::new(Body::Leaf(l), max_size)))
            }
            Body::Inner(inner) => {
                if inner.entries.is_empty() {
                    weak_unreachable!("empty inner node");
                    return ((0, None), None);
                }

                let mut c = inner.binary_search_by_key(&key, upper, order);
                if inner.entries[c].node.is_full() && inner.try_shift_to_siblings(id, c, ctx) {
                    c = inner.binary_search_by_key(&key, upper, order);
                }

                let base = inner.entries[c].base;
                let child = auto_clone(&mut inner.entries[c].node, Some(id), ctx);
                let ((i, old), split) = child.insert_sorted(item, on_equal, ctx);
                if old.is_none() {
                    inner.add_to_bases_after(c, 1);
                }
                inner.refresh_key(c, ctx);
                if let Some(right) = split {
                    inner.handle_child_split(id, c, right, ctx);
                }

                let split = inner
                    .split_if_overfull(id, max, ctx)
                    .map(|n| Node::new(Body::Inner(n), max_size));
                ((base + i, old), split)
            }
            Body::Sparse(_) => {
                weak_unreachable!("sparse trees have no key order");
                ((0, None), None)
            }
        }
    }
}
