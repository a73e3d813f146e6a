//! Wrapper module for [`LookupIndex`], an observer that answers "where is this item?"

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::{ObserverError, ObserverResult};
use crate::observer::{Populate, TreeObserver};
use crate::tree::{Node, NodeId};

/// Reverse index from items to their positions in a tree
///
/// The index doesn't store positions directly, since a single insertion would change all of them.
/// Instead, it records which leaf holds each item and which inner node holds each node. Finding
/// an item's position then means following the parents from its leaf up to the root, and adding
/// up the offsets on the way back down -- O(log n) work, independent of where the item is.
///
/// An index can only be attached to one tree at a time. Attaching it clears whatever it had
/// recorded before.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use hyperion::{IndexedTree, LookupIndex, param::NodeLimits};
///
/// let mut tree: IndexedTree<&str> = IndexedTree::new(NodeLimits::new(4, 4));
/// tree.insert_range(0, "the quick brown fox jumps".split(' ')).unwrap();
///
/// let index = Rc::new(RefCell::new(LookupIndex::new()));
/// tree.observe(index.clone()).unwrap();
/// tree.insert(0, "oh").unwrap();
///
/// assert_eq!(index.borrow().index_of(&"fox", tree.root()), Some(4));
/// assert_eq!(index.borrow().index_of(&"dog", tree.root()), None);
/// ```
pub struct LookupIndex<T> {
    /// Every leaf containing each item, once per occurrence
    leaves: FxHashMap<T, Vec<NodeId>>,
    parents: FxHashMap<NodeId, NodeId>,
    root: Option<NodeId>,
    attached: bool,
}

impl<T> Default for LookupIndex<T> {
    fn default() -> Self {
        LookupIndex {
            leaves: FxHashMap::default(),
            parents: FxHashMap::default(),
            root: None,
            attached: false,
        }
    }
}

impl<T: Hash + Eq> LookupIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the index is currently attached to a tree
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Returns whether any copy of `item` is in the tree
    pub fn contains(&self, item: &T) -> bool {
        self.leaves.contains_key(item)
    }

    /// Returns the number of occurrences of `item` in the tree
    pub fn count_of(&self, item: &T) -> usize {
        self.leaves.get(item).map(Vec::len).unwrap_or(0)
    }

    /// Returns the number of distinct items in the tree
    pub fn distinct_len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns the smallest index holding `item` in the tree rooted at `root`, which must be the
    /// root of the tree the index is attached to
    pub fn index_of<K>(&self, item: &T, root: Option<&Node<T, K>>) -> Option<u32> {
        let root = root?;
        if Some(root.id()) != self.root {
            return None;
        }

        let leaves = self.leaves.get(item)?;
        let mut best: Option<u32> = None;
        for &leaf in leaves {
            if let Some(i) = self.locate(item, leaf, root) {
                best = Some(best.map_or(i, |b| b.min(i)));
            }
        }
        best
    }

    /// Finds the index of the first `item` in `leaf`
    fn locate<K>(&self, item: &T, leaf: NodeId, root: &Node<T, K>) -> Option<u32> {
        // Path from the leaf up to the root, then walked in reverse.
        let mut path = vec![leaf];
        let mut current = leaf;
        while current != root.id() {
            current = *self.parents.get(&current)?;
            path.push(current);
        }
        path.pop();

        let mut node = root;
        let mut base = 0;
        while let Some(next) = path.pop() {
            let (offset, child) = node.child_entries().find(|(_, c)| c.id() == next)?;
            base += offset;
            node = child;
        }

        node.leaf_items()
            .find(|(_, x)| *x == item)
            .map(|(offset, _)| base + offset)
    }
}

impl<T: Hash + Eq + Clone> LookupIndex<T> {
    fn add_item(&mut self, item: &T, leaf: NodeId) {
        match self.leaves.get_mut(item) {
            Some(v) => v.push(leaf),
            None => {
                self.leaves.insert(item.clone(), vec![leaf]);
            }
        }
    }

    fn remove_item(&mut self, item: &T, leaf: NodeId) -> ObserverResult {
        let leaves = self
            .leaves
            .get_mut(item)
            .ok_or_else(|| ObserverError::failed("removed an item that was never added"))?;
        let pos = leaves
            .iter()
            .position(|&l| l == leaf)
            .ok_or_else(|| ObserverError::failed("removed an item from the wrong leaf"))?;

        leaves.swap_remove(pos);
        if leaves.is_empty() {
            self.leaves.remove(item);
        }
        Ok(())
    }

    fn add_subtree<K>(&mut self, node: &Node<T, K>) {
        for (_, item) in node.leaf_items() {
            self.add_item(item, node.id());
        }
        for child in node.children() {
            self.parents.insert(child.id(), node.id());
            self.add_subtree(child);
        }
    }

    fn remove_subtree<K>(&mut self, node: &Node<T, K>) -> ObserverResult {
        let mut result = Ok(());
        for (_, item) in node.leaf_items() {
            result = result.and(self.remove_item(item, node.id()));
        }
        for child in node.children() {
            self.parents.remove(&child.id());
            result = result.and(self.remove_subtree(child));
        }
        result
    }

    fn reset(&mut self) {
        self.leaves.clear();
        self.parents.clear();
        self.root = None;
    }
}

impl<T: Hash + Eq + Clone, K> TreeObserver<T, K> for LookupIndex<T> {
    fn attach(&mut self, _root: Option<&Node<T, K>>) -> Result<Populate, ObserverError> {
        if self.attached {
            return Err(ObserverError::AlreadyAttached);
        }
        self.reset();
        self.attached = true;
        Ok(Populate::TopDown)
    }

    fn detach(&mut self) {
        self.reset();
        self.attached = false;
    }

    fn root_changed(&mut self, new_root: Option<&Node<T, K>>, is_clear: bool) -> ObserverResult {
        if is_clear {
            self.reset();
        }
        self.root = new_root.map(|r| r.id());
        if let Some(id) = self.root {
            self.parents.remove(&id);
        }
        Ok(())
    }

    fn item_added(&mut self, item: &T, leaf: NodeId) -> ObserverResult {
        self.add_item(item, leaf);
        Ok(())
    }

    fn item_removed(&mut self, item: &T, leaf: NodeId) -> ObserverResult {
        self.remove_item(item, leaf)
    }

    fn node_added(&mut self, child: NodeId, parent: NodeId) -> ObserverResult {
        self.parents.insert(child, parent);
        Ok(())
    }

    fn node_removed(&mut self, child: NodeId, parent: NodeId) -> ObserverResult {
        match self.parents.get(&child) {
            Some(&p) if p == parent => {
                self.parents.remove(&child);
                Ok(())
            }
            _ => Err(ObserverError::failed("unlinked a node from the wrong parent")),
        }
    }

    fn add_all(&mut self, node: &Node<T, K>) -> ObserverResult {
        self.add_subtree(node);
        Ok(())
    }

    fn remove_all(&mut self, node: &Node<T, K>) -> ObserverResult {
        self.remove_subtree(node)
    }
}
