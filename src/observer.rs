//! The tree observer protocol
//!
//! An observer is kept in sync with the *structure* of a tree: which leaf holds which item, and
//! which inner node holds which child. That's enough to build auxiliary indexes (like
//! [`LookupIndex`]) without storing a second copy of the tree's positions, because positions can
//! always be recovered by walking from a leaf back up to the root.
//!
//! The events, and how to interpret them:
//!
//! * [`item_added`] / [`item_removed`] -- a single item entered or left a leaf
//! * [`node_added`] / [`node_removed`] -- a child was linked into or unlinked from an inner node
//! * [`add_all`] / [`remove_all`] -- a whole subtree (every item and every descendant link
//!   beneath the node) entered or left the tree. The node's own link to its parent is reported
//!   separately, with `node_added` / `node_removed`.
//! * [`root_changed`] -- the root was replaced. With `is_clear == true`, the tree was emptied and
//!   everything previously reported should be forgotten.
//! * [`checkpoint`] -- the operation is complete; the tree is consistent again
//!
//! Replacing a value is always reported as a removal followed by an addition, and copy-on-write
//! replacement of a node is reported the same way. Nodes are identified by [`NodeId`]; an
//! observer never sees a node reference outside of the call that provides it. While a tree is
//! observed, each of its nodes appears at most once in it, even after it has been spliced with its
//! own clones.
//!
//! [`LookupIndex`]: crate::LookupIndex
//! [`item_added`]: TreeObserver::item_added
//! [`item_removed`]: TreeObserver::item_removed
//! [`node_added`]: TreeObserver::node_added
//! [`node_removed`]: TreeObserver::node_removed
//! [`add_all`]: TreeObserver::add_all
//! [`remove_all`]: TreeObserver::remove_all
//! [`root_changed`]: TreeObserver::root_changed
//! [`checkpoint`]: TreeObserver::checkpoint

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{ObserverError, ObserverResult};
use crate::tree::{Node, NodeId};

/// An observer shared between its owner and the tree it's attached to
pub type SharedObserver<T, K = ()> = Rc<RefCell<dyn TreeObserver<T, K>>>;

/// How a newly attached observer wants to be told about the existing contents of the tree
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Populate {
    /// Parents are reported before their children
    TopDown,
    /// Children are reported before their parents
    BottomUp,
    /// Only `root_changed` is called; the observer will work out the rest itself
    Skip,
}

/// Receiver for the structural notifications of an [`IndexedTree`]
///
/// Only [`checkpoint`] may meaningfully fail: errors from any other method are recorded and then
/// ignored, because the mutation that produced them is already underway and cannot be undone.
///
/// [`IndexedTree`]: crate::IndexedTree
/// [`checkpoint`]: Self::checkpoint
pub trait TreeObserver<T, K = ()> {
    /// Called once when the observer is attached, before population
    ///
    /// Observers that may only be attached to a single tree should return
    /// [`ObserverError::AlreadyAttached`] on a second call.
    fn attach(&mut self, root: Option<&Node<T, K>>) -> Result<Populate, ObserverError> {
        let _ = root;
        Ok(Populate::TopDown)
    }

    /// Called when the observer is removed from its tree
    fn detach(&mut self) {}

    fn root_changed(&mut self, new_root: Option<&Node<T, K>>, is_clear: bool) -> ObserverResult;

    fn item_added(&mut self, item: &T, leaf: NodeId) -> ObserverResult;

    fn item_removed(&mut self, item: &T, leaf: NodeId) -> ObserverResult;

    fn node_added(&mut self, child: NodeId, parent: NodeId) -> ObserverResult;

    fn node_removed(&mut self, child: NodeId, parent: NodeId) -> ObserverResult;

    /// The subtree rooted at `node` entered the tree
    fn add_all(&mut self, node: &Node<T, K>) -> ObserverResult;

    /// The subtree rooted at `node` left the tree
    fn remove_all(&mut self, node: &Node<T, K>) -> ObserverResult;

    /// Called at the end of every mutating operation. Unlike the other methods, an error here is
    /// returned to the caller of the operation.
    fn checkpoint(&mut self) -> ObserverResult {
        Ok(())
    }
}

/// Record of a notification that an observer failed to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverFailure {
    /// Position of the observer in its [`Dispatcher`]
    pub observer: usize,
    /// Name of the [`TreeObserver`] method that failed
    pub method: &'static str,
    pub error: ObserverError,
}

/// Fan-out of notifications to any number of observers
///
/// A tree with two or more observers holds a `Dispatcher`; its failures are available through
/// [`IndexedTree::observer_failures`](crate::IndexedTree::observer_failures).
pub struct Dispatcher<T, K = ()> {
    observers: Vec<SharedObserver<T, K>>,
    failures: Vec<ObserverFailure>,
}

impl<T, K> Default for Dispatcher<T, K> {
    fn default() -> Self {
        Dispatcher {
            observers: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T, K> Dispatcher<T, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: SharedObserver<T, K>) {
        self.observers.push(observer);
    }

    /// Removes the observer, returning whether it was present
    pub fn remove(&mut self, observer: &SharedObserver<T, K>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !same_observer(o, observer));
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Failures recorded so far, oldest first
    pub fn failures(&self) -> &[ObserverFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<ObserverFailure> {
        std::mem::take(&mut self.failures)
    }

    fn into_observers(self) -> Vec<SharedObserver<T, K>> {
        self.observers
    }

    /// Sends a notification to every observer, recording (rather than returning) the failures
    fn dispatch(
        &mut self,
        method: &'static str,
        mut f: impl FnMut(&mut dyn TreeObserver<T, K>) -> ObserverResult,
    ) {
        for (i, o) in self.observers.iter().enumerate() {
            let result = match o.try_borrow_mut() {
                Ok(mut obs) => f(&mut *obs),
                Err(_) => Err(ObserverError::Reentrant),
            };

            if let Err(error) = result {
                tracing::warn!(observer = i, method, %error, "observer failed; ignoring");
                self.failures.push(ObserverFailure {
                    observer: i,
                    method,
                    error,
                });
            }
        }
    }
}

impl<T, K> TreeObserver<T, K> for Dispatcher<T, K> {
    fn attach(&mut self, root: Option<&Node<T, K>>) -> Result<Populate, ObserverError> {
        for o in &self.observers {
            o.try_borrow_mut()
                .map_err(|_| ObserverError::Reentrant)?
                .attach(root)?;
        }
        Ok(Populate::TopDown)
    }

    fn detach(&mut self) {
        for o in &self.observers {
            if let Ok(mut o) = o.try_borrow_mut() {
                o.detach();
            }
        }
    }

    fn root_changed(&mut self, new_root: Option<&Node<T, K>>, is_clear: bool) -> ObserverResult {
        self.dispatch("root_changed", |o| o.root_changed(new_root, is_clear));
        Ok(())
    }

    fn item_added(&mut self, item: &T, leaf: NodeId) -> ObserverResult {
        self.dispatch("item_added", |o| o.item_added(item, leaf));
        Ok(())
    }

    fn item_removed(&mut self, item: &T, leaf: NodeId) -> ObserverResult {
        self.dispatch("item_removed", |o| o.item_removed(item, leaf));
        Ok(())
    }

    fn node_added(&mut self, child: NodeId, parent: NodeId) -> ObserverResult {
        self.dispatch("node_added", |o| o.node_added(child, parent));
        Ok(())
    }

    fn node_removed(&mut self, child: NodeId, parent: NodeId) -> ObserverResult {
        self.dispatch("node_removed", |o| o.node_removed(child, parent));
        Ok(())
    }

    fn add_all(&mut self, node: &Node<T, K>) -> ObserverResult {
        self.dispatch("add_all", |o| o.add_all(node));
        Ok(())
    }

    fn remove_all(&mut self, node: &Node<T, K>) -> ObserverResult {
        self.dispatch("remove_all", |o| o.remove_all(node));
        Ok(())
    }

    /// Every observer is checkpointed; the first failure is returned
    fn checkpoint(&mut self) -> ObserverResult {
        let mut first = Ok(());
        for o in &self.observers {
            let result = match o.try_borrow_mut() {
                Ok(mut obs) => obs.checkpoint(),
                Err(_) => Err(ObserverError::Reentrant),
            };
            if first.is_ok() {
                first = result;
            }
        }
        first
    }
}

pub(crate) fn same_observer<T, K>(a: &SharedObserver<T, K>, b: &SharedObserver<T, K>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// The zero-or-one observer attached to a tree
pub(crate) enum ObserverSlot<T, K> {
    Single(SharedObserver<T, K>),
    Fanout(Dispatcher<T, K>),
}

impl<T, K> ObserverSlot<T, K> {
    /// Adds another observer, upgrading to a [`Dispatcher`] if necessary
    pub(crate) fn with(self, observer: SharedObserver<T, K>) -> Self {
        match self {
            ObserverSlot::Single(existing) => {
                let mut d = Dispatcher::new();
                d.push(existing);
                d.push(observer);
                ObserverSlot::Fanout(d)
            }
            ObserverSlot::Fanout(mut d) => {
                d.push(observer);
                ObserverSlot::Fanout(d)
            }
        }
    }

    /// Removes the observer. Returns the remaining slot (if any are left) and whether the observer
    /// was found.
    pub(crate) fn without(self, observer: &SharedObserver<T, K>) -> (Option<Self>, bool) {
        match self {
            ObserverSlot::Single(o) if same_observer(&o, observer) => (None, true),
            s @ ObserverSlot::Single(_) => (Some(s), false),
            ObserverSlot::Fanout(mut d) => {
                let found = d.remove(observer);
                let slot = match d.len() {
                    0 => None,
                    1 => d.into_observers().pop().map(ObserverSlot::Single),
                    _ => Some(ObserverSlot::Fanout(d)),
                };
                (slot, found)
            }
        }
    }

    pub(crate) fn failures(&self) -> &[ObserverFailure] {
        match self {
            ObserverSlot::Single(_) => &[],
            ObserverSlot::Fanout(d) => d.failures(),
        }
    }
}

/// Notification sink handed down through every tree operation
///
/// With no observer attached, every method here is a no-op, so the algorithms in `tree` can call
/// them unconditionally.
pub(crate) struct Notify<'a, T, K> {
    slot: Option<&'a mut ObserverSlot<T, K>>,
}

impl<'a, T, K> Notify<'a, T, K> {
    pub(crate) fn new(slot: Option<&'a mut ObserverSlot<T, K>>) -> Self {
        Notify { slot }
    }

    pub(crate) fn silent() -> Self {
        Notify { slot: None }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    fn send(
        &mut self,
        method: &'static str,
        mut f: impl FnMut(&mut dyn TreeObserver<T, K>) -> ObserverResult,
    ) {
        match self.slot.as_deref_mut() {
            None => {}
            Some(ObserverSlot::Single(o)) => {
                let result = match o.try_borrow_mut() {
                    Ok(mut obs) => f(&mut *obs),
                    Err(_) => Err(ObserverError::Reentrant),
                };
                if let Err(error) = result {
                    tracing::warn!(method, %error, "observer failed; ignoring");
                }
            }
            Some(ObserverSlot::Fanout(d)) => d.dispatch(method, f),
        }
    }

    pub(crate) fn root_changed(&mut self, root: Option<&Node<T, K>>, is_clear: bool) {
        self.send("root_changed", |o| o.root_changed(root, is_clear));
    }

    pub(crate) fn item_added(&mut self, item: &T, leaf: NodeId) {
        self.send("item_added", |o| o.item_added(item, leaf));
    }

    pub(crate) fn item_removed(&mut self, item: &T, leaf: NodeId) {
        self.send("item_removed", |o| o.item_removed(item, leaf));
    }

    pub(crate) fn node_added(&mut self, child: NodeId, parent: NodeId) {
        self.send("node_added", |o| o.node_added(child, parent));
    }

    pub(crate) fn node_removed(&mut self, child: NodeId, parent: NodeId) {
        self.send("node_removed", |o| o.node_removed(child, parent));
    }

    pub(crate) fn add_all(&mut self, node: &Node<T, K>) {
        self.send("add_all", |o| o.add_all(node));
    }

    pub(crate) fn remove_all(&mut self, node: &Node<T, K>) {
        self.send("remove_all", |o| o.remove_all(node));
    }

    /// Reports the *direct* contents of a node that has just come into existence: the items of a
    /// leaf, or the child links of an inner node
    pub(crate) fn content_added(&mut self, node: &Node<T, K>) {
        if !self.is_active() {
            return;
        }

        if node.is_leaf() {
            self.add_all(node);
        } else {
            for child in node.children() {
                self.node_added(child.id(), node.id());
            }
        }
    }

    /// Counterpart to [`content_added`](Self::content_added) for a node that is being discarded
    /// while its contents live on elsewhere
    pub(crate) fn content_removed(&mut self, node: &Node<T, K>) {
        if !self.is_active() {
            return;
        }

        if node.is_leaf() {
            self.remove_all(node);
        } else {
            for child in node.children() {
                self.node_removed(child.id(), node.id());
            }
        }
    }

    pub(crate) fn checkpoint(&mut self) -> ObserverResult {
        match self.slot.as_deref_mut() {
            None => Ok(()),
            Some(ObserverSlot::Single(o)) => match o.try_borrow_mut() {
                Ok(mut obs) => obs.checkpoint(),
                Err(_) => Err(ObserverError::Reentrant),
            },
            Some(ObserverSlot::Fanout(d)) => d.checkpoint(),
        }
    }
}

/// Reports the existing contents of a tree to a newly attached observer
pub(crate) fn populate<T, K>(
    observer: &mut dyn TreeObserver<T, K>,
    root: Option<&Node<T, K>>,
    order: Populate,
) -> ObserverResult {
    observer.root_changed(root, false)?;
    match (root, order) {
        (None, _) | (_, Populate::Skip) => Ok(()),
        (Some(root), order) => populate_node(observer, root, order),
    }
}

fn populate_node<T, K>(
    observer: &mut dyn TreeObserver<T, K>,
    node: &Node<T, K>,
    order: Populate,
) -> ObserverResult {
    if node.is_leaf() {
        return observer.add_all(node);
    }

    if order == Populate::TopDown {
        for child in node.children() {
            observer.node_added(child.id(), node.id())?;
        }
    }

    for child in node.children() {
        populate_node(observer, child, order)?;
    }

    if order == Populate::BottomUp {
        for child in node.children() {
            observer.node_added(child.id(), node.id())?;
        }
    }

    Ok(())
}
