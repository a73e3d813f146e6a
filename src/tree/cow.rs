//! Internal handling for clone-on-write, and the tree's freeze state
//!
//! There are two unrelated notions of "frozen" here. A *node* is frozen when it's shared between
//! more than one tree (i.e. its reference count is above one), and is unfrozen by replacing it
//! with a clone -- this happens automatically, in [`auto_clone`]. A *tree* is frozen according to
//! its [`FreezeMode`], and that state is either permanent (after [`IndexedTree::freeze`]) or lasts
//! only for the duration of a callback or mutation.
//!
//! [`IndexedTree::freeze`]: crate::IndexedTree::freeze

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::node::{Node, NodeId, NodeRef};
use super::{Core, Ctx};
use crate::error::TreeError;

/// The current mutability of an [`IndexedTree`](crate::IndexedTree)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FreezeMode {
    Mutable,
    /// Permanently read-only. Clones of the tree start out mutable.
    Frozen,
    /// A pre-change listener is running
    FrozenDuringCallback,
    /// A mutation is in progress
    FrozenDuringMutation,
}

impl FreezeMode {
    /// Returns the error that a mutation attempted in this mode should produce, if any
    pub fn check_mutable(self) -> Result<(), TreeError> {
        match self {
            FreezeMode::Mutable => Ok(()),
            FreezeMode::Frozen => Err(TreeError::Frozen),
            FreezeMode::FrozenDuringCallback | FreezeMode::FrozenDuringMutation => {
                Err(TreeError::ConcurrentModification)
            }
        }
    }
}

/// Guard that holds a tree in a temporary freeze mode, restoring the previous mode on drop (even
/// if the operation panics)
pub(super) struct ModeGuard<'m> {
    mode: &'m Cell<FreezeMode>,
    restore: FreezeMode,
}

impl<'m> ModeGuard<'m> {
    /// Checks that the tree is mutable, then switches it to `during`
    pub(super) fn enter(mode: &'m Cell<FreezeMode>, during: FreezeMode) -> Result<Self, TreeError> {
        let restore = mode.get();
        restore.check_mutable()?;
        mode.set(during);
        Ok(ModeGuard { mode, restore })
    }
}

impl Drop for ModeGuard<'_> {
    fn drop(&mut self) {
        self.mode.set(self.restore);
    }
}

/// Returns a mutable reference to the node in `slot`, first replacing it with an unshared clone if
/// it was shared
///
/// `parent` is the node that holds `slot`, or `None` if `slot` is the root. Replacement is
/// reported to observers as the old node leaving and the new node arriving in its place.
pub(super) fn auto_clone<'n, T: Clone, K: Clone>(
    slot: &'n mut NodeRef<T, K>,
    parent: Option<NodeId>,
    ctx: &mut Ctx<T, K>,
) -> &'n mut Node<T, K> {
    if Rc::get_mut(slot).is_none() {
        let fresh = Rc::new(slot.detached_clone());
        debug_println!("auto_clone: {:?} -> {:?}", slot.id(), fresh.id());

        if ctx.notify.is_active() {
            ctx.notify.content_removed(slot);
            ctx.notify.content_added(&fresh);
            match parent {
                Some(p) => {
                    ctx.notify.node_removed(slot.id(), p);
                    ctx.notify.node_added(fresh.id(), p);
                }
                None => ctx.notify.root_changed(Some(&fresh), false),
            }
        }

        *slot = fresh;
    }

    match Rc::get_mut(slot) {
        Some(node) => node,
        None => unreachable!("freshly cloned node must be unique"),
    }
}

/// Copies every node of the subtree, so that none of its [`NodeId`]s are shared with `node`
pub(super) fn deep_copy<T: Clone, K: Clone>(node: &Node<T, K>) -> NodeRef<T, K> {
    let mut copy = node.detached_clone();
    if let Some(inner) = copy.as_inner_mut() {
        for e in &mut inner.entries {
            e.node = deep_copy(&e.node);
        }
    }
    Rc::new(copy)
}

impl<T: Clone, K: Clone> Core<T, K> {
    /// Replaces every repeated occurrence of a node within this tree with a deep copy, so that each
    /// [`NodeId`] appears at most once. Returns whether anything was replaced.
    ///
    /// Appending a tree to itself (or to a section copied out of it) links the same nodes in more
    /// than one place. That's harmless for the tree, but observers identify nodes by id.
    pub(super) fn unalias(&mut self) -> bool {
        let mut seen = FxHashSet::default();
        let fresh = match &self.root {
            Some(root) => unalias_in(root, &mut seen),
            None => None,
        };
        let changed = fresh.is_some();
        if let Some(root) = fresh {
            self.root = Some(root);
        }
        changed
    }
}

/// Returns a replacement for `node` if it, or anything below it, was already in `seen`
fn unalias_in<T: Clone, K: Clone>(
    node: &NodeRef<T, K>,
    seen: &mut FxHashSet<NodeId>,
) -> Option<NodeRef<T, K>> {
    if !seen.insert(node.id()) {
        return Some(deep_copy(node));
    }

    let mut copy: Option<Node<T, K>> = None;
    if let Some(inner) = node.as_inner() {
        for (c, e) in inner.entries.iter().enumerate() {
            let Some(fresh) = unalias_in(&e.node, seen) else {
                continue;
            };
            let copy = copy.get_or_insert_with(|| node.detached_clone());
            if let Some(entry) = copy.as_inner_mut().and_then(|n| n.entries.get_mut(c)) {
                entry.node = fresh;
            }
        }
    }
    copy.map(Rc::new)
}
