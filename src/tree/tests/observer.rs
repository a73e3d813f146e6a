use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::{ObserverError, ObserverResult};
use crate::observer::{Populate, TreeObserver};
use crate::param::NodeLimits;
use crate::{IndexedTree, LookupIndex, Node, NodeId, TreeError};

/// Observer that rebuilds the structure of the tree from nothing but notifications
#[derive(Default)]
struct Model {
    root: Option<NodeId>,
    items: BTreeMap<NodeId, BTreeSet<u32>>,
    parents: BTreeMap<NodeId, NodeId>,
    errors: Vec<String>,
    checkpoints: usize,
}

impl Model {
    fn shared() -> Rc<RefCell<Model>> {
        Rc::new(RefCell::new(Model::default()))
    }

    fn add_item(&mut self, item: u32, leaf: NodeId) {
        if !self.items.entry(leaf).or_default().insert(item) {
            self.errors.push(format!("{item} added twice to {leaf:?}"));
        }
    }

    fn remove_item(&mut self, item: u32, leaf: NodeId) {
        let removed = self.items.get_mut(&leaf).map(|s| s.remove(&item));
        if removed != Some(true) {
            self.errors.push(format!("{item} removed from {leaf:?}, but wasn't there"));
        }
        if self.items.get(&leaf).is_some_and(|s| s.is_empty()) {
            self.items.remove(&leaf);
        }
    }

    fn link(&mut self, child: NodeId, parent: NodeId) {
        if let Some(old) = self.parents.insert(child, parent) {
            self.errors.push(format!("{child:?} linked to {parent:?}, still in {old:?}"));
        }
    }

    fn unlink(&mut self, child: NodeId, parent: NodeId) {
        if self.parents.remove(&child) != Some(parent) {
            self.errors.push(format!("{child:?} unlinked from {parent:?}, but wasn't there"));
        }
    }

    fn walk(&mut self, node: &Node<u32>, add: bool) {
        if node.is_leaf() {
            for (_, &item) in node.leaf_items() {
                match add {
                    true => self.add_item(item, node.id()),
                    false => self.remove_item(item, node.id()),
                }
            }
            return;
        }

        for child in node.children() {
            match add {
                true => self.link(child.id(), node.id()),
                false => self.unlink(child.id(), node.id()),
            }
            self.walk(child, add);
        }
    }

    /// Checks that the model matches the tree exactly
    fn assert_matches(&self, tree: &IndexedTree<u32>) {
        assert_eq!(self.errors, Vec::<String>::new());

        let mut expected = Model {
            root: tree.root().map(|r| r.id()),
            ..Model::default()
        };
        if let Some(root) = tree.root() {
            expected.walk(root, true);
        }

        assert_eq!(self.root, expected.root);
        assert_eq!(self.items, expected.items);
        assert_eq!(self.parents, expected.parents);
    }
}

impl TreeObserver<u32> for Model {
    fn root_changed(&mut self, new_root: Option<&Node<u32>>, is_clear: bool) -> ObserverResult {
        if is_clear {
            self.items.clear();
            self.parents.clear();
        }
        self.root = new_root.map(|r| r.id());
        Ok(())
    }

    fn item_added(&mut self, item: &u32, leaf: NodeId) -> ObserverResult {
        self.add_item(*item, leaf);
        Ok(())
    }

    fn item_removed(&mut self, item: &u32, leaf: NodeId) -> ObserverResult {
        self.remove_item(*item, leaf);
        Ok(())
    }

    fn node_added(&mut self, child: NodeId, parent: NodeId) -> ObserverResult {
        self.link(child, parent);
        Ok(())
    }

    fn node_removed(&mut self, child: NodeId, parent: NodeId) -> ObserverResult {
        self.unlink(child, parent);
        Ok(())
    }

    fn add_all(&mut self, node: &Node<u32>) -> ObserverResult {
        self.walk(node, true);
        Ok(())
    }

    fn remove_all(&mut self, node: &Node<u32>) -> ObserverResult {
        self.walk(node, false);
        Ok(())
    }

    fn checkpoint(&mut self) -> ObserverResult {
        self.checkpoints += 1;
        Ok(())
    }
}

fn tree_of(limits: NodeLimits, items: impl IntoIterator<Item = u32>) -> IndexedTree<u32> {
    let mut tree = IndexedTree::new(limits);
    tree.insert_range(0, items).unwrap();
    tree
}

#[test]
fn model_tracks_every_operation() {
    let limits = NodeLimits::new(3, 3);
    let mut tree = tree_of(limits, 0..40);
    let model = Model::shared();
    tree.observe(model.clone()).unwrap();
    model.borrow().assert_matches(&tree);

    let check = |tree: &IndexedTree<u32>, after: &str| {
        tree.validate();
        println!("after {after}");
        model.borrow().assert_matches(tree);
    };

    tree.insert(0, 1000).unwrap();
    check(&tree, "insert at front");
    tree.insert(tree.len() / 2, 1001).unwrap();
    check(&tree, "insert in the middle");
    tree.insert_range(7, 1100..1160).unwrap();
    check(&tree, "insert_range");
    tree.remove_range(3, 12).unwrap();
    check(&tree, "remove_range");
    tree.set(5, 1200).unwrap();
    check(&tree, "set");
    tree.remove_range(1, tree.len() - 1).unwrap();
    check(&tree, "remove all but one");

    // Splices with the other tree taller, shorter, then about the same height
    tree.append(&tree_of(limits, 1300..1360)).unwrap();
    check(&tree, "append taller");
    tree.prepend(&tree_of(limits, 1400..1405)).unwrap();
    check(&tree, "prepend shorter");
    let other = tree_of(limits, 2000..2000 + tree.len());
    tree.append(&other).unwrap();
    check(&tree, "append equal");

    let section = tree.remove_section(2, tree.len() / 2).unwrap();
    check(&tree, "remove_section");
    tree.prepend(&section).unwrap();
    check(&tree, "prepend removed section");
    tree.clear().unwrap();
    check(&tree, "clear");
    tree.insert_range(0, 0..10).unwrap();
    check(&tree, "insert after clear");

    assert!(model.borrow().checkpoints >= 14);
}

#[test]
fn clones_are_reported_as_replacements() {
    let mut tree = tree_of(NodeLimits::new(3, 3), 0..50);
    let model = Model::shared();
    tree.observe(model.clone()).unwrap();

    // Every write to a shared node replaces it
    let snapshot = tree.clone();
    tree.set(20, 500).unwrap();
    model.borrow().assert_matches(&tree);
    tree.remove_range(30, 10).unwrap();
    model.borrow().assert_matches(&tree);
    tree.insert_range(0, 600..620).unwrap();
    model.borrow().assert_matches(&tree);

    // The clone was never observed
    assert!(snapshot.iter().copied().eq(0..50));
}

#[test]
fn bottom_up_population() {
    struct Order {
        seen: Vec<(NodeId, NodeId)>,
    }

    impl TreeObserver<u32> for Order {
        fn attach(&mut self, _: Option<&Node<u32>>) -> Result<Populate, ObserverError> {
            Ok(Populate::BottomUp)
        }
        fn root_changed(&mut self, _: Option<&Node<u32>>, _: bool) -> ObserverResult {
            Ok(())
        }
        fn item_added(&mut self, _: &u32, _: NodeId) -> ObserverResult {
            Ok(())
        }
        fn item_removed(&mut self, _: &u32, _: NodeId) -> ObserverResult {
            Ok(())
        }
        fn node_added(&mut self, child: NodeId, parent: NodeId) -> ObserverResult {
            self.seen.push((child, parent));
            Ok(())
        }
        fn node_removed(&mut self, _: NodeId, _: NodeId) -> ObserverResult {
            Ok(())
        }
        fn add_all(&mut self, _: &Node<u32>) -> ObserverResult {
            Ok(())
        }
        fn remove_all(&mut self, _: &Node<u32>) -> ObserverResult {
            Ok(())
        }
    }

    let mut tree = tree_of(NodeLimits::new(3, 3), 0..30);
    let order = Rc::new(RefCell::new(Order { seen: Vec::new() }));
    tree.observe(order.clone()).unwrap();

    let order = order.borrow();
    let seen = &order.seen;
    let root = tree.root().unwrap().id();
    // The root's links come last, after everything beneath them
    let first_root_link = seen.iter().position(|(_, p)| *p == root).unwrap();
    assert!(seen[first_root_link..].iter().all(|(_, p)| *p == root));
    assert!(first_root_link > 0);
}

/// Observer that fails at the given method
struct Failing {
    on: &'static str,
}

impl TreeObserver<u32> for Failing {
    fn root_changed(&mut self, _: Option<&Node<u32>>, _: bool) -> ObserverResult {
        Ok(())
    }
    fn item_added(&mut self, _: &u32, _: NodeId) -> ObserverResult {
        match self.on {
            "item_added" => Err(ObserverError::failed("no more items")),
            _ => Ok(()),
        }
    }
    fn item_removed(&mut self, _: &u32, _: NodeId) -> ObserverResult {
        Ok(())
    }
    fn node_added(&mut self, _: NodeId, _: NodeId) -> ObserverResult {
        Ok(())
    }
    fn node_removed(&mut self, _: NodeId, _: NodeId) -> ObserverResult {
        Ok(())
    }
    fn add_all(&mut self, _: &Node<u32>) -> ObserverResult {
        Ok(())
    }
    fn remove_all(&mut self, _: &Node<u32>) -> ObserverResult {
        Ok(())
    }
    fn checkpoint(&mut self) -> ObserverResult {
        match self.on {
            "checkpoint" => Err(ObserverError::failed("rejected")),
            _ => Ok(()),
        }
    }
}

#[test]
fn failures_are_recorded_not_returned() {
    let mut tree = tree_of(NodeLimits::default(), 0..5);
    let model = Model::shared();
    tree.observe(Rc::new(RefCell::new(Failing { on: "item_added" })))
        .unwrap();
    tree.observe(model.clone()).unwrap();

    tree.insert(0, 100).unwrap();
    assert_eq!(tree.len(), 6);
    model.borrow().assert_matches(&tree);

    let failures = tree.observer_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].observer, 0);
    assert_eq!(failures[0].method, "item_added");
    assert_eq!(failures[0].error, ObserverError::failed("no more items"));
}

#[test]
fn checkpoint_failure_is_returned() {
    let mut tree = tree_of(NodeLimits::default(), 0..5);
    tree.observe(Rc::new(RefCell::new(Failing { on: "checkpoint" })))
        .unwrap();

    assert_eq!(
        tree.insert(0, 100),
        Err(TreeError::Observer(ObserverError::failed("rejected")))
    );
    // The change itself still happened
    assert_eq!(tree.get(0), Some(&100));
}

#[test]
fn unobserve_stops_notifications() {
    let mut tree = tree_of(NodeLimits::new(3, 3), 0..10);
    let model = Model::shared();
    tree.observe(model.clone()).unwrap();
    let shared: crate::SharedObserver<u32> = model.clone();
    assert!(tree.unobserve(&shared));
    assert!(!tree.unobserve(&shared));

    let before = model.borrow().checkpoints;
    tree.insert(0, 100).unwrap();
    assert_eq!(model.borrow().checkpoints, before);
}

#[test]
fn lookup_index_follows_tree() {
    let mut tree = tree_of(NodeLimits::new(3, 3), (0..60).map(|x| x * 2));
    let index = Rc::new(RefCell::new(LookupIndex::new()));
    tree.observe(index.clone()).unwrap();

    tree.remove_range(10, 15).unwrap();
    tree.insert_range(3, [7, 9, 11]).unwrap();
    tree.append(&tree_of(NodeLimits::new(3, 3), 200..230)).unwrap();
    tree.set(0, 1).unwrap();

    let index = index.borrow();
    for (i, item) in tree.iter().enumerate() {
        assert_eq!(index.index_of(item, tree.root()), Some(i as u32));
    }
    assert_eq!(index.index_of(&0, tree.root()), None);
    assert_eq!(index.index_of(&22, tree.root()), None);
    assert_eq!(index.distinct_len(), tree.len() as usize);
}

#[test]
fn lookup_index_only_attaches_once() {
    let mut a = tree_of(NodeLimits::default(), 0..3);
    let mut b = tree_of(NodeLimits::default(), 0..3);
    let index = Rc::new(RefCell::new(LookupIndex::new()));
    a.observe(index.clone()).unwrap();
    assert_eq!(
        b.observe(index.clone()),
        Err(TreeError::Observer(ObserverError::AlreadyAttached))
    );

    let shared: crate::SharedObserver<u32> = index.clone();
    assert!(a.unobserve(&shared));
    assert!(!index.borrow().is_attached());
    b.observe(index.clone()).unwrap();
    assert_eq!(index.borrow().index_of(&2, b.root()), Some(2));
}

fn node_ids(node: &Node<u32>, out: &mut Vec<NodeId>) {
    out.push(node.id());
    for child in node.children() {
        node_ids(child, out);
    }
}

fn assert_ids_unique(tree: &IndexedTree<u32>) {
    let mut ids = Vec::new();
    if let Some(root) = tree.root() {
        node_ids(root, &mut ids);
    }
    let distinct: BTreeSet<_> = ids.iter().copied().collect();
    assert_eq!(distinct.len(), ids.len(), "a node is linked more than once");
}

#[test]
fn lookup_index_survives_appending_own_nodes() {
    let limits = NodeLimits::new(3, 3);
    let sources: [fn(&IndexedTree<u32>) -> IndexedTree<u32>; 2] = [
        |t| t.clone(),
        |t| t.copy_section(0, t.len()).unwrap(),
    ];

    for source in sources {
        let mut tree = tree_of(limits, 0..30);
        let index = Rc::new(RefCell::new(LookupIndex::new()));
        tree.observe(index.clone()).unwrap();

        let other = source(&tree);
        tree.append(&other).unwrap();
        assert_ids_unique(&tree);
        for x in 0..30 {
            assert_eq!(index.borrow().index_of(&x, tree.root()), Some(x));
        }

        tree.remove_range(0, 30).unwrap();
        for x in 0..30 {
            assert_eq!(index.borrow().index_of(&x, tree.root()), Some(x));
        }
    }
}

#[test]
fn observing_after_self_append_unshares_nodes() {
    let mut tree = tree_of(NodeLimits::new(3, 3), 0..30);
    tree.prepend(&tree.clone()).unwrap();
    tree.append(&tree.copy_section(10, 40).unwrap()).unwrap();

    let model = Model::shared();
    tree.observe(model.clone()).unwrap();
    assert_ids_unique(&tree);
    model.borrow().assert_matches(&tree);

    let index = Rc::new(RefCell::new(LookupIndex::new()));
    tree.observe(index.clone()).unwrap();
    for x in 0..30 {
        assert_eq!(index.borrow().index_of(&x, tree.root()), Some(x));
    }

    tree.remove_range(0, 45).unwrap();
    model.borrow().assert_matches(&tree);
    let expected: Vec<u32> = (15..30).chain(10..30).chain(0..20).collect();
    assert_eq!(tree.iter().copied().collect::<Vec<_>>(), expected);
    for x in 0..30 {
        let first = expected.iter().position(|&y| y == x).map(|p| p as u32);
        assert_eq!(index.borrow().index_of(&x, tree.root()), first, "item {x}");
    }
}
