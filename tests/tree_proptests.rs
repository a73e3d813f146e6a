//! Property-based tests for `IndexedTree` and the collections built on it.
//!
//! Every property checks the tree against a plain `Vec` model, through the public API only.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use hyperion::param::NodeLimits;
use hyperion::{AList, BList, IndexedTree, Node, NodeId, ObserverResult, SparseAList, TreeObserver};
use proptest::prelude::*;

// ============================================================================
//  Strategies
// ============================================================================

/// Small limits, so that even short sequences build several levels
fn limits() -> impl Strategy<Value = NodeLimits> {
    (3_u16..=6, 3_u16..=6).prop_map(|(leaf, inner)| NodeLimits::new(leaf, inner))
}

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, u16),
    InsertRange(usize, Vec<u16>),
    Remove(usize, usize),
    Set(usize, u16),
}

/// Positions are taken modulo the length at the time the operation runs
fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), any::<u16>()).prop_map(|(i, x)| Op::Insert(i, x)),
        2 => (any::<usize>(), prop::collection::vec(any::<u16>(), 0..20))
            .prop_map(|(i, xs)| Op::InsertRange(i, xs)),
        2 => (any::<usize>(), 0_usize..15).prop_map(|(i, n)| Op::Remove(i, n)),
        1 => (any::<usize>(), any::<u16>()).prop_map(|(i, x)| Op::Set(i, x)),
    ]
}

fn apply(list: &mut AList<u16>, model: &mut Vec<u16>, op: &Op) {
    match op {
        Op::Insert(i, x) => {
            let i = i % (model.len() + 1);
            list.insert(i, *x).unwrap();
            model.insert(i, *x);
        }
        Op::InsertRange(i, xs) => {
            let i = i % (model.len() + 1);
            list.insert_range(i, xs.iter().copied()).unwrap();
            model.splice(i..i, xs.iter().copied());
        }
        Op::Remove(i, n) => {
            let i = i % (model.len() + 1);
            let end = (i + n).min(model.len());
            list.remove_range(i..end).unwrap();
            model.drain(i..end);
        }
        Op::Set(i, x) => {
            if !model.is_empty() {
                let i = i % model.len();
                assert_eq!(list.set(i, *x).unwrap(), model[i]);
                model[i] = *x;
            }
        }
    }
}

fn contents(list: &AList<u16>) -> Vec<u16> {
    list.iter().copied().collect()
}

// ============================================================================
//  List Properties
// ============================================================================

proptest! {
    /// Any sequence of edits leaves the list equal to the same edits on a `Vec`.
    #[test]
    fn matches_vec_model(limits in limits(), ops in prop::collection::vec(op(), 0..60)) {
        let mut list = AList::with_limits(limits);
        let mut model = Vec::new();
        for op in &ops {
            apply(&mut list, &mut model, op);
        }

        prop_assert_eq!(list.len(), model.len());
        prop_assert_eq!(contents(&list), model.clone());
        for (i, x) in model.iter().enumerate() {
            prop_assert_eq!(list.get(i), Some(x));
        }
    }

    /// Cutting a list in two and splicing it back together gives the original.
    #[test]
    fn split_then_merge(
        limits in limits(),
        items in prop::collection::vec(any::<u16>(), 0..300),
        at in any::<usize>(),
    ) {
        let mut list = AList::with_limits(limits);
        list.insert_range(0, items.iter().copied()).unwrap();
        let at = at % (items.len() + 1);

        let mut tail = list.remove_section(at..items.len()).unwrap();
        prop_assert_eq!(contents(&list), items[..at].to_vec());
        prop_assert_eq!(contents(&tail), items[at..].to_vec());

        tail.prepend(&list).unwrap();
        prop_assert_eq!(contents(&tail), items.clone());

        list.append(&tail).unwrap();
        let mut doubled = items[..at].to_vec();
        doubled.extend_from_slice(&items);
        prop_assert_eq!(contents(&list), doubled);
    }

    /// Inserting items one at a time and then removing every one of them, in any order, leaves
    /// the tree completely empty.
    #[test]
    fn insert_then_remove_all(
        limits in limits(),
        inserts in prop::collection::vec(any::<usize>(), 0..300),
        removes in prop::collection::vec(any::<usize>(), 300),
    ) {
        let mut list = AList::with_limits(limits);
        for (n, at) in inserts.iter().enumerate() {
            list.insert(at % (n + 1), n as u16).unwrap();
        }
        prop_assert_eq!(list.len(), inserts.len());

        for at in removes.iter().take(inserts.len()) {
            let at = at % list.len();
            list.remove_at(at).unwrap();
        }
        prop_assert_eq!(list.len(), 0);
        prop_assert!(list.as_tree().root().is_none());
        prop_assert_eq!(list.as_tree().height(), 0);
    }

    /// Edits to a clone never show up in the original, and vice versa.
    #[test]
    fn clones_are_isolated(
        limits in limits(),
        items in prop::collection::vec(any::<u16>(), 0..200),
        ops_a in prop::collection::vec(op(), 0..30),
        ops_b in prop::collection::vec(op(), 0..30),
    ) {
        let mut a = AList::with_limits(limits);
        a.insert_range(0, items.iter().copied()).unwrap();
        let mut b = a.clone();

        let (mut model_a, mut model_b) = (items.clone(), items.clone());
        for op in &ops_a {
            apply(&mut a, &mut model_a, op);
        }
        for op in &ops_b {
            apply(&mut b, &mut model_b, op);
        }

        prop_assert_eq!(contents(&a), model_a);
        prop_assert_eq!(contents(&b), model_b);
    }

    /// An indexed list finds every item at its first position.
    #[test]
    fn index_matches_position(
        limits in limits(),
        items in prop::collection::vec(0_u16..40, 0..150),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let mut list = AList::with_limits(limits);
        list.insert_range(0, items.iter().copied()).unwrap();
        list.enable_index().unwrap();
        let mut model = items;
        for op in &ops {
            apply(&mut list, &mut model, op);
        }

        for x in 0..40_u16 {
            let expected = model.iter().position(|y| *y == x);
            prop_assert_eq!(list.index_of(&x), expected);
        }
    }

    /// Copying a section gives the matching slice, and leaves the source alone.
    #[test]
    fn copy_section_is_slice(
        limits in limits(),
        items in prop::collection::vec(any::<u16>(), 0..300),
        a in any::<usize>(),
        b in any::<usize>(),
    ) {
        let mut list = AList::with_limits(limits);
        list.insert_range(0, items.iter().copied()).unwrap();
        let (a, b) = (a % (items.len() + 1), b % (items.len() + 1));
        let range = a.min(b)..a.max(b);

        let section = list.copy_section(range.clone()).unwrap();
        prop_assert_eq!(contents(&section), items[range].to_vec());
        prop_assert_eq!(contents(&list), items);
    }
}

// ============================================================================
//  Sorted Properties
// ============================================================================

proptest! {
    /// A sorted list stays sorted, and its bounds match `partition_point` on the model.
    #[test]
    fn sorted_bounds(
        items in prop::collection::vec(0_u16..100, 0..200),
        keys in prop::collection::vec(0_u16..110, 1..20),
    ) {
        let mut list = BList::with_limits(NodeLimits::new(3, 3));
        for x in &items {
            list.add(*x).unwrap();
        }
        let mut model = items;
        model.sort();

        prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), model.clone());
        for p in &keys {
            prop_assert_eq!(list.lower_bound(p), model.partition_point(|x| x < p));
            prop_assert_eq!(list.upper_bound(p), model.partition_point(|x| x <= p));
            prop_assert_eq!(list.contains(p), model.binary_search(p).is_ok());
        }
    }
}

// ============================================================================
//  Sparse Properties
// ============================================================================

proptest! {
    /// Neighbor searches agree with a scan over an `Option` model.
    #[test]
    fn sparse_neighbors(
        len in 1_usize..500,
        set in prop::collection::vec((any::<usize>(), any::<u8>()), 0..60),
        from in any::<usize>(),
    ) {
        let mut list = SparseAList::with_limits(NodeLimits::new(3, 3));
        list.insert_space(0, len).unwrap();
        let mut model = vec![None; len];
        for (i, x) in set {
            let i = i % len;
            list.set(i, x).unwrap();
            model[i] = Some(x);
        }

        let from = from % len;
        let higher = model.iter().enumerate().skip(from + 1).find_map(|(i, x)| x.map(|x| (i, x)));
        let mut at = Some(from);
        prop_assert_eq!(list.next_higher_item(&mut at).copied(), higher.map(|(_, x)| x));
        prop_assert_eq!(at, higher.map(|(i, _)| i));

        let lower = model[..from].iter().enumerate().rev().find_map(|(i, x)| x.map(|x| (i, x)));
        let mut at = Some(from);
        prop_assert_eq!(list.next_lower_item(&mut at).copied(), lower.map(|(_, x)| x));
        prop_assert_eq!(at, lower.map(|(i, _)| i));

        let expected: Vec<(usize, u8)> =
            model.iter().enumerate().filter_map(|(i, x)| x.map(|x| (i, x))).collect();
        prop_assert_eq!(list.iter_set().map(|(i, x)| (i, *x)).collect::<Vec<_>>(), expected);
    }
}

// ============================================================================
//  Observer Properties
// ============================================================================

proptest! {
    /// A listener is told about exactly the changes that happen, and a veto prevents them.
    #[test]
    fn listener_sees_every_change(
        limits in limits(),
        ops in prop::collection::vec(op(), 0..40),
        veto_removals in any::<bool>(),
    ) {
        let mut tree: IndexedTree<u16> = IndexedTree::new(limits);
        let net = Rc::new(RefCell::new(0_i64));
        let seen = net.clone();
        tree.on_changing(move |info| {
            if veto_removals && info.size_change < 0 {
                return Err(hyperion::Veto::new("no removals"));
            }
            *seen.borrow_mut() += info.size_change;
            Ok(())
        });

        for op in &ops {
            let len = tree.len() as usize;
            match op {
                Op::Insert(i, x) => tree.insert((i % (len + 1)) as u32, *x).unwrap(),
                Op::InsertRange(i, xs) => {
                    tree.insert_range((i % (len + 1)) as u32, xs.iter().copied()).unwrap()
                }
                Op::Remove(i, n) => {
                    let i = i % (len + 1);
                    let n = (*n).min(len - i);
                    let result = tree.remove_range(i as u32, n as u32);
                    prop_assert_eq!(result.is_err(), veto_removals && n > 0);
                }
                Op::Set(i, x) if len > 0 => drop(tree.set((i % len) as u32, *x).unwrap()),
                Op::Set(..) => {}
            }
        }

        prop_assert_eq!(*net.borrow(), tree.len() as i64);
    }
}

/// Replays notifications into a count of each item
#[derive(Default)]
struct Counts {
    counts: HashMap<u16, i64>,
}

impl Counts {
    fn walk(&mut self, node: &Node<u16>, delta: i64) {
        for (_, item) in node.leaf_items() {
            *self.counts.entry(*item).or_default() += delta;
        }
        for child in node.children() {
            self.walk(child, delta);
        }
    }

    fn nonzero(&self) -> HashMap<u16, i64> {
        self.counts.iter().filter(|(_, c)| **c != 0).map(|(k, c)| (*k, *c)).collect()
    }
}

impl TreeObserver<u16> for Counts {
    fn root_changed(&mut self, _: Option<&Node<u16>>, is_clear: bool) -> ObserverResult {
        if is_clear {
            self.counts.clear();
        }
        Ok(())
    }

    fn item_added(&mut self, item: &u16, _: NodeId) -> ObserverResult {
        *self.counts.entry(*item).or_default() += 1;
        Ok(())
    }

    fn item_removed(&mut self, item: &u16, _: NodeId) -> ObserverResult {
        *self.counts.entry(*item).or_default() -= 1;
        Ok(())
    }

    fn node_added(&mut self, _: NodeId, _: NodeId) -> ObserverResult {
        Ok(())
    }

    fn node_removed(&mut self, _: NodeId, _: NodeId) -> ObserverResult {
        Ok(())
    }

    fn add_all(&mut self, node: &Node<u16>) -> ObserverResult {
        self.walk(node, 1);
        Ok(())
    }

    fn remove_all(&mut self, node: &Node<u16>) -> ObserverResult {
        self.walk(node, -1);
        Ok(())
    }
}

proptest! {
    /// Replaying the notifications reproduces exactly the items in the list, including across
    /// clones (which share nodes) and splices.
    #[test]
    fn observer_counts_match(
        limits in limits(),
        items in prop::collection::vec(0_u16..50, 0..100),
        ops in prop::collection::vec(op(), 0..40),
        splice_at in prop::collection::vec(any::<bool>(), 0..40),
    ) {
        let mut list = AList::with_limits(limits);
        list.insert_range(0, items.iter().copied()).unwrap();
        let counts = Rc::new(RefCell::new(Counts::default()));
        list.observe(counts.clone()).unwrap();

        let mut model = items;
        let _snapshot = list.clone();
        for (i, op) in ops.iter().enumerate() {
            apply(&mut list, &mut model, op);
            if splice_at.get(i) == Some(&true) {
                let other = list.clone();
                list.append(&other).unwrap();
                model.extend_from_slice(&model.clone());
            }

            let mut expected: HashMap<u16, i64> = HashMap::new();
            for x in &model {
                *expected.entry(*x).or_default() += 1;
            }
            prop_assert_eq!(counts.borrow().nonzero(), expected);
        }
    }
}

#[derive(Debug, Clone)]
enum SparseOp {
    Insert(usize, u16),
    Space(usize, usize),
    Set(usize, u16),
    Clear(usize, usize),
    Remove(usize, usize),
    AppendClone,
    PrependSection(usize, usize),
}

fn sparse_op() -> impl Strategy<Value = SparseOp> {
    prop_oneof![
        3 => (any::<usize>(), 0_u16..50).prop_map(|(i, x)| SparseOp::Insert(i, x)),
        2 => (any::<usize>(), 1_usize..30).prop_map(|(i, n)| SparseOp::Space(i, n)),
        4 => (any::<usize>(), 0_u16..50).prop_map(|(i, x)| SparseOp::Set(i, x)),
        1 => (any::<usize>(), 0_usize..20).prop_map(|(i, n)| SparseOp::Clear(i, n)),
        1 => (any::<usize>(), 0_usize..20).prop_map(|(i, n)| SparseOp::Remove(i, n)),
        1 => Just(SparseOp::AppendClone),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| SparseOp::PrependSection(a, b)),
    ]
}

fn apply_sparse(list: &mut SparseAList<u16>, model: &mut Vec<Option<u16>>, op: &SparseOp) {
    let span = |i: usize, n: usize| {
        let i = i % (model.len() + 1);
        i..(i + n).min(model.len())
    };
    match op {
        SparseOp::Insert(i, x) => {
            let i = i % (model.len() + 1);
            list.insert(i, *x).unwrap();
            model.insert(i, Some(*x));
        }
        SparseOp::Space(i, n) => {
            let i = i % (model.len() + 1);
            list.insert_space(i, *n).unwrap();
            model.splice(i..i, std::iter::repeat(None).take(*n));
        }
        SparseOp::Set(i, x) => {
            if !model.is_empty() {
                let i = i % model.len();
                assert_eq!(list.set(i, *x).unwrap(), model[i]);
                model[i] = Some(*x);
            }
        }
        SparseOp::Clear(i, n) => {
            let range = span(*i, *n);
            list.clear_space(range.clone()).unwrap();
            model[range].fill(None);
        }
        SparseOp::Remove(i, n) => {
            let range = span(*i, *n);
            list.remove_range(range.clone()).unwrap();
            model.drain(range);
        }
        SparseOp::AppendClone => {
            if model.len() < 1000 {
                let other = list.clone();
                list.append(&other).unwrap();
                model.extend_from_slice(&model.clone());
            }
        }
        SparseOp::PrependSection(a, b) => {
            let (a, b) = (a % (model.len() + 1), b % (model.len() + 1));
            let range = a.min(b)..a.max(b);
            let section = list.copy_section(range.clone()).unwrap();
            list.prepend(&section).unwrap();
            let copied = model[range].to_vec();
            model.splice(0..0, copied);
        }
    }
}

proptest! {
    /// The counting observer stays exact on sparse lists, where moving, splitting and clearing
    /// leaves also moves empty space between them.
    #[test]
    fn sparse_observer_counts_match(
        limits in limits(),
        len in 0_usize..60,
        ops in prop::collection::vec(sparse_op(), 0..50),
    ) {
        let mut list = SparseAList::with_limits(limits);
        list.insert_space(0, len).unwrap();
        let counts = Rc::new(RefCell::new(Counts::default()));
        list.observe(counts.clone()).unwrap();

        let mut model = vec![None; len];
        for op in &ops {
            apply_sparse(&mut list, &mut model, op);

            let mut expected: HashMap<u16, i64> = HashMap::new();
            for x in model.iter().flatten() {
                *expected.entry(*x).or_default() += 1;
            }
            prop_assert_eq!(counts.borrow().nonzero(), expected);
            prop_assert_eq!(list.len(), model.len());
        }

        let set: Vec<(usize, u16)> =
            model.iter().enumerate().filter_map(|(i, x)| x.map(|x| (i, x))).collect();
        prop_assert_eq!(list.iter_set().map(|(i, x)| (i, *x)).collect::<Vec<_>>(), set);
    }

    /// An indexed list keeps finding every item at its first position when it is spliced with
    /// clones of itself and with sections copied out of it, which share its nodes.
    #[test]
    fn index_survives_splices(
        limits in limits(),
        items in prop::collection::vec(0_u16..40, 0..80),
        steps in prop::collection::vec((op(), 0_u8..4, any::<usize>(), any::<usize>()), 0..25),
    ) {
        let mut list = AList::with_limits(limits);
        list.insert_range(0, items.iter().copied()).unwrap();
        list.enable_index().unwrap();

        let mut model = items;
        for (op, splice, a, b) in &steps {
            apply(&mut list, &mut model, op);
            let (a, b) = (a % (model.len() + 1), b % (model.len() + 1));
            let range = a.min(b)..a.max(b);

            if model.len() < 1000 {
                match splice {
                    0 => {
                        let other = list.clone();
                        list.append(&other).unwrap();
                        model.extend_from_slice(&model.clone());
                    }
                    1 => {
                        let section = list.copy_section(range.clone()).unwrap();
                        list.prepend(&section).unwrap();
                        let copied = model[range].to_vec();
                        model.splice(0..0, copied);
                    }
                    2 => {
                        let section = list.copy_section(range.clone()).unwrap();
                        list.append(&section).unwrap();
                        model.extend_from_slice(&model[range].to_vec());
                    }
                    _ => {}
                }
            }

            for x in 0..40_u16 {
                prop_assert_eq!(list.index_of(&x), model.iter().position(|y| *y == x));
            }
        }
        prop_assert_eq!(contents(&list), model);
    }
}
