use std::cell::RefCell;
use std::rc::Rc;

use crate::param::NodeLimits;
use crate::{ChangeAction, FreezeMode, IndexedTree, TreeError, Veto};

fn tree_of(limits: NodeLimits, items: impl IntoIterator<Item = u32>) -> IndexedTree<u32> {
    let mut tree = IndexedTree::new(limits);
    tree.insert_range(0, items).unwrap();
    tree.validate();
    tree
}

fn contents<K: Clone>(tree: &IndexedTree<u32, K>) -> Vec<u32> {
    tree.iter().copied().collect()
}

#[test]
fn reverse_insert_splits_root() {
    let mut tree: IndexedTree<char> = IndexedTree::new(NodeLimits::new(3, 3));
    for c in ['a', 'b', 'c', 'd', 'e'] {
        tree.insert(0, c).unwrap();
        tree.validate();
    }

    assert_eq!(tree.iter().collect::<String>(), "edcba");
    assert!(tree.height() >= 2);

    let root = tree.root().unwrap();
    let totals: u32 = root.children().map(|c| c.total_count()).sum();
    assert_eq!(totals, 5);
    assert_eq!(root.total_count(), 5);
}

#[test]
fn clone_is_isolated() {
    let original = tree_of(NodeLimits::new(4, 4), 0..100);
    let mut clone = original.clone();
    clone.remove_range(40, 20).unwrap();
    clone.validate();
    original.validate();

    assert_eq!(original.len(), 100);
    assert_eq!(original.get(50), Some(&50));
    assert_eq!(clone.len(), 80);
    assert_eq!(clone.get(40), Some(&60));
}

#[test]
fn clone_shares_until_written() {
    let original = tree_of(NodeLimits::new(3, 3), 0..50);
    let mut clone = original.clone();
    assert_eq!(clone.root().unwrap().id(), original.root().unwrap().id());

    enable_debug!();
    clone.set(0, 1000).unwrap();
    disable_debug!();
    assert_ne!(clone.root().unwrap().id(), original.root().unwrap().id());

    // Only the path to the first leaf was copied
    let last = |t: &IndexedTree<u32>| t.root().unwrap().children().last().unwrap().id();
    assert_eq!(last(&clone), last(&original));
    assert_eq!(original.get(0), Some(&0));
}

#[test]
fn out_of_bounds() {
    let mut tree = tree_of(NodeLimits::default(), 0..10);
    assert_eq!(
        tree.insert(11, 0),
        Err(TreeError::IndexOutOfBounds { index: 11, len: 10 })
    );
    assert!(tree.remove_range(5, 6).is_err());
    assert!(tree.set(10, 0).is_err());
    assert!(tree.remove_at(10).is_err());
    assert_eq!(tree.get(10), None);
    assert_eq!(tree.remove_range(10, 0), Ok(()));
    assert_eq!(contents(&tree), (0..10).collect::<Vec<_>>());
}

#[test]
fn next_higher_and_lower_dense() {
    let tree = tree_of(NodeLimits::new(3, 3), 0..20);
    assert_eq!(tree.next_higher(None), Some((0, &0)));
    assert_eq!(tree.next_higher(Some(8)), Some((9, &9)));
    assert_eq!(tree.next_higher(Some(19)), None);
    assert_eq!(tree.next_lower(Some(9)), Some((8, &8)));
    assert_eq!(tree.next_lower(None), Some((19, &19)));
    assert_eq!(tree.next_lower(Some(0)), None);
}

#[test]
fn iter_from_middle() {
    let tree = tree_of(NodeLimits::new(3, 3), 0..40);
    assert!(tree.iter_from(17).copied().eq(17..40));
    assert_eq!(tree.iter_from(40).next(), None);
    assert_eq!(tree.iter().count(), 40);
    assert_eq!(tree.iter_from(30).size_hint(), (10, Some(10)));
}

#[test]
fn freeze_is_permanent() {
    let mut tree = tree_of(NodeLimits::default(), 0..5);
    tree.freeze();
    assert!(tree.is_frozen());
    assert_eq!(tree.freeze_mode(), FreezeMode::Frozen);
    assert_eq!(tree.insert(0, 9), Err(TreeError::Frozen));
    assert_eq!(tree.set(0, 9), Err(TreeError::Frozen));
    assert_eq!(tree.clear(), Err(TreeError::Frozen));
    assert_eq!(tree.force_clear(), Err(TreeError::Frozen));
    assert_eq!(tree.len(), 5);

    let mut clone = tree.clone();
    assert!(!clone.is_frozen());
    clone.insert(0, 9).unwrap();
    assert_eq!(tree.get(0), Some(&0));
}

#[test]
fn temporary_modes_reject_mutation() {
    let mut tree = tree_of(NodeLimits::default(), 0..5);
    for mode in [FreezeMode::FrozenDuringCallback, FreezeMode::FrozenDuringMutation] {
        tree.set_mode(mode);
        assert_eq!(tree.insert(0, 9), Err(TreeError::ConcurrentModification));
        assert_eq!(tree.remove_range(0, 1), Err(TreeError::ConcurrentModification));
        tree.set_mode(FreezeMode::Mutable);
    }
    assert_eq!(tree.len(), 5);
}

#[test]
fn listeners_see_changes_first() {
    let mut tree = tree_of(NodeLimits::default(), 0..5);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    tree.on_changing(move |info| {
        log.borrow_mut()
            .push((info.action, info.index, info.size_change, info.new_items.to_vec()));
        Ok(())
    });

    tree.insert(2, 7).unwrap();
    tree.remove_range(0, 3).unwrap();
    tree.set(1, 8).unwrap();
    tree.clear().unwrap();

    assert_eq!(
        *seen.borrow(),
        [
            (ChangeAction::Add, 2, 1, vec![7]),
            (ChangeAction::Remove, 0, -3, vec![]),
            (ChangeAction::Replace, 1, 0, vec![8]),
            (ChangeAction::Clear, 0, -3, vec![]),
        ]
    );
}

#[test]
fn veto_leaves_tree_untouched() {
    let mut tree = tree_of(NodeLimits::new(3, 3), 0..10);
    tree.on_changing(|info| match info.action {
        ChangeAction::Remove | ChangeAction::Clear => Err(Veto::new("read-mostly")),
        _ => Ok(()),
    });

    let vetoed = Err(TreeError::Vetoed(Veto::new("read-mostly")));
    assert_eq!(tree.remove_range(0, 4), vetoed);
    assert_eq!(tree.clear(), vetoed);
    assert_eq!(tree.len(), 10);
    assert_eq!(tree.freeze_mode(), FreezeMode::Mutable);

    tree.insert(0, 99).unwrap();
    assert_eq!(tree.get(0), Some(&99));

    // force_clear reports the veto, but clears anyway
    assert_eq!(tree.force_clear(), vetoed);
    assert!(tree.is_empty());
    tree.validate();
}

#[test]
fn cursor_invalidated_by_structure() {
    let mut tree = tree_of(NodeLimits::new(3, 3), 0..10);
    let mut cursor = tree.cursor(3).unwrap();
    assert_eq!(tree.cursor_get(&cursor), Ok(Some(&3)));
    assert_eq!(tree.cursor_move(&mut cursor, 4), Ok(true));
    assert_eq!(cursor.index(), 7);
    assert_eq!(tree.cursor_move(&mut cursor, 4), Ok(false));
    assert_eq!(tree.cursor_move(&mut cursor, -7), Ok(true));
    assert_eq!(cursor.index(), 0);

    let version = tree.version();
    tree.set(0, 50).unwrap();
    assert_ne!(tree.version(), version);
    assert_eq!(tree.cursor_get(&cursor), Err(TreeError::ConcurrentModification));

    let mut cursor = tree.cursor(0).unwrap();
    assert_eq!(tree.cursor_get(&cursor), Ok(Some(&50)));
    tree.insert(0, 1).unwrap();
    assert_eq!(tree.cursor_move(&mut cursor, 1), Err(TreeError::ConcurrentModification));
    assert!(tree.cursor(12).is_err());
    assert_eq!(tree.cursor_get(&tree.cursor(11).unwrap()), Ok(None));
}

#[test]
fn cursor_move_rejects_extreme_deltas() {
    let tree = tree_of(NodeLimits::default(), 0..1);
    let mut cursor = tree.cursor(1).unwrap();
    assert_eq!(tree.cursor_move(&mut cursor, i64::MAX), Ok(false));
    assert_eq!(tree.cursor_move(&mut cursor, i64::MIN), Ok(false));
    assert_eq!(cursor.index(), 1);
    assert_eq!(tree.cursor_move(&mut cursor, -1), Ok(true));
    assert_eq!(tree.cursor_get(&cursor), Ok(Some(&0)));
}

#[test]
fn append_every_height() {
    let limits = NodeLimits::new(3, 3);
    for small in [0, 1, 4, 9, 30] {
        for large in [0, 2, 5, 27, 90] {
            let mut a = tree_of(limits, 0..small);
            let b = tree_of(limits, small..small + large);
            a.append(&b).unwrap();
            a.validate();
            b.validate();
            assert!(a.iter().copied().eq(0..small + large));

            let mut c = tree_of(limits, small..small + large);
            c.prepend(&tree_of(limits, 0..small)).unwrap();
            c.validate();
            assert!(c.iter().copied().eq(0..small + large));
        }
    }
}

#[test]
fn append_with_different_limits() {
    let mut a = tree_of(NodeLimits::new(3, 3), 0..20);
    let b = tree_of(NodeLimits::new(5, 4), 20..50);
    a.append(&b).unwrap();
    a.validate();
    assert_eq!(a.limits(), NodeLimits::new(3, 3));
    assert!(a.iter().copied().eq(0..50));
}

#[test]
fn sparse_into_dense_fails() {
    let mut dense = tree_of(NodeLimits::default(), 0..3);
    let mut sparse: IndexedTree<u32> = IndexedTree::new_sparse(NodeLimits::default());
    sparse.insert_space(0, 4).unwrap();
    assert_eq!(dense.append(&sparse), Err(TreeError::NotSparse));
    assert_eq!(dense.insert_space(0, 1), Err(TreeError::NotSparse));

    // The other way around is fine
    sparse.append(&dense).unwrap();
    sparse.validate();
    assert_eq!(sparse.len(), 7);
    assert_eq!(sparse.get(5), Some(&1));
    assert!(!sparse.is_set(3));
}

#[test]
fn copy_and_remove_sections() {
    let mut tree = tree_of(NodeLimits::new(3, 3), 0..100);
    for (start, n) in [(0, 0), (0, 100), (10, 50), (33, 1), (97, 3)] {
        let copy = tree.copy_section(start, n).unwrap();
        copy.validate();
        assert!(copy.iter().copied().eq(start..start + n));
    }
    assert!(tree.copy_section(90, 11).is_err());

    let cut = tree.remove_section(10, 50).unwrap();
    cut.validate();
    tree.validate();
    assert!(cut.iter().copied().eq(10..60));
    assert!(tree.iter().copied().eq((0..10).chain(60..100)));
}

#[test]
fn insert_range_at_every_point() {
    let limits = NodeLimits::new(4, 3);
    for at in 0..=20 {
        let mut tree = tree_of(limits, (0..20).map(|x| x * 10));
        tree.insert_range(at, 1000..1013).unwrap();
        tree.validate();

        let mut expected: Vec<u32> = (0..20).map(|x| x * 10).collect();
        expected.splice(at as usize..at as usize, 1000..1013);
        assert_eq!(contents(&tree), expected);
    }
}
