use std::cell::RefCell;
use std::rc::Rc;

use crate::param::NodeLimits;
use crate::{IndexedTree, KeyOrder, OnEqual, TreeError};

fn identity(x: &u32) -> u32 {
    *x
}

fn sorted_tree(limits: NodeLimits) -> IndexedTree<u32, u32> {
    IndexedTree::new_sorted(limits, KeyOrder::new(identity))
}

fn add(tree: &mut IndexedTree<u32, u32>, item: u32) {
    let (i, _) = tree.find_by_key(&item, false).unwrap();
    tree.insert(i, item).unwrap();
}

#[test]
fn bounds_with_duplicates() {
    let mut tree = sorted_tree(NodeLimits::new(3, 3));
    for i in 0..100 {
        add(&mut tree, (i * 7) % 50);
        tree.validate();
    }

    for k in 0..50 {
        assert_eq!(tree.find_by_key(&k, true), Ok((2 * k, true)));
        assert_eq!(tree.find_by_key(&k, false), Ok((2 * k + 2, true)));
    }
    assert_eq!(tree.find_by_key(&50, true), Ok((100, false)));
    assert_eq!(tree.find_by_key(&50, false), Ok((100, false)));
}

#[test]
fn missing_keys() {
    let mut tree = sorted_tree(NodeLimits::new(3, 4));
    for i in 0..40 {
        add(&mut tree, i * 10);
    }

    assert_eq!(tree.find_by_key(&0, true), Ok((0, true)));
    assert_eq!(tree.find_by_key(&5, true), Ok((1, false)));
    assert_eq!(tree.find_by_key(&5, false), Ok((1, false)));
    assert_eq!(tree.find_by_key(&395, true), Ok((40, false)));
    assert_eq!(tree.find_by_key(&390, false), Ok((40, true)));
}

#[test]
fn cached_keys_follow_removal() {
    let mut tree = sorted_tree(NodeLimits::new(3, 3));
    for i in 0..60 {
        add(&mut tree, i);
    }

    // Removing the end of each leaf changes the highest key of its subtree
    tree.remove_range(50, 10).unwrap();
    tree.validate();
    assert_eq!(tree.find_by_key(&55, true), Ok((50, false)));

    tree.remove_range(10, 20).unwrap();
    tree.validate();
    assert_eq!(tree.find_by_key(&30, true), Ok((10, true)));
    assert_eq!(tree.find_by_key(&20, false), Ok((10, false)));

    tree.set(9, 25).unwrap();
    tree.validate();
    assert_eq!(tree.find_by_key(&25, true), Ok((9, true)));
}

#[test]
fn sections_keep_keys() {
    let mut tree = sorted_tree(NodeLimits::new(3, 3));
    for i in 0..80 {
        add(&mut tree, i);
    }

    let section = tree.copy_section(20, 40).unwrap();
    section.validate();
    assert_eq!(section.find_by_key(&35, true), Ok((15, true)));
    assert!(section.key_order().is_some());

    let mut high = sorted_tree(NodeLimits::new(3, 3));
    for i in 100..130 {
        add(&mut high, i);
    }
    tree.append(&high).unwrap();
    tree.validate();
    assert_eq!(tree.find_by_key(&100, true), Ok((80, true)));
}

#[test]
fn custom_comparer() {
    let order: KeyOrder<String, usize> = KeyOrder::with_comparer(|s| s.len(), |a, b| b.cmp(a));
    let mut tree: IndexedTree<String, usize> = IndexedTree::new_sorted(NodeLimits::new(3, 3), order);
    for word in ["a", "bbb", "cc", "dddd", "ee", "f"] {
        let (i, _) = tree.find_by_key(&word.len(), false).unwrap();
        tree.insert(i, word.to_owned()).unwrap();
    }
    tree.validate();

    let words: Vec<&str> = tree.iter().map(|s| s.as_str()).collect();
    assert_eq!(words, ["dddd", "bbb", "cc", "ee", "a", "f"]);
    assert_eq!(tree.find_by_key(&2, true), Ok((2, true)));
}

#[test]
fn unsorted_tree_has_no_keys() {
    let mut tree: IndexedTree<u32> = IndexedTree::new(NodeLimits::default());
    assert_eq!(tree.find_by_key(&(), true), Err(TreeError::NotSorted));
    assert_eq!(tree.insert_sorted(1, OnEqual::Replace), Err(TreeError::NotSorted));
}

#[test]
fn insert_sorted_goes_after_equal_items() {
    let mut tree = sorted_tree(NodeLimits::new(3, 3));
    let mut model: Vec<u32> = Vec::new();
    for i in 0..120 {
        let item = (i * 37) % 41;
        let expected = model.partition_point(|&x| x <= item);
        model.insert(expected, item);
        assert_eq!(tree.insert_sorted(item, OnEqual::InsertAfter), Ok((expected as u32, None)));
        tree.validate();
    }
    assert!(tree.iter().eq(model.iter()));
}

#[test]
fn insert_sorted_replaces_equal_key() {
    fn first(pair: &(u32, char)) -> u32 {
        pair.0
    }

    let mut tree = IndexedTree::new_sorted(NodeLimits::new(3, 3), KeyOrder::new(first));
    for k in 0..30 {
        assert_eq!(tree.insert_sorted((k * 2, 'a'), OnEqual::Replace), Ok((k, None)));
    }
    let version = tree.version();
    assert_eq!(tree.insert_sorted((10, 'b'), OnEqual::Replace), Ok((5, Some((10, 'a')))));
    assert_ne!(tree.version(), version);
    assert_eq!(tree.insert_sorted((11, 'c'), OnEqual::Replace), Ok((6, None)));
    tree.validate();

    assert_eq!(tree.len(), 31);
    assert_eq!(tree.get(5), Some(&(10, 'b')));
    assert_eq!(tree.find_by_key(&58, true), Ok((30, true)));
}

#[test]
fn insert_sorted_reports_position_to_listeners() {
    let mut tree = sorted_tree(NodeLimits::new(3, 3));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    tree.on_changing(move |info| {
        log.borrow_mut().push(info.index);
        Ok(())
    });

    for item in [5, 1, 9, 5] {
        tree.insert_sorted(item, OnEqual::InsertAfter).unwrap();
    }
    assert_eq!(*seen.borrow(), [0, 0, 2, 2]);
    assert!(tree.iter().copied().eq([1, 5, 5, 9]));
}
