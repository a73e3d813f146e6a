use crate::param::NodeLimits;
use crate::AList;

#[test]
fn insert_past_end() {
    let mut list_0 = AList::with_limits(NodeLimits::new(3, 3));
    list_0.insert(0, 'A').unwrap();
    assert!(list_0.insert(2, 'B').is_err());
    list_0.insert(1, 'B').unwrap();
    assert_eq!(list_0.get(2), None);
    assert_eq!(list_0.iter().cloned().collect::<Vec<_>>(), ['A', 'B']);
    list_0.as_tree().validate();
}

#[test]
fn insert_range_into_full_leaf() {
    let mut list_0 = AList::with_limits(NodeLimits::new(3, 3));
    list_0.insert_range(0, ['A', 'B', 'C', 'D', 'E', 'F', 'G']).unwrap();
    list_0.as_tree().validate();
    list_0.insert_range(3, ['X', 'Y', 'Z', 'W']).unwrap();
    list_0.as_tree().validate();
    assert_eq!(
        list_0.iter().cloned().collect::<Vec<_>>(),
        ['A', 'B', 'C', 'X', 'Y', 'Z', 'W', 'D', 'E', 'F', 'G']
    );
    assert_eq!(list_0.get(6), Some(&'W'));
    assert_eq!(list_0.get(7), Some(&'D'));
}

#[test]
fn remove_across_leaves() {
    let mut list_0 = AList::with_limits(NodeLimits::new(3, 3));
    list_0.insert_range(0, 'A'..='T').unwrap();
    list_0.as_tree().validate();
    list_0.remove_range(2..17).unwrap();
    list_0.as_tree().validate();
    assert_eq!(list_0.iter().cloned().collect::<Vec<_>>(), ['A', 'B', 'R', 'S', 'T']);
    assert!(list_0.remove_range(4..6).is_err());
    list_0.remove_range(0..5).unwrap();
    list_0.as_tree().validate();
    assert_eq!(list_0.len(), 0);
    assert_eq!(list_0.as_tree().height(), 0);
    list_0.insert(0, 'Q').unwrap();
    assert_eq!(list_0.get(0), Some(&'Q'));
}

#[test]
fn set_then_remove_front() {
    let mut list_0 = AList::with_limits(NodeLimits::new(4, 3));
    list_0.insert_range(0, ['K', 'L', 'M']).unwrap();
    assert_eq!(list_0.set(1, 'B'), Ok('L'));
    assert!(list_0.set(3, 'B').is_err());
    list_0.insert(0, 'J').unwrap();
    list_0.insert(0, 'I').unwrap();
    list_0.insert(0, 'H').unwrap();
    list_0.as_tree().validate();
    list_0.remove_range(0..1).unwrap();
    list_0.as_tree().validate();
    assert_eq!(list_0.iter().cloned().collect::<Vec<_>>(), ['I', 'J', 'K', 'B', 'M']);
}

#[test]
fn alternating_front_and_back() {
    let mut list_0 = AList::with_limits(NodeLimits::new(3, 3));
    for i in 0..30_u32 {
        match i % 2 {
            0 => list_0.insert(0, i).unwrap(),
            _ => list_0.push(i).unwrap(),
        }
        list_0.as_tree().validate();
    }

    let expected: Vec<u32> = (0..30).step_by(2).rev().chain((1..30).step_by(2)).collect();
    assert_eq!(list_0.iter().cloned().collect::<Vec<_>>(), expected);

    for _ in 0..15 {
        list_0.remove_range(7..9).unwrap();
        if list_0.len() < 9 {
            break;
        }
    }
    list_0.as_tree().validate();
}
