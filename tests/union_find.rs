//! Tests for the union_find module.

use stormtrack::union_find::UnionFind;

#[test]
fn test_basic_operations() {
    let mut uf: UnionFind<u64> = UnionFind::new();

    uf.make_set(1);
    uf.make_set(2);
    uf.make_set(3);

    assert!(!uf.connected(&1, &2));

    uf.union(&1, &2);
    assert!(uf.connected(&1, &2));
    assert!(!uf.connected(&1, &3));
}

#[test]
fn test_path_compression() {
    let mut uf: UnionFind<u64> = UnionFind::new();

    for i in 1..=4 {
        uf.make_set(i);
    }
    uf.union(&1, &2);
    uf.union(&2, &3);
    uf.union(&3, &4);

    let root = uf.find(&1);
    assert_eq!(uf.find(&2), root);
    assert_eq!(uf.find(&3), root);
    assert_eq!(uf.find(&4), root);
}

#[test]
fn test_groups() {
    let mut uf: UnionFind<u64> = UnionFind::new();

    for i in 1..=4 {
        uf.make_set(i);
    }
    uf.union(&1, &2);
    uf.union(&3, &4);

    let groups = uf.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&1], vec![1, 2]);
    assert_eq!(groups[&3], vec![3, 4]);
}

#[test]
fn test_groups_keyed_by_minimum_member() {
    let mut uf: UnionFind<u64> = UnionFind::new();

    // Union in an order that makes the larger id the internal root.
    uf.make_set(9);
    uf.make_set(2);
    uf.make_set(5);
    uf.union(&9, &5);
    uf.union(&5, &2);

    let groups = uf.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[&2], vec![2, 5, 9]);
}

#[test]
fn test_groups_deterministic() {
    // HashMap iteration order varies between runs; groups() must not.
    let results: Vec<_> = (0..5)
        .map(|_| {
            let mut uf: UnionFind<String> = UnionFind::new();
            for id in ["d", "a", "c", "b"] {
                uf.make_set(id.to_string());
            }
            uf.union(&"a".to_string(), &"b".to_string());
            uf.union(&"c".to_string(), &"d".to_string());
            uf.groups()
        })
        .collect();

    for other in &results[1..] {
        assert_eq!(&results[0], other);
    }
}

#[test]
fn test_find_registers_unknown_items() {
    let mut uf: UnionFind<u64> = UnionFind::new();
    assert_eq!(uf.find(&7), 7);
    assert_eq!(uf.len(), 1);
    assert!(!uf.is_empty());
}
