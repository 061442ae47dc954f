//! Union-Find (disjoint set) data structure for transitive track merging.
//!
//! Uses path compression and union by rank. `groups()` keys every group by
//! its minimum member so results are deterministic regardless of insertion
//! or union order.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A Union-Find structure over arbitrary hashable keys.
#[derive(Debug, Default)]
pub struct UnionFind<T: Clone + Eq + Hash + Ord> {
    parent: HashMap<T, T>,
    rank: HashMap<T, usize>,
}

impl<T: Clone + Eq + Hash + Ord> UnionFind<T> {
    /// Create an empty Union-Find.
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            rank: HashMap::new(),
        }
    }

    /// Create an empty Union-Find with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parent: HashMap::with_capacity(capacity),
            rank: HashMap::with_capacity(capacity),
        }
    }

    /// Register an element as its own singleton set. No-op if present.
    pub fn make_set(&mut self, item: T) {
        if !self.parent.contains_key(&item) {
            self.parent.insert(item.clone(), item.clone());
            self.rank.insert(item, 0);
        }
    }

    /// Find the representative of the set containing `item`, compressing
    /// the path along the way. Registers unknown items as singletons.
    pub fn find(&mut self, item: &T) -> T {
        if !self.parent.contains_key(item) {
            self.make_set(item.clone());
            return item.clone();
        }

        // Walk to the root, then repoint every node on the path to it.
        let mut root = item.clone();
        while self.parent[&root] != root {
            root = self.parent[&root].clone();
        }
        let mut current = item.clone();
        while current != root {
            let next = self.parent[&current].clone();
            self.parent.insert(current, root.clone());
            current = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`.
    pub fn union(&mut self, a: &T, b: &T) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }

        let rank_a = self.rank[&root_a];
        let rank_b = self.rank[&root_b];
        if rank_a < rank_b {
            self.parent.insert(root_a, root_b);
        } else if rank_a > rank_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_b, root_a.clone());
            *self.rank.get_mut(&root_a).unwrap() += 1;
        }
    }

    /// Check whether two elements belong to the same set.
    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        self.find(a) == self.find(b)
    }

    /// Return all sets, keyed by each set's minimum member, with members
    /// sorted ascending. Deterministic across runs.
    pub fn groups(&mut self) -> BTreeMap<T, Vec<T>> {
        let items: Vec<T> = self.parent.keys().cloned().collect();
        let mut by_root: HashMap<T, Vec<T>> = HashMap::new();
        for item in items {
            let root = self.find(&item);
            by_root.entry(root).or_default().push(item);
        }

        let mut result = BTreeMap::new();
        for (_, mut members) in by_root {
            members.sort();
            let key = members[0].clone();
            result.insert(key, members);
        }
        result
    }

    /// Number of registered elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether no elements are registered.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
