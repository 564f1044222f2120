use std;

/// Like a BTreeMap keyed by node pairs, except the pair is sorted before
/// insertion / get etc. so that (a, b) and (b, a) are the same edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedPairEdgeMap<V> {
    internal: std::collections::BTreeMap<(usize, usize), V>,
}

impl<V> Default for SortedPairEdgeMap<V> {
    fn default() -> Self {
        SortedPairEdgeMap {
            internal: std::collections::BTreeMap::new(),
        }
    }
}

fn sorted(node_ids: (usize, usize)) -> (usize, usize) {
    if node_ids.0 < node_ids.1 {
        node_ids
    } else {
        (node_ids.1, node_ids.0)
    }
}

impl<V> SortedPairEdgeMap<V> {
    /// Returns the value previously stored for this pair, if any.
    pub fn insert(&mut self, node_ids: (usize, usize), value: V) -> Option<V> {
        self.internal.insert(sorted(node_ids), value)
    }

    pub fn get(&self, node_ids: &(usize, usize)) -> Option<&V> {
        self.internal.get(&sorted(*node_ids))
    }

    pub fn len(&self) -> usize {
        self.internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty()
    }

    /// Edges in ascending (smaller, larger) order.
    pub fn iter(&self) -> impl Iterator<Item = (&(usize, usize), &V)> {
        self.internal.iter()
    }
}
