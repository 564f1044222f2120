//! Louvain community detection on undirected weighted graphs.
//!
//! Nodes are visited in index order so results are deterministic. Each
//! connected component is optimised on its own, in parallel, while the
//! modularity is normalised by the weight of the whole graph: communities
//! never span components, so this finds the same partitions as a single
//! pass over the whole graph.

use std::collections::BTreeMap;

use disjoint::DisjointSet;
use rayon::prelude::*;

pub const DEFAULT_RESOLUTION: f64 = 1.0;
/// Minimum modularity gain for another aggregation level.
pub const DEFAULT_THRESHOLD: f64 = 1e-7;

/// Adjacency lists with self loops kept apart. Each undirected edge must be
/// added once.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl WeightedGraph {
    pub fn new(node_count: usize) -> WeightedGraph {
        WeightedGraph {
            adjacency: vec![vec![]; node_count],
            self_loops: vec![0.0; node_count],
        }
    }

    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        if a == b {
            self.self_loops[a] += weight;
        } else {
            self.adjacency[a].push((b, weight));
            self.adjacency[b].push((a, weight));
        }
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Weighted degree, self loops counting twice.
    pub fn degree(&self, node: usize) -> f64 {
        self.adjacency[node].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[node]
    }

    pub fn total_weight(&self) -> f64 {
        let edges: f64 = self
            .adjacency
            .iter()
            .map(|neighbours| neighbours.iter().map(|(_, w)| w).sum::<f64>())
            .sum();
        edges / 2.0 + self.self_loops.iter().sum::<f64>()
    }

    /// Restriction of the graph to the given nodes, renumbered in order.
    fn subgraph(&self, nodes: &[usize]) -> WeightedGraph {
        let local: BTreeMap<usize, usize> =
            nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let mut sub = WeightedGraph::new(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            sub.self_loops[i] = self.self_loops[*node];
            for (neighbour, weight) in &self.adjacency[*node] {
                if let Some(j) = local.get(neighbour) {
                    sub.adjacency[i].push((*j, *weight));
                }
            }
        }
        sub
    }

    /// Collapse each community into a single node.
    fn aggregate(&self, node2com: &[usize], community_count: usize) -> WeightedGraph {
        let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        let mut aggregated = WeightedGraph::new(community_count);
        for (node, neighbours) in self.adjacency.iter().enumerate() {
            let com = node2com[node];
            aggregated.self_loops[com] += self.self_loops[node];
            for (neighbour, weight) in neighbours {
                if node < *neighbour {
                    let other = node2com[*neighbour];
                    if com == other {
                        aggregated.self_loops[com] += weight;
                    } else {
                        *merged.entry((com.min(other), com.max(other))).or_insert(0.0) += weight;
                    }
                }
            }
        }
        for ((a, b), weight) in merged {
            aggregated.add_edge(a, b, weight);
        }
        aggregated
    }
}

/// Modularity of a partition given as community per node, `m` being the
/// total edge weight used for normalisation.
pub fn modularity(graph: &WeightedGraph, node2com: &[usize], m: f64, resolution: f64) -> f64 {
    if m <= 0.0 {
        return 0.0;
    }
    let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degrees: BTreeMap<usize, f64> = BTreeMap::new();
    for node in 0..graph.len() {
        let com = node2com[node];
        *degrees.entry(com).or_insert(0.0) += graph.degree(node);
        let mut within = graph.self_loops[node];
        for (neighbour, weight) in &graph.adjacency[node] {
            if node < *neighbour && node2com[*neighbour] == com {
                within += weight;
            }
        }
        *internal.entry(com).or_insert(0.0) += within;
    }
    degrees
        .iter()
        .map(|(com, degree)| {
            let norm = degree / (2.0 * m);
            internal.get(com).copied().unwrap_or(0.0) / m - resolution * norm * norm
        })
        .sum()
}

/// Move single nodes between communities until no move improves modularity.
/// Returns renumbered communities and whether any node moved.
fn one_level(graph: &WeightedGraph, m: f64, resolution: f64) -> (Vec<usize>, usize, bool) {
    let n = graph.len();
    let mut node2com: Vec<usize> = (0..n).collect();
    let degrees: Vec<f64> = (0..n).map(|u| graph.degree(u)).collect();
    let mut stot = degrees.clone();
    let mut improvement = false;

    let mut nb_moves = 1;
    while nb_moves > 0 {
        nb_moves = 0;
        for u in 0..n {
            let mut best_mod = 0.0;
            let mut best_com = node2com[u];
            let degree = degrees[u];

            let mut weights2com: BTreeMap<usize, f64> = BTreeMap::new();
            for (neighbour, weight) in &graph.adjacency[u] {
                *weights2com.entry(node2com[*neighbour]).or_insert(0.0) += weight;
            }

            stot[best_com] -= degree;
            let remove_cost = -weights2com.get(&best_com).copied().unwrap_or(0.0) / m
                + resolution * (stot[best_com] * degree) / (2.0 * m * m);
            for (com, weight) in &weights2com {
                let gain =
                    remove_cost + weight / m - resolution * (stot[*com] * degree) / (2.0 * m * m);
                if gain > best_mod {
                    best_mod = gain;
                    best_com = *com;
                }
            }
            stot[best_com] += degree;

            if best_com != node2com[u] {
                node2com[u] = best_com;
                improvement = true;
                nb_moves += 1;
            }
        }
    }

    let mut renumbering: BTreeMap<usize, usize> = BTreeMap::new();
    let mut renumbered = Vec::with_capacity(n);
    for com in node2com {
        let next = renumbering.len();
        renumbered.push(*renumbering.entry(com).or_insert(next));
    }
    let count = renumbering.len();
    (renumbered, count, improvement)
}

/// Community of each node of a connected graph.
fn louvain_membership(graph: WeightedGraph, m: f64, resolution: f64, threshold: f64) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..graph.len()).collect();
    if m <= 0.0 {
        return membership;
    }

    let mut current = graph;
    let singletons: Vec<usize> = (0..current.len()).collect();
    let mut modularity_value = modularity(&current, &singletons, m, resolution);
    let mut level = 0;
    loop {
        let (node2com, community_count, improvement) = one_level(&current, m, resolution);
        if level > 0 && !improvement {
            break;
        }
        for community in membership.iter_mut() {
            *community = node2com[*community];
        }
        let new_modularity = modularity(&current, &node2com, m, resolution);
        trace!(
            "Louvain level {}: {} communities, modularity {}",
            level,
            community_count,
            new_modularity
        );
        if new_modularity - modularity_value <= threshold {
            break;
        }
        modularity_value = new_modularity;
        current = current.aggregate(&node2com, community_count);
        level += 1;
    }
    membership
}

/// Partition the nodes into communities maximising modularity. Communities
/// are sorted and listed by their smallest node.
pub fn louvain_communities(
    graph: &WeightedGraph,
    resolution: f64,
    threshold: f64,
) -> Vec<Vec<usize>> {
    if graph.is_empty() {
        return vec![];
    }
    let m = graph.total_weight();

    let mut components = DisjointSet::with_len(graph.len());
    for (node, neighbours) in graph.adjacency.iter().enumerate() {
        for (neighbour, _) in neighbours {
            components.join(node, *neighbour);
        }
    }
    let components = components.sets();
    debug!(
        "Running Louvain on {} connected components with {} threads",
        components.len(),
        rayon::current_num_threads()
    );

    let mut communities: Vec<Vec<usize>> = components
        .par_iter()
        .flat_map(|component| {
            let mut nodes = component.clone();
            nodes.sort_unstable();
            let membership = louvain_membership(graph.subgraph(&nodes), m, resolution, threshold);
            let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (local, community) in membership.iter().enumerate() {
                grouped.entry(*community).or_insert_with(Vec::new).push(nodes[local]);
            }
            grouped.into_iter().map(|(_, members)| members).collect::<Vec<_>>()
        })
        .collect();
    communities.sort_unstable_by_key(|c| c[0]);
    communities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn graph_from(node_count: usize, edges: &[(usize, usize, f64)]) -> WeightedGraph {
        let mut graph = WeightedGraph::new(node_count);
        for (a, b, w) in edges {
            graph.add_edge(*a, *b, *w);
        }
        graph
    }

    #[test]
    fn test_two_disconnected_groups() {
        init();
        let graph = graph_from(
            5,
            &[(0, 1, 1.0), (0, 2, 1.0), (1, 2, 1.0), (3, 4, 1.0)],
        );
        assert_eq!(
            vec![vec![0, 1, 2], vec![3, 4]],
            louvain_communities(&graph, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD)
        );
    }

    #[test]
    fn test_bridged_triangles() {
        init();
        let graph = graph_from(
            6,
            &[
                (0, 1, 1.0),
                (0, 2, 1.0),
                (1, 2, 1.0),
                (2, 3, 1.0),
                (3, 4, 1.0),
                (3, 5, 1.0),
                (4, 5, 1.0),
            ],
        );
        assert_eq!(
            vec![vec![0, 1, 2], vec![3, 4, 5]],
            louvain_communities(&graph, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD)
        );
    }

    #[test]
    fn test_isolated_nodes_stay_alone() {
        init();
        assert!(louvain_communities(&graph_from(0, &[]), DEFAULT_RESOLUTION, DEFAULT_THRESHOLD)
            .is_empty());
        let graph = graph_from(3, &[]);
        assert_eq!(
            vec![vec![0], vec![1], vec![2]],
            louvain_communities(&graph, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD)
        );
        let graph = graph_from(4, &[(1, 2, 0.5)]);
        assert_eq!(
            vec![vec![0], vec![1, 2], vec![3]],
            louvain_communities(&graph, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD)
        );
    }

    #[test]
    fn test_modularity() {
        init();
        let graph = graph_from(4, &[(0, 1, 1.0), (2, 3, 1.0)]);
        let m = graph.total_weight();
        assert!((modularity(&graph, &[0, 0, 1, 1], m, 1.0) - 0.5).abs() < 1e-12);
        assert!(modularity(&graph, &[0, 1, 2, 3], m, 1.0) < 0.0);
    }

    #[test]
    fn test_aggregation_preserves_weight() {
        init();
        let graph = graph_from(
            4,
            &[(0, 1, 1.0), (1, 2, 0.5), (2, 3, 2.0), (0, 0, 0.25)],
        );
        let aggregated = graph.aggregate(&[0, 0, 1, 1], 2);
        assert_eq!(graph.total_weight(), aggregated.total_weight());
        assert_eq!(1.25, aggregated.self_loops[0]);
        assert_eq!(2.0, aggregated.self_loops[1]);
        assert_eq!(vec![(1, 0.5)], aggregated.adjacency[0]);
    }
}
