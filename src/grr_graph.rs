use std::collections::{BTreeMap, HashMap};

use crate::louvain::WeightedGraph;
use crate::rgp_similarity::EdgeMetrics;
use crate::sorted_pair_edge_map::SortedPairEdgeMap;

/// Edge weight used for community detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    MinGrr,
    MaxGrr,
    JaccardIndex,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::MinGrr, Metric::MaxGrr, Metric::JaccardIndex];

    pub fn attribute(&self) -> &'static str {
        match self {
            Metric::MinGrr => "min_grr",
            Metric::MaxGrr => "max_grr",
            Metric::JaccardIndex => "jaccard_index",
        }
    }

    pub fn cluster_attribute(&self) -> &'static str {
        match self {
            Metric::MinGrr => "min_grr_cluster",
            Metric::MaxGrr => "max_grr_cluster",
            Metric::JaccardIndex => "jaccard_index_cluster",
        }
    }

    pub fn weight(&self, metrics: &EdgeMetrics) -> f64 {
        match self {
            Metric::MinGrr => metrics.min_grr,
            Metric::MaxGrr => metrics.max_grr,
            Metric::JaccardIndex => metrics.jaccard_index,
        }
    }
}

/// Descriptive attributes of a region node. Annotations are optional since
/// nodes are created before regions are described.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttributes {
    pub name: Option<String>,
    pub contig: Option<String>,
    pub organism: Option<String>,
    pub genes_count: Option<usize>,
    /// Family names joined by ';'.
    pub families: Option<String>,
    pub families_count: Option<usize>,
    pub is_contig_border: Option<bool>,
    pub is_whole_contig: Option<bool>,
    pub spot_id: Option<String>,
    pub clusters: BTreeMap<Metric, String>,
    pub identical: bool,
}

/// Undirected graph of regions, named nodes and one edge per pair at most.
#[derive(Debug, Clone, Default)]
pub struct GrrGraph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    attributes: Vec<NodeAttributes>,
    edges: SortedPairEdgeMap<EdgeMetrics>,
}

impl GrrGraph {
    pub fn new() -> GrrGraph {
        GrrGraph::default()
    }

    /// Get or create the node of that name.
    pub fn add_node(&mut self, name: &str) -> usize {
        if let Some(index) = self.index.get(name) {
            return *index;
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        self.attributes.push(NodeAttributes::default());
        self.index.insert(name.to_string(), index);
        index
    }

    /// Add (or replace) the edge between two named nodes, creating them if
    /// needed.
    pub fn add_edge(&mut self, a: &str, b: &str, metrics: EdgeMetrics) {
        let a = self.add_node(a);
        let b = self.add_node(b);
        self.edges.insert((a, b), metrics);
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn attributes(&self, node: usize) -> &NodeAttributes {
        &self.attributes[node]
    }

    pub fn attributes_mut(&mut self, node: usize) -> &mut NodeAttributes {
        &mut self.attributes[node]
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&EdgeMetrics> {
        match (self.node_index(a), self.node_index(b)) {
            (Some(a), Some(b)) => self.edges.get(&(a, b)),
            _ => None,
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = (&(usize, usize), &EdgeMetrics)> {
        self.edges.iter()
    }

    /// The graph weighted by one metric, for community detection.
    pub fn weighted(&self, metric: Metric) -> WeightedGraph {
        let mut graph = WeightedGraph::new(self.node_count());
        for ((a, b), metrics) in self.edges.iter() {
            graph.add_edge(*a, *b, metric.weight(metrics));
        }
        graph
    }
}
