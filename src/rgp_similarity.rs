use std::collections::BTreeSet;

/// Denominator used by the gene repertoire relatedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    /// Smaller family set: a region included in another scores 1.
    Min,
    /// Larger family set: penalises size differences.
    Max,
}

impl Aggregator {
    fn aggregate(&self, a: usize, b: usize) -> usize {
        match self {
            Aggregator::Min => a.min(b),
            Aggregator::Max => a.max(b),
        }
    }
}

/// Gene repertoire relatedness between the family sets of two regions.
/// Returns 0 when either set is empty.
pub fn compute_grr(a: &BTreeSet<usize>, b: &BTreeSet<usize>, mode: Aggregator) -> f64 {
    let denominator = mode.aggregate(a.len(), b.len());
    if denominator == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / denominator as f64
}

pub fn compute_jaccard_index(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> f64 {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        return 0.0;
    }
    shared as f64 / union as f64
}

/// The three similarity values carried by an edge of the region graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMetrics {
    pub min_grr: f64,
    pub max_grr: f64,
    pub jaccard_index: f64,
    pub identical: bool,
}

impl EdgeMetrics {
    /// Metrics between two regions sharing at least one family, None otherwise.
    pub fn between(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> Option<EdgeMetrics> {
        if a.is_disjoint(b) {
            return None;
        }
        Some(EdgeMetrics {
            min_grr: compute_grr(a, b, Aggregator::Min),
            max_grr: compute_grr(a, b, Aggregator::Max),
            jaccard_index: compute_jaccard_index(a, b),
            identical: false,
        })
    }

    pub fn identical() -> EdgeMetrics {
        EdgeMetrics {
            min_grr: 1.0,
            max_grr: 1.0,
            jaccard_index: 1.0,
            identical: true,
        }
    }
}
