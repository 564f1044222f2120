use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::iter::Peekable;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc;

use concurrent_queue::{ConcurrentQueue, PopError};
use rayon::ThreadPool;

use crate::error::{Result, RgpError};
use crate::genomic_island::progress_bar;
use crate::graph_writer;
use crate::grr_graph::{GrrGraph, Metric};
use crate::louvain::{louvain_communities, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD};
use crate::pangenome::{Pangenome, Status};
use crate::region::Region;
use crate::rgp_similarity::EdgeMetrics;

/// Parameters of region clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParameters {
    /// Recorded for downstream edge filtering, not applied to the graph.
    pub grr_cutoff: f32,
    pub threads: usize,
}

impl Default for ClusterParameters {
    fn default() -> ClusterParameters {
        ClusterParameters {
            grr_cutoff: 0.8,
            threads: 1,
        }
    }
}

impl ClusterParameters {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.grr_cutoff) {
            return Err(RgpError::InvalidArgument(format!(
                "GRR cutoff must be between 0 and 1, found {}",
                self.grr_cutoff
            )));
        }
        if self.threads == 0 {
            return Err(RgpError::InvalidArgument(
                "at least one thread is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A region reduced to what is needed to compare it: its name and the
/// identifiers of its families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgpProfile {
    pub name: String,
    pub families: BTreeSet<usize>,
}

pub type ScoredPair = (String, String, EdgeMetrics);

/// A region standing for every region with the same family content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueRgp {
    pub representative: usize,
    pub identical: Vec<usize>,
}

/// Pairs `start..end` of a chunk. Pairs `(i, j)` with `i < j` are counted
/// in lexicographic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRange {
    pub chunk: usize,
    pub start: usize,
    pub end: usize,
}

/// Group regions by family content. Families are compared as sets, so two
/// regions carrying the same families in a different gene order are
/// identical. The first region of each group is its representative and
/// groups are returned in order of their representatives.
pub fn dereplicate_rgp(family_sets: &[BTreeSet<usize>]) -> Vec<UniqueRgp> {
    info!("Dereplicating {} RGPs", family_sets.len());
    let mut group_of: HashMap<&BTreeSet<usize>, usize> = HashMap::new();
    let mut uniq_rgps: Vec<UniqueRgp> = vec![];
    for (i, families) in family_sets.iter().enumerate() {
        match group_of.get(families) {
            Some(group) => uniq_rgps[*group].identical.push(i),
            None => {
                group_of.insert(families, uniq_rgps.len());
                uniq_rgps.push(UniqueRgp {
                    representative: i,
                    identical: vec![],
                });
            }
        }
    }
    info!("{} unique RGPs", uniq_rgps.len());
    uniq_rgps
}

/// Metrics of every pair sharing at least one family.
pub fn compute_rgp_metric<'a, I>(pairs: I) -> Vec<ScoredPair>
where
    I: IntoIterator<Item = (&'a RgpProfile, &'a RgpProfile)>,
{
    pairs
        .into_iter()
        .filter_map(|(a, b)| {
            EdgeMetrics::between(&a.families, &b.families)
                .map(|metrics| (a.name.clone(), b.name.clone(), metrics))
        })
        .collect()
}

pub fn pairs_count(rgp_count: usize) -> usize {
    rgp_count * rgp_count.saturating_sub(1) / 2
}

/// Index pairs `(i, j)` with `i < j < n`, starting at `(first_i, first_j)`.
fn pair_indices(n: usize, first_i: usize, first_j: usize) -> impl Iterator<Item = (usize, usize)> {
    (first_i..n).flat_map(move |i| {
        let from = if i == first_i { first_j } else { i + 1 };
        (from..n).map(move |j| (i, j))
    })
}

/// The pairs of one range, generated from the profiles without collecting
/// the pairs before it.
pub fn pairs_in<'a>(
    profiles: &'a [RgpProfile],
    range: &PairRange,
) -> impl Iterator<Item = (&'a RgpProfile, &'a RgpProfile)> + 'a {
    let n = profiles.len();
    // row i holds the n - 1 - i pairs (i, j) with j > i
    let mut i = 0;
    let mut offset = range.start;
    while i < n && offset >= n - 1 - i {
        offset -= n - 1 - i;
        i += 1;
    }
    pair_indices(n, i, i + 1 + offset)
        .take(range.end - range.start)
        .map(move |(i, j)| (&profiles[i], &profiles[j]))
}

/// Lazily cut `pairs_count` pairs into ranges of at most `size` pairs.
pub fn pair_ranges(
    pairs_count: usize,
    size: usize,
) -> impl ExactSizeIterator<Item = PairRange> {
    let size = size.max(1);
    (0..pairs_count)
        .step_by(size)
        .enumerate()
        .map(move |(chunk, start)| PairRange {
            chunk,
            start,
            end: (start + size).min(pairs_count),
        })
}

/// Metrics of the pairs of one range.
pub fn evaluate_range(profiles: &[RgpProfile], range: &PairRange) -> Vec<ScoredPair> {
    compute_rgp_metric(pairs_in(profiles, range))
}

/// Number of ranges waiting in the task queue at any time. It depends on
/// the worker count only, never on the number of pairs.
pub fn task_queue_capacity(threads: usize) -> usize {
    threads.max(1) * 2
}

/// A pool of exactly `threads` workers, used for every parallel step of
/// the clustering.
pub fn worker_pool(threads: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| {
            RgpError::InvalidArgument(format!("Failed to start {} worker threads: {}", threads, e))
        })
}

fn panic_message(cause: Box<dyn Any + Send>) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Hand out ranges until the queue is full. The queue is closed once the
/// last range has been pushed.
fn refill<I: Iterator<Item = PairRange>>(
    queue: &ConcurrentQueue<PairRange>,
    ranges: &mut Peekable<I>,
) {
    while let Some(range) = ranges.peek() {
        if queue.push(*range).is_err() {
            return;
        }
        ranges.next();
    }
    queue.close();
}

/// Evaluate ranges of pairs on the workers of `pool` and add the resulting
/// edges to the graph in completion order. Ranges are pulled from `ranges`
/// only as queue slots free up. A failed chunk is reported once every other
/// chunk has been drained.
pub fn evaluate_chunks<I, F>(
    graph: &mut GrrGraph,
    profiles: &[RgpProfile],
    ranges: I,
    pool: &ThreadPool,
    disable_bar: bool,
    evaluate: F,
) -> Result<()>
where
    I: ExactSizeIterator<Item = PairRange>,
    F: Fn(&[RgpProfile], &PairRange) -> Vec<ScoredPair> + Sync,
{
    let chunk_count = ranges.len();
    let threads = pool.current_num_threads();
    let queue = ConcurrentQueue::bounded(task_queue_capacity(threads));
    let mut ranges = ranges.peekable();

    let bar = progress_bar(chunk_count as u64, "chunks", disable_bar);
    let (sender, receiver) = mpsc::channel();
    let mut first_failure: Option<RgpError> = None;
    let mut edge_count = 0usize;

    refill(&queue, &mut ranges);
    pool.in_place_scope(|scope| {
        for _ in 0..threads {
            let sender = sender.clone();
            let queue = &queue;
            let evaluate = &evaluate;
            scope.spawn(move |_| loop {
                let range = match queue.pop() {
                    Ok(range) => range,
                    Err(PopError::Empty) => {
                        std::thread::yield_now();
                        continue;
                    }
                    Err(PopError::Closed) => break,
                };
                let result = panic::catch_unwind(AssertUnwindSafe(|| evaluate(profiles, &range)))
                    .map_err(|cause| RgpError::WorkerFailure {
                        chunk: range.chunk,
                        message: panic_message(cause),
                    });
                if sender.send(result).is_err() {
                    break;
                }
            });
        }
        drop(sender);

        for result in receiver.iter() {
            refill(&queue, &mut ranges);
            match result {
                Ok(edges) => {
                    edge_count += edges.len();
                    for (a, b, metrics) in edges {
                        graph.add_edge(&a, &b, metrics);
                    }
                }
                Err(e) => {
                    error!("{}", e);
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
            bar.inc(1);
        }
    });
    bar.finish_and_clear();

    match first_failure {
        Some(e) => Err(e),
        None => {
            debug!("Merged {} edges from {} chunks", edge_count, chunk_count);
            Ok(())
        }
    }
}

/// Link each copy to its representative with maximal similarity.
fn add_identical_rgps(graph: &mut GrrGraph, regions: &[Region], uniq_rgps: &[UniqueRgp]) {
    for uniq in uniq_rgps {
        let representative = &regions[uniq.representative].name;
        for identical in &uniq.identical {
            let name = &regions[*identical].name;
            graph.add_edge(representative, name, EdgeMetrics::identical());
            if let Some(node) = graph.node_index(name) {
                graph.attributes_mut(node).identical = true;
            }
        }
    }
}

/// Describe every region node, including the spot the region belongs to.
fn annotate_nodes(graph: &mut GrrGraph, pangenome: &Pangenome) -> Result<()> {
    let regions = pangenome.regions();
    for region in regions {
        let node = match graph.node_index(&region.name) {
            Some(node) => node,
            None => continue,
        };
        let contig = region
            .contig()
            .ok_or_else(|| RgpError::EmptyRegion(region.name.clone()))?;
        let families = region.families(pangenome);
        let family_names: Vec<&str> = families
            .iter()
            .map(|f| pangenome.family(*f).name.as_str())
            .collect();

        let is_contig_border = region.is_contig_border(pangenome)?;
        let is_whole_contig = region.is_whole_contig(pangenome)?;
        let attributes = graph.attributes_mut(node);
        attributes.name = Some(region.name.clone());
        attributes.contig = Some(pangenome.contig(contig).name.clone());
        attributes.organism = Some(
            pangenome
                .organism(pangenome.contig(contig).organism)
                .name
                .clone(),
        );
        attributes.genes_count = Some(region.len());
        attributes.families = Some(family_names.join(";"));
        attributes.families_count = Some(families.len());
        attributes.is_contig_border = Some(is_contig_border);
        attributes.is_whole_contig = Some(is_whole_contig);
    }

    for spot in pangenome.spots() {
        for region in &spot.regions {
            if let Some(node) = graph.node_index(&regions[*region].name) {
                graph.attributes_mut(node).spot_id = Some(spot.id.clone());
            }
        }
    }
    Ok(())
}

/// Store the Louvain community of every node for each metric. Community
/// detection runs on the workers of `pool`.
fn label_communities(graph: &mut GrrGraph, pool: &ThreadPool) {
    for metric in Metric::ALL.iter() {
        let weighted = graph.weighted(*metric);
        let communities =
            pool.install(|| louvain_communities(&weighted, DEFAULT_RESOLUTION, DEFAULT_THRESHOLD));
        info!(
            "Graph has {} clusters using {}",
            communities.len(),
            metric.attribute()
        );
        for (i, community) in communities.iter().enumerate() {
            for node in community {
                graph
                    .attributes_mut(*node)
                    .clusters
                    .insert(*metric, format!("cluster_{}", i));
            }
        }
    }
}

/// Cluster the regions of the pangenome by gene repertoire relatedness.
pub fn cluster_rgp(
    pangenome: &Pangenome,
    parameters: &ClusterParameters,
    disable_bar: bool,
) -> Result<GrrGraph> {
    parameters.validate()?;
    if pangenome.rgp_status() == Status::Absent {
        return Err(RgpError::PrerequisiteMissing(
            "regions of genomic plasticity have not been predicted".to_string(),
        ));
    }
    debug!(
        "Using a GRR cutoff of {} for downstream filtering",
        parameters.grr_cutoff
    );

    let regions = pangenome.regions();
    let family_sets: Vec<BTreeSet<usize>> =
        regions.iter().map(|r| r.families(pangenome)).collect();
    let uniq_rgps = dereplicate_rgp(&family_sets);

    let mut graph = GrrGraph::new();
    let profiles: Vec<RgpProfile> = uniq_rgps
        .iter()
        .map(|uniq| {
            let region = &regions[uniq.representative];
            graph.add_node(&region.name);
            RgpProfile {
                name: region.name.clone(),
                families: family_sets[uniq.representative].clone(),
            }
        })
        .collect();

    let pool = worker_pool(parameters.threads)?;
    let total_pairs = pairs_count(profiles.len());
    info!(
        "Computing GRR metric for {} pairs of RGP using {} threads ..",
        total_pairs, parameters.threads
    );
    let chunk_size = total_pairs / (parameters.threads * 10) + 1;
    let ranges = pair_ranges(total_pairs, chunk_size);
    debug!(
        "Split pairs into {} chunks of at most {} pairs",
        ranges.len(),
        chunk_size
    );
    evaluate_chunks(
        &mut graph,
        &profiles,
        ranges,
        &pool,
        disable_bar,
        evaluate_range,
    )?;

    info!("Louvain communities clustering of RGP ..");
    label_communities(&mut graph, &pool);

    add_identical_rgps(&mut graph, regions, &uniq_rgps);
    annotate_nodes(&mut graph, pangenome)?;
    Ok(graph)
}

/// Create the output directory, refusing to reuse an existing one unless
/// forced.
pub fn mk_outdir(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(RgpError::InvalidArgument(format!(
            "{} already exists. Use --force to write into it anyway",
            output.display()
        )));
    }
    std::fs::create_dir_all(output)?;
    Ok(())
}

/// Write the clustered graph in GEXF and GraphML formats.
pub fn write_grr_graph(graph: &GrrGraph, output: &Path) -> Result<()> {
    info!("Writing graph in gexf and graphml format ..");
    graph_writer::write_gexf(graph, &output.join("grrGraph.gexf"))?;
    graph_writer::write_graphml(graph, &output.join("grrGraph.graphml"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pangenome::{Partition, Spot, Strand};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn set(families: &[usize]) -> BTreeSet<usize> {
        families.iter().copied().collect()
    }

    fn profile(name: &str, families: &[usize]) -> RgpProfile {
        RgpProfile {
            name: name.to_string(),
            families: set(families),
        }
    }

    fn rgp_pairs(profiles: &[RgpProfile]) -> impl Iterator<Item = (&RgpProfile, &RgpProfile)> + '_ {
        pair_indices(profiles.len(), 0, 1).map(move |(i, j)| (&profiles[i], &profiles[j]))
    }

    fn names<'a, I>(pairs: I) -> Vec<(String, String)>
    where
        I: Iterator<Item = (&'a RgpProfile, &'a RgpProfile)>,
    {
        pairs
            .map(|(a, b)| (a.name.clone(), b.name.clone()))
            .collect()
    }

    #[test]
    fn test_dereplicate_rgp() {
        init();
        let family_sets = vec![set(&[1, 2]), set(&[3]), set(&[2, 1]), set(&[1, 2, 3]), set(&[3])];
        let uniq = dereplicate_rgp(&family_sets);
        assert_eq!(
            vec![
                UniqueRgp {
                    representative: 0,
                    identical: vec![2]
                },
                UniqueRgp {
                    representative: 1,
                    identical: vec![4]
                },
                UniqueRgp {
                    representative: 3,
                    identical: vec![]
                },
            ],
            uniq
        );

        // dereplicating the representatives again changes nothing
        let representatives: Vec<BTreeSet<usize>> = uniq
            .iter()
            .map(|u| family_sets[u.representative].clone())
            .collect();
        let again = dereplicate_rgp(&representatives);
        assert_eq!(3, again.len());
        for (i, u) in again.iter().enumerate() {
            assert_eq!(i, u.representative);
            assert!(u.identical.is_empty());
        }
    }

    #[test]
    fn test_pair_ranges() {
        init();
        let ranges: Vec<PairRange> = pair_ranges(7, 3).collect();
        assert_eq!(
            vec![
                PairRange {
                    chunk: 0,
                    start: 0,
                    end: 3
                },
                PairRange {
                    chunk: 1,
                    start: 3,
                    end: 6
                },
                PairRange {
                    chunk: 2,
                    start: 6,
                    end: 7
                },
            ],
            ranges
        );
        assert_eq!(3, pair_ranges(7, 3).len());
        assert_eq!(0, pair_ranges(0, 3).len());
        assert_eq!(2, pair_ranges(2, 0).len());
    }

    #[test]
    fn test_rgp_pairs() {
        init();
        let profiles = vec![profile("a", &[1]), profile("b", &[1]), profile("c", &[2])];
        assert_eq!(
            vec![
                ("a".to_string(), "b".to_string()),
                ("a".to_string(), "c".to_string()),
                ("b".to_string(), "c".to_string()),
            ],
            names(rgp_pairs(&profiles))
        );
        assert_eq!(3, pairs_count(profiles.len()));
        let scored = compute_rgp_metric(rgp_pairs(&profiles));
        assert_eq!(1, scored.len());
        assert_eq!("a", scored[0].0);
        assert_eq!("b", scored[0].1);
    }

    #[test]
    fn test_pairs_in_ranges_cover_every_pair_once() {
        init();
        for n in 0..8 {
            let profiles: Vec<RgpProfile> = (0..n)
                .map(|i| profile(&format!("r{}", i), &[i]))
                .collect();
            let all = names(rgp_pairs(&profiles));
            assert_eq!(pairs_count(n), all.len());
            for size in 1..5 {
                let mut joined = vec![];
                for range in pair_ranges(pairs_count(n), size) {
                    let piece = names(pairs_in(&profiles, &range));
                    assert_eq!(range.end - range.start, piece.len());
                    joined.extend(piece);
                }
                assert_eq!(all, joined);
            }
        }
    }

    #[test]
    fn test_worker_pool_size() {
        init();
        for threads in &[1usize, 3] {
            let pool = worker_pool(*threads).unwrap();
            assert_eq!(*threads, pool.install(rayon::current_num_threads));
        }
        assert_eq!(2, task_queue_capacity(1));
        assert_eq!(8, task_queue_capacity(4));
    }

    #[test]
    fn test_evaluate_chunks_merges_in_any_order() {
        init();
        let profiles: Vec<RgpProfile> = (0..12)
            .map(|i| profile(&format!("r{}", i), &[i % 3, 10 + i % 4]))
            .collect();

        let mut expected = GrrGraph::new();
        for (a, b, metrics) in compute_rgp_metric(rgp_pairs(&profiles)) {
            expected.add_edge(&a, &b, metrics);
        }

        for threads in &[1usize, 4] {
            let pool = worker_pool(*threads).unwrap();
            let mut graph = GrrGraph::new();
            for p in &profiles {
                graph.add_node(&p.name);
            }
            let ranges = pair_ranges(pairs_count(profiles.len()), 5);
            evaluate_chunks(&mut graph, &profiles, ranges, &pool, true, evaluate_range).unwrap();
            assert_eq!(expected.edge_count(), graph.edge_count());
            for ((a, b), metrics) in expected.edges() {
                assert_eq!(
                    Some(metrics),
                    graph.edge(expected.name(*a), expected.name(*b))
                );
            }
        }
    }

    #[test]
    fn test_evaluate_chunks_pulls_ranges_lazily() {
        init();
        let profiles: Vec<RgpProfile> = (0..60)
            .map(|i| profile(&format!("r{}", i), &[i % 7]))
            .collect();
        let total = pairs_count(profiles.len());
        let ranges_count = pair_ranges(total, 5).len();
        assert_eq!(354, ranges_count);

        let pool = worker_pool(1).unwrap();
        let pulled = AtomicUsize::new(0);
        let started = AtomicUsize::new(0);
        let most_ahead = AtomicUsize::new(0);
        let ranges = pair_ranges(total, 5).inspect(|_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        });
        let mut graph = GrrGraph::new();
        evaluate_chunks(&mut graph, &profiles, ranges, &pool, true, |p, range| {
            let before = started.fetch_add(1, Ordering::SeqCst);
            let ahead = pulled.load(Ordering::SeqCst) - before;
            most_ahead.fetch_max(ahead, Ordering::SeqCst);
            evaluate_range(p, range)
        })
        .unwrap();

        assert_eq!(ranges_count, started.load(Ordering::SeqCst));
        assert_eq!(ranges_count, pulled.load(Ordering::SeqCst));
        // queued ranges, the running one and the one waiting for a slot
        assert!(most_ahead.load(Ordering::SeqCst) <= task_queue_capacity(1) + 2);

        let expected = compute_rgp_metric(rgp_pairs(&profiles));
        assert_eq!(expected.len(), graph.edge_count());
    }

    #[test]
    fn test_evaluate_chunks_reports_failed_chunk() {
        init();
        let profiles: Vec<RgpProfile> = (0..6)
            .map(|i| profile(&format!("r{}", i), &[1]))
            .collect();
        let pool = worker_pool(3).unwrap();
        let ranges = pair_ranges(pairs_count(profiles.len()), 2);
        let mut graph = GrrGraph::new();
        let result = evaluate_chunks(&mut graph, &profiles, ranges, &pool, true, |p, range| {
            if pairs_in(p, range).any(|(a, b)| a.name == "r2" && b.name == "r3") {
                panic!("cannot compare r2 and r3");
            }
            evaluate_range(p, range)
        });
        match result {
            Err(RgpError::WorkerFailure { chunk, message }) => {
                assert_eq!(4, chunk);
                assert_eq!("cannot compare r2 and r3", message)
            }
            other => panic!("Unexpected result {:?}", other),
        }
        // the failed chunk held (r1, r5) and (r2, r3), the other chunks were
        // still drained
        assert_eq!(13, graph.edge_count());
        assert!(graph.edge("r1", "r5").is_none());
        assert!(graph.edge("r0", "r5").is_some());
    }

    /// Two groups of three organisms sharing an island, plus one organism
    /// carrying a copy of the first island.
    fn clustered_pangenome() -> Pangenome {
        let mut pangenome = Pangenome::new();
        let islands: Vec<(&str, Vec<&str>)> = vec![
            ("o1", vec!["a1", "a2", "a3", "a4", "a5"]),
            ("o2", vec!["a1", "a2", "a3", "a4", "a6"]),
            ("o3", vec!["a1", "a2", "a3", "a5", "a6"]),
            ("o4", vec!["b1", "b2", "b3", "b4", "b5"]),
            ("o5", vec!["b1", "b2", "b3", "b4", "b6"]),
            ("o6", vec!["a1", "a2", "a3", "a4", "a5"]),
        ];
        for (org_name, island) in &islands {
            let org = pangenome.add_organism(org_name);
            let contig = pangenome.add_contig(org, &format!("{}_chr", org_name), false);
            let mut families: Vec<(String, Partition)> = (0..3)
                .map(|i| (format!("core{}", i), Partition::Persistent))
                .collect();
            families.extend(island.iter().map(|f| (f.to_string(), Partition::Cloud)));
            families.extend((3..6).map(|i| (format!("core{}", i), Partition::Persistent)));
            for (i, (family, partition)) in families.iter().enumerate() {
                let family = pangenome.add_family(family, *partition).unwrap();
                let start = i as u64 * 1000 + 1;
                pangenome.add_gene(
                    contig,
                    &format!("{}_g{}", org_name, i),
                    start,
                    start + 900,
                    Strand::Forward,
                    family,
                );
            }
        }
        let parameters = crate::genomic_island::RgpParameters {
            min_length: 0,
            ..crate::genomic_island::RgpParameters::default()
        };
        crate::genomic_island::predict_rgp(&mut pangenome, &parameters, false, true).unwrap();
        pangenome.add_spot(Spot {
            id: "spot_0".to_string(),
            regions: vec![0, 1],
        });
        pangenome
    }

    #[test]
    fn test_cluster_rgp() {
        init();
        let pangenome = clustered_pangenome();
        assert_eq!(6, pangenome.regions().len());
        let parameters = ClusterParameters {
            threads: 2,
            ..ClusterParameters::default()
        };
        let graph = cluster_rgp(&pangenome, &parameters, true).unwrap();

        assert_eq!(6, graph.node_count());
        // 3 edges within the a islands, 1 within the b islands, 1 identical
        assert_eq!(5, graph.edge_count());

        let a12 = graph.edge("o1_chr_RGP_0", "o2_chr_RGP_0").unwrap();
        assert!((a12.min_grr - 0.8).abs() < 1e-12);
        assert!((a12.jaccard_index - 4.0 / 6.0).abs() < 1e-12);

        let identical = graph.edge("o1_chr_RGP_0", "o6_chr_RGP_0").unwrap();
        assert!(identical.identical);
        let copy = graph.attributes(graph.node_index("o6_chr_RGP_0").unwrap());
        assert!(copy.identical);
        assert!(copy.clusters.is_empty());

        for metric in Metric::ALL.iter() {
            let label = |name: &str| {
                graph
                    .attributes(graph.node_index(name).unwrap())
                    .clusters
                    .get(metric)
                    .cloned()
                    .unwrap()
            };
            assert_eq!(label("o1_chr_RGP_0"), label("o2_chr_RGP_0"));
            assert_eq!(label("o1_chr_RGP_0"), label("o3_chr_RGP_0"));
            assert_eq!(label("o4_chr_RGP_0"), label("o5_chr_RGP_0"));
            assert_ne!(label("o1_chr_RGP_0"), label("o4_chr_RGP_0"));
        }

        let first = graph.attributes(graph.node_index("o1_chr_RGP_0").unwrap());
        assert_eq!(Some("o1".to_string()), first.organism);
        assert_eq!(Some("o1_chr".to_string()), first.contig);
        assert_eq!(Some(5), first.genes_count);
        assert_eq!(Some(5), first.families_count);
        assert_eq!(Some("a1;a2;a3;a4;a5".to_string()), first.families);
        assert_eq!(Some(false), first.is_contig_border);
        assert_eq!(Some(false), first.is_whole_contig);
        assert_eq!(Some("spot_0".to_string()), first.spot_id);
        assert!(!first.identical);
        assert_eq!(Some("o1_chr_RGP_0".to_string()), first.name);
        let third = graph.attributes(graph.node_index("o3_chr_RGP_0").unwrap());
        assert_eq!(None, third.spot_id);
        assert_eq!(Some("o6_chr_RGP_0".to_string()), copy.name);
    }

    #[test]
    fn test_label_communities_on_worker_pool() {
        init();
        let pangenome = clustered_pangenome();
        let parameters = ClusterParameters::default();
        let graph = cluster_rgp(&pangenome, &parameters, true).unwrap();
        let mut unlabelled = graph.clone();
        for node in 0..unlabelled.node_count() {
            unlabelled.attributes_mut(node).clusters.clear();
        }
        for threads in &[1usize, 3] {
            let pool = worker_pool(*threads).unwrap();
            let mut relabelled = unlabelled.clone();
            label_communities(&mut relabelled, &pool);
            for node in 0..graph.node_count() {
                assert_eq!(
                    graph.attributes(node).clusters,
                    relabelled.attributes(node).clusters
                );
            }
        }
    }

    #[test]
    fn test_cluster_rgp_requires_regions() {
        init();
        let pangenome = Pangenome::new();
        assert!(matches!(
            cluster_rgp(&pangenome, &ClusterParameters::default(), true),
            Err(RgpError::PrerequisiteMissing(_))
        ));
        let mut pangenome = Pangenome::new();
        pangenome.set_rgp_status(Status::InFile);
        let parameters = ClusterParameters {
            threads: 0,
            ..ClusterParameters::default()
        };
        assert!(matches!(
            cluster_rgp(&pangenome, &parameters, true),
            Err(RgpError::InvalidArgument(_))
        ));
    }
}
