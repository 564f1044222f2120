use std::collections::BTreeSet;

use crate::error::Result;
use crate::pangenome::{Pangenome, Partition};
use crate::region::{NamingScheme, Region};

/// Score changes applied while walking along a contig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringScheme {
    /// Base of the exponential penalty applied to runs of persistent genes.
    pub persistent_penalty: i64,
    /// Gain for each variable (or multigenic persistent) gene.
    pub variable_gain: i64,
}

impl ScoringScheme {
    /// Score change brought by a gene. `persistent_run` counts the
    /// consecutive non-multigenic persistent genes seen just before it and
    /// is updated in place.
    fn delta(
        &self,
        pangenome: &Pangenome,
        multigenics: &BTreeSet<usize>,
        gene: usize,
        persistent_run: &mut u32,
    ) -> i64 {
        let family = pangenome.family(pangenome.gene(gene).family);
        if family.partition == Partition::Persistent && !multigenics.contains(&family.id) {
            let penalty = self.persistent_penalty.saturating_pow(*persistent_run);
            *persistent_run = persistent_run.saturating_add(1);
            -penalty
        } else {
            *persistent_run = 0;
            self.variable_gain
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreNode {
    /// true when the node currently belongs to a candidate region.
    pub state: bool,
    pub score: i64,
    /// Index of the preceding node, none at the start of a linear contig.
    pub prev: Option<usize>,
    pub gene: usize,
}

impl ScoreNode {
    fn changes(&mut self, score: i64) {
        self.state = score >= 0;
        self.score = score.max(0);
    }

    fn consume(&mut self) {
        self.state = false;
        self.score = 0;
    }
}

/// Plasticity scores along the genes of one contig.
pub struct ScoreMatrix<'a> {
    pangenome: &'a Pangenome,
    multigenics: &'a BTreeSet<usize>,
    scheme: ScoringScheme,
    contig: usize,
    nodes: Vec<ScoreNode>,
}

impl<'a> ScoreMatrix<'a> {
    /// Score every gene of the contig in order. On a circular contig whose
    /// last gene is in a region, scoring continues over the first genes until
    /// the region state is left.
    pub fn new(
        pangenome: &'a Pangenome,
        contig: usize,
        multigenics: &'a BTreeSet<usize>,
        scheme: ScoringScheme,
    ) -> ScoreMatrix<'a> {
        let genes = &pangenome.contig(contig).genes;
        let mut nodes: Vec<ScoreNode> = Vec::with_capacity(genes.len());
        let mut persistent_run = 0u32;
        let mut first_zero = None;
        let mut prev_score = 0i64;

        for (i, gene) in genes.iter().enumerate() {
            let delta = scheme.delta(pangenome, multigenics, *gene, &mut persistent_run);
            let mut node = ScoreNode {
                state: false,
                score: 0,
                prev: if i == 0 { None } else { Some(i - 1) },
                gene: *gene,
            };
            node.changes(delta.saturating_add(prev_score));
            if !node.state && first_zero.is_none() {
                first_zero = Some(i);
            }
            prev_score = node.score;
            nodes.push(node);
        }

        let mut matrix = ScoreMatrix {
            pangenome,
            multigenics,
            scheme,
            contig,
            nodes,
        };
        let ends_in_region = matrix.nodes.last().map_or(false, |n| n.state);
        if pangenome.contig(contig).is_circular && ends_in_region {
            if let Some(first_zero) = first_zero {
                matrix.wrap_around(first_zero, persistent_run);
            }
        }
        matrix
    }

    fn wrap_around(&mut self, first_zero: usize, mut persistent_run: u32) {
        let last = self.nodes.len() - 1;
        self.nodes[0].prev = Some(last);
        let mut prev_score = self.nodes[last].score;
        trace!(
            "Contig {} is circular and ends in a region, rescoring its first {} genes",
            self.pangenome.contig(self.contig).name,
            first_zero
        );
        for index in 0..first_zero {
            let delta = self.scheme.delta(
                self.pangenome,
                self.multigenics,
                self.nodes[index].gene,
                &mut persistent_run,
            );
            let node = &mut self.nodes[index];
            node.changes(delta.saturating_add(prev_score));
            if !node.state {
                break;
            }
            prev_score = node.score;
        }
    }

    pub fn nodes(&self) -> &[ScoreNode] {
        &self.nodes
    }

    /// Highest score and the index of its last occurrence.
    pub fn max_index_node(&self) -> Option<(i64, usize)> {
        let mut best: Option<(i64, usize)> = None;
        for (i, node) in self.nodes.iter().enumerate() {
            match best {
                Some((score, _)) if node.score < score => {}
                _ => best = Some((node.score, i)),
            }
        }
        best
    }

    /// Build a region from the node at `index`, walking back through the
    /// predecessors while they are in a region. Visited nodes are consumed.
    pub fn extract_region(
        &mut self,
        index: usize,
        region_index: usize,
        naming: NamingScheme,
    ) -> Result<Region> {
        let pangenome = self.pangenome;
        let contig = pangenome.contig(self.contig);
        let name = naming.region_name(
            &pangenome.organism(contig.organism).name,
            &contig.name,
            region_index,
        );
        let mut region = Region::new(&name);
        let mut current = Some(index);
        while let Some(i) = current {
            let node = &mut self.nodes[i];
            if !node.state {
                break;
            }
            region.append(pangenome, node.gene)?;
            node.consume();
            current = node.prev;
        }
        Ok(region)
    }

    /// Recompute scores after the node at `index` was consumed, until a node
    /// already out of any region is met or a linear contig ends.
    pub fn rewrite_from(&mut self, index: usize) {
        let len = self.nodes.len();
        let circular = self.pangenome.contig(self.contig).is_circular;
        let mut prev_score = self.nodes[index].score;
        let mut next = index + 1;
        if next >= len {
            if !circular {
                return;
            }
            next = 0;
        }

        let mut persistent_run = 0u32;
        while self.nodes[next].state {
            let delta = self.scheme.delta(
                self.pangenome,
                self.multigenics,
                self.nodes[next].gene,
                &mut persistent_run,
            );
            self.nodes[next].changes(delta.saturating_add(prev_score));
            prev_score = self.nodes[next].score;
            next += 1;
            if next >= len {
                if !circular {
                    break;
                }
                next = 0;
            }
        }
    }
}
