use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::error::{Result, RgpError};
use crate::pangenome::Pangenome;

/// How region names are built. Contig identifiers are used alone unless
/// they clash across organisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    Contig,
    Organism,
}

impl NamingScheme {
    pub fn region_name(&self, organism: &str, contig: &str, index: usize) -> String {
        match self {
            NamingScheme::Contig => format!("{}_RGP_{}", contig, index),
            NamingScheme::Organism => format!("{}_{}_RGP_{}", organism, contig, index),
        }
    }
}

/// A region of genomic plasticity: an ordered set of genes drawn from a
/// single contig.
///
/// Two regions are equal when they hold the same genes, whatever their
/// order or name.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub score: i64,
    genes: Vec<usize>,
    contig: Option<usize>,
    organism: Option<usize>,
}

impl Region {
    pub fn new(name: &str) -> Region {
        Region {
            name: name.to_string(),
            score: 0,
            genes: vec![],
            contig: None,
            organism: None,
        }
    }

    pub fn append(&mut self, pangenome: &Pangenome, gene: usize) -> Result<()> {
        if gene >= pangenome.number_of_genes() {
            return Err(RgpError::InvalidArgument(format!(
                "Gene index {} is not part of the pangenome",
                gene
            )));
        }
        let gene_contig = pangenome.gene(gene).contig;
        match self.contig {
            None => {
                self.contig = Some(gene_contig);
                self.organism = Some(pangenome.gene(gene).organism);
            }
            Some(contig) if contig != gene_contig => {
                return Err(RgpError::InvalidArgument(format!(
                    "Gene {} does not belong to the contig of region {}",
                    pangenome.gene(gene).id,
                    self.name
                )));
            }
            Some(_) => {}
        }
        if self.genes.contains(&gene) {
            return Err(RgpError::InvalidArgument(format!(
                "Gene {} is already part of region {}",
                pangenome.gene(gene).id,
                self.name
            )));
        }
        self.genes.push(gene);
        Ok(())
    }

    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// First gene appended to the region.
    pub fn first_gene(&self) -> Result<usize> {
        self.genes
            .first()
            .copied()
            .ok_or_else(|| RgpError::EmptyRegion(self.name.clone()))
    }

    /// Last gene appended to the region.
    pub fn last_gene(&self) -> Result<usize> {
        self.genes
            .last()
            .copied()
            .ok_or_else(|| RgpError::EmptyRegion(self.name.clone()))
    }

    pub fn contig(&self) -> Option<usize> {
        self.contig
    }

    pub fn organism(&self) -> Option<usize> {
        self.organism
    }

    pub fn start(&self, pangenome: &Pangenome) -> Result<u64> {
        self.genes
            .iter()
            .map(|g| pangenome.gene(*g).start)
            .min()
            .ok_or_else(|| RgpError::EmptyRegion(self.name.clone()))
    }

    pub fn stop(&self, pangenome: &Pangenome) -> Result<u64> {
        self.genes
            .iter()
            .map(|g| pangenome.gene(*g).stop)
            .max()
            .ok_or_else(|| RgpError::EmptyRegion(self.name.clone()))
    }

    /// Distinct gene families of the region.
    pub fn families(&self, pangenome: &Pangenome) -> BTreeSet<usize> {
        self.genes
            .iter()
            .map(|g| pangenome.gene(*g).family)
            .collect()
    }

    /// Whether the region holds the first or the last gene of its contig.
    pub fn is_contig_border(&self, pangenome: &Pangenome) -> Result<bool> {
        let contig = self
            .contig
            .ok_or_else(|| RgpError::EmptyRegion(self.name.clone()))?;
        let last_position = pangenome.contig(contig).genes.len() - 1;
        Ok(self.genes.iter().any(|g| {
            let position = pangenome.gene(*g).position;
            position == 0 || position == last_position
        }))
    }

    pub fn is_whole_contig(&self, pangenome: &Pangenome) -> Result<bool> {
        let contig = self
            .contig
            .ok_or_else(|| RgpError::EmptyRegion(self.name.clone()))?;
        // genes are unique and all from this contig
        Ok(self.genes.len() == pangenome.contig(contig).genes.len())
    }

    fn sorted_genes(&self) -> Vec<usize> {
        let mut genes = self.genes.clone();
        genes.sort_unstable();
        genes
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Region) -> bool {
        self.genes.len() == other.genes.len() && self.sorted_genes() == other.sorted_genes()
    }
}

impl Eq for Region {}

impl Hash for Region {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_genes().hash(state);
    }
}
