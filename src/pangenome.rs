use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Result, RgpError};
use crate::region::Region;

/// Presence-frequency class of a gene family across the genomes of the
/// pangenome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Persistent,
    Shell,
    Cloud,
    Undefined,
}

impl Partition {
    /// Accepts full names or the one-letter codes used by partitioned
    /// pangenome tables (P/S/C), case insensitively.
    pub fn from_label(label: &str) -> Partition {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "persistent" => Partition::Persistent,
            "shell" => Partition::Shell,
            "cloud" => Partition::Cloud,
            _ => match label.chars().next() {
                Some('p') => Partition::Persistent,
                Some('s') => Partition::Shell,
                Some('c') => Partition::Cloud,
                _ => Partition::Undefined,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Partition::Persistent => "persistent",
            Partition::Shell => "shell",
            Partition::Cloud => "cloud",
            Partition::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_symbol(symbol: &str) -> Option<Strand> {
        match symbol.trim() {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

/// Computation status of a pangenome feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Absent,
    /// Computed during this run, not yet written.
    Computed,
    /// Loaded from (or already present in) the persistent store.
    InFile,
}

#[derive(Debug, Clone)]
pub struct Gene {
    pub id: String,
    pub start: u64,
    pub stop: u64,
    pub strand: Strand,
    /// Index of the gene within its contig.
    pub position: usize,
    pub family: usize,
    pub organism: usize,
    pub contig: usize,
}

#[derive(Debug, Clone)]
pub struct GeneFamily {
    pub id: usize,
    pub name: String,
    pub partition: Partition,
    pub genes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Contig {
    pub name: String,
    pub is_circular: bool,
    pub organism: usize,
    pub genes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Organism {
    pub name: String,
    pub contigs: Vec<usize>,
}

/// A hotspot: a set of regions inserted at the same genomic context.
#[derive(Debug, Clone)]
pub struct Spot {
    pub id: String,
    pub regions: Vec<usize>,
}

/// Annotated and partitioned pangenome. Genes, families, contigs and
/// organisms live in arenas and refer to each other by index.
#[derive(Debug, Default)]
pub struct Pangenome {
    genes: Vec<Gene>,
    families: Vec<GeneFamily>,
    contigs: Vec<Contig>,
    organisms: Vec<Organism>,
    regions: Vec<Region>,
    spots: Vec<Spot>,
    organism_index: HashMap<String, usize>,
    contig_index: HashMap<(usize, String), usize>,
    family_index: HashMap<String, usize>,
    rgp_status: Option<Status>,
    spots_status: Option<Status>,
    parameters: BTreeMap<String, BTreeMap<String, String>>,
}

impl Pangenome {
    pub fn new() -> Pangenome {
        Pangenome::default()
    }

    pub fn add_organism(&mut self, name: &str) -> usize {
        if let Some(index) = self.organism_index.get(name) {
            return *index;
        }
        let index = self.organisms.len();
        self.organisms.push(Organism {
            name: name.to_string(),
            contigs: vec![],
        });
        self.organism_index.insert(name.to_string(), index);
        index
    }

    /// Get or create a contig of the given organism. The circularity of an
    /// existing contig is never changed.
    pub fn add_contig(&mut self, organism: usize, name: &str, is_circular: bool) -> usize {
        let key = (organism, name.to_string());
        if let Some(index) = self.contig_index.get(&key) {
            return *index;
        }
        let index = self.contigs.len();
        self.contigs.push(Contig {
            name: name.to_string(),
            is_circular,
            organism,
            genes: vec![],
        });
        self.organisms[organism].contigs.push(index);
        self.contig_index.insert(key, index);
        index
    }

    /// Get or create a gene family. Returns an error when the family is
    /// already known under another partition.
    pub fn add_family(&mut self, name: &str, partition: Partition) -> Result<usize> {
        if let Some(index) = self.family_index.get(name) {
            let known = self.families[*index].partition;
            if known != partition {
                return Err(RgpError::InvalidArgument(format!(
                    "Gene family {} is assigned to both the {} and {} partitions",
                    name,
                    known.name(),
                    partition.name()
                )));
            }
            return Ok(*index);
        }
        let index = self.families.len();
        self.families.push(GeneFamily {
            id: index,
            name: name.to_string(),
            partition,
            genes: vec![],
        });
        self.family_index.insert(name.to_string(), index);
        Ok(index)
    }

    /// Append a gene at the end of a contig.
    pub fn add_gene(
        &mut self,
        contig: usize,
        id: &str,
        start: u64,
        stop: u64,
        strand: Strand,
        family: usize,
    ) -> usize {
        let index = self.genes.len();
        let organism = self.contigs[contig].organism;
        let position = self.contigs[contig].genes.len();
        self.genes.push(Gene {
            id: id.to_string(),
            start,
            stop,
            strand,
            position,
            family,
            organism,
            contig,
        });
        self.contigs[contig].genes.push(index);
        self.families[family].genes.push(index);
        index
    }

    pub fn gene(&self, index: usize) -> &Gene {
        &self.genes[index]
    }

    pub fn family(&self, index: usize) -> &GeneFamily {
        &self.families[index]
    }

    pub fn contig(&self, index: usize) -> &Contig {
        &self.contigs[index]
    }

    pub fn organism(&self, index: usize) -> &Organism {
        &self.organisms[index]
    }

    pub fn number_of_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn families(&self) -> &[GeneFamily] {
        &self.families
    }

    pub fn gene_index_by_id(&self) -> HashMap<&str, usize> {
        self.genes
            .iter()
            .enumerate()
            .map(|(i, gene)| (gene.id.as_str(), i))
            .collect()
    }

    /// Annotations and partitions must be available before regions can be
    /// predicted.
    pub fn check_partitions(&self) -> Result<()> {
        if self.genes.is_empty() {
            return Err(RgpError::PrerequisiteMissing(
                "the pangenome has no annotated genes".to_string(),
            ));
        }
        if let Some(family) = self
            .families
            .iter()
            .find(|f| f.partition == Partition::Undefined)
        {
            return Err(RgpError::PrerequisiteMissing(format!(
                "gene family {} has not been partitioned",
                family.name
            )));
        }
        Ok(())
    }

    /// Persistent families found in several copies in at least `dup_margin`
    /// of the organisms where they are present.
    pub fn get_multigenics(&self, dup_margin: f32) -> BTreeSet<usize> {
        let mut multigenics = BTreeSet::new();
        for family in &self.families {
            if family.partition != Partition::Persistent {
                continue;
            }
            let mut copies_per_organism: BTreeMap<usize, usize> = BTreeMap::new();
            for gene in &family.genes {
                *copies_per_organism
                    .entry(self.genes[*gene].organism)
                    .or_insert(0) += 1;
            }
            if copies_per_organism.is_empty() {
                continue;
            }
            let duplicated = copies_per_organism.values().filter(|c| **c > 1).count();
            if duplicated as f32 / copies_per_organism.len() as f32 >= dup_margin {
                trace!(
                    "Family {} is duplicated in {} of {} organisms",
                    family.name,
                    duplicated,
                    copies_per_organism.len()
                );
                multigenics.insert(family.id);
            }
        }
        info!("{} families were considered multigenic", multigenics.len());
        multigenics
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn add_regions<I: IntoIterator<Item = Region>>(&mut self, regions: I) {
        self.regions.extend(regions);
    }

    pub fn region_index_by_name(&self) -> HashMap<&str, usize> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, region)| (region.name.as_str(), i))
            .collect()
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn add_spot(&mut self, spot: Spot) {
        self.spots.push(spot);
    }

    pub fn rgp_status(&self) -> Status {
        self.rgp_status.unwrap_or(Status::Absent)
    }

    pub fn spots_status(&self) -> Status {
        self.spots_status.unwrap_or(Status::Absent)
    }

    pub fn set_rgp_status(&mut self, status: Status) {
        self.rgp_status = Some(status);
    }

    pub fn set_spots_status(&mut self, status: Status) {
        self.spots_status = Some(status);
    }

    pub fn record_run_parameters(&mut self, kind: &str, parameters: BTreeMap<String, String>) {
        self.parameters.insert(kind.to_string(), parameters);
    }

    pub fn run_parameters(&self, kind: &str) -> Option<&BTreeMap<String, String>> {
        self.parameters.get(kind)
    }

    /// Drop the predicted regions and everything derived from them.
    pub fn erase_regions(&mut self) {
        debug!(
            "Erasing {} regions and {} spots",
            self.regions.len(),
            self.spots.len()
        );
        self.regions.clear();
        self.spots.clear();
        self.parameters.remove("RGP");
        self.rgp_status = Some(Status::Absent);
        self.spots_status = Some(Status::Absent);
    }
}
