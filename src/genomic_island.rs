use std::collections::{BTreeMap, BTreeSet, HashSet};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Result, RgpError};
use crate::pangenome::{Pangenome, Status};
use crate::region::{NamingScheme, Region};
use crate::score_matrix::{ScoreMatrix, ScoringScheme};

/// Parameters of region prediction, recorded alongside the regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgpParameters {
    pub persistent_penalty: i64,
    pub variable_gain: i64,
    /// Minimum length (bp) of a region to be kept.
    pub min_length: i64,
    pub min_score: i64,
    /// Minimum fraction of organisms with several copies of a persistent
    /// family for it to be multigenic.
    pub dup_margin: f32,
}

impl Default for RgpParameters {
    fn default() -> RgpParameters {
        RgpParameters {
            persistent_penalty: 3,
            variable_gain: 1,
            min_length: 3000,
            min_score: 4,
            dup_margin: 0.05,
        }
    }
}

impl RgpParameters {
    pub fn validate(&self) -> Result<()> {
        if self.persistent_penalty < 1 {
            return Err(RgpError::InvalidArgument(format!(
                "persistent penalty must be at least 1, found {}",
                self.persistent_penalty
            )));
        }
        if self.variable_gain < 1 {
            return Err(RgpError::InvalidArgument(format!(
                "variable gain must be at least 1, found {}",
                self.variable_gain
            )));
        }
        if self.min_score < 1 {
            return Err(RgpError::InvalidArgument(format!(
                "minimum score must be at least 1, found {}",
                self.min_score
            )));
        }
        if self.min_length < 0 {
            return Err(RgpError::InvalidArgument(format!(
                "minimum length cannot be negative, found {}",
                self.min_length
            )));
        }
        if !(0.0..=1.0).contains(&self.dup_margin) {
            return Err(RgpError::InvalidArgument(format!(
                "duplication margin must be between 0 and 1, found {}",
                self.dup_margin
            )));
        }
        Ok(())
    }

    fn scoring_scheme(&self) -> ScoringScheme {
        ScoringScheme {
            persistent_penalty: self.persistent_penalty,
            variable_gain: self.variable_gain,
        }
    }

    fn to_record(&self) -> BTreeMap<String, String> {
        let mut record = BTreeMap::new();
        record.insert(
            "persistent_penalty".to_string(),
            self.persistent_penalty.to_string(),
        );
        record.insert("variable_gain".to_string(), self.variable_gain.to_string());
        record.insert("min_length".to_string(), self.min_length.to_string());
        record.insert("min_score".to_string(), self.min_score.to_string());
        record.insert("dup_margin".to_string(), self.dup_margin.to_string());
        record
    }
}

/// Peel the regions of one contig, best scoring first.
pub fn mk_regions(
    pangenome: &Pangenome,
    contig: usize,
    multigenics: &BTreeSet<usize>,
    parameters: &RgpParameters,
    naming: NamingScheme,
) -> Result<Vec<Region>> {
    let mut matrix = ScoreMatrix::new(pangenome, contig, multigenics, parameters.scoring_scheme());
    let mut contig_regions = vec![];

    while let Some((score, index)) = matrix.max_index_node() {
        if score < parameters.min_score {
            break;
        }
        let mut region = matrix.extract_region(index, contig_regions.len(), naming)?;
        if region.is_empty() {
            warn!(
                "Node {} of contig {} has score {} but is not in a region",
                index,
                pangenome.contig(contig).name,
                score
            );
            break;
        }
        region.score = score;

        // Genes were collected backwards: the first one is the rightmost.
        let first = pangenome.gene(region.first_gene()?);
        let last = pangenome.gene(region.last_gene()?);
        let length = first.stop as i64 - last.start as i64;
        if length > parameters.min_length {
            contig_regions.push(region);
        } else {
            trace!(
                "Discarding {} with score {}: length {} is not above {}",
                region.name,
                score,
                length,
                parameters.min_length
            );
        }
        matrix.rewrite_from(index);
    }
    Ok(contig_regions)
}

/// Predict the regions of every contig of an organism.
pub fn compute_org_rgp(
    pangenome: &Pangenome,
    organism: usize,
    multigenics: &BTreeSet<usize>,
    parameters: &RgpParameters,
    naming: NamingScheme,
) -> Result<Vec<Region>> {
    let mut org_regions = vec![];
    for contig in &pangenome.organism(organism).contigs {
        // some contigs have no coding genes
        if pangenome.contig(*contig).genes.is_empty() {
            continue;
        }
        org_regions.extend(mk_regions(
            pangenome,
            *contig,
            multigenics,
            parameters,
            naming,
        )?);
    }
    Ok(org_regions)
}

/// Contig names alone are used unless two contigs share an identifier.
pub fn naming_scheme(pangenome: &Pangenome) -> NamingScheme {
    let mut contig_ids = HashSet::new();
    for contig in pangenome.contigs() {
        if !contig_ids.insert(contig.name.as_str()) {
            warn!(
                "You have contigs with identical identifiers in your assemblies. \
                 Identifiers will be supplemented with your provided organism names."
            );
            return NamingScheme::Organism;
        }
    }
    NamingScheme::Contig
}

/// Refuse to overwrite stored regions unless forced, in which case they are
/// erased along with everything computed from them.
pub fn check_pangenome_former_rgp(pangenome: &mut Pangenome, force: bool) -> Result<()> {
    if pangenome.rgp_status() == Status::InFile {
        if !force {
            return Err(RgpError::AlreadyComputed);
        }
        info!("Erasing previously predicted RGPs");
        pangenome.erase_regions();
    }
    Ok(())
}

/// Predict regions of genomic plasticity in every organism of the pangenome.
pub fn predict_rgp(
    pangenome: &mut Pangenome,
    parameters: &RgpParameters,
    force: bool,
    disable_bar: bool,
) -> Result<()> {
    parameters.validate()?;
    check_pangenome_former_rgp(pangenome, force)?;
    pangenome.check_partitions()?;

    info!("Detecting multigenic families ..");
    let multigenics = pangenome.get_multigenics(parameters.dup_margin);

    info!("Computing Regions of Genomic Plasticity ..");
    let naming = naming_scheme(pangenome);
    let bar = progress_bar(pangenome.organisms().len() as u64, "genomes", disable_bar);

    let mut regions = vec![];
    for organism in 0..pangenome.organisms().len() {
        let org_regions = compute_org_rgp(pangenome, organism, &multigenics, parameters, naming)?;
        debug!(
            "Found {} RGPs in {}",
            org_regions.len(),
            pangenome.organism(organism).name
        );
        regions.extend(org_regions);
        bar.inc(1);
    }
    bar.finish_and_clear();

    pangenome.add_regions(regions);
    info!("Predicted {} RGPs", pangenome.regions().len());

    pangenome.record_run_parameters("RGP", parameters.to_record());
    pangenome.set_rgp_status(Status::Computed);
    Ok(())
}

pub(crate) fn progress_bar(length: u64, unit: &str, disable: bool) -> ProgressBar {
    if disable {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(length);
    if let Ok(style) =
        ProgressStyle::with_template(&format!("{{bar:40}} {{pos}}/{{len}} {} [{{elapsed}}]", unit))
    {
        bar.set_style(style);
    }
    bar
}
