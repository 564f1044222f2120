//! Persistent storage of predicted regions as tab-separated tables in a
//! directory, and reading of spot assignments.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Result, RgpError};
use crate::pangenome::{Pangenome, Spot, Status};
use crate::region::Region;

pub const RGP_GENES_FILE: &str = "rgp_genes.tsv";
pub const RGP_PARAMETERS_FILE: &str = "rgp_parameters.tsv";
pub const PLASTIC_REGIONS_FILE: &str = "plastic_regions.tsv";

fn tsv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?)
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?)
}

fn check_headers(
    reader: &mut csv::Reader<std::fs::File>,
    path: &Path,
    expected: &[&str],
) -> Result<()> {
    if reader.headers()? != expected.to_vec() {
        return Err(RgpError::parse(
            path.display().to_string(),
            format!("Incorrect headers, expected {}", expected.join(" ")),
        ));
    }
    Ok(())
}

/// Whether regions were already written to this directory.
pub fn has_stored_rgp(directory: &Path) -> bool {
    directory.join(RGP_GENES_FILE).exists()
}

/// Write the regions of the pangenome, the parameters they were predicted
/// with and a per-region summary.
pub fn write_rgp(pangenome: &Pangenome, directory: &Path) -> Result<()> {
    std::fs::create_dir_all(directory)?;
    info!(
        "Writing {} RGPs to {}",
        pangenome.regions().len(),
        directory.display()
    );

    let mut genes = tsv_writer(&directory.join(RGP_GENES_FILE))?;
    genes.write_record(&["region", "gene", "score"])?;
    for region in pangenome.regions() {
        let score = region.score.to_string();
        for gene in region.genes() {
            genes.write_record(&[
                region.name.as_str(),
                pangenome.gene(*gene).id.as_str(),
                score.as_str(),
            ])?;
        }
    }
    genes.flush()?;

    let mut parameters = tsv_writer(&directory.join(RGP_PARAMETERS_FILE))?;
    parameters.write_record(&["kind", "parameter", "value"])?;
    if let Some(recorded) = pangenome.run_parameters("RGP") {
        for (parameter, value) in recorded {
            parameters.write_record(&["RGP", parameter.as_str(), value.as_str()])?;
        }
    }
    parameters.flush()?;

    write_plastic_regions(pangenome, &directory.join(PLASTIC_REGIONS_FILE))
}

/// One line per region with its coordinates and borders, sorted by
/// organism, contig and start.
pub fn write_plastic_regions(pangenome: &Pangenome, path: &Path) -> Result<()> {
    let mut rows = Vec::with_capacity(pangenome.regions().len());
    for region in pangenome.regions() {
        let contig = region
            .contig()
            .ok_or_else(|| RgpError::EmptyRegion(region.name.clone()))?;
        let contig = pangenome.contig(contig);
        let organism = &pangenome.organism(contig.organism).name;
        rows.push((organism, &contig.name, region.start(pangenome)?, region));
    }
    rows.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let mut summary = tsv_writer(path)?;
    summary.write_record(&[
        "region",
        "organism",
        "contig",
        "start",
        "stop",
        "genes",
        "contigBorder",
        "wholeContig",
    ])?;
    for (organism, contig, start, region) in rows {
        summary.write_record(&[
            region.name.clone(),
            organism.clone(),
            contig.clone(),
            start.to_string(),
            region.stop(pangenome)?.to_string(),
            region.len().to_string(),
            region.is_contig_border(pangenome)?.to_string(),
            region.is_whole_contig(pangenome)?.to_string(),
        ])?;
    }
    summary.flush()?;
    Ok(())
}

/// Load regions written by `write_rgp` into a pangenome read from the same
/// annotations.
pub fn read_rgp(pangenome: &mut Pangenome, directory: &Path) -> Result<()> {
    if !has_stored_rgp(directory) {
        return Err(RgpError::PrerequisiteMissing(format!(
            "no RGPs were found in {}, they must be predicted first",
            directory.display()
        )));
    }

    let genes_path = directory.join(RGP_GENES_FILE);
    let mut reader = tsv_reader(&genes_path)?;
    check_headers(&mut reader, &genes_path, &["region", "gene", "score"])?;

    let regions = {
        let gene_index = pangenome.gene_index_by_id();
        let mut regions: Vec<Region> = vec![];
        let mut region_index: HashMap<String, usize> = HashMap::new();
        for result in reader.records() {
            let record = result?;
            let gene = *gene_index.get(&record[1]).ok_or_else(|| {
                RgpError::parse(
                    genes_path.display().to_string(),
                    format!(
                        "Gene {} of region {} is not in the pangenome",
                        &record[1], &record[0]
                    ),
                )
            })?;
            let score: i64 = record[2].trim().parse().map_err(|_| {
                RgpError::parse(
                    genes_path.display().to_string(),
                    format!("Invalid score '{}' for region {}", &record[2], &record[0]),
                )
            })?;
            let index = match region_index.get(&record[0]) {
                Some(index) => *index,
                None => {
                    let mut region = Region::new(&record[0]);
                    region.score = score;
                    region_index.insert(record[0].to_string(), regions.len());
                    regions.push(region);
                    regions.len() - 1
                }
            };
            regions[index].append(pangenome, gene)?;
        }
        regions
    };
    debug!(
        "Read {} RGPs from {}",
        regions.len(),
        genes_path.display()
    );
    pangenome.add_regions(regions);

    let parameters_path = directory.join(RGP_PARAMETERS_FILE);
    if parameters_path.exists() {
        let mut reader = tsv_reader(&parameters_path)?;
        check_headers(&mut reader, &parameters_path, &["kind", "parameter", "value"])?;
        let mut recorded: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for result in reader.records() {
            let record = result?;
            recorded
                .entry(record[0].to_string())
                .or_insert_with(BTreeMap::new)
                .insert(record[1].to_string(), record[2].to_string());
        }
        for (kind, parameters) in recorded {
            pangenome.record_run_parameters(&kind, parameters);
        }
    }
    pangenome.set_rgp_status(Status::InFile);
    Ok(())
}

/// Remove stored region tables from the directory.
pub fn erase_stored_rgp(directory: &Path) -> Result<()> {
    for file in &[RGP_GENES_FILE, RGP_PARAMETERS_FILE, PLASTIC_REGIONS_FILE] {
        let path = directory.join(file);
        if path.exists() {
            debug!("Removing {}", path.display());
            std::fs::remove_file(path)?;
        }
    }
    Ok(())
}

/// Read spot assignments, [spot_id, rgp_id] per line, for regions already
/// loaded in the pangenome. Spots are kept in order of first appearance.
pub fn read_spots_file(pangenome: &mut Pangenome, file_path: &str) -> Result<()> {
    let path = Path::new(file_path);
    let mut reader = tsv_reader(path)?;
    check_headers(&mut reader, path, &["spot_id", "rgp_id"])?;

    let spots = {
        let region_index = pangenome.region_index_by_name();
        let mut spots: Vec<Spot> = vec![];
        let mut spot_index: HashMap<String, usize> = HashMap::new();
        for result in reader.records() {
            let record = result?;
            let region = *region_index.get(&record[1]).ok_or_else(|| {
                RgpError::parse(
                    file_path,
                    format!("Unknown region {} in spot {}", &record[1], &record[0]),
                )
            })?;
            let index = *spot_index.entry(record[0].to_string()).or_insert_with(|| {
                spots.push(Spot {
                    id: record[0].to_string(),
                    regions: vec![],
                });
                spots.len() - 1
            });
            spots[index].regions.push(region);
        }
        spots
    };
    info!("Read {} spots from {}", spots.len(), file_path);
    for spot in spots {
        pangenome.add_spot(spot);
    }
    pangenome.set_spots_status(Status::InFile);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation_file::read_annotation_file;
    use crate::genomic_island::{predict_rgp, RgpParameters};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn predicted() -> Pangenome {
        let mut pangenome = read_annotation_file("tests/data/annotations.tsv").unwrap();
        predict_rgp(&mut pangenome, &RgpParameters::default(), false, true).unwrap();
        pangenome
    }

    #[test]
    fn test_write_then_read_regions() {
        init();
        let pangenome = predicted();
        assert_eq!(3, pangenome.regions().len());
        let dir = tempfile::tempdir().unwrap();
        write_rgp(&pangenome, dir.path()).unwrap();
        assert!(has_stored_rgp(dir.path()));

        let summary = std::fs::read_to_string(dir.path().join(PLASTIC_REGIONS_FILE)).unwrap();
        assert_eq!(
            "region\torganism\tcontig\tstart\tstop\tgenes\tcontigBorder\twholeContig\n\
             A_chr_RGP_0\torgA\tA_chr\t3001\t7900\t5\tfalse\tfalse\n\
             B_chr_RGP_0\torgB\tB_chr\t3001\t7900\t5\tfalse\tfalse\n\
             C_chr_RGP_0\torgC\tC_chr\t3001\t7900\t5\tfalse\tfalse\n",
            summary
        );

        let mut reloaded = read_annotation_file("tests/data/annotations.tsv").unwrap();
        read_rgp(&mut reloaded, dir.path()).unwrap();
        assert_eq!(Status::InFile, reloaded.rgp_status());
        assert_eq!(pangenome.regions().len(), reloaded.regions().len());
        for (before, after) in pangenome.regions().iter().zip(reloaded.regions()) {
            assert_eq!(before.name, after.name);
            assert_eq!(before.score, after.score);
            assert_eq!(before.genes(), after.genes());
        }
        assert_eq!(
            pangenome.run_parameters("RGP"),
            reloaded.run_parameters("RGP")
        );

        erase_stored_rgp(dir.path()).unwrap();
        assert!(!has_stored_rgp(dir.path()));
    }

    #[test]
    fn test_plastic_regions_are_sorted() {
        use crate::pangenome::tests::single_contig_pangenome;
        use crate::pangenome::{Partition::*, Strand};
        init();

        // org1 is read first and its second region starts before its first
        let mut partitions = vec![Cloud; 5];
        partitions.extend_from_slice(&[Persistent; 3]);
        partitions.extend_from_slice(&[Shell; 6]);
        let mut pangenome = single_contig_pangenome(&partitions, false);
        let org = pangenome.add_organism("alpha");
        let contig = pangenome.add_contig(org, "alpha_chr", false);
        for i in 0..6 {
            let family = pangenome
                .add_family(&format!("alpha_fam{}", i), Cloud)
                .unwrap();
            let start = i as u64 * 1000 + 1;
            pangenome.add_gene(
                contig,
                &format!("alpha_gene{}", i),
                start,
                start + 899,
                Strand::Forward,
                family,
            );
        }
        predict_rgp(&mut pangenome, &RgpParameters::default(), false, true).unwrap();
        assert_eq!(3, pangenome.regions().len());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PLASTIC_REGIONS_FILE);
        write_plastic_regions(&pangenome, &path).unwrap();
        let summary = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<Vec<&str>> = summary
            .lines()
            .skip(1)
            .map(|line| line.split('\t').take(4).collect())
            .collect();
        assert_eq!(
            vec![
                vec!["alpha_chr_RGP_0", "alpha", "alpha_chr", "1"],
                vec!["contig1_RGP_1", "org1", "contig1", "1"],
                vec!["contig1_RGP_0", "org1", "contig1", "8001"],
            ],
            rows
        );
    }

    #[test]
    fn test_read_without_regions() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let mut pangenome = read_annotation_file("tests/data/annotations.tsv").unwrap();
        assert!(matches!(
            read_rgp(&mut pangenome, dir.path()),
            Err(RgpError::PrerequisiteMissing(_))
        ));
    }

    #[test]
    fn test_read_spots() {
        init();
        let mut pangenome = predicted();
        read_spots_file(&mut pangenome, "tests/data/spots.tsv").unwrap();
        assert_eq!(Status::InFile, pangenome.spots_status());
        let spots = pangenome.spots();
        assert_eq!(2, spots.len());
        assert_eq!("spot_0", spots[0].id);
        assert_eq!(vec![0, 1], spots[0].regions);
        assert_eq!("spot_1", spots[1].id);
        assert_eq!(vec![2], spots[1].regions);
    }

    #[test]
    fn test_spots_of_unknown_regions() {
        init();
        let mut pangenome = read_annotation_file("tests/data/annotations.tsv").unwrap();
        assert!(matches!(
            read_spots_file(&mut pangenome, "tests/data/spots.tsv"),
            Err(RgpError::Parse { .. })
        ));
    }
}
