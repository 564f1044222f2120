use std::collections::HashSet;

use crate::error::{Result, RgpError};
use crate::pangenome::{Pangenome, Partition, Strand};

pub const ANNOTATION_HEADERS: [&str; 9] = [
    "organism",
    "contig",
    "circular",
    "gene",
    "start",
    "stop",
    "strand",
    "family",
    "partition",
];

fn parse_circular(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Read a partitioned pangenome from a tab-separated annotation table, one
/// gene per line: [organism, contig, circular, gene, start, stop, strand,
/// family, partition]. Genes are placed on their contig in file order.
pub fn read_annotation_file(file_path: &str) -> Result<Pangenome> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(std::path::Path::new(file_path))?;
    if reader.headers()? != ANNOTATION_HEADERS.to_vec() {
        return Err(RgpError::parse(
            file_path,
            format!(
                "Incorrect headers found in annotation table, expected {}",
                ANNOTATION_HEADERS.join(" ")
            ),
        ));
    }

    let mut pangenome = Pangenome::new();
    let mut seen_genes = HashSet::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        // line 1 is the header
        let line = i + 2;
        let circular = parse_circular(&record[2]).ok_or_else(|| {
            RgpError::parse(
                file_path,
                format!("Invalid circularity '{}' on line {}", &record[2], line),
            )
        })?;
        let start: u64 = record[4].trim().parse().map_err(|_| {
            RgpError::parse(
                file_path,
                format!("Invalid start '{}' on line {}", &record[4], line),
            )
        })?;
        let stop: u64 = record[5].trim().parse().map_err(|_| {
            RgpError::parse(
                file_path,
                format!("Invalid stop '{}' on line {}", &record[5], line),
            )
        })?;
        if stop < start {
            return Err(RgpError::parse(
                file_path,
                format!("Gene {} stops before it starts on line {}", &record[3], line),
            ));
        }
        let strand = Strand::from_symbol(&record[6]).ok_or_else(|| {
            RgpError::parse(
                file_path,
                format!("Invalid strand '{}' on line {}", &record[6], line),
            )
        })?;
        if !seen_genes.insert(record[3].to_string()) {
            return Err(RgpError::parse(
                file_path,
                format!("The gene {} was found multiple times", &record[3]),
            ));
        }

        let organism = pangenome.add_organism(&record[0]);
        let contig = pangenome.add_contig(organism, &record[1], circular);
        let family = pangenome.add_family(&record[7], Partition::from_label(&record[8]))?;
        trace!(
            "Gene {} of family {} on {} {}..{}",
            &record[3],
            &record[7],
            &record[1],
            start,
            stop
        );
        pangenome.add_gene(contig, &record[3], start, stop, strand, family);
    }
    debug!(
        "Read in {} genes of {} families in {} genomes from {}",
        pangenome.number_of_genes(),
        pangenome.families().len(),
        pangenome.organisms().len(),
        file_path
    );
    Ok(pangenome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_read_annotations() {
        init();
        let pangenome = read_annotation_file("tests/data/annotations.tsv").unwrap();
        assert_eq!(3, pangenome.organisms().len());
        assert_eq!(33, pangenome.number_of_genes());
        assert_eq!(
            vec!["A_chr", "B_chr", "C_chr"],
            pangenome
                .contigs()
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
        );
        assert!(!pangenome.contig(0).is_circular);
        assert!(pangenome.contig(2).is_circular);

        let gene = pangenome.gene(3);
        assert_eq!("A_g3", gene.id);
        assert_eq!(3001, gene.start);
        assert_eq!(3900, gene.stop);
        assert_eq!(Strand::Reverse, gene.strand);
        assert_eq!(3, gene.position);
        assert_eq!("a1", pangenome.family(gene.family).name);
        assert_eq!(Partition::Cloud, pangenome.family(gene.family).partition);

        let a6 = pangenome.families().iter().find(|f| f.name == "a6").unwrap();
        assert_eq!(Partition::Shell, a6.partition);
        assert!(pangenome.check_partitions().is_ok());
    }

    #[test]
    fn test_fail_on_wrong_headers() {
        init();
        assert!(matches!(
            read_annotation_file("tests/data/spots.tsv"),
            Err(RgpError::Parse { .. })
        ));
    }

    #[test]
    fn test_fail_on_missing_file() {
        init();
        assert!(read_annotation_file("tests/data/no_such_file.tsv").is_err());
    }

    #[test]
    fn test_circularity_values() {
        assert_eq!(Some(true), parse_circular("True"));
        assert_eq!(Some(true), parse_circular("1"));
        assert_eq!(Some(false), parse_circular("no"));
        assert_eq!(None, parse_circular("maybe"));
    }
}
