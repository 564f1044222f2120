pub mod annotation_file;
pub mod error;
pub mod genomic_island;
pub mod graph_writer;
pub mod grr_graph;
pub mod louvain;
pub mod pangenome;
pub mod region;
pub mod region_store;
pub mod rgp_argument_parsing;
pub mod rgp_cluster;
pub mod rgp_similarity;
pub mod score_matrix;
pub mod sorted_pair_edge_map;

#[macro_use]
extern crate log;
extern crate clap;
extern crate rayon;

pub const DEFAULT_PERSISTENT_PENALTY: &str = "3";
pub const DEFAULT_VARIABLE_GAIN: &str = "1";
pub const DEFAULT_MIN_LENGTH: &str = "3000";
pub const DEFAULT_MIN_SCORE: &str = "4";
pub const DEFAULT_DUP_MARGIN: &str = "0.05";
pub const DEFAULT_GRR_CUTOFF: &str = "0.8";
