use std::path::Path;

use bird_tool_utils::clap_utils::{add_clap_verbosity_flags, set_log_level};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::annotation_file::read_annotation_file;
use crate::error::{Result, RgpError};
use crate::genomic_island::{predict_rgp, RgpParameters};
use crate::region_store;
use crate::rgp_cluster::{cluster_rgp, mk_outdir, write_grr_graph, ClusterParameters};
use crate::{
    DEFAULT_DUP_MARGIN, DEFAULT_GRR_CUTOFF, DEFAULT_MIN_LENGTH, DEFAULT_MIN_SCORE,
    DEFAULT_PERSISTENT_PENALTY, DEFAULT_VARIABLE_GAIN,
};

fn get_value<T: Clone + Send + Sync + 'static>(m: &ArgMatches, parameter: &str) -> Result<T> {
    m.get_one::<T>(parameter)
        .cloned()
        .ok_or_else(|| RgpError::InvalidArgument(format!("--{} must be specified", parameter)))
}

/// A value between 0 and 1 inclusive.
pub fn parse_fraction(m: &ArgMatches, parameter: &str) -> Result<f32> {
    let fraction: f32 = get_value(m, parameter)?;
    if !(0.0..=1.0).contains(&fraction) {
        error!("Invalid fraction: '{}'", fraction);
        return Err(RgpError::InvalidArgument(format!(
            "Invalid fraction specified for --{}: '{}', it must be between 0 and 1",
            parameter, fraction
        )));
    }
    debug!("Using {} {}", parameter, fraction);
    Ok(fraction)
}

pub fn add_rgp_subcommand(app: Command) -> Command {
    let rgp_subcommand = add_clap_verbosity_flags(Command::new("rgp"))
        .about("Predict regions of genomic plasticity in a partitioned pangenome")
        .arg(
            Arg::new("pangenome")
                .long("pangenome")
                .required(true)
                .help("Tab-separated annotation table of the partitioned pangenome"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .required(true)
                .help("Directory where predicted regions are stored"),
        )
        .arg(
            Arg::new("persistent-penalty")
                .long("persistent-penalty")
                .help("Penalty score to apply to persistent genes")
                .value_parser(value_parser!(i64))
                .default_value(DEFAULT_PERSISTENT_PENALTY),
        )
        .arg(
            Arg::new("variable-gain")
                .long("variable-gain")
                .help("Gain score to apply to variable genes")
                .value_parser(value_parser!(i64))
                .default_value(DEFAULT_VARIABLE_GAIN),
        )
        .arg(
            Arg::new("min-length")
                .long("min-length")
                .help("Minimum length (bp) of a region to be considered a RGP")
                .value_parser(value_parser!(i64))
                .default_value(DEFAULT_MIN_LENGTH),
        )
        .arg(
            Arg::new("min-score")
                .long("min-score")
                .help("Minimal score wanted for considering a region as being a RGP")
                .value_parser(value_parser!(i64))
                .default_value(DEFAULT_MIN_SCORE),
        )
        .arg(
            Arg::new("dup-margin")
                .long("dup-margin")
                .help(
                    "Minimum ratio of organisms where a persistent family has several \
                     genes for it to be considered multigenic",
                )
                .value_parser(value_parser!(f32))
                .default_value(DEFAULT_DUP_MARGIN),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Erase previously predicted regions of the output directory"),
        )
        .arg(
            Arg::new("disable-progress-bar")
                .long("disable-progress-bar")
                .action(ArgAction::SetTrue)
                .help("Do not show progress bars"),
        );
    app.subcommand(rgp_subcommand)
}

pub fn add_rgp_cluster_subcommand(app: Command) -> Command {
    let cluster_subcommand = add_clap_verbosity_flags(Command::new("rgp-cluster"))
        .about("Cluster regions of genomic plasticity by gene repertoire relatedness")
        .arg(
            Arg::new("pangenome")
                .long("pangenome")
                .required(true)
                .help("Tab-separated annotation table of the partitioned pangenome"),
        )
        .arg(
            Arg::new("rgp-directory")
                .long("rgp-directory")
                .required(true)
                .help("Output directory of the 'rgp' subcommand"),
        )
        .arg(
            Arg::new("spots")
                .long("spots")
                .help("Tab-separated table assigning regions to spots [spot_id, rgp_id]"),
        )
        .arg(
            Arg::new("grr-cutoff")
                .long("grr-cutoff")
                .help("Min gene repertoire relatedness used to filter edges downstream")
                .value_parser(value_parser!(f32))
                .default_value(DEFAULT_GRR_CUTOFF),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .help("Number of CPU threads to use")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .required(true)
                .help("Output directory for the region graph"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Write into the output directory even if it exists"),
        )
        .arg(
            Arg::new("disable-progress-bar")
                .long("disable-progress-bar")
                .action(ArgAction::SetTrue)
                .help("Do not show progress bars"),
        );
    app.subcommand(cluster_subcommand)
}

pub fn run_rgp_subcommand(matches: &ArgMatches, program_name: &str, version: &str) -> Result<()> {
    let m = matches
        .subcommand_matches("rgp")
        .ok_or_else(|| RgpError::InvalidArgument("rgp subcommand expected".to_string()))?;
    set_log_level(m, true, program_name, version);

    let parameters = RgpParameters {
        persistent_penalty: get_value(m, "persistent-penalty")?,
        variable_gain: get_value(m, "variable-gain")?,
        min_length: get_value(m, "min-length")?,
        min_score: get_value(m, "min-score")?,
        dup_margin: parse_fraction(m, "dup-margin")?,
    };
    parameters.validate()?;
    let force = m.get_flag("force");
    let disable_bar = m.get_flag("disable-progress-bar");

    let pangenome_path: String = get_value(m, "pangenome")?;
    let output: String = get_value(m, "output")?;
    let output = Path::new(&output);

    let mut pangenome = read_annotation_file(&pangenome_path)?;
    let stored = region_store::has_stored_rgp(output);
    if stored {
        region_store::read_rgp(&mut pangenome, output)?;
    }
    predict_rgp(&mut pangenome, &parameters, force, disable_bar)?;

    if stored {
        region_store::erase_stored_rgp(output)?;
    }
    region_store::write_rgp(&pangenome, output)?;
    info!("Finished predicting regions of genomic plasticity");
    Ok(())
}

pub fn run_rgp_cluster_subcommand(
    matches: &ArgMatches,
    program_name: &str,
    version: &str,
) -> Result<()> {
    let m = matches
        .subcommand_matches("rgp-cluster")
        .ok_or_else(|| RgpError::InvalidArgument("rgp-cluster subcommand expected".to_string()))?;
    set_log_level(m, true, program_name, version);

    let parameters = ClusterParameters {
        grr_cutoff: parse_fraction(m, "grr-cutoff")?,
        threads: get_value(m, "threads")?,
    };
    parameters.validate()?;
    let force = m.get_flag("force");
    let disable_bar = m.get_flag("disable-progress-bar");

    let pangenome_path: String = get_value(m, "pangenome")?;
    let rgp_directory: String = get_value(m, "rgp-directory")?;
    let output: String = get_value(m, "output")?;
    let output = Path::new(&output);

    let mut pangenome = read_annotation_file(&pangenome_path)?;
    region_store::read_rgp(&mut pangenome, Path::new(&rgp_directory))?;
    if let Some(spots) = m.get_one::<String>("spots") {
        region_store::read_spots_file(&mut pangenome, spots)?;
    }

    mk_outdir(output, force)?;
    let graph = cluster_rgp(&pangenome, &parameters, disable_bar)?;
    write_grr_graph(&graph, output)?;
    info!(
        "Wrote a graph of {} RGPs and {} edges to {}",
        graph.node_count(),
        graph.edge_count(),
        output.display()
    );
    Ok(())
}
