extern crate rgpfinder;

extern crate clap;
use clap::*;
use std::process;

#[macro_use]
extern crate log;

extern crate bird_tool_utils;
use bird_tool_utils::clap_utils::*;

use rgpfinder::rgp_argument_parsing::*;

static PROGRAM_NAME: &str = "rgpfinder";

fn main() {
    let app = build_cli();
    let matches = app.clone().get_matches();
    set_log_level(&matches, false, PROGRAM_NAME, crate_version!());

    let result = match matches.subcommand_name() {
        Some("rgp") => run_rgp_subcommand(&matches, PROGRAM_NAME, crate_version!()),
        Some("rgp-cluster") => {
            run_rgp_cluster_subcommand(&matches, PROGRAM_NAME, crate_version!())
        }
        _ => panic!("Programming error"),
    };
    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn build_cli() -> Command {
    let app = add_clap_verbosity_flags(Command::new(PROGRAM_NAME))
        .version(crate_version!())
        .about("Prediction and clustering of regions of genomic plasticity in pangenomes")
        .arg_required_else_help(true);
    add_rgp_cluster_subcommand(add_rgp_subcommand(app))
}
