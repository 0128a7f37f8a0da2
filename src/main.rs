//! cutflow: event selection efficiencies of a dimuon + b-jets analysis
//!
//!
//! # Introduction (for the physicist)
//!
//! This program measures how simulated collider events survive the successive
//! cuts of an analysis looking for two opposite-sign muons produced alongside
//! b-jets, as in top quark pair or Z' decays.
//!
//! After a preselection on the muon charges and the jet b-tagging, three
//! kinematic cuts are applied in sequence:
//!
//! 1. One of the muon-jet systems must be heavier than 170 GeV, muons and jets
//!    being paired so that the two systems have the most similar masses
//! 2. Five times the missing transverse energy must be below the dimuon mass
//! 3. The jets must carry less transverse momentum than the muons (HT - LT < 0)
//!
//! For each cut, the fraction of events reaching it which pass it is reported
//! along with its statistical error.
//!
//!
//! # Introduction (for the computer guy)
//!
//! This program works in a purely sequential style:
//!
//! * read in parameters and initialise counters
//! * loop over events read from disk,
//!     * classify their jets and muons,
//!     * run them through the cut-flow,
//!     * count which cuts they pass
//! * then display / store the result.
//!
//! The detector simulation records are only seen through a narrow trait, so
//! that the selection logic does not depend on how they are stored.

#![warn(missing_docs)]

mod analysis;
mod config;
mod cutflow;
mod evcut;
mod event;
mod momentum;
mod numeric;
mod output;
mod resfin;
mod source;

use clap::Parser;
use eyre::WrapErr;

use crate::{
    config::Configuration,
    source::{EventSource, RecordChain},
};

use std::{path::PathBuf, time::Instant};

/// We'll use eyre's type-erased result type throughout the application
type Result<T> = eyre::Result<T>;

/// Cut-flow of the dimuon + b-jets selection
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Directory containing the event record files
    sample_directory: PathBuf,

    /// Configuration file overriding the default cuts
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where the cut-flow data should be written
    #[arg(short, long, value_name = "FILE", default_value = "cutflow.data")]
    output: PathBuf,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all diagnostics except errors
    #[arg(short, long)]
    quiet: bool,
}

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    // ### CONFIGURATION READOUT ###

    let cfg = match &args.config {
        Some(path) => Configuration::load(path).wrap_err("Failed to load the configuration")?,
        None => Configuration::default(),
    };
    cfg.log();

    // ### INPUT SETUP ###

    // Start the clock after configuration I/O, to avoid IO-induced timing
    // fluctuations
    let saved_time = Instant::now();

    println!(
        "taking samples from {}",
        args.sample_directory.join(&cfg.sample_pattern).display()
    );
    let mut source = RecordChain::open(&args.sample_directory, &cfg.sample_pattern)
        .wrap_err("Failed to open the event samples")?;
    log::info!(
        "{} sample file(s), {} events",
        source.files().len(),
        source.num_events()
    );

    // ### EVENT LOOP ###

    let results = analysis::run(&cfg, &mut source).wrap_err("Failed to analyze the events")?;

    // ### RESULTS DISPLAY AND STORAGE ###

    let elapsed_time = saved_time.elapsed();
    output::dump_results(&cfg, &results, elapsed_time, &args.output)
        .wrap_err("Failed to output the results")?;

    // ...and we're done
    Ok(())
}

/// Set up the logger according to the requested verbosity
///
/// Without any flag, the `RUST_LOG` environment variable is honored, falling
/// back to the info level.
///
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::{Builder, Env};
    use log::LevelFilter;

    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(LevelFilter::Error);
    } else if verbose > 0 {
        builder.filter_level(match verbose {
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        });
    }
    builder.format_timestamp(None).init();
}
