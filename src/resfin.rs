//! This module contains the final cut-flow results and their console display

use crate::{
    cutflow::{Stage, NUM_STAGES},
    numeric::Float,
};

/// Title of the cut-flow, followed by its axis labels
pub const CUTFLOW_TITLE: &str =
    "(2b & 2OS muons) & max(SBM)>170, MET<100, DHTLT<0;cut number;percent passing";

/// Final statistics of one cut-flow stage
#[derive(Clone, Debug, PartialEq)]
pub struct StageResult {
    /// Stage which these statistics are about
    pub stage: Stage,

    /// Number of events which reached this stage
    pub entries: u64,

    /// Number of events which passed this stage
    pub passed: u64,

    /// Fraction of the events reaching this stage which passed it
    pub mean: Float,

    /// Statistical error on the mean
    pub error: Float,
}

/// Final results of the cut-flow
#[derive(Clone, Debug, PartialEq)]
pub struct CutFlowResults {
    /// Per-stage statistics, in cut-flow order
    pub stages: [StageResult; NUM_STAGES],

    /// Number of events which went through the cut-flow
    pub processed_events: u64,

    /// Number of events which could not be evaluated to the end
    pub skipped_events: u64,
}
//
impl CutFlowResults {
    /// Statistics of a given stage
    pub fn stage(&self, stage: Stage) -> &StageResult {
        &self.stages[stage.index()]
    }

    /// Events passing every stage, i.e. the final selection
    pub fn selected_events(&self) -> u64 {
        self.stage(Stage::HtMinusLt).passed
    }

    /// Display the per-stage efficiencies
    pub fn print(&self) {
        let mut parts = CUTFLOW_TITLE.split(';');
        let title = parts.next().unwrap_or_default();
        let x_label = parts.next().unwrap_or_default();
        let y_label = parts.next().unwrap_or_default();

        println!();
        println!("{}", title);
        println!("({} vs {})", y_label, x_label);
        for res in &self.stages {
            println!("{}: {:.6} +/- {:.6} ", res.stage.index(), res.mean, res.error);
        }
        if self.skipped_events > 0 {
            println!(
                "{} event(s) lacked missing energy information",
                self.skipped_events
            );
        }
    }
}
