//! This module accumulates the cut-flow statistics across events

use crate::{
    evcut::CutFlowDecision,
    numeric,
    resfin::{CutFlowResults, StageResult},
};
use nalgebra::SVector;
use num_traits::Zero;
use std::fmt::{self, Display};

/// Number of stages in the cut-flow
pub const NUM_STAGES: usize = 4;

/// Vector type with one entry per cut-flow stage
pub type StageVector<T> = SVector<T, NUM_STAGES>;

/// Stages of the cut-flow, in the order where they are applied
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Stage {
    /// Two opposite-sign muons, plus two b-jets or a b-jet and a light jet
    Preselection = 0,

    /// One of the muon-jet systems is heavier than the mass threshold
    MuonJetMass = 1,

    /// Missing transverse energy is small with respect to the dimuon mass
    MissingEnergy = 2,

    /// The muons carry more transverse momentum than the jets
    HtMinusLt = 3,
}
//
impl Stage {
    /// All stages, in cut-flow order
    pub const ALL: [Stage; NUM_STAGES] = [
        Stage::Preselection,
        Stage::MuonJetMass,
        Stage::MissingEnergy,
        Stage::HtMinusLt,
    ];

    /// Position of this stage in the cut-flow
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short human-readable description
    pub fn label(self) -> &'static str {
        match self {
            Stage::Preselection => "2b & 2OS muons",
            Stage::MuonJetMass => "max(SBM) cut",
            Stage::MissingEnergy => "MET veto",
            Stage::HtMinusLt => "HT - LT < 0",
        }
    }
}
//
impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// This struct accumulates per-stage pass/fail samples during the event loop,
/// and ultimately computes the final results (see CutFlowResults).
///
/// Each stage behaves like a profile histogram bin filled with 0 or 1. As
/// samples are boolean, keeping integer counts is enough to compute the mean
/// and its error exactly, whatever the order in which events came.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StageAccumulator {
    /// Number of samples recorded into each stage
    entries: StageVector<u64>,

    /// Number of passing samples recorded into each stage
    passed: StageVector<u64>,

    /// Number of events that went through the cut-flow
    processed_events: u64,

    /// Number of events that could not be evaluated up to their last stage
    skipped_events: u64,
}
//
impl Default for StageAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
//
impl StageAccumulator {
    /// Prepare for cut-flow accumulation
    pub fn new() -> Self {
        Self {
            entries: StageVector::zero(),
            passed: StageVector::zero(),
            processed_events: 0,
            skipped_events: 0,
        }
    }

    /// Record one pass/fail sample into a stage
    pub fn fill(&mut self, stage: Stage, pass: bool) {
        self.entries[stage.index()] += 1;
        self.passed[stage.index()] += u64::from(pass);
    }

    /// Record the outcome of one event
    pub fn record(&mut self, decision: CutFlowDecision) {
        self.processed_events += 1;
        if let CutFlowDecision::Undetermined(_) = decision {
            self.skipped_events += 1;
        }
        for (stage, pass) in decision.samples() {
            self.fill(stage, pass);
        }
    }

    /// Number of samples recorded so far into a stage
    pub fn entries(&self, stage: Stage) -> u64 {
        self.entries[stage.index()]
    }

    /// Number of passing samples recorded so far into a stage
    pub fn passed(&self, stage: Stage) -> u64 {
        self.passed[stage.index()]
    }

    /// Integrate statistics from another StageAccumulator
    #[allow(clippy::needless_pass_by_value)]
    pub fn merge(&mut self, other: Self) {
        self.entries += other.entries;
        self.passed += other.passed;
        self.processed_events += other.processed_events;
        self.skipped_events += other.skipped_events;
    }

    /// Turn accumulated statistics into finalized results
    pub fn finalize(self) -> CutFlowResults {
        let stages = Stage::ALL.map(|stage| {
            let entries = self.entries(stage);
            let passed = self.passed(stage);

            let (mean, error) = numeric::pass_fraction(passed, entries);
            StageResult {
                stage,
                entries,
                passed,
                mean,
                error,
            }
        });

        CutFlowResults {
            stages,
            processed_events: self.processed_events,
            skipped_events: self.skipped_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Float;
    use prefix_num_ops::real::*;

    fn assert_close(actual: Float, expected: Float) {
        assert!(
            abs(actual - expected) <= 1e-6,
            "{actual} is not close to {expected}"
        );
    }

    #[test]
    fn stage_indices_follow_order() {
        for (idx, stage) in Stage::ALL.into_iter().enumerate() {
            assert_eq!(stage.index(), idx);
        }
        assert!(Stage::Preselection < Stage::HtMinusLt);
    }

    #[test]
    fn empty_accumulator() {
        let results = StageAccumulator::new().finalize();
        for stage in &results.stages {
            assert_eq!(stage.entries, 0);
            assert_eq!(stage.mean, 0.);
            assert_eq!(stage.error, 0.);
        }
        assert_eq!(results.processed_events, 0);
    }

    #[test]
    fn mean_and_error() {
        let mut acc = StageAccumulator::new();
        for pass in [true, false, false, true, true, false, false, false] {
            acc.fill(Stage::Preselection, pass);
        }
        let results = acc.finalize();
        let presel = &results.stages[Stage::Preselection.index()];
        assert_eq!(presel.entries, 8);
        assert_eq!(presel.passed, 3);
        // p = 3/8, error = sqrt(p(1-p)/n) = sqrt(15/512)
        assert_close(presel.mean, 0.375);
        assert_close(presel.error, 0.171_163_0);
    }

    #[test]
    fn unanimous_stage_has_no_error() {
        let mut acc = StageAccumulator::new();
        for _ in 0..5 {
            acc.fill(Stage::MuonJetMass, true);
        }
        let results = acc.finalize();
        let stage = &results.stages[Stage::MuonJetMass.index()];
        assert_eq!(stage.mean, 1.);
        assert_eq!(stage.error, 0.);
    }

    #[test]
    fn record_respects_stage_order() {
        let mut acc = StageAccumulator::new();
        acc.record(CutFlowDecision::Rejected(Stage::Preselection));
        acc.record(CutFlowDecision::Rejected(Stage::MissingEnergy));
        acc.record(CutFlowDecision::Undetermined(Stage::MissingEnergy));
        acc.record(CutFlowDecision::Accepted);

        assert_eq!(acc.entries(Stage::Preselection), 4);
        assert_eq!(acc.passed(Stage::Preselection), 3);
        assert_eq!(acc.entries(Stage::MuonJetMass), 3);
        assert_eq!(acc.passed(Stage::MuonJetMass), 3);
        assert_eq!(acc.entries(Stage::MissingEnergy), 2);
        assert_eq!(acc.passed(Stage::MissingEnergy), 1);
        assert_eq!(acc.entries(Stage::HtMinusLt), 1);
        assert_eq!(acc.passed(Stage::HtMinusLt), 1);

        let results = acc.finalize();
        assert_eq!(results.processed_events, 4);
        assert_eq!(results.skipped_events, 1);
    }

    #[test]
    fn merge_matches_single_pass() {
        let decisions = [
            CutFlowDecision::Accepted,
            CutFlowDecision::Rejected(Stage::MuonJetMass),
            CutFlowDecision::Rejected(Stage::Preselection),
            CutFlowDecision::Undetermined(Stage::MissingEnergy),
            CutFlowDecision::Rejected(Stage::HtMinusLt),
        ];

        let mut single = StageAccumulator::new();
        decisions.iter().for_each(|&d| single.record(d));

        let mut first = StageAccumulator::new();
        let mut second = StageAccumulator::new();
        decisions[..2].iter().for_each(|&d| first.record(d));
        decisions[2..].iter().for_each(|&d| second.record(d));
        first.merge(second);

        assert_eq!(first, single);
    }
}
