//! Mechanism to apply the cut-flow selection to events

use crate::{
    config::Configuration,
    cutflow::Stage,
    event::{EventRecord, Jet, Muon},
    momentum,
    numeric::Float,
};
use prefix_num_ops::real::*;

/// Jets of an event which survive the transverse momentum threshold, sorted
/// out by b-tagging status
#[derive(Clone, Debug, PartialEq)]
pub struct JetClassification {
    /// Positions of the b-tagged jets, in stored order
    b_jets: Vec<usize>,

    /// Position of the leading non b-tagged jet, if any
    leading_light_jet: Option<usize>,
}
//
impl JetClassification {
    /// Truth that there are at least two b-tagged jets
    pub fn di_bottom(&self) -> bool {
        self.b_jets.len() >= 2
    }

    /// Truth that there is exactly one b-tagged jet, plus a light one
    pub fn bottom_jet(&self) -> bool {
        self.b_jets.len() == 1 && self.leading_light_jet.is_some()
    }

    /// Pick the two jets that will be paired with the muons
    ///
    /// Returns None if the event has neither of the two supported topologies.
    ///
    pub fn jet_pair(&self) -> Option<JetPair> {
        if self.di_bottom() {
            Some(JetPair::DiBottom {
                b1: self.b_jets[0],
                b2: self.b_jets[1],
            })
        } else if self.bottom_jet() {
            Some(JetPair::BottomJet {
                b: self.b_jets[0],
                light: self.leading_light_jet?,
            })
        } else {
            None
        }
    }
}

/// Classify the jets of an event
///
/// Jets softer than `pt_min` are ignored. Among the other light jets, the
/// hardest one is kept, the first one winning in case of an exact tie.
///
pub fn classify_jets(jets: &[Jet], pt_min: Float) -> JetClassification {
    let mut b_jets = Vec::new();
    let mut leading_light_jet = None;
    let mut leading_light_pt = 0.;
    for (pos, jet) in jets.iter().enumerate() {
        if jet.pt < pt_min {
            continue;
        }
        if jet.is_btagged() {
            b_jets.push(pos);
        } else if leading_light_pt < jet.pt {
            leading_light_jet = Some(pos);
            leading_light_pt = jet.pt;
        }
    }
    JetClassification {
        b_jets,
        leading_light_jet,
    }
}

/// Jets selected for pairing with the muons, as positions in the jet list
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JetPair {
    /// The first two b-tagged jets
    DiBottom { b1: usize, b2: usize },

    /// The only b-tagged jet and the leading light jet
    BottomJet { b: usize, light: usize },
}
//
impl JetPair {
    /// Positions of the first and second jet of the pair
    pub fn positions(self) -> (usize, usize) {
        match self {
            Self::DiBottom { b1, b2 } => (b1, b2),
            Self::BottomJet { b, light } => (b, light),
        }
    }
}

/// Pick the first two muons of an event if they have opposite charges
pub fn opposite_sign_muons(muons: &[Muon]) -> Option<(&Muon, &Muon)> {
    match muons {
        [mu1, mu2, ..] if mu1.charge != mu2.charge => Some((mu1, mu2)),
        _ => None,
    }
}

/// Invariant masses of the two muon-jet systems
///
/// A muon may be paired with either jet. Among the two possible assignments,
/// the one which gives the two most similar masses wins. The direct
/// assignment (mu1 with j1, mu2 with j2) must be strictly better to be picked.
///
pub fn muon_jet_masses(mu1: &Muon, mu2: &Muon, j1: &Jet, j2: &Jet) -> (Float, Float) {
    let (p_mu1, p_mu2) = (mu1.p4(), mu2.p4());
    let (p_j1, p_j2) = (j1.p4(), j2.p4());
    let direct = (
        momentum::pair_mass(&p_mu1, &p_j1),
        momentum::pair_mass(&p_mu2, &p_j2),
    );
    let crossed = (
        momentum::pair_mass(&p_mu2, &p_j1),
        momentum::pair_mass(&p_mu1, &p_j2),
    );
    if abs(direct.0 - direct.1) < abs(crossed.0 - crossed.1) {
        direct
    } else {
        crossed
    }
}

/// Outcome of the cut-flow for one event
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CutFlowDecision {
    /// The event passed every stage before this one, then failed it
    Rejected(Stage),

    /// The event passed every stage
    Accepted,

    /// The event passed every stage before this one, but it lacks the
    /// information needed to evaluate it
    Undetermined(Stage),
}
//
impl CutFlowDecision {
    /// Samples that this event contributes to the cut-flow, in stage order
    pub fn samples(self) -> impl Iterator<Item = (Stage, bool)> {
        let (stop, failure) = match self {
            Self::Rejected(stage) => (Some(stage), Some((stage, false))),
            Self::Accepted => (None, None),
            Self::Undetermined(stage) => (Some(stage), None),
        };
        Stage::ALL
            .into_iter()
            .take_while(move |&stage| Some(stage) != stop)
            .map(|stage| (stage, true))
            .chain(failure)
    }
}

/// The event selection
pub struct EventSelector {
    /// Minimal jet transverse momentum (GeV)
    jet_pt_min: Float,

    /// Muon-jet mass threshold of cut 1 (GeV)
    mu_jet_mass_min: Float,

    /// Missing transverse energy factor of cut 2
    met_factor: Float,
}
//
impl EventSelector {
    /// Setup the selection from the analysis configuration
    pub fn new(cfg: &Configuration) -> Self {
        Self {
            jet_pt_min: cfg.jet_pt_min,
            mu_jet_mass_min: cfg.mu_jet_mass_min,
            met_factor: cfg.met_factor,
        }
    }

    /// Run an event through the cut-flow
    pub fn evaluate(&self, event: &impl EventRecord) -> CutFlowDecision {
        let jets = event.jets();

        // Preselection: two opposite-sign muons, and either two b-jets or a
        // b-jet and a light jet
        let classification = classify_jets(jets, self.jet_pt_min);
        let (Some((mu1, mu2)), Some(jet_pair)) = (
            opposite_sign_muons(event.muons()),
            classification.jet_pair(),
        ) else {
            return CutFlowDecision::Rejected(Stage::Preselection);
        };
        let (pos1, pos2) = jet_pair.positions();
        let (j1, j2) = (&jets[pos1], &jets[pos2]);

        // Cut 1: one of the muon-jet systems must be heavy
        let (mass1, mass2) = muon_jet_masses(mu1, mu2, j1, j2);
        if !(mass1 > self.mu_jet_mass_min || mass2 > self.mu_jet_mass_min) {
            return CutFlowDecision::Rejected(Stage::MuonJetMass);
        }

        // Cut 2: missing transverse energy must be small wrt dimuon mass
        let Some(met) = event.missing_et() else {
            return CutFlowDecision::Undetermined(Stage::MissingEnergy);
        };
        let dimuon_mass = momentum::pair_mass(&mu1.p4(), &mu2.p4());
        if !(self.met_factor * met < dimuon_mass) {
            return CutFlowDecision::Rejected(Stage::MissingEnergy);
        }

        // Cut 3: muons must be harder than jets (HT - LT < 0)
        let ht_lt = (j1.pt + j2.pt) - (mu1.pt + mu2.pt);
        if !(ht_lt < 0.) {
            return CutFlowDecision::Rejected(Stage::HtMinusLt);
        }

        CutFlowDecision::Accepted
    }
}
