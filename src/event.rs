//! This module defines the reconstructed objects of an event, and the narrow
//! interface through which the selection looks at them

use crate::{
    momentum::{self, Momentum},
    numeric::Float,
};
use serde::Deserialize;

/// What the event selection needs to know about an event
///
/// Events come from an external detector simulation whose object model is far
/// richer than this. Keeping the selection behind this trait means that it
/// does not care how the records were stored or decoded.
///
pub trait EventRecord {
    /// Reconstructed jets, in stored order
    fn jets(&self) -> &[Jet];

    /// Reconstructed muons, in stored order
    fn muons(&self) -> &[Muon];

    /// Magnitude of the missing transverse momentum, if it was recorded
    fn missing_et(&self) -> Option<Float>;
}

/// Reconstructed hadronic jet
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Jet {
    /// Transverse momentum (GeV)
    #[serde(rename = "PT")]
    pub pt: Float,

    /// Pseudorapidity
    #[serde(rename = "Eta", default)]
    pub eta: Float,

    /// Azimuthal angle
    #[serde(rename = "Phi", default)]
    pub phi: Float,

    /// Invariant mass (GeV)
    #[serde(rename = "Mass", default)]
    pub mass: Float,

    /// b-tagging bitmask, one bit per working point
    #[serde(rename = "BTag", default)]
    pub btag: u32,
}
//
impl Jet {
    /// Truth that at least one b-tagging working point fired
    pub fn is_btagged(&self) -> bool {
        self.btag != 0
    }

    /// 4-momentum of the jet
    pub fn p4(&self) -> Momentum {
        momentum::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass)
    }
}

/// Reconstructed muon
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Muon {
    /// Transverse momentum (GeV)
    #[serde(rename = "PT")]
    pub pt: Float,

    /// Pseudorapidity
    #[serde(rename = "Eta", default)]
    pub eta: Float,

    /// Azimuthal angle
    #[serde(rename = "Phi", default)]
    pub phi: Float,

    /// Electric charge, in units of the elementary charge
    #[serde(rename = "Charge")]
    pub charge: i32,
}
//
impl Muon {
    /// 4-momentum of the muon
    ///
    /// The muon mass is neglected, as the records we read do.
    ///
    pub fn p4(&self) -> Momentum {
        momentum::from_pt_eta_phi_m(self.pt, self.eta, self.phi, 0.)
    }
}

/// Missing transverse momentum
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MissingEt {
    /// Magnitude (GeV)
    #[serde(rename = "MET")]
    pub met: Float,

    /// Azimuthal angle
    #[serde(rename = "Phi", default)]
    pub phi: Float,
}

/// Storage for one collision event
///
/// Collections which are absent from a record are treated as empty.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Event {
    /// Jet collection
    #[serde(rename = "Jet", default)]
    pub jets: Vec<Jet>,

    /// Muon collection
    #[serde(rename = "Muon", default)]
    pub muons: Vec<Muon>,

    /// Missing transverse momentum collection (one entry in practice)
    #[serde(rename = "MissingET", default)]
    pub missing_et: Vec<MissingEt>,
}

impl EventRecord for Event {
    fn jets(&self) -> &[Jet] {
        &self.jets
    }

    fn muons(&self) -> &[Muon] {
        &self.muons
    }

    fn missing_et(&self) -> Option<Float> {
        self.missing_et.first().map(|met| met.met)
    }
}
