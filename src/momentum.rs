//! This module implements some domain-specific 4-momentum handling logic.

use crate::numeric::Float;
use nalgebra::SVector;
use prefix_num_ops::real::*;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Relativistic 4-momentum
pub type Momentum = SVector<Float, MOMENTUM_DIM>;

/// Convenience const for accessing the X coordinate of a 4-vector
pub const X: usize = 0;

/// Convenience const for accessing the E coordinate of a 4-vector
pub const E: usize = 3;

/// Build a 4-momentum from collider coordinates
///
/// Takes the transverse momentum, pseudorapidity, azimuthal angle and mass of
/// a particle, which is how detector-level objects are usually recorded.
///
pub fn from_pt_eta_phi_m(pt: Float, eta: Float, phi: Float, mass: Float) -> Momentum {
    let px = pt * cos(phi);
    let py = pt * sin(phi);
    let pz = pt * eta.sinh();
    let p2 = px.powi(2) + py.powi(2) + pz.powi(2);
    let energy = if mass >= 0. {
        sqrt(p2 + mass.powi(2))
    } else {
        // Negative masses encode space-like vectors
        sqrt((p2 - mass.powi(2)).max(0.))
    };
    Momentum::new(px, py, pz, energy)
}

/// Invariant mass of a 4-momentum
///
/// Space-like vectors get a negative mass, so that a numerically broken input
/// cannot masquerade as a heavy particle.
///
pub fn invariant_mass(p: &Momentum) -> Float {
    let m2 = p[E].powi(2) - p.fixed_rows::<3>(X).norm_squared();
    if m2 < 0. {
        -sqrt(-m2)
    } else {
        sqrt(m2)
    }
}

/// Invariant mass of a two-particle system
pub fn pair_mass(p1: &Momentum, p2: &Momentum) -> Float {
    invariant_mass(&(p1 + p2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::reals;

    fn assert_close(actual: Float, expected: Float) {
        assert!(
            abs(actual - expected) <= 1e-4 * expected.abs().max(1.),
            "{actual} is not close to {expected}"
        );
    }

    #[test]
    fn transverse_particle() {
        let p = from_pt_eta_phi_m(50., 0., 0., 0.);
        assert_close(p[X], 50.);
        assert_close(p[1], 0.);
        assert_close(p[2], 0.);
        assert_close(p[E], 50.);
    }

    #[test]
    fn mass_is_preserved() {
        let p = from_pt_eta_phi_m(42., 1.3, -2.1, 4.7);
        assert_close(invariant_mass(&p), 4.7);
    }

    #[test]
    fn back_to_back_massless_pair() {
        // Two 100 GeV photons flying in opposite directions make 200 GeV
        let p1 = from_pt_eta_phi_m(100., 0., 0., 0.);
        let p2 = from_pt_eta_phi_m(100., 0., reals::consts::PI, 0.);
        assert_close(pair_mass(&p1, &p2), 200.);
    }

    #[test]
    fn collinear_massless_pair_is_massless() {
        let p1 = from_pt_eta_phi_m(30., 0.5, 1., 0.);
        let p2 = from_pt_eta_phi_m(60., 0.5, 1., 0.);
        assert!(abs(pair_mass(&p1, &p2)) < 0.1);
    }

    #[test]
    fn space_like_vectors_get_negative_mass() {
        let p = Momentum::new(3., 0., 4., 0.);
        assert_close(invariant_mass(&p), -5.);
    }
}
