//! Basic numerical concepts used throughout the program

use prefix_num_ops::real::*;

// Floating-point precision is configured here
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f32")]
pub use std::f32 as reals;
#[cfg(not(feature = "f32"))]
pub type Float = f64;
#[cfg(not(feature = "f32"))]
pub use std::f64 as reals;

/// Mean of a set of 0/1 samples, and the standard error on that mean
///
/// Takes the number of samples equal to 1 and the total number of samples.
/// Like profile histograms do, an empty set yields zero for both quantities.
///
pub fn pass_fraction(passed: u64, entries: u64) -> (Float, Float) {
    debug_assert!(passed <= entries);
    if entries == 0 {
        return (0., 0.);
    }
    let n = entries as Float;
    let mean = passed as Float / n;
    let spread2 = abs(mean - mean.powi(2));
    (mean, sqrt(spread2 / n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set() {
        assert_eq!(pass_fraction(0, 0), (0., 0.));
    }

    #[test]
    fn unanimous_sets_have_no_spread() {
        assert_eq!(pass_fraction(0, 7), (0., 0.));
        assert_eq!(pass_fraction(7, 7), (1., 0.));
    }

    #[test]
    fn half_and_half() {
        // p = 1/2 over 100 samples: sqrt(1/4 / 100) = 1/20
        let (mean, error) = pass_fraction(50, 100);
        assert_eq!(mean, 0.5);
        assert!(abs(error - 0.05) < 1e-6);
    }
}
