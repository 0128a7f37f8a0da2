//! Mechanism for loading and sharing the analysis configuration

use crate::{numeric::Float, Result};

use eyre::{ensure, eyre, WrapErr};

use std::{fs, path::Path, str::FromStr};

/// Analysis configuration
///
/// The defaults reproduce the reference ttbar selection. A configuration file
/// may override them, e.g. to study how the cut-flow reacts to a threshold.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// File name pattern of the samples inside the sample directory
    pub sample_pattern: String,

    /// Minimal transverse momentum of the jets considered (GeV)
    pub jet_pt_min: Float,

    /// Muon-jet invariant mass above which cut 1 passes (GeV)
    pub mu_jet_mass_min: Float,

    /// Factor applied to the missing transverse energy before comparing it to
    /// the dimuon mass in cut 2
    pub met_factor: Float,

    /// Number of events between two progress printouts
    pub progress_period: usize,
}
//
impl Default for Configuration {
    fn default() -> Self {
        Self {
            sample_pattern: "tt_*.jsonl".to_owned(),
            jet_pt_min: 30.,
            mu_jet_mass_min: 170.,
            met_factor: 5.,
            progress_period: 10_000,
        }
    }
}
//
impl Configuration {
    /// Load the configuration from a file and check it
    pub fn load(file_name: impl AsRef<Path>) -> Result<Self> {
        let file_name = file_name.as_ref();
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read {}", file_name.display()))?;
        Self::parse(&config_str)
    }

    /// Decode the contents of a configuration file
    ///
    /// Configuration items are the first non-whitespace chunk of text on each
    /// line, in a fixed order. Blank lines are ignored, and anything after the
    /// first chunk of a line may be used as a comment.
    ///
    pub fn parse(config_str: &str) -> Result<Self> {
        let mut config_iter = config_str
            .lines()
            .filter_map(|line| line.split_whitespace().next());

        // This closure fetches the next configuration item, tagging it with
        // the name of the configuration field which it is supposed to fill to
        // ease error reporting, and handling unexpected end-of-file too.
        let mut next_item = |name: &'static str| -> Result<ConfigItem> {
            config_iter
                .next()
                .map(|data| ConfigItem::new(name, data))
                .ok_or_else(|| eyre!("Missing configuration of {}", name))
        };

        let config = Configuration {
            sample_pattern: next_item("sample_pattern")?.data.to_owned(),
            jet_pt_min: next_item("jet_pt_min")?.parse::<Float>()?,
            mu_jet_mass_min: next_item("mu_jet_mass_min")?.parse::<Float>()?,
            met_factor: next_item("met_factor")?.parse::<Float>()?,
            progress_period: next_item("progress_period")?.parse::<usize>()?,
        };
        config.check()?;
        Ok(config)
    }

    /// Make sure that the configuration makes sense
    pub fn check(&self) -> Result<()> {
        ensure!(
            !self.sample_pattern.is_empty(),
            "The sample file pattern cannot be empty"
        );
        for (name, value) in [
            ("jet_pt_min", self.jet_pt_min),
            ("mu_jet_mass_min", self.mu_jet_mass_min),
            ("met_factor", self.met_factor),
        ] {
            ensure!(
                value.is_finite() && value >= 0.,
                "{} must be a finite non-negative number, got {}",
                name,
                value
            );
        }
        ensure!(
            self.progress_period > 0,
            "Progress must be reported at least every once in a while"
        );
        Ok(())
    }

    /// Log the configuration for the record
    pub fn log(&self) {
        log::info!("Sample pattern  : {}", self.sample_pattern);
        log::info!("Jet PT min      : {}", self.jet_pt_min);
        log::info!("Mu-jet mass min : {}", self.mu_jet_mass_min);
        log::info!("MET factor      : {}", self.met_factor);
        log::info!("Progress period : {}", self.progress_period);
    }
}

/// A value from the configuration file, tagged with the struct field which it
/// is supposed to map for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a struct field tag and raw iterator data
    fn new(name: &'static str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(self) -> Result<T>
    where
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        self.data
            .parse::<T>()
            .wrap_err_with(|| format!("Could not parse configuration of {}", self.name))
    }
}
