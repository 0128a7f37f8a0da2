//! This module is in charge of outputting the final cut-flow results to the
//! standard output and to disk

use crate::{
    config::Configuration,
    numeric::{reals, Float},
    resfin::{CutFlowResults, CUTFLOW_TITLE},
    Result,
};

use eyre::WrapErr;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    time::Duration,
};

// Number of significant digits in file output
const SIG_DIGITS: usize = (reals::DIGITS - 1) as usize;

/// Output the cut-flow results to the console and to a data file
pub fn dump_results(
    cfg: &Configuration,
    results: &CutFlowResults,
    elapsed_time: Duration,
    data_path: &Path,
) -> Result<()> {
    // Print out the per-stage efficiencies on stdout
    results.print();

    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .wrap_err("Could not format the current time")?;

    // Write the cut-flow down for later plotting
    let file = File::create(data_path)
        .wrap_err_with(|| format!("Could not create {}", data_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_data(&mut writer, cfg, results, elapsed_time, &timestamp)
        .and_then(|()| writer.flush())
        .wrap_err_with(|| format!("Could not write {}", data_path.display()))?;
    log::info!("Cut-flow written to {}", data_path.display());
    Ok(())
}

/// Write the cut-flow data file contents
///
/// The header holds the run parameters as key-value pairs, followed by one
/// whitespace-separated row per stage which plotting tools can read directly.
///
fn write_data(
    out: &mut impl Write,
    cfg: &Configuration,
    results: &CutFlowResults,
    elapsed_time: Duration,
    timestamp: &str,
) -> io::Result<()> {
    writeln_cf(out, timestamp)?;
    writeln_cf(out, CUTFLOW_TITLE)?;
    writeln_cf(out, "---------------------------------------------")?;
    writeln_cf(out, ("Processed events", results.processed_events))?;
    writeln_cf(out, ("Skipped events (no MET)", results.skipped_events))?;
    writeln_cf(out, ("Selected events", results.selected_events()))?;
    writeln_cf(out, ("Sample pattern", cfg.sample_pattern.as_str()))?;
    writeln_cf(out, ("Jet PT cut                (GeV)", cfg.jet_pt_min))?;
    writeln_cf(out, ("Muon-jet mass cut         (GeV)", cfg.mu_jet_mass_min))?;
    writeln_cf(out, ("MET factor", cfg.met_factor))?;
    let elapsed_secs = elapsed_time.as_secs_f64() as Float;
    writeln_cf(out, ("Elapsed time                (s)", elapsed_secs))?;
    writeln_cf(out, "---------------------------------------------")?;

    let decimals = (SIG_DIGITS - 1).min(7);
    let width = decimals + 8;
    writeln!(
        out,
        "#{:>4}{:>12}{:>12}{:>width$}{:>width$}",
        "cut",
        "entries",
        "passed",
        "mean",
        "error",
        width = width,
    )?;
    for res in &results.stages {
        writeln!(
            out,
            "{:>5}{:>12}{:>12}{:>width$.decs$e}{:>width$.decs$e}",
            res.stage.index(),
            res.entries,
            res.passed,
            res.mean,
            res.error,
            width = width,
            decs = decimals,
        )?;
    }
    Ok(())
}

/// Text output facility that mimicks the key-value styling of our data files
fn writeln_cf(out: &mut impl Write, data: impl WriteCf) -> io::Result<()> {
    write!(out, " ")?;
    data.write(out)?;
    writeln!(out)
}

/// Trait implemented by things which can be printed in a data file header
trait WriteCf: Sized {
    /// Write down `self` to the output using the data file style
    fn write(self, out: &mut impl Write) -> io::Result<()>;
}

impl WriteCf for &str {
    // Strings work in the usual way
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl WriteCf for u64 {
    // Integers work in the usual way too
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

impl WriteCf for Float {
    // Floats use a close approximation of %g
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write_engineering(out, self, SIG_DIGITS)
    }
}

impl<T: WriteCf> WriteCf for (&str, T) {
    // Key-value output that uses fixed-size columns for better readability
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{:<31}: ", self.0)?;
        self.1.write(out)
    }
}

/// Write a floating-point number using "engineering" notation
///
/// Analogous to the %g format of the C printf function, this method switches
/// between naive and scientific notation for floating-point numbers when the
/// number being printed becomes so small that printing leading zeroes could end
/// up larger than the scientific notation, or so large that we would be forced
/// to print more significant digits than requested.
///
fn write_engineering(writer: &mut impl Write, x: Float, sig_digits: usize) -> io::Result<()> {
    let mut precision = sig_digits - 1;
    if x == 0. {
        // Zero is special because you can't take its log
        write!(writer, "0")
    } else {
        // Otherwise, use log to evaluate order of magnitude
        let log_x = x.abs().log10();
        if log_x >= -3. && log_x <= (sig_digits as Float) {
            // Print using naive notation
            //
            // Since Rust's precision controls number of digits after the
            // decimal point, we must adjust it depending on magnitude in order
            // to operate at a constant number of significant digits.
            precision = (precision as isize - log_x.trunc() as isize).max(0) as usize;

            // Numbers smaller than 1 must get one extra digit since the leading
            // zero does not count as a significant digit.
            if log_x < 0. {
                precision += 1
            }

            // People don't normally expect trailing zeros or decimal point in
            // naive notation, but be careful with integer numbers...
            let str_with_zeros = format!("{:.1$}", x, precision);
            if str_with_zeros.contains('.') {
                write!(
                    writer,
                    "{}",
                    str_with_zeros.trim_end_matches('0').trim_end_matches('.')
                )
            } else {
                write!(writer, "{}", str_with_zeros)
            }
        } else {
            // Print using scientific notation
            write!(writer, "{:.1$e}", x, precision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cutflow::{Stage, StageAccumulator},
        evcut::CutFlowDecision,
    };

    fn engineering(x: Float, sig_digits: usize) -> String {
        let mut buf = Vec::new();
        write_engineering(&mut buf, x, sig_digits).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn engineering_notation() {
        assert_eq!(engineering(0., 6), "0");
        assert_eq!(engineering(170., 6), "170");
        assert_eq!(engineering(0.375, 6), "0.375");
        assert_eq!(engineering(-2.5, 6), "-2.5");
        assert_eq!(engineering(1.5e-5, 3), "1.50e-5");
        assert_eq!(engineering(1.5e9, 3), "1.50e9");
    }

    #[test]
    fn data_file_layout() {
        let mut acc = StageAccumulator::new();
        acc.record(CutFlowDecision::Accepted);
        acc.record(CutFlowDecision::Rejected(Stage::Preselection));
        let results = acc.finalize();

        let mut buf = Vec::new();
        write_data(
            &mut buf,
            &Configuration::default(),
            &results,
            Duration::from_millis(1500),
            "2024-01-01T00:00:00Z",
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], " 2024-01-01T00:00:00Z");
        assert!(text.contains(" Processed events               : 2\n"));
        assert!(text.contains(" Selected events                : 1\n"));
        assert!(text.contains(" Sample pattern                 : tt_*.jsonl\n"));
        assert!(text.contains(" Elapsed time                (s): 1.5\n"));

        // Header row, then one row per stage
        let rows: Vec<Vec<&str>> = lines
            .iter()
            .skip_while(|line| !line.starts_with('#'))
            .skip(1)
            .map(|line| line.split_whitespace().collect())
            .collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][..3], &["0", "2", "1"]);
        assert_eq!(rows[0][3].parse::<Float>().unwrap(), 0.5);
        assert_eq!(&rows[3][..3], &["3", "1", "1"]);
        assert_eq!(rows[3][4].parse::<Float>().unwrap(), 0.);
    }

    #[test]
    fn dump_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cutflow.data");
        let results = StageAccumulator::new().finalize();
        dump_results(&Configuration::default(), &results, Duration::ZERO, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Processed events"));
    }
}
