//! This module provides the events to be analyzed

use crate::{
    event::{Event, EventRecord},
    Result,
};

use eyre::{ensure, WrapErr};

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

/// Something which provides events, one at a time, to the analysis
pub trait EventSource {
    /// Type of the events which are provided
    type Event: EventRecord;

    /// Total number of events that this source will provide
    fn num_events(&self) -> usize;

    /// Provide the next event, or None if the source is exhausted
    fn next_event(&mut self) -> Result<Option<Self::Event>>;
}

/// Chain of event record files, read one after the other
///
/// Files contain one JSON-encoded event per line, using the branch and leaf
/// names of the detector simulation (see `Event`). Blank lines are ignored.
///
pub struct RecordChain {
    /// Files of the chain, in reading order
    files: Vec<PathBuf>,

    /// Total number of records in the chain
    num_events: usize,

    /// Index of the next file to be opened
    next_file: usize,

    /// File which is currently being read
    current: Option<RecordFile>,
}
//
impl RecordChain {
    /// Chain all files of a directory whose name matches a pattern
    ///
    /// The pattern may use `*` to match any sequence of characters and `?` to
    /// match any single character. Files are read in lexicographic order.
    ///
    pub fn open(directory: impl AsRef<Path>, pattern: &str) -> Result<Self> {
        let directory = directory.as_ref();
        let mut files = Vec::new();
        let entries = fs::read_dir(directory)
            .wrap_err_with(|| format!("Could not list {}", directory.display()))?;
        for entry in entries {
            let entry = entry?;
            let matches = entry
                .file_name()
                .to_str()
                .map_or(false, |name| matches_pattern(pattern, name));
            if matches && entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        ensure!(
            !files.is_empty(),
            "No file matching {} in {}",
            pattern,
            directory.display()
        );
        Self::from_files(files)
    }

    /// Chain an explicit list of files
    pub fn from_files(files: Vec<PathBuf>) -> Result<Self> {
        let mut num_events = 0;
        for path in &files {
            let file_events = count_records(path)?;
            log::debug!("{}: {} events", path.display(), file_events);
            num_events += file_events;
        }
        Ok(Self {
            files,
            num_events,
            next_file: 0,
            current: None,
        })
    }

    /// Files of the chain, in reading order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}
//
impl EventSource for RecordChain {
    type Event = Event;

    fn num_events(&self) -> usize {
        self.num_events
    }

    fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            if let Some(current) = &mut self.current {
                if let Some(event) = current.next_record()? {
                    return Ok(Some(event));
                }
                self.current = None;
            }

            // Move to the next file of the chain
            let Some(path) = self.files.get(self.next_file) else {
                return Ok(None);
            };
            self.next_file += 1;
            log::debug!("Reading events from {}", path.display());
            self.current = Some(RecordFile::open(path.clone())?);
        }
    }
}

/// Event record file which is being read
struct RecordFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}
//
impl RecordFile {
    /// Open a record file
    fn open(path: PathBuf) -> Result<Self> {
        let file =
            File::open(&path).wrap_err_with(|| format!("Could not open {}", path.display()))?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }

    /// Decode the next record, if any
    fn next_record(&mut self) -> Result<Option<Event>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line.wrap_err_with(|| format!("Could not read {}", self.path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).wrap_err_with(|| {
                format!(
                    "Malformed event record at {}:{}",
                    self.path.display(),
                    self.line_no
                )
            })?;
            return Ok(Some(event));
        }
        Ok(None)
    }
}

/// Count the records of a file without decoding them
fn count_records(path: &Path) -> Result<usize> {
    let file = File::open(path).wrap_err_with(|| format!("Could not open {}", path.display()))?;
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        let line = line.wrap_err_with(|| format!("Could not read {}", path.display()))?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

/// Truth that a file name matches a shell-style wildcard pattern
pub fn matches_pattern(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    // Greedy matching, backtracking to the last star on mismatch
    let (mut p, mut n) = (0, 0);
    let mut last_star: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                last_star = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match last_star {
                Some((star_p, star_n)) => {
                    last_star = Some((star_p, star_n + 1));
                    p = star_p + 1;
                    n = star_n + 1;
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn drain(source: &mut impl EventSource<Event = Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn wildcard_matching() {
        assert!(matches_pattern("tt_*.jsonl", "tt_001.jsonl"));
        assert!(matches_pattern("tt_*.jsonl", "tt_.jsonl"));
        assert!(matches_pattern("tt_*", "tt_a.b.c"));
        assert!(matches_pattern("*", "anything"));
        assert!(matches_pattern("tt_?.jsonl", "tt_7.jsonl"));
        assert!(matches_pattern("*_*.jsonl", "zp_tt_1.jsonl"));
        assert!(!matches_pattern("tt_*.jsonl", "zp_001.jsonl"));
        assert!(!matches_pattern("tt_*.jsonl", "tt_001.jsonl.bak"));
        assert!(!matches_pattern("tt_?.jsonl", "tt_10.jsonl"));
        assert!(!matches_pattern("tt_", "tt_1"));
    }

    #[test]
    fn chain_reads_matching_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "tt_2.jsonl",
            "{\"Muon\": [{\"PT\": 2.0, \"Charge\": 1}]}\n",
        );
        write_file(
            dir.path(),
            "tt_1.jsonl",
            "{\"Muon\": [{\"PT\": 1.0, \"Charge\": 1}]}\n\n{\"Muon\": [{\"PT\": 1.5, \"Charge\": -1}]}\n",
        );
        write_file(
            dir.path(),
            "zp_1.jsonl",
            "{\"Muon\": [{\"PT\": 99.0, \"Charge\": 1}]}\n",
        );

        let mut chain = RecordChain::open(dir.path(), "tt_*.jsonl").unwrap();
        assert_eq!(chain.files().len(), 2);
        assert_eq!(chain.num_events(), 3);

        let pts: Vec<_> = drain(&mut chain)
            .iter()
            .map(|event| event.muons()[0].pt)
            .collect();
        assert_eq!(pts, vec![1.0, 1.5, 2.0]);

        // Exhausted sources stay exhausted
        assert!(chain.next_event().unwrap().is_none());
    }

    #[test]
    fn empty_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "tt_1.jsonl", "");
        write_file(dir.path(), "tt_2.jsonl", "{}\n");
        let mut chain = RecordChain::open(dir.path(), "tt_*.jsonl").unwrap();
        assert_eq!(chain.num_events(), 1);
        assert_eq!(drain(&mut chain), vec![Event::default()]);
    }

    #[test]
    fn no_matching_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "zp_1.jsonl", "{}\n");
        assert!(RecordChain::open(dir.path(), "tt_*.jsonl").is_err());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RecordChain::open(dir.path().join("nope"), "tt_*.jsonl").is_err());
    }

    #[test]
    fn malformed_record_names_its_location() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "tt_1.jsonl", "{}\n{\"Jet\": 42}\n");
        let mut chain = RecordChain::open(dir.path(), "tt_*.jsonl").unwrap();
        assert!(chain.next_event().unwrap().is_some());
        let err = chain.next_event().unwrap_err();
        assert!(err.to_string().contains("tt_1.jsonl:2"));
    }
}
