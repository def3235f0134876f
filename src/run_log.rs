use crate::enums::ProjectionOutcome;

use chrono::Local;
use std::{
    error::Error,
    fmt::Write as _,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

pub const RUN_MARKER: &str = "#### anilyze-data ####";
pub const DONE_MARKER: &str = "Done with script.";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Plain-text record of a batch run, kept next to the scans.
///
/// The file is opened, written, flushed and closed for every entry, so a run
/// interrupted between scans leaves a complete, readable log behind.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Truncate any previous log at `path` and write the run header.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let mut file = File::create(&path)?;
        write!(file, "\n{}\n{}\n", timestamp(), RUN_MARKER)?;
        file.flush()?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()
    }

    pub fn scan_succeeded(&self, basename: &str, outcome: ProjectionOutcome) -> io::Result<()> {
        self.append(&format!(
            "{}Congrats, it was successful! ({outcome})\n",
            scan_header(basename)
        ))
    }

    /// Record a failure with its whole `source()` chain.
    pub fn scan_failed(&self, basename: &str, error: &dyn Error) -> io::Result<()> {
        let mut text = format!(
            "{}\n{}\nError with {basename}\n\n{error}\n",
            scan_header(basename),
            timestamp()
        );
        let mut source = error.source();
        while let Some(cause) = source {
            let _ = writeln!(text, "  caused by: {cause}");
            source = cause.source();
        }
        self.append(&text)
    }

    pub fn finish(&self) -> io::Result<()> {
        self.append(&format!("\n{DONE_MARKER}\n"))
    }
}

/// Every scan gets exactly one entry, header and outcome written together.
fn scan_header(basename: &str) -> String {
    format!("\n \n -- Processing {basename} --\n")
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn create_truncates_previous_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("errorFile.txt");
        fs::write(&path, "stale content").unwrap();

        RunLog::create(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert!(text.contains(RUN_MARKER));
    }

    #[test]
    fn entries_are_appended_in_order() {
        let dir = tempdir().unwrap();
        let log = RunLog::create(dir.path().join("errorFile.txt")).unwrap();
        log.scan_succeeded("scan1", ProjectionOutcome::Projected).unwrap();
        log.scan_failed(
            "scan2",
            &ScanError::Resolution {
                pattern: "scan2_Cycle00001_Ch?_000001.ome.tif".to_string(),
            },
        )
        .unwrap();
        log.finish().unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        let first = text.find("-- Processing scan1 --").unwrap();
        let success = text.find("Congrats, it was successful! (projected)").unwrap();
        let second = text.find("-- Processing scan2 --").unwrap();
        let failure = text.find("Error with scan2").unwrap();
        assert!(first < success && success < second && second < failure);
        assert!(text.contains("no initiator file found matching scan2_Cycle00001"));
        assert!(text.trim_end().ends_with(DONE_MARKER));
    }
}
