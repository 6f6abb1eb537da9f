//! CSV cycle log — one row per cycle, append-only.
//!
//! ```text
//! cycle,timestamp,status,verdict,total_favor,total_contra,total_neutral,s10_favor,...,s10_state,...
//! 7,2025-01-01 12:00:03,partial_failure,favor,300,120,90,100,40,30,ok,,,,retries_exhausted(nack)
//! ```
//!
//! Columns are positional: slave `i` of the configuration always owns the
//! same four columns, so a failed slave leaves its counts empty rather
//! than shifting the row.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::app::ports::RecordPort;
use crate::error::SinkError;
use crate::slaves::SlaveAddress;
use crate::slaves::aggregate::CycleSnapshot;

/// Header row naming every column, slaves in configuration order.
pub fn csv_header(addresses: &[SlaveAddress]) -> String {
    let mut line =
        String::from("cycle,timestamp,status,verdict,total_favor,total_contra,total_neutral");
    for a in addresses {
        let raw = a.raw();
        let _ = write!(
            line,
            ",s{raw:02x}_favor,s{raw:02x}_contra,s{raw:02x}_neutral,s{raw:02x}_state"
        );
    }
    line
}

/// One data row.  Failed slaves carry empty counts and the outcome
/// marker in their state column.
pub fn format_row(snapshot: &CycleSnapshot) -> String {
    let t = &snapshot.totals;
    let mut line = format!(
        "{},{},{},{},{},{},{}",
        snapshot.cycle,
        snapshot.timestamp,
        snapshot.status,
        t.verdict(),
        t.favor,
        t.contra,
        t.neutral
    );
    for r in &snapshot.results {
        match r.outcome.tally() {
            Some(tally) => {
                let _ = write!(
                    line,
                    ",{},{},{},ok",
                    tally.favor, tally.contra, tally.neutral
                );
            }
            None => {
                let _ = write!(line, ",,,,{}", r.outcome);
            }
        }
    }
    line
}

fn sink_error(e: &io::Error) -> SinkError {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => SinkError::DeviceAbsent,
        _ => SinkError::WriteFailed,
    }
}

/// Highest rotation suffix tried before giving up.
const MAX_ROTATIONS: u32 = 99;

/// `datalog.csv` → `datalog-<n>.csv`.
fn rotated_path(base: &Path, n: u32) -> PathBuf {
    let stem = base.file_stem().unwrap_or_default().to_string_lossy();
    let name = match base.extension() {
        Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n}"),
    };
    base.with_file_name(name)
}

/// `true` when `path` is missing, empty, or already starts with `header`.
fn accepts_header(path: &Path, header: &str) -> io::Result<bool> {
    use std::io::BufRead;
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    };
    let mut first = String::new();
    io::BufReader::new(file).read_line(&mut first)?;
    Ok(first.is_empty() || first.trim_end_matches(['\r', '\n']) == header)
}

/// Append-only CSV file.
///
/// The file is opened for each append and closed again, so a card that is
/// pulled and reinserted between cycles is picked up without a restart.
///
/// An existing file whose header belongs to a different slave list is
/// never appended to; rows go to the first `<stem>-<n>.<ext>` whose header
/// matches (or that does not exist yet).
pub struct CsvFileLogger {
    base: PathBuf,
    path: PathBuf,
    header: String,
    /// A row has landed in `path`; its header no longer needs checking.
    resolved: bool,
    rows: u64,
}

impl CsvFileLogger {
    pub fn new(path: impl AsRef<Path>, addresses: &[SlaveAddress]) -> Self {
        let base = path.as_ref().to_path_buf();
        Self {
            path: base.clone(),
            base,
            header: csv_header(addresses),
            resolved: false,
            rows: 0,
        }
    }

    /// File the rows go to; differs from the configured path after rotation.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn resolve_target(&mut self) -> io::Result<()> {
        if self.resolved {
            return Ok(());
        }
        let mut candidate = self.base.clone();
        let mut n = 0;
        while !accepts_header(&candidate, &self.header)? {
            n += 1;
            if n > MAX_ROTATIONS {
                return Err(io::Error::other("no free log file name"));
            }
            candidate = rotated_path(&self.base, n);
        }
        if n > 0 {
            warn!(
                "CSV log: {} has a different column layout, writing to {}",
                self.base.display(),
                candidate.display()
            );
        }
        self.path = candidate;
        Ok(())
    }

    /// Rows written by this logger since construction.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    fn append(&mut self, row: &str) -> io::Result<()> {
        self.resolve_target()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut writer = BufWriter::new(file);
        if fresh {
            writeln!(writer, "{}", self.header)?;
            info!("CSV log: started {}", self.path.display());
        }
        writeln!(writer, "{row}")?;
        writer.flush()?;
        self.resolved = true;
        Ok(())
    }
}

impl RecordPort for CsvFileLogger {
    fn record(&mut self, snapshot: &CycleSnapshot) -> Result<(), SinkError> {
        let row = format_row(snapshot);
        match self.append(&row) {
            Ok(()) => {
                self.rows += 1;
                Ok(())
            }
            Err(e) => {
                debug!("CSV append to {} failed: {}", self.path.display(), e);
                Err(sink_error(&e))
            }
        }
    }
}

/// Read back every line of a log file; used by tooling and tests.
pub fn read_lines(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    use std::io::BufRead;
    let file = File::open(path)?;
    io::BufReader::new(file).lines().collect()
}
