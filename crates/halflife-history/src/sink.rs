//! Result rows for discovered half-points.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use halflife_core::{format_commit_date, HalfPoint, Result, Revision};

/// Header of the CSV result file.
pub const CSV_HEADER: &str = "startRevision,dateOfStart,dateOfHalfPoint,commitsElapsed";

/// Receives one row per half-point found during a run.
pub trait ResultSink {
    /// Append the row for `baseline`'s half-point.
    fn record(&mut self, baseline: &Revision, half_point: &HalfPoint) -> io::Result<()>;

    /// Push buffered rows to their destination.
    fn flush(&mut self) -> io::Result<()>;
}

/// Writes result rows as CSV, header first.
///
/// # Examples
///
/// ```
/// use halflife_history::sink::{CsvSink, ResultSink};
///
/// let mut sink = CsvSink::new(Vec::new()).unwrap();
/// sink.flush().unwrap();
/// let bytes = sink.into_inner().unwrap();
/// assert_eq!(
///     String::from_utf8(bytes).unwrap(),
///     "startRevision,dateOfStart,dateOfHalfPoint,commitsElapsed\n"
/// );
/// ```
pub struct CsvSink<W: Write> {
    writer: BufWriter<W>,
}

impl CsvSink<File> {
    /// Create (or truncate) the CSV file at `path` and write the header.
    ///
    /// # Errors
    ///
    /// Returns [`halflife_core::HalfLifeError::Io`] if the file cannot be created or written.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(file)?)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wrap `writer` and write the header row.
    ///
    /// # Errors
    ///
    /// Returns any error from writing the header.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut writer = BufWriter::new(writer);
        writeln!(writer, "{CSV_HEADER}")?;
        Ok(Self { writer })
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns the error from the final flush.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn record(&mut self, baseline: &Revision, half_point: &HalfPoint) -> io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{}",
            baseline,
            format_commit_date(&half_point.baseline_date),
            format_commit_date(&half_point.half_point_date),
            half_point.commits_elapsed
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
