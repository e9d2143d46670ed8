//! JSON report output
//!
//! Serializes the full [`RecordingReport`] records, axes and matrices
//! included, so downstream tooling can re-plot without re-running the
//! analysis.

use super::RecordingReport;
use std::io;

pub fn write<W: io::Write>(writer: W, reports: &[RecordingReport]) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, reports)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
