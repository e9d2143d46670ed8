//! Report generation for analysis results
//!
//! Two machine-readable formats plus the PNG artifacts:
//!
//! - **JSON**: full axes and matrices per channel, for programmatic use
//! - **CSV**: one summary row per channel, spreadsheet-friendly
//! - **PNG** ([`render`]): per-channel spectrum + spectrogram image
//!
//! ```ignore
//! use fftscope::report;
//!
//! // Picks the format from the extension
//! report::generate("report.json", &reports)?; // JSON
//! report::generate("report.csv", &reports)?;  // CSV
//! ```

pub mod csv;
pub mod json;
pub mod render;

use crate::analyzer::AnalysisOutput;
use crate::error::Error;
use serde::Serialize;
use std::path::Path;

/// Outcome of analyzing one recording, as it appears in reports.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingReport {
    /// Path of the source CSV.
    pub source: String,
    /// File stem, used as the artifact directory name.
    pub stem: String,
    pub sampling_freq: f64,
    /// `[start, end]` of the analyzed window in seconds.
    pub time_range: (f64, f64),
    /// Per-channel results; absent when the recording failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<AnalysisOutput>,
    /// Written artifact paths, one per channel, when images were rendered.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generate a report in the format matching the file extension.
pub fn generate<P: AsRef<Path>>(path: P, reports: &[RecordingReport]) -> Result<(), Error> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let file = std::fs::File::create(path).map_err(|e| Error::write(path, e))?;

    match ext.as_str() {
        "json" => json::write(file, reports),
        _ => csv::write(file, reports),
    }
    .map_err(|e| Error::write(path, e))
}

/// Summary statistics for a batch of recordings.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub total: usize,
    pub analyzed: usize,
    pub failed: usize,
    /// Channel results across all analyzed recordings.
    pub channels: usize,
}

impl Summary {
    pub fn from_reports(reports: &[RecordingReport]) -> Self {
        let mut summary = Summary {
            total: reports.len(),
            ..Self::default()
        };

        for report in reports {
            match &report.output {
                Some(output) => {
                    summary.analyzed += 1;
                    summary.channels += output.channels.len();
                }
                None => summary.failed += 1,
            }
        }

        summary
    }
}
