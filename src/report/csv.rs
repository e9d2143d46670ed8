//! CSV report output
//!
//! One row per analyzed channel (or per failed recording), summary-level
//! only: the full matrices belong in the JSON report.

use super::RecordingReport;
use std::io;

const HEADER: [&str; 8] = [
    "source",
    "channel",
    "peak_frequency_hz",
    "bin_resolution_hz",
    "segment_samples",
    "spectrogram_bins",
    "spectrogram_segments",
    "error",
];

fn record_err(e: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

pub fn write<W: io::Write>(writer: W, reports: &[RecordingReport]) -> io::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER).map_err(record_err)?;

    for report in reports {
        match &report.output {
            Some(output) => {
                for ch in &output.channels {
                    let n = ch.spectral.amplitudes.len();
                    let resolution = report.sampling_freq / n as f64;
                    let (bins, segments) = ch.spectrogram.dimensions();
                    out.write_record(&[
                        report.source.clone(),
                        ch.channel.clone(),
                        format!("{:.6}", ch.spectral.peak_frequency),
                        format!("{:.6}", resolution),
                        n.to_string(),
                        bins.to_string(),
                        segments.to_string(),
                        String::new(),
                    ])
                    .map_err(record_err)?;
                }
            }
            None => {
                out.write_record(&[
                    report.source.clone(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    report.error.clone().unwrap_or_default(),
                ])
                .map_err(record_err)?;
            }
        }
    }

    out.flush()
}
