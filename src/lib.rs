//! fftscope - Per-channel FFT and spectrogram analysis for CSV recordings
//!
//! fftscope loads multi-channel time-series recordings from CSV files (one
//! column per sensor channel, one row per sampling instant) and computes,
//! independently for each selected channel, an amplitude spectrum with its
//! peak frequency plus a short-time spectrogram — the standard first look
//! at vibration and other sensor data.
//!
//! # Pipeline
//!
//! Every run is a pure function of its inputs:
//!
//! 1. Select a time window `[start, end]` of the recording and cut out the
//!    matching rows.
//! 2. Per channel, subtract the mean (a DC offset would otherwise dominate
//!    both spectra).
//! 3. Per channel, run one full-length FFT (amplitude spectrum, signed
//!    frequency axis, peak frequency) and one Hann-windowed short-time FFT
//!    (one-sided power spectral density over time).
//!
//! Channels share nothing and are processed as parallel tasks; any channel
//! failure fails the whole run with no partial results.
//!
//! # Quick Start
//!
//! ```no_run
//! use fftscope::{Analyzer, Recording};
//!
//! # fn main() -> Result<(), fftscope::Error> {
//! let recording = Recording::load("vibration.csv", 1000.0)?;
//! let output = Analyzer::new().run(&recording, 2, (0.0, recording.duration()))?;
//!
//! for ch in &output.channels {
//!     println!("{}: peak at {:.1} Hz", ch.channel, ch.spectral.peak_frequency);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! All failures are deterministic input problems, split into a small
//! taxonomy ([`Error`]): unparseable files, parameters that contradict the
//! recording, empty row windows, and segments too short to transform. See
//! [`error`] for the exact mapping.
//!
//! # Modules
//!
//! - [`recording`]: CSV loading and time-window row selection
//! - [`analyzer`]: the per-channel analysis pipeline and both transforms
//! - [`report`]: JSON/CSV reports and PNG artifact rendering

pub mod analyzer;
pub mod error;
pub mod recording;
pub mod report;

pub use analyzer::{
    AnalysisOutput, Analyzer, ChannelAnalysis, SpectralResult, SpectrogramConfig,
    SpectrogramResult,
};
pub use error::Error;
pub use recording::Recording;
