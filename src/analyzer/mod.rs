//! Per-channel analysis pipeline
//!
//! [`Analyzer::run`] is the whole tool in one call: validate the requested
//! channel count and time window against a loaded [`Recording`], cut the
//! row window out, then for each of the first `use_channels` columns
//! independently remove the DC offset and run both the amplitude-spectrum
//! and the spectrogram transforms over the identical mean-removed segment.
//!
//! Channels never share state, so they fan out as parallel tasks and join
//! into one [`AnalysisOutput`] ordered by column. The run is fail-fast: if
//! any channel errors, the whole run returns that error and no partial
//! results escape.

pub mod preprocess;
pub mod spectral;
pub mod spectrogram;

pub use spectral::SpectralResult;
pub use spectrogram::{SpectrogramConfig, SpectrogramResult};

use crate::error::Error;
use crate::recording::Recording;
use rayon::prelude::*;
use serde::Serialize;

/// Everything computed for one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelAnalysis {
    /// Column header (or positional `chN` name) of the channel.
    pub channel: String,
    pub spectral: SpectralResult,
    pub spectrogram: SpectrogramResult,
}

/// All channel results of one run, in column order.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub channels: Vec<ChannelAnalysis>,
}

impl AnalysisOutput {
    /// Look a channel up by its header.
    pub fn channel(&self, name: &str) -> Option<&ChannelAnalysis> {
        self.channels.iter().find(|c| c.channel == name)
    }
}

/// Analysis pipeline configuration, built in the `with_*` style.
///
/// ```no_run
/// use fftscope::{Analyzer, Recording};
///
/// # fn main() -> Result<(), fftscope::Error> {
/// let recording = Recording::load("run1.csv", 1000.0)?;
/// let output = Analyzer::new()
///     .with_spectrogram_window(512)
///     .run(&recording, 2, (0.0, recording.duration()))?;
///
/// for ch in &output.channels {
///     println!("{}: peak {} Hz", ch.channel, ch.spectral.peak_frequency);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    spectrogram: SpectrogramConfig,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the spectrogram frame length (default 256 samples).
    pub fn with_spectrogram_window(mut self, window_len: usize) -> Self {
        self.spectrogram.window_len = window_len;
        self
    }

    /// Override the spectrogram overlap (default half the frame).
    pub fn with_spectrogram_overlap(mut self, overlap: usize) -> Self {
        self.spectrogram.overlap = overlap;
        self
    }

    pub fn spectrogram_config(&self) -> &SpectrogramConfig {
        &self.spectrogram
    }

    /// Analyze the first `use_channels` channels of `recording` over the
    /// `(start, end)` window in seconds.
    ///
    /// Parameter problems (channel count, window outside the recording,
    /// unusable spectrogram config) fail with [`Error::Validation`] before
    /// any work happens; a segment too short for the transforms fails with
    /// [`Error::Analysis`].
    pub fn run(
        &self,
        recording: &Recording,
        use_channels: usize,
        time_range: (f64, f64),
    ) -> Result<AnalysisOutput, Error> {
        let (t_start, t_end) = time_range;

        self.spectrogram.validate()?;

        if use_channels == 0 {
            return Err(Error::Validation(
                "at least one channel must be selected".to_string(),
            ));
        }
        if use_channels > recording.channel_count() {
            return Err(Error::Validation(format!(
                "{} channel(s) requested but the recording has {}",
                use_channels,
                recording.channel_count()
            )));
        }
        if t_end <= t_start {
            return Err(Error::Validation(format!(
                "time range end {} must be after start {}",
                t_end, t_start
            )));
        }
        if t_start < 0.0 {
            return Err(Error::Validation(format!(
                "time range start {} is before the recording",
                t_start
            )));
        }
        if t_end > recording.duration() {
            return Err(Error::Validation(format!(
                "time range end {} exceeds the recording duration {:.6}",
                t_end,
                recording.duration()
            )));
        }

        let (row_start, row_count) = recording.row_range(t_start, t_end)?;
        let window = recording.extract_subrange(row_start, row_count)?;
        let sampling_freq = window.sampling_freq();

        // Each channel is a pure function of its own column copy; fan out
        // and join in column order. collect() on Result aborts on the first
        // channel error, so a failed channel yields no partial output.
        let channels = (0..use_channels)
            .into_par_iter()
            .map(|index| {
                let mut samples = window.channel(index);
                preprocess::remove_offset(&mut samples);

                let spectral = spectral::analyze(&samples, sampling_freq)?;
                let sgram = spectrogram::analyze(&samples, sampling_freq, &self.spectrogram)?;

                Ok(ChannelAnalysis {
                    channel: window.channel_names()[index].clone(),
                    spectral,
                    spectrogram: sgram,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(AnalysisOutput { channels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Recording with one sine per channel (frequency, amplitude, offset).
    fn sine_recording(rows: usize, fs: f64, channels: &[(f64, f64, f64)]) -> Recording {
        let names = (1..=channels.len()).map(|i| format!("ch{}", i)).collect();
        let data = (0..rows)
            .map(|row| {
                channels
                    .iter()
                    .map(|&(freq, amplitude, offset)| {
                        offset + amplitude * (2.0 * PI * freq * row as f64 / fs).sin()
                    })
                    .collect()
            })
            .collect();
        Recording::from_rows(names, data, fs).expect("valid recording")
    }

    // ==========================================================================
    // PARAMETER VALIDATION TESTS
    // ==========================================================================
    //
    // All of these must fail before any channel is analyzed and therefore
    // produce no output at all.
    // ==========================================================================

    #[test]
    fn test_rejects_channel_count_above_available() {
        let rec = sine_recording(500, 1000.0, &[(50.0, 1.0, 0.0); 4]);
        let err = Analyzer::new().run(&rec, 5, (0.0, 0.5)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_rejects_zero_channels() {
        let rec = sine_recording(500, 1000.0, &[(50.0, 1.0, 0.0)]);
        let err = Analyzer::new().run(&rec, 0, (0.0, 0.5)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_rejects_reversed_time_range() {
        let rec = sine_recording(500, 1000.0, &[(50.0, 1.0, 0.0)]);
        for range in [(0.5, 0.5), (0.4, 0.1)] {
            let err = Analyzer::new().run(&rec, 1, range).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn test_rejects_range_outside_recording() {
        let rec = sine_recording(500, 1000.0, &[(50.0, 1.0, 0.0)]);
        assert!(matches!(
            Analyzer::new().run(&rec, 1, (-0.1, 0.4)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Analyzer::new().run(&rec, 1, (0.0, 0.6)), // duration is 0.5 s
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_spectrogram_config() {
        let rec = sine_recording(500, 1000.0, &[(50.0, 1.0, 0.0)]);
        let err = Analyzer::new()
            .with_spectrogram_window(64)
            .with_spectrogram_overlap(64)
            .run(&rec, 1, (0.0, 0.5))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    // ==========================================================================
    // PIPELINE BEHAVIOR TESTS
    // ==========================================================================

    #[test]
    fn test_two_of_four_channels_over_half_second() {
        let rec = sine_recording(
            500,
            1000.0,
            &[
                (50.0, 1.0, 0.0),
                (120.0, 1.0, 0.0),
                (200.0, 1.0, 0.0),
                (333.0, 1.0, 0.0),
            ],
        );

        let output = Analyzer::new().run(&rec, 2, (0.0, 0.5)).unwrap();

        assert_eq!(output.channels.len(), 2);
        assert_eq!(output.channels[0].channel, "ch1");
        assert_eq!(output.channels[1].channel, "ch2");
        // Each channel segment is exactly the 500 selected rows.
        assert_eq!(output.channels[0].spectral.amplitudes.len(), 500);
        assert!((output.channels[0].spectral.peak_frequency - 50.0).abs() < 2.0);
        assert!((output.channels[1].spectral.peak_frequency - 120.0).abs() < 2.0);
    }

    #[test]
    fn test_channels_are_independent_of_each_other() {
        // Wildly different offsets per channel: offset removal is per
        // channel, so each DC bin ends up empty and each peak is the
        // channel's own tone.
        let rec = sine_recording(1000, 1000.0, &[(50.0, 1.0, 40.0), (120.0, 1.0, -7.0)]);
        let output = Analyzer::new().run(&rec, 2, (0.0, 1.0)).unwrap();

        for (ch, expected) in output.channels.iter().zip([50.0, 120.0]) {
            assert!(
                (ch.spectral.peak_frequency - expected).abs() < 2.0,
                "{}: expected ~{} Hz, got {}",
                ch.channel,
                expected,
                ch.spectral.peak_frequency
            );
            assert!(
                ch.spectral.amplitudes[0] < 1e-9,
                "{}: DC bin should be empty after offset removal",
                ch.channel
            );
        }
    }

    #[test]
    fn test_sub_window_selects_rows() {
        let rec = sine_recording(1000, 1000.0, &[(50.0, 1.0, 0.0)]);
        let output = Analyzer::new().run(&rec, 1, (0.25, 0.75)).unwrap();
        assert_eq!(output.channels[0].spectral.amplitudes.len(), 500);
    }

    #[test]
    fn test_spectrogram_present_with_custom_config() {
        let rec = sine_recording(500, 1000.0, &[(50.0, 1.0, 0.0)]);
        let output = Analyzer::new()
            .with_spectrogram_window(64)
            .with_spectrogram_overlap(32)
            .run(&rec, 1, (0.0, 0.5))
            .unwrap();

        let sgram = &output.channels[0].spectrogram;
        assert_eq!(sgram.dimensions(), (33, 14)); // (500-64)/32 + 1
    }

    #[test]
    fn test_segment_too_short_for_spectrogram_fails_whole_run() {
        // 100 rows cannot fill the default 256-sample window; the run
        // errors as a whole, with no partial output to inspect.
        let rec = sine_recording(100, 1000.0, &[(50.0, 1.0, 0.0), (60.0, 1.0, 0.0)]);
        let err = Analyzer::new().run(&rec, 2, (0.0, 0.1)).unwrap_err();
        assert!(matches!(err, Error::Analysis(_)));
    }

    #[test]
    fn test_rerun_is_bit_identical() {
        let rec = sine_recording(512, 1000.0, &[(50.0, 1.0, 0.3), (80.0, 0.5, -0.2)]);
        let analyzer = Analyzer::new();

        let first = analyzer.run(&rec, 2, (0.0, 0.512)).unwrap();
        let second = analyzer.run(&rec, 2, (0.0, 0.512)).unwrap();

        for (a, b) in first.channels.iter().zip(second.channels.iter()) {
            assert_eq!(a.spectral.amplitudes, b.spectral.amplitudes);
            assert_eq!(a.spectral.frequencies, b.spectral.frequencies);
            assert_eq!(a.spectral.peak_frequency, b.spectral.peak_frequency);
            assert_eq!(a.spectrogram.power, b.spectrogram.power);
            assert_eq!(a.spectrogram.times, b.spectrogram.times);
        }
    }

    #[test]
    fn test_output_lookup_by_header() {
        let rec = sine_recording(500, 1000.0, &[(50.0, 1.0, 0.0), (60.0, 1.0, 0.0)]);
        let output = Analyzer::new().run(&rec, 2, (0.0, 0.5)).unwrap();

        assert!(output.channel("ch2").is_some());
        assert!(output.channel("ch9").is_none());
    }
}
