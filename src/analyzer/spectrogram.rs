//! Short-time spectrogram with power-spectral-density scaling
//!
//! The segment is split into overlapping Hann-windowed frames (256 samples
//! with 50% overlap by default, both configurable), each frame is FFT'd, and
//! the one-sided power spectral density of every frame becomes one column of
//! the output matrix.
//!
//! # Scaling
//!
//! Values are power per Hz, not raw magnitude:
//!
//! ```text
//! psd[k] = |fft(x * w)[k]|^2 / (fs * sum(w^2))
//! ```
//!
//! with every bin except DC doubled to fold the mirrored negative
//! frequencies into the one-sided spectrum. For an even window length the
//! Nyquist bin has no mirror and is not doubled either.
//!
//! # Axes
//!
//! - `frequencies`: `window_len/2 + 1` bins from 0 to Nyquist, ascending.
//! - `times`: the center of each frame in seconds, ascending.
//! - `power[frequency_index][time_index]`.

use crate::error::Error;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

/// Frame length and overlap for the short-time transform.
#[derive(Debug, Clone, Copy)]
pub struct SpectrogramConfig {
    /// Samples per analysis frame.
    pub window_len: usize,
    /// Samples shared between consecutive frames; must stay below
    /// `window_len`.
    pub overlap: usize,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        SpectrogramConfig {
            window_len: 256,
            overlap: 128,
        }
    }
}

impl SpectrogramConfig {
    /// Samples advanced between consecutive frames.
    pub fn hop(&self) -> usize {
        self.window_len - self.overlap
    }

    /// Reject configurations that cannot produce frames.
    pub fn validate(&self) -> Result<(), Error> {
        if self.window_len < 2 {
            return Err(Error::Validation(format!(
                "spectrogram window of {} sample(s) is too short",
                self.window_len
            )));
        }
        if self.overlap >= self.window_len {
            return Err(Error::Validation(format!(
                "overlap {} must be smaller than the window length {}",
                self.overlap, self.window_len
            )));
        }
        Ok(())
    }
}

/// Time-frequency power density matrix for one channel segment.
#[derive(Debug, Clone, Serialize)]
pub struct SpectrogramResult {
    /// Bin centers in Hz, 0 to Nyquist ascending.
    pub frequencies: Vec<f64>,
    /// Frame centers in seconds, ascending.
    pub times: Vec<f64>,
    /// Power per Hz, indexed `[frequency][time]`.
    pub power: Vec<Vec<f64>>,
}

impl SpectrogramResult {
    /// `(frequency_bins, time_segments)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.frequencies.len(), self.times.len())
    }

    /// Smallest and largest density in the matrix.
    pub fn power_range(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for row in &self.power {
            for &value in row {
                min = min.min(value);
                max = max.max(value);
            }
        }
        (min, max)
    }
}

/// Hann window of the given size.
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos())
        })
        .collect()
}

/// Compute the spectrogram of a real-valued segment.
///
/// Fails with [`Error::Analysis`] when the segment cannot fill a single
/// frame, and with [`Error::Validation`] for an unusable configuration.
pub fn analyze(
    samples: &[f64],
    sampling_freq: f64,
    config: &SpectrogramConfig,
) -> Result<SpectrogramResult, Error> {
    config.validate()?;

    let n = samples.len();
    let window_len = config.window_len;
    if n < window_len {
        return Err(Error::Analysis(format!(
            "segment of {} samples is shorter than one {}-sample spectrogram window",
            n, window_len
        )));
    }

    let hop = config.hop();
    let num_segments = (n - window_len) / hop + 1;
    let n_freq = window_len / 2 + 1;

    let window = hann_window(window_len);
    let window_power: f64 = window.iter().map(|&w| w * w).sum();
    let scale = 1.0 / (sampling_freq * window_power);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(window_len);

    let mut power = vec![vec![0.0; num_segments]; n_freq];
    let mut times = Vec::with_capacity(num_segments);

    for segment in 0..num_segments {
        let start = segment * hop;
        let mut buffer: Vec<Complex<f64>> = samples[start..start + window_len]
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        fft.process(&mut buffer);
        times.push((start as f64 + window_len as f64 / 2.0) / sampling_freq);

        for (bin, row) in power.iter_mut().enumerate() {
            let mut density = buffer[bin].norm_sqr() * scale;
            // One-sided spectrum: fold the mirrored bins in. DC has no
            // mirror; neither does Nyquist when the window length is even.
            let is_nyquist = window_len % 2 == 0 && bin == n_freq - 1;
            if bin != 0 && !is_nyquist {
                density *= 2.0;
            }
            row[segment] = density;
        }
    }

    let frequencies = (0..n_freq)
        .map(|bin| bin as f64 * sampling_freq / window_len as f64)
        .collect();

    Ok(SpectrogramResult {
        frequencies,
        times,
        power,
    })
}
