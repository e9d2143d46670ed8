//! Amplitude spectrum and peak frequency
//!
//! One full-length FFT over the mean-removed segment, no padding and no
//! truncation. Results come back in three parallel pieces:
//!
//! - `frequencies[i]`: bin center in Hz, in the standard signed FFT layout
//!   (non-negative bins ascending from DC, then negative bins ascending
//!   toward zero — the same order `numpy.fft.fftfreq` uses).
//! - `amplitudes[i] = |fft[i]| * 2 / N`: scaled so a pure sine of amplitude
//!   A over an integer number of periods reads back as A at its bin.
//! - `peak_frequency`: the frequency at the first bin attaining the maximum
//!   amplitude. For a real signal the spectrum is mirror-symmetric, so the
//!   first maximum lands on the non-negative side.

use crate::error::Error;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

/// Amplitude spectrum of one channel segment.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralResult {
    /// Bin centers in Hz, signed FFT layout.
    pub frequencies: Vec<f64>,
    /// `|fft[i]| * 2 / N`, non-negative by construction.
    pub amplitudes: Vec<f64>,
    /// Frequency at the first bin with maximal amplitude.
    pub peak_frequency: f64,
}

/// Frequency of every FFT bin for an N-point transform at `sampling_freq`.
///
/// Index `i` maps to `i / (N * dt)` for the non-negative half and
/// `(i - N) / (N * dt)` for the negative half, matching the bin order the
/// transform itself produces.
pub fn bin_frequencies(n: usize, sampling_freq: f64) -> Vec<f64> {
    let span = n as f64 / sampling_freq; // N * dt
    let last_nonnegative = (n - 1) / 2;
    (0..n)
        .map(|i| {
            let k = if i <= last_nonnegative {
                i as f64
            } else {
                i as f64 - n as f64
            };
            k / span
        })
        .collect()
}

/// Compute the amplitude spectrum of a real-valued segment.
///
/// Fails with [`Error::Analysis`] for segments shorter than two samples; a
/// single sample has no meaningful spectrum.
pub fn analyze(samples: &[f64], sampling_freq: f64) -> Result<SpectralResult, Error> {
    let n = samples.len();
    if n < 2 {
        return Err(Error::Analysis(format!(
            "segment of {} sample(s) is too short for an FFT",
            n
        )));
    }

    let mut buffer: Vec<Complex<f64>> =
        samples.iter().map(|&s| Complex::new(s, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let scale = 2.0 / n as f64;
    let amplitudes: Vec<f64> = buffer.iter().map(|c| c.norm() * scale).collect();
    let frequencies = bin_frequencies(n, sampling_freq);

    // Stable argmax: strict comparison keeps the first bin on ties, which
    // for a mirrored real-signal spectrum is the non-negative one.
    let mut peak_index = 0;
    for (i, &amplitude) in amplitudes.iter().enumerate() {
        if amplitude > amplitudes[peak_index] {
            peak_index = i;
        }
    }

    Ok(SpectralResult {
        peak_frequency: frequencies[peak_index],
        frequencies,
        amplitudes,
    })
}
