//! PNG artifact rendering
//!
//! One image per channel: the one-sided amplitude spectrum as a line plot
//! on top, the spectrogram as a colormapped heatmap below (time across,
//! frequency up, dB color scale).
//!
//! Artifacts for one recording are written all-or-none: every channel is
//! rendered to memory first and files only hit the disk once all of them
//! encoded, so a failed run never leaves a half-populated results
//! directory behind.

use crate::analyzer::{AnalysisOutput, ChannelAnalysis};
use crate::error::Error;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

const WIDTH: u32 = 800;
const SPECTRUM_HEIGHT: u32 = 220;
const SPECTROGRAM_HEIGHT: u32 = 260;

const BACKGROUND: Rgb<u8> = Rgb([16, 16, 20]);

/// Visible dynamic range of the heatmap below its peak, in dB.
const DB_RANGE: f64 = 90.0;
/// Floor for empty bins, below any real density of interest.
const DB_FLOOR: f64 = -120.0;

/// Colormap for the spectrogram heatmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Viridis (perceptually uniform, colorblind-friendly)
    #[default]
    Viridis,
    /// Plasma (perceptually uniform, high contrast)
    Plasma,
    /// Simple black to white
    Grayscale,
}

impl Colormap {
    /// Map a normalized value (0-1) to RGB.
    pub fn map(&self, value: f64) -> [u8; 3] {
        let t = value.clamp(0.0, 1.0);
        match self {
            Colormap::Viridis => Self::viridis(t),
            Colormap::Plasma => Self::plasma(t),
            Colormap::Grayscale => {
                let v = (t * 255.0) as u8;
                [v, v, v]
            }
        }
    }

    /// Parse a colormap name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viridis" => Some(Colormap::Viridis),
            "plasma" => Some(Colormap::Plasma),
            "grayscale" | "gray" | "grey" => Some(Colormap::Grayscale),
            _ => None,
        }
    }

    // Polynomial approximations of the matplotlib colormaps
    fn viridis(t: f64) -> [u8; 3] {
        let r = (0.267 + t * (0.329 + t * (1.451 + t * (-1.808 + t * 0.758)))).clamp(0.0, 1.0);
        let g = (0.004 + t * (1.513 + t * (-0.838 + t * (0.731 - t * 0.466)))).clamp(0.0, 1.0);
        let b = (0.329 + t * (1.442 + t * (-2.642 + t * (1.963 - t * 0.440)))).clamp(0.0, 1.0);
        [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
    }

    fn plasma(t: f64) -> [u8; 3] {
        let r = (0.050 + t * (2.735 + t * (-2.811 + t * (1.327 - t * 0.259)))).clamp(0.0, 1.0);
        let g = (0.030 + t * (0.259 + t * (2.042 + t * (-2.802 + t * 1.429)))).clamp(0.0, 1.0);
        let b = (0.528 + t * (1.502 + t * (-3.489 + t * (3.003 - t * 0.985)))).clamp(0.0, 1.0);
        [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
    }
}

/// Power density to dB, floored for empty bins.
fn power_db(value: f64) -> f64 {
    if value <= 0.0 {
        DB_FLOOR
    } else {
        10.0 * value.log10()
    }
}

/// Render one channel's spectrum-over-spectrogram composite.
pub fn render_channel(ch: &ChannelAnalysis, colormap: Colormap) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, SPECTRUM_HEIGHT + SPECTROGRAM_HEIGHT, BACKGROUND);
    draw_spectrum(&mut img, ch, colormap);
    draw_spectrogram(&mut img, ch, colormap);
    img
}

/// Line plot of the non-negative half of the amplitude spectrum.
fn draw_spectrum(img: &mut RgbImage, ch: &ChannelAnalysis, colormap: Colormap) {
    let spectral = &ch.spectral;
    let n = spectral.amplitudes.len();
    // Bins 0..=(N-1)/2 are the non-negative frequencies.
    let half = (n - 1) / 2 + 1;

    let max_amplitude = spectral.amplitudes[..half]
        .iter()
        .cloned()
        .fold(f64::MIN_POSITIVE, f64::max);

    let color = Rgb(colormap.map(0.85));
    let height = SPECTRUM_HEIGHT as f64;
    let mut prev_y: Option<u32> = None;

    for x in 0..WIDTH {
        let bin = (x as usize * (half - 1)) / (WIDTH as usize - 1).max(1);
        let level = (spectral.amplitudes[bin] / max_amplitude).clamp(0.0, 1.0);
        // 4 px margin top and bottom so the trace never touches the edge.
        let y = (height - 5.0 - level * (height - 9.0)) as u32;

        // Connect to the previous column so steep peaks stay visible.
        let (from, to) = match prev_y {
            Some(p) if p < y => (p, y),
            Some(p) => (y, p),
            None => (y, y),
        };
        for yy in from..=to {
            img.put_pixel(x, yy, color);
        }
        prev_y = Some(y);
    }
}

/// Colormapped heatmap, low frequencies at the bottom, time left to right.
fn draw_spectrogram(img: &mut RgbImage, ch: &ChannelAnalysis, colormap: Colormap) {
    let sgram = &ch.spectrogram;
    let (bins, segments) = sgram.dimensions();

    let max_db = sgram
        .power
        .iter()
        .flat_map(|row| row.iter())
        .cloned()
        .map(power_db)
        .fold(f64::NEG_INFINITY, f64::max);
    let silent = max_db <= DB_FLOOR + 1e-9;
    let min_db = max_db - DB_RANGE;

    for y in 0..SPECTROGRAM_HEIGHT {
        // Flip vertically: the top row of the panel is the highest bin.
        let bin = ((SPECTROGRAM_HEIGHT - 1 - y) as usize * (bins - 1))
            / (SPECTROGRAM_HEIGHT as usize - 1);
        for x in 0..WIDTH {
            let segment = (x as usize * (segments - 1)) / (WIDTH as usize - 1).max(1);
            let t = if silent {
                0.0
            } else {
                (power_db(sgram.power[bin][segment]) - min_db) / DB_RANGE
            };
            let [r, g, b] = colormap.map(t);
            img.put_pixel(x, SPECTRUM_HEIGHT + y, Rgb([r, g, b]));
        }
    }
}

/// Encode an image as PNG in memory.
pub fn encode_png(img: &RgbImage) -> io::Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(buffer.into_inner())
}

/// File name for a channel artifact, with anything awkward for a file
/// system replaced by underscores.
pub fn artifact_file_name(channel: &str) -> String {
    let sanitized: String = channel
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "channel.png".to_string()
    } else {
        format!("{}.png", sanitized)
    }
}

/// Write one PNG per channel under `<report_dir>/<stem>/`.
///
/// Rendering happens fully in memory before the first write; if any write
/// fails, files already written for this recording are removed again so
/// the directory holds either every channel or nothing.
pub fn write_artifacts(
    report_dir: &Path,
    stem: &str,
    output: &AnalysisOutput,
    colormap: Colormap,
) -> Result<Vec<PathBuf>, Error> {
    let dir = report_dir.join(stem);

    let mut rendered = Vec::with_capacity(output.channels.len());
    for ch in &output.channels {
        let img = render_channel(ch, colormap);
        let png = encode_png(&img)
            .map_err(|e| Error::write(dir.join(artifact_file_name(&ch.channel)), e))?;
        rendered.push((artifact_file_name(&ch.channel), png));
    }

    std::fs::create_dir_all(&dir).map_err(|e| Error::write(&dir, e))?;

    let mut written: Vec<PathBuf> = Vec::with_capacity(rendered.len());
    for (name, png) in &rendered {
        let path = dir.join(name);
        if let Err(e) = std::fs::write(&path, png) {
            for earlier in &written {
                let _ = std::fs::remove_file(earlier);
            }
            let _ = std::fs::remove_dir(&dir);
            return Err(Error::write(path, e));
        }
        written.push(path);
    }

    Ok(written)
}
