use chrono::Local;
use clap::Parser;
use fftscope::report::{self, render, RecordingReport, Summary};
use fftscope::{Analyzer, Recording};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "fftscope")]
#[command(author, version, about = "Per-channel FFT and spectrogram analysis for CSV sensor recordings")]
struct Args {
    /// CSV file or directory of CSV files to analyze
    path: PathBuf,

    /// Sampling frequency of the recording in Hz
    #[arg(short = 'f', long)]
    sampling_freq: f64,

    /// Number of channels to analyze, starting from the first column
    #[arg(short, long, default_value = "1")]
    channels: usize,

    /// Start of the analysis window in seconds
    #[arg(long, default_value = "0")]
    start: f64,

    /// End of the analysis window in seconds (default: end of recording)
    #[arg(long)]
    end: Option<f64>,

    /// Spectrogram window length in samples
    #[arg(long, default_value = "256")]
    window: usize,

    /// Spectrogram overlap in samples (default: half the window)
    #[arg(long)]
    overlap: Option<usize>,

    /// Colormap for spectrogram images: viridis, plasma, grayscale
    #[arg(long, default_value = "viridis")]
    colormap: String,

    /// Output report file (.csv, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for image artifacts and auto-generated reports
    #[arg(long, default_value = "fftscope-results")]
    report_dir: PathBuf,

    /// Don't render PNG artifacts
    #[arg(long)]
    no_images: bool,

    /// Don't auto-generate a CSV report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open the results directory
    #[arg(long)]
    no_open: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Show per-channel details
    #[arg(short, long)]
    verbose: bool,

    /// Only show the summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let colormap = match render::Colormap::from_str(&args.colormap) {
        Some(cm) => cm,
        None => {
            eprintln!(
                "Unknown colormap '{}' (expected viridis, plasma or grayscale)",
                args.colormap
            );
            std::process::exit(1);
        }
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    // Collect CSV files
    let files: Vec<PathBuf> = if args.path.is_dir() {
        WalkDir::new(&args.path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        eprintln!("No CSV files found under {}", args.path.display());
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mfftscope - FFT & Spectrogram Analyzer\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!(
            "Found {} recording(s), sampling at {} Hz\n",
            files.len(),
            args.sampling_freq
        );
    }

    // Set up progress bar
    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut analyzer = Analyzer::new().with_spectrogram_window(args.window);
    analyzer = analyzer.with_spectrogram_overlap(args.overlap.unwrap_or(args.window / 2));

    // Analyze recordings in parallel; channels fan out inside each run.
    let reports: Vec<RecordingReport> = files
        .par_iter()
        .map(|path| {
            let report = analyze_recording(path, &args, &analyzer, colormap);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(report.stem.clone());
            }
            report
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Print results
    if !args.quiet {
        for r in &reports {
            match (&r.output, &r.error) {
                (Some(output), _) => {
                    let peaks: Vec<String> = output
                        .channels
                        .iter()
                        .map(|ch| format!("{} {:.2}Hz", ch.channel, ch.spectral.peak_frequency))
                        .collect();
                    println!(
                        "\x1b[32m[OK]\x1b[0m   {:<32}  [{:.3}s, {:.3}s]  {}",
                        r.stem,
                        r.time_range.0,
                        r.time_range.1,
                        peaks.join("  ")
                    );

                    if args.verbose {
                        for ch in &output.channels {
                            let n = ch.spectral.amplitudes.len();
                            let (bins, segments) = ch.spectrogram.dimensions();
                            eprintln!(
                                "    {}: {} samples, {:.3} Hz/bin, spectrogram {}x{}",
                                ch.channel,
                                n,
                                r.sampling_freq / n as f64,
                                bins,
                                segments
                            );
                        }
                    }
                }
                (None, Some(error)) => {
                    println!("\x1b[31m[FAIL]\x1b[0m {:<32}  {}", r.stem, error);
                }
                (None, None) => unreachable!("report without output or error"),
            }
        }
    }

    // Summary
    let summary = Summary::from_reports(&reports);
    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Analyzed:\x1b[0m {} ({} channel(s))", summary.analyzed, summary.channels);
        if summary.failed > 0 {
            eprintln!("  \x1b[31m✗ Failed:\x1b[0m   {}", summary.failed);
        }
    }

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        // Auto-generate report
        std::fs::create_dir_all(&args.report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("fftscope_report_{}.csv", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    // Generate report
    if let Some(ref output_path) = report_path {
        if let Err(e) = report::generate(output_path, &reports) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }
    }

    // Offer to open the results directory
    if !args.no_open && !args.quiet && report_path.is_some() {
        eprint!("\nOpen results folder? [Y/n] ");
        io::stderr().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() {
            let input = input.trim().to_lowercase();
            if input.is_empty() || input == "y" || input == "yes" {
                if let Err(e) = open::that(&args.report_dir) {
                    eprintln!("Failed to open results folder: {}", e);
                }
            }
        }
    }

    if !args.quiet {
        eprintln!("\n\x1b[90mAnalysis complete.\x1b[0m");
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }
}

/// Load, analyze, and (optionally) render one recording, folding any error
/// into the report record instead of aborting the batch.
fn analyze_recording(
    path: &Path,
    args: &Args,
    analyzer: &Analyzer,
    colormap: render::Colormap,
) -> RecordingReport {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording")
        .to_string();

    let mut report = RecordingReport {
        source: path.display().to_string(),
        stem,
        sampling_freq: args.sampling_freq,
        time_range: (args.start, 0.0),
        output: None,
        artifacts: vec![],
        error: None,
    };

    let result = Recording::load(path, args.sampling_freq).and_then(|recording| {
        let end = args.end.unwrap_or_else(|| recording.duration());
        report.time_range = (args.start, end);
        analyzer.run(&recording, args.channels, (args.start, end))
    });

    match result {
        Ok(output) => {
            if !args.no_images {
                match render::write_artifacts(&args.report_dir, &report.stem, &output, colormap) {
                    Ok(written) => {
                        report.artifacts = written
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect();
                    }
                    Err(e) => {
                        report.error = Some(e.to_string());
                        return report;
                    }
                }
            }
            report.output = Some(output);
        }
        Err(e) => report.error = Some(e.to_string()),
    }

    report
}
