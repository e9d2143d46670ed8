//! CSV sensor recordings
//!
//! A [`Recording`] is the immutable sample table every analysis starts from:
//! one row per sampling instant, one column per sensor channel, plus the
//! sampling frequency the caller supplies (the CSV itself carries no timing
//! information).
//!
//! # Table format
//!
//! ```text
//! accel_x,accel_y,accel_z,temp      <- optional header row
//! 0.012,-0.003,0.981,24.1
//! 0.014,-0.001,0.979,24.1
//! ...
//! ```
//!
//! The first row is sniffed: if every field parses as a number it is treated
//! as data and channels get positional names (`ch1`..`chN`); otherwise it
//! supplies the channel names. All rows must have the same number of fields.
//!
//! # Time windows
//!
//! Analyses run on a contiguous row window derived from a `[start, end]`
//! window in seconds: `row_start = floor(start / dt)` and
//! `row_count = floor((end - start) / dt)` with `dt = 1/sampling_freq`.
//! The window must cover at least one row; [`Recording::row_range`] rejects
//! empty windows rather than clamping, so a truncated request can never
//! silently produce a misleading spectrum.

use crate::error::Error;
use std::path::Path;

/// An immutable multi-channel sample table with a sampling frequency.
#[derive(Debug, Clone)]
pub struct Recording {
    channel_names: Vec<String>,
    /// Row-major samples; every row has `channel_names.len()` entries.
    rows: Vec<Vec<f64>>,
    sampling_freq: f64,
}

impl Recording {
    /// Load a recording from a delimited text table.
    ///
    /// Fails with [`Error::Parse`] if the file is missing, malformed, ragged,
    /// or contains no data rows, and with [`Error::Validation`] if
    /// `sampling_freq` is not positive.
    pub fn load<P: AsRef<Path>>(path: P, sampling_freq: f64) -> Result<Recording, Error> {
        let path = path.as_ref();

        if !(sampling_freq > 0.0) {
            return Err(Error::Validation(format!(
                "sampling frequency must be positive, got {}",
                sampling_freq
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(|e| Error::parse(path, e.to_string()))?;

        let mut channel_names: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();

        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::parse(path, e.to_string()))?;

            // Skip blank lines (a record with a single empty field).
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }

            if channel_names.is_empty() && rows.is_empty() {
                // First real row: header iff any field is non-numeric.
                if record.iter().any(|f| f.parse::<f64>().is_err()) {
                    channel_names = record.iter().map(|f| f.to_string()).collect();
                    continue;
                }
                channel_names = (1..=record.len()).map(|i| format!("ch{}", i)).collect();
            }

            if record.len() != channel_names.len() {
                return Err(Error::parse(
                    path,
                    format!(
                        "row {} has {} fields, expected {}",
                        line + 1,
                        record.len(),
                        channel_names.len()
                    ),
                ));
            }

            let mut row = Vec::with_capacity(record.len());
            for (col, field) in record.iter().enumerate() {
                let value: f64 = field.parse().map_err(|_| {
                    Error::parse(
                        path,
                        format!("row {}, column {}: not a number: {:?}", line + 1, col + 1, field),
                    )
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(Error::parse(path, "no data rows"));
        }

        Ok(Recording {
            channel_names,
            rows,
            sampling_freq,
        })
    }

    /// Build a recording from in-memory rows. Every row must have one sample
    /// per channel name; fails with [`Error::Validation`] otherwise.
    pub fn from_rows(
        channel_names: Vec<String>,
        rows: Vec<Vec<f64>>,
        sampling_freq: f64,
    ) -> Result<Recording, Error> {
        if !(sampling_freq > 0.0) {
            return Err(Error::Validation(format!(
                "sampling frequency must be positive, got {}",
                sampling_freq
            )));
        }
        if channel_names.is_empty() {
            return Err(Error::Validation("recording has no channels".to_string()));
        }
        if rows.is_empty() {
            return Err(Error::Validation("recording has no rows".to_string()));
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != channel_names.len())
        {
            return Err(Error::Validation(format!(
                "row {} has {} samples, expected {}",
                i + 1,
                row.len(),
                channel_names.len()
            )));
        }

        Ok(Recording {
            channel_names,
            rows,
            sampling_freq,
        })
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn sampling_freq(&self) -> f64 {
        self.sampling_freq
    }

    /// Sampling period in seconds (`1 / sampling_freq`).
    pub fn sampling_period(&self) -> f64 {
        1.0 / self.sampling_freq
    }

    /// Total duration in seconds (`row_count * sampling_period`).
    pub fn duration(&self) -> f64 {
        self.rows.len() as f64 * self.sampling_period()
    }

    /// Copy one channel's samples out as an independently owned buffer.
    ///
    /// Callers must keep `index < channel_count()`; the pipeline validates
    /// the channel count before it ever gets here.
    pub fn channel(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Map a `[t_start, t_end]` window in seconds to `(row_start, row_count)`.
    ///
    /// `t_end <= t_start` and negative `t_start` are rejected before any row
    /// math; a window spanning less than one sampling period is rejected as
    /// well. Both are [`Error::Range`].
    pub fn row_range(&self, t_start: f64, t_end: f64) -> Result<(usize, usize), Error> {
        if t_end <= t_start {
            return Err(Error::Range(format!(
                "window end {} must be after start {}",
                t_end, t_start
            )));
        }
        if t_start < 0.0 {
            return Err(Error::Range(format!(
                "window start {} is before the recording",
                t_start
            )));
        }

        // t / dt written as t * fs: dividing by the rounded 1/fs loses a
        // few ulps and can floor an exact boundary like 0.5 s @ 1 kHz into
        // the previous row.
        let row_start = (t_start * self.sampling_freq).floor() as usize;
        let row_count = ((t_end - t_start) * self.sampling_freq).floor() as usize;

        if row_count < 1 {
            return Err(Error::Range(format!(
                "window [{}, {}] spans less than one sample at {} Hz",
                t_start, t_end, self.sampling_freq
            )));
        }

        Ok((row_start, row_count))
    }

    /// Extract a contiguous row window as a new recording.
    ///
    /// Rejects empty windows and windows that run past the end of the table
    /// instead of clamping them.
    pub fn extract_subrange(&self, start_row: usize, row_count: usize) -> Result<Recording, Error> {
        if row_count == 0 {
            return Err(Error::Range("requested row window is empty".to_string()));
        }
        let end = start_row
            .checked_add(row_count)
            .filter(|&end| end <= self.rows.len())
            .ok_or_else(|| {
                Error::Range(format!(
                    "rows {}..{} exceed the {} rows available",
                    start_row,
                    start_row as u128 + row_count as u128,
                    self.rows.len()
                ))
            })?;

        Ok(Recording {
            channel_names: self.channel_names.clone(),
            rows: self.rows[start_row..end].to_vec(),
            sampling_freq: self.sampling_freq,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write csv");
        file
    }

    fn two_channel_recording(rows: usize, fs: f64) -> Recording {
        Recording::from_rows(
            vec!["a".to_string(), "b".to_string()],
            (0..rows).map(|i| vec![i as f64, -(i as f64)]).collect(),
            fs,
        )
        .expect("valid recording")
    }

    // ==========================================================================
    // CSV LOADING TESTS
    // ==========================================================================
    //
    // The loader accepts two shapes: a table with a header row naming the
    // channels, and a bare numeric table where channels are named
    // positionally (ch1..chN). Everything else is a ParseError.
    // ==========================================================================

    #[test]
    fn test_load_with_header() {
        let file = write_csv("x,y\n1.0,2.0\n3.0,4.0\n");
        let rec = Recording::load(file.path(), 100.0).unwrap();

        assert_eq!(rec.channel_names(), &["x".to_string(), "y".to_string()]);
        assert_eq!(rec.row_count(), 2);
        assert_eq!(rec.channel(0), vec![1.0, 3.0]);
        assert_eq!(rec.channel(1), vec![2.0, 4.0]);
    }

    #[test]
    fn test_load_without_header_names_positionally() {
        let file = write_csv("1.0,2.0,3.0\n4.0,5.0,6.0\n");
        let rec = Recording::load(file.path(), 100.0).unwrap();

        assert_eq!(
            rec.channel_names(),
            &["ch1".to_string(), "ch2".to_string(), "ch3".to_string()]
        );
        // The numeric first row is data, not a header.
        assert_eq!(rec.row_count(), 2);
        assert_eq!(rec.channel(0), vec![1.0, 4.0]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Recording::load("/nonexistent/readings.csv", 100.0).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_load_header_only_is_empty() {
        let file = write_csv("x,y\n");
        let err = Recording::load(file.path(), 100.0).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_load_non_numeric_cell() {
        let file = write_csv("x,y\n1.0,2.0\n3.0,oops\n");
        let err = Recording::load(file.path(), 100.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 3"), "got: {}", msg);
        assert!(msg.contains("oops"), "got: {}", msg);
    }

    #[test]
    fn test_load_ragged_row() {
        let file = write_csv("x,y\n1.0,2.0\n3.0\n");
        let err = Recording::load(file.path(), 100.0).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let file = write_csv("x,y\n1.0,2.0\n\n3.0,4.0\n");
        let rec = Recording::load(file.path(), 100.0).unwrap();
        assert_eq!(rec.row_count(), 2);
    }

    #[test]
    fn test_load_rejects_zero_sampling_freq() {
        let file = write_csv("1.0,2.0\n");
        let err = Recording::load(file.path(), 0.0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    // ==========================================================================
    // CONSTRUCTOR INVARIANT TESTS
    // ==========================================================================

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let err = Recording::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 2.0], vec![3.0]],
            100.0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_from_rows_rejects_empty() {
        let err =
            Recording::from_rows(vec!["a".to_string()], vec![], 100.0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_duration_and_period() {
        let rec = two_channel_recording(500, 1000.0);
        assert!((rec.sampling_period() - 0.001).abs() < 1e-12);
        assert!((rec.duration() - 0.5).abs() < 1e-12);
    }

    // ==========================================================================
    // TIME WINDOW -> ROW WINDOW TESTS
    // ==========================================================================
    //
    // row_start = floor(t_start / dt), row_count = floor((t_end - t_start) / dt).
    // The window must cover at least one full sampling period.
    // ==========================================================================

    #[test]
    fn test_row_range_full_window() {
        let rec = two_channel_recording(500, 1000.0);
        assert_eq!(rec.row_range(0.0, 0.5).unwrap(), (0, 500));
    }

    #[test]
    fn test_row_range_interior_window() {
        let rec = two_channel_recording(1000, 1000.0);
        assert_eq!(rec.row_range(0.125, 0.375).unwrap(), (125, 250));
    }

    #[test]
    fn test_row_range_rejects_reversed_window() {
        let rec = two_channel_recording(100, 100.0);
        assert!(matches!(rec.row_range(0.5, 0.5), Err(Error::Range(_))));
        assert!(matches!(rec.row_range(0.5, 0.2), Err(Error::Range(_))));
    }

    #[test]
    fn test_row_range_rejects_negative_start() {
        let rec = two_channel_recording(100, 100.0);
        assert!(matches!(rec.row_range(-0.1, 0.5), Err(Error::Range(_))));
    }

    #[test]
    fn test_row_range_rejects_sub_sample_window() {
        // A 0.4 ms window at 1 kHz covers zero full rows.
        let rec = two_channel_recording(100, 1000.0);
        assert!(matches!(rec.row_range(0.0, 0.0004), Err(Error::Range(_))));
    }

    // ==========================================================================
    // SUB-RANGE EXTRACTION TESTS
    // ==========================================================================

    #[test]
    fn test_extract_subrange() {
        let rec = two_channel_recording(10, 100.0);
        let sub = rec.extract_subrange(2, 5).unwrap();

        assert_eq!(sub.row_count(), 5);
        assert_eq!(sub.channel(0), vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(sub.channel_names(), rec.channel_names());
        assert_eq!(sub.sampling_freq(), rec.sampling_freq());
    }

    #[test]
    fn test_extract_subrange_rejects_empty() {
        let rec = two_channel_recording(10, 100.0);
        assert!(matches!(rec.extract_subrange(0, 0), Err(Error::Range(_))));
    }

    #[test]
    fn test_extract_subrange_rejects_overrun() {
        // No silent clamping: 5 rows starting at 8 of 10 is an error.
        let rec = two_channel_recording(10, 100.0);
        assert!(matches!(rec.extract_subrange(8, 5), Err(Error::Range(_))));
        assert!(matches!(
            rec.extract_subrange(10, 1),
            Err(Error::Range(_))
        ));
    }

    #[test]
    fn test_extract_subrange_full_table() {
        let rec = two_channel_recording(10, 100.0);
        let sub = rec.extract_subrange(0, 10).unwrap();
        assert_eq!(sub.row_count(), 10);
    }

    #[test]
    fn test_channel_copies_are_independent() {
        let rec = two_channel_recording(4, 100.0);
        let mut a = rec.channel(0);
        a[0] = 99.0;
        // The recording itself is untouched.
        assert_eq!(rec.channel(0)[0], 0.0);
    }
}
