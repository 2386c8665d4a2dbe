//! # Rhythm Coach
//!
//! Measures how two performances line up rhythmically: how often their
//! onsets fall inside a tolerance band of each other, and which recurring
//! delay (tempo-like period) each stream's onsets carry.
//!
//! ## Features
//!
//! - **Onset Detection**: Streaming energy flux, spectral flux or HFC with
//!   adaptive peak picking, silence gate and minimum inter-onset interval
//! - **Periodicity**: Comb filterbank over a fixed three-second delay line
//! - **Correlation**: Lockstep comparison of two streams with a windowed
//!   match count and per-match records
//! - **Visualization**: Downsampled periodicity history rendered to PNG
//!
//! ## Quick Start
//!
//! ```no_run
//! use rhythm_coach::{analyze_files, AnalysisConfig};
//!
//! let report = analyze_files("drummer.wav", "click.wav", &AnalysisConfig::default())?;
//! for record in &report.records {
//!     println!("{}", record);
//! }
//! println!("{}", report.summary_line());
//! # Ok::<(), rhythm_coach::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio → Decode → Onset Detection → Channel Tracker (comb filterbank) ┐
//! Audio → Decode → Onset Detection → Channel Tracker (comb filterbank) ┴→ Correlator → Report
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod tracking;

use std::path::Path;
use std::time::Instant;

// Re-export main types
pub use analysis::metadata::AnalysisMetadata;
pub use analysis::result::{ChannelSummary, CorrelationRecord, CorrelationReport};
pub use config::{AnalysisConfig, ChannelConfig, CorrelationWindow, DetectorSettings, OnsetMethod};
pub use error::AnalysisError;
pub use tracking::{
    ChannelTracker, DetectedOnsetSource, DualStreamCorrelator, OnsetSource, OnsetTrack,
    PeriodicityImage,
};

use io::decoder::decode_audio;
use io::image::{ImageEncoder, PngImageEncoder};

/// Correlate two onset sources and write any configured images
///
/// Runs until the shorter source ends. Channels whose [`ChannelConfig`]
/// carries an image path get their periodicity history written as PNG.
///
/// # Errors
///
/// `ConfigurationError` for invalid settings or mismatched sources,
/// `RenderError`/`IoError` if an image cannot be written.
///
/// # Example
///
/// ```
/// use rhythm_coach::{correlate_sources, AnalysisConfig, OnsetTrack};
///
/// let a = OnsetTrack::from_events(vec![(10, 100.0)], 100, 48_000, 256);
/// let b = OnsetTrack::from_events(vec![(10, 120.0)], 100, 48_000, 256);
/// let report = correlate_sources(a, b, &AnalysisConfig::default())?;
/// assert_eq!(report.windowed, 1);
/// assert_eq!(report.records[1].diff_ms, 20.0);
/// # Ok::<(), rhythm_coach::AnalysisError>(())
/// ```
pub fn correlate_sources<A, B>(
    first: A,
    second: B,
    config: &AnalysisConfig,
) -> Result<CorrelationReport, AnalysisError>
where
    A: OnsetSource,
    B: OnsetSource,
{
    let mut correlator: DualStreamCorrelator<A, B> =
        DualStreamCorrelator::from_config(first, second, config)?;
    let report = correlator.run()?;

    let images = correlator.render_histories();
    for (channel, image) in config.channels.iter().zip(&images) {
        if let Some(path) = &channel.image_path {
            PngImageEncoder.encode(image, path)?;
        }
    }

    Ok(report)
}

/// Decode two audio files, detect their onsets and correlate them
///
/// Both files are decoded in parallel.
///
/// # Errors
///
/// `IoError`/`DecodingError` if either file cannot be read, plus everything
/// [`correlate_sources`] reports.
pub fn analyze_files(
    first: impl AsRef<Path>,
    second: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<CorrelationReport, AnalysisError> {
    let start_time = Instant::now();
    let (first, second) = (first.as_ref(), second.as_ref());
    config.validate()?;

    let (decoded_a, decoded_b) = rayon::join(|| decode_audio(first), || decode_audio(second));
    let (decoded_a, decoded_b) = (decoded_a?, decoded_b?);
    log::info!(
        "Decoded {} ({:.2} s) and {} ({:.2} s)",
        first.display(),
        decoded_a.duration_seconds(),
        second.display(),
        decoded_b.duration_seconds()
    );

    let [settings_a, settings_b] = &config.channels;
    let source_a = DetectedOnsetSource::from_decoded(decoded_a, &settings_a.detector)?;
    let source_b = DetectedOnsetSource::from_decoded(decoded_b, &settings_b.detector)?;

    let mut report = correlate_sources(source_a, source_b, config)?;
    report.metadata.onset_methods = config
        .channels
        .iter()
        .map(|c| c.detector.method.to_string())
        .collect();
    report.metadata.processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    log::debug!(
        "Analysis completed in {:.2} ms",
        report.metadata.processing_time_ms
    );
    Ok(report)
}
