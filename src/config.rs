//! Configuration parameters for rhythm correlation

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Longest lag tracked by the comb filterbank, in hops
///
/// Three seconds of 256-sample hops at 48 kHz.
pub const MAX_DELAY_HOPS: usize = 48_000 / 256 * 3;

/// Number of columns in the periodicity history image
pub const DEFAULT_IMAGE_WIDTH: usize = 1024;

/// Delay rows blanked before a history column is contrast-stretched
///
/// Lags this short are dominated by each onset correlating with itself.
pub const DEFAULT_SUPPRESSED_ROWS: usize = 20;

/// 21.3 ms = 4 hops of 256 samples at 48 kHz
pub const DEFAULT_MIN_IOI_MS: f32 = 21.3;

/// Novelty function used by the onset detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnsetMethod {
    /// Positive difference of frame RMS energy
    Energy,
    /// Sum of positive magnitude differences between consecutive spectra
    SpectralFlux,
    /// Bin-index weighted spectral energy
    #[default]
    Hfc,
}

impl FromStr for OnsetMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "hfc" => Ok(OnsetMethod::Hfc),
            "energy" => Ok(OnsetMethod::Energy),
            "specflux" | "spectral_flux" => Ok(OnsetMethod::SpectralFlux),
            other => Err(AnalysisError::ConfigurationError(format!(
                "Unknown onset method '{}' (expected default|hfc|energy|specflux)",
                other
            ))),
        }
    }
}

impl fmt::Display for OnsetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OnsetMethod::Energy => "energy",
            OnsetMethod::SpectralFlux => "specflux",
            OnsetMethod::Hfc => "hfc",
        };
        f.write_str(name)
    }
}

/// Onset detector parameters for one input stream
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Hop size in samples (default: 256)
    pub hop_size: usize,

    /// Analysis window in samples (default: 1024)
    /// Must be at least one hop long
    pub window_size: usize,

    /// Minimum inter-onset interval in milliseconds (default: 21.3)
    pub minioi_ms: f32,

    /// Silence gate in dBFS (default: -90.0)
    /// Frames quieter than this never produce an onset
    pub silence_db: f32,

    /// Peak-picking threshold (default: 0.3)
    /// Weight of the local mean added to the local median
    pub threshold: f32,

    /// Log compression lambda (default: 0.0 = off)
    pub compression: f32,

    /// Novelty function (default: HFC)
    pub method: OnsetMethod,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            hop_size: 256,
            window_size: 1024,
            minioi_ms: DEFAULT_MIN_IOI_MS,
            silence_db: -90.0,
            threshold: 0.3,
            compression: 0.0,
            method: OnsetMethod::default(),
        }
    }
}

impl DetectorSettings {
    /// Check the settings for values the detector cannot work with
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.hop_size == 0 {
            return Err(AnalysisError::ConfigurationError(
                "Hop size must be > 0".to_string(),
            ));
        }
        if self.window_size < self.hop_size {
            return Err(AnalysisError::ConfigurationError(format!(
                "Window size ({}) must be at least the hop size ({})",
                self.window_size, self.hop_size
            )));
        }
        if !self.minioi_ms.is_finite() || self.minioi_ms < 0.0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "Invalid minimum inter-onset interval: {} ms",
                self.minioi_ms
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "Invalid detection threshold: {}",
                self.threshold
            )));
        }
        if !self.compression.is_finite() || self.compression < 0.0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "Invalid compression lambda: {}",
                self.compression
            )));
        }
        if !self.silence_db.is_finite() {
            return Err(AnalysisError::ConfigurationError(format!(
                "Invalid silence threshold: {} dB",
                self.silence_db
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DetectorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hop={} window={} minioi={}ms silence={}dB threshold={} compression={} method={}",
            self.hop_size,
            self.window_size,
            self.minioi_ms,
            self.silence_db,
            self.threshold,
            self.compression,
            self.method
        )
    }
}

/// Per-stream configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Onset detector settings
    pub detector: DetectorSettings,

    /// Moving-average width over delays for the history snapshots (default: 11)
    pub smoothing_window: usize,

    /// Where to write the periodicity image, if anywhere
    pub image_path: Option<PathBuf>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            detector: DetectorSettings::default(),
            smoothing_window: 11,
            image_path: None,
        }
    }
}

impl ChannelConfig {
    /// Check detector settings and smoothing width against a delay capacity
    pub fn validate(&self, capacity: usize) -> Result<(), AnalysisError> {
        self.detector.validate()?;
        validate_smoothing_window(self.smoothing_window, capacity)
    }
}

/// Check that a smoothing window fits inside a delay line of `capacity` hops
pub fn validate_smoothing_window(window: usize, capacity: usize) -> Result<(), AnalysisError> {
    if window >= capacity {
        return Err(AnalysisError::ConfigurationError(format!(
            "Smoothing window ({}) must be smaller than the delay capacity ({})",
            window, capacity
        )));
    }
    Ok(())
}

/// Tolerance band for treating two onsets as one synchronized event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationWindow {
    /// Differences at or below this are the same event with jitter (default: 10 ms)
    pub min_ms: f32,

    /// Differences at or above this are unrelated (default: 40 ms)
    pub max_ms: f32,
}

impl Default for CorrelationWindow {
    fn default() -> Self {
        Self {
            min_ms: 10.0,
            max_ms: 40.0,
        }
    }
}

impl CorrelationWindow {
    /// Create a window, rejecting empty or non-finite bands
    pub fn new(min_ms: f32, max_ms: f32) -> Result<Self, AnalysisError> {
        let window = Self { min_ms, max_ms };
        window.validate()?;
        Ok(window)
    }

    /// Check the band bounds
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.min_ms.is_finite() || !self.max_ms.is_finite() || self.min_ms < 0.0 {
            return Err(AnalysisError::ConfigurationError(format!(
                "Invalid correlation window: ({}, {}) ms",
                self.min_ms, self.max_ms
            )));
        }
        if self.min_ms >= self.max_ms {
            return Err(AnalysisError::ConfigurationError(format!(
                "Correlation window minimum ({} ms) must be below its maximum ({} ms)",
                self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }

    /// Strict `min < |diff| < max` test
    pub fn contains(&self, diff_ms: f32) -> bool {
        let abs = diff_ms.abs();
        self.min_ms < abs && abs < self.max_ms
    }
}

/// Configuration for a full two-stream run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Settings for the first and second stream
    pub channels: [ChannelConfig; 2],

    /// Timing tolerance band for windowed matches
    pub window: CorrelationWindow,

    /// Columns in each periodicity history table (default: 1024)
    pub image_width: usize,

    /// Lowest delay rows blanked when rendering (default: 20)
    pub suppressed_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            channels: [ChannelConfig::default(), ChannelConfig::default()],
            window: CorrelationWindow::default(),
            image_width: DEFAULT_IMAGE_WIDTH,
            suppressed_rows: DEFAULT_SUPPRESSED_ROWS,
        }
    }
}

impl AnalysisConfig {
    /// Validate against the default delay capacity
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.validate_for_capacity(MAX_DELAY_HOPS)
    }

    /// Validate against an explicit delay capacity
    pub fn validate_for_capacity(&self, capacity: usize) -> Result<(), AnalysisError> {
        for channel in &self.channels {
            channel.validate(capacity)?;
        }
        self.window.validate()?;
        if self.image_width == 0 {
            return Err(AnalysisError::ConfigurationError(
                "Image width must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
