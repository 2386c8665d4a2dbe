//! Streaming onset detection
//!
//! Frame-at-a-time onset detection for one input stream:
//! - Novelty functions: energy flux, spectral flux, high-frequency content
//! - Silence gate
//! - Adaptive-threshold peak picking
//! - Minimum inter-onset interval
//!
//! The detector is fed one analysis frame per hop and reports the hop index
//! of each onset it confirms. Peak picking needs one hop of look-ahead, so a
//! detection always refers to the hop before the one just processed.

pub mod energy_flux;
pub mod hfc;
pub mod spectral_flux;
pub mod spectrum;
pub mod threshold;

use crate::config::{DetectorSettings, OnsetMethod};
use crate::error::AnalysisError;
use crate::preprocessing::silence::is_silent;

use self::energy_flux::EnergyFlux;
use self::hfc::HighFrequencyContent;
use self::spectral_flux::SpectralFlux;
use self::threshold::{PeakPicker, DEFAULT_THRESHOLD_SPAN};

/// A per-frame onset strength measure
pub trait NoveltyFunction: Send {
    /// Novelty of `frame` relative to the frames before it
    fn process(&mut self, frame: &[f32]) -> f32;

    /// Forget the previous frames
    fn reset(&mut self);
}

/// Build the novelty function for `method`
pub fn novelty_function(
    method: OnsetMethod,
    frame_size: usize,
    compression: f32,
) -> Box<dyn NoveltyFunction> {
    match method {
        OnsetMethod::Energy => Box::new(EnergyFlux::new(compression)),
        OnsetMethod::SpectralFlux => Box::new(SpectralFlux::new(frame_size, compression)),
        OnsetMethod::Hfc => Box::new(HighFrequencyContent::new(frame_size, compression)),
    }
}

/// Onset detector for one stream of hop-aligned frames
pub struct OnsetDetector {
    novelty: Box<dyn NoveltyFunction>,
    picker: PeakPicker,
    silence_db: f32,
    min_ioi_hops: u64,
    hops: u64,
    last_onset: Option<u64>,
}

impl std::fmt::Debug for OnsetDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnsetDetector")
            .field("silence_db", &self.silence_db)
            .field("min_ioi_hops", &self.min_ioi_hops)
            .field("hops", &self.hops)
            .field("last_onset", &self.last_onset)
            .finish()
    }
}

impl OnsetDetector {
    /// Create a detector for a stream at `sample_rate`
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for invalid settings or a zero sample rate.
    pub fn new(settings: &DetectorSettings, sample_rate: u32) -> Result<Self, AnalysisError> {
        settings.validate()?;
        if sample_rate == 0 {
            return Err(AnalysisError::ConfigurationError(
                "Invalid sample rate: 0".to_string(),
            ));
        }

        let hop_ms = settings.hop_size as f32 * 1000.0 / sample_rate as f32;
        let min_ioi_hops = (settings.minioi_ms / hop_ms).ceil() as u64;

        log::debug!(
            "Onset detector: {} at {} Hz, min IOI {} hops",
            settings,
            sample_rate,
            min_ioi_hops
        );

        Ok(Self {
            novelty: novelty_function(settings.method, settings.window_size, settings.compression),
            picker: PeakPicker::new(settings.threshold, DEFAULT_THRESHOLD_SPAN),
            silence_db: settings.silence_db,
            min_ioi_hops,
            hops: 0,
            last_onset: None,
        })
    }

    /// Process the analysis frame ending at the current hop
    ///
    /// Returns the hop index of a newly confirmed onset, if any.
    pub fn process_hop(&mut self, frame: &[f32]) -> Option<u64> {
        let hop = self.hops;
        self.hops += 1;

        let novelty = self.novelty.process(frame);
        let value = if is_silent(frame, self.silence_db) {
            0.0
        } else {
            novelty
        };

        if !self.picker.push(value) {
            return None;
        }

        // The picker confirms the value pushed one hop earlier
        let onset = hop.checked_sub(1)?;
        if let Some(last) = self.last_onset {
            if onset - last < self.min_ioi_hops {
                return None;
            }
        }
        self.last_onset = Some(onset);
        Some(onset)
    }

    /// Number of frames processed
    pub fn hops_processed(&self) -> u64 {
        self.hops
    }

    /// Forget all state
    pub fn reset(&mut self) {
        self.novelty.reset();
        self.picker.reset();
        self.hops = 0;
        self.last_onset = None;
    }
}
