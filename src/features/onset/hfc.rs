//! High-frequency content (HFC) novelty function
//!
//! Weights each magnitude bin by its index, emphasizing the broadband
//! high-frequency energy of percussive attacks: `hfc = sum_k k * |X[k]|`.
//!
//! # Reference
//!
//! Masri, P. (1996). Computer Modelling of Sound for Transformation and
//! Synthesis of Musical Signals. PhD thesis, University of Bristol.

use super::spectrum::MagnitudeSpectrum;
use super::NoveltyFunction;

/// Streaming high-frequency content
#[derive(Debug)]
pub struct HighFrequencyContent {
    spectrum: MagnitudeSpectrum,
}

impl HighFrequencyContent {
    /// Create an HFC function over frames of `frame_size` samples
    pub fn new(frame_size: usize, compression: f32) -> Self {
        Self {
            spectrum: MagnitudeSpectrum::new(frame_size, compression),
        }
    }
}

impl NoveltyFunction for HighFrequencyContent {
    fn process(&mut self, frame: &[f32]) -> f32 {
        self.spectrum
            .compute(frame)
            .iter()
            .enumerate()
            .map(|(k, &mag)| k as f32 * mag)
            .sum()
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq_bin: f32, size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| (2.0 * std::f32::consts::PI * freq_bin * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn test_high_tones_score_higher() {
        let mut hfc = HighFrequencyContent::new(512, 0.0);
        let low = hfc.process(&tone(8.0, 512));
        let high = hfc.process(&tone(120.0, 512));
        assert!(high > low * 5.0, "HFC should favour high bins: low={} high={}", low, high);
    }

    #[test]
    fn test_silence_scores_zero() {
        let mut hfc = HighFrequencyContent::new(512, 0.0);
        assert_eq!(hfc.process(&[0.0; 512]), 0.0);
    }
}
