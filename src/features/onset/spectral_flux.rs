//! Spectral flux novelty function
//!
//! Sums the positive magnitude differences between the spectrum of the
//! current frame and the one before it:
//! `flux = sum_k max(0, |X_n[k]| - |X_{n-1}[k]|)`.

use super::spectrum::MagnitudeSpectrum;
use super::NoveltyFunction;

/// Streaming spectral flux
#[derive(Debug)]
pub struct SpectralFlux {
    spectrum: MagnitudeSpectrum,
    previous: Vec<f32>,
}

impl SpectralFlux {
    /// Create a spectral flux function over frames of `frame_size` samples
    pub fn new(frame_size: usize, compression: f32) -> Self {
        let spectrum = MagnitudeSpectrum::new(frame_size, compression);
        let previous = vec![0.0; spectrum.bins()];
        Self { spectrum, previous }
    }
}

impl NoveltyFunction for SpectralFlux {
    fn process(&mut self, frame: &[f32]) -> f32 {
        let magnitudes = self.spectrum.compute(frame);
        let mut flux = 0.0f32;
        for (prev, &mag) in self.previous.iter_mut().zip(magnitudes) {
            flux += (mag - *prev).max(0.0);
            *prev = mag;
        }
        flux
    }

    fn reset(&mut self) {
        self.previous.iter_mut().for_each(|m| *m = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise_burst(len: usize, seed: u32) -> Vec<f32> {
        // Deterministic LCG noise
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_flux_rises_on_attack_only() {
        let mut flux = SpectralFlux::new(256, 0.0);
        assert_eq!(flux.process(&[0.0; 256]), 0.0);
        let burst = noise_burst(256, 7);
        let attack = flux.process(&burst);
        assert!(attack > 1.0, "attack flux should be large, got {}", attack);
        let steady = flux.process(&burst);
        assert_eq!(steady, 0.0, "repeating the same frame adds nothing");
        assert_eq!(flux.process(&[0.0; 256]), 0.0, "release is not an onset");
    }
}
