//! Energy flux novelty function
//!
//! Measures how much the RMS energy of the analysis frame rose since the
//! previous hop.
//!
//! Algorithm:
//! 1. Compute the RMS energy of the frame
//! 2. Optionally log-compress it: `ln(1 + lambda * rms)`
//! 3. Flux: `max(0, E[n] - E[n-1])`
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use super::NoveltyFunction;

/// Streaming energy flux over consecutive frames
#[derive(Debug, Clone)]
pub struct EnergyFlux {
    compression: f32,
    previous: f32,
}

impl EnergyFlux {
    /// Create an energy flux function; `compression` 0 disables log compression
    pub fn new(compression: f32) -> Self {
        Self {
            compression,
            previous: 0.0,
        }
    }

    fn energy(&self, frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = frame.iter().map(|&x| x * x).sum();
        let rms = (sum_sq / frame.len() as f32).sqrt();
        if self.compression > 0.0 {
            (1.0 + self.compression * rms).ln()
        } else {
            rms
        }
    }
}

impl NoveltyFunction for EnergyFlux {
    fn process(&mut self, frame: &[f32]) -> f32 {
        let energy = self.energy(frame);
        let flux = (energy - self.previous).max(0.0);
        self.previous = energy;
        flux
    }

    fn reset(&mut self) {
        self.previous = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_produces_single_rise() {
        let mut flux = EnergyFlux::new(0.0);
        assert_eq!(flux.process(&[0.0; 64]), 0.0);
        let rise = flux.process(&[0.5; 64]);
        assert!((rise - 0.5).abs() < 1e-6, "RMS step of 0.5 expected, got {}", rise);
        assert_eq!(flux.process(&[0.5; 64]), 0.0, "steady level has no flux");
        assert_eq!(flux.process(&[0.0; 64]), 0.0, "decay is clipped to zero");
    }

    #[test]
    fn test_compression_applies_log() {
        let mut plain = EnergyFlux::new(0.0);
        let mut compressed = EnergyFlux::new(10.0);
        let loud = [0.9f32; 32];
        let a = plain.process(&loud);
        let b = compressed.process(&loud);
        assert!(b > 0.0);
        assert!((b - (1.0f32 + 9.0).ln()).abs() < 1e-4);
        assert!(a < b);
    }

    #[test]
    fn test_reset_forgets_previous_frame() {
        let mut flux = EnergyFlux::new(0.0);
        flux.process(&[0.5; 16]);
        flux.reset();
        assert!(flux.process(&[0.5; 16]) > 0.0);
    }
}
