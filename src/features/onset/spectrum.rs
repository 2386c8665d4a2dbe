//! Windowed magnitude spectrum shared by the spectral novelty functions

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Hann-windowed FFT magnitudes of fixed-length frames
pub struct MagnitudeSpectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    compression: f32,
}

impl std::fmt::Debug for MagnitudeSpectrum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagnitudeSpectrum")
            .field("frame_size", &self.window.len())
            .field("compression", &self.compression)
            .finish()
    }
}

impl MagnitudeSpectrum {
    /// Plan an FFT of `frame_size` points
    ///
    /// `compression` > 0 applies `ln(1 + lambda * |X|)` to every magnitude.
    pub fn new(frame_size: usize, compression: f32) -> Self {
        let frame_size = frame_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        let window = (0..frame_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (frame_size as f32 - 1.0)).cos())
            })
            .collect();

        Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); frame_size],
            magnitudes: vec![0.0; frame_size / 2 + 1],
            compression,
        }
    }

    /// Number of magnitude bins (`frame_size / 2 + 1`)
    pub fn bins(&self) -> usize {
        self.magnitudes.len()
    }

    /// Magnitudes of `frame`; shorter frames are zero-padded, longer ones truncated
    pub fn compute(&mut self, frame: &[f32]) -> &[f32] {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = frame.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        for (mag, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            let norm = bin.norm();
            *mag = if self.compression > 0.0 {
                (1.0 + self.compression * norm).ln()
            } else {
                norm
            };
        }
        &self.magnitudes
    }
}
