//! Hop-aligned analysis framing over a sample buffer

/// Splits mono samples into overlapping analysis frames, one per hop
///
/// Frame `h` holds the `window_size` samples ending at `(h + 1) * hop_size`.
/// Frames reaching before the start of the buffer are zero-padded on the
/// left. A trailing partial hop is not emitted.
#[derive(Debug, Clone)]
pub struct HopFramer {
    samples: Vec<f32>,
    hop_size: usize,
    frame: Vec<f32>,
    hop: usize,
}

impl HopFramer {
    /// Create a framer; `hop_size` and `window_size` are clamped to at least 1
    pub fn new(samples: Vec<f32>, hop_size: usize, window_size: usize) -> Self {
        let hop_size = hop_size.max(1);
        let window_size = window_size.max(hop_size);
        Self {
            samples,
            hop_size,
            frame: vec![0.0; window_size],
            hop: 0,
        }
    }

    /// Number of complete hops in the buffer
    pub fn total_hops(&self) -> usize {
        self.samples.len() / self.hop_size
    }

    /// Next analysis frame, or `None` once every complete hop is consumed
    pub fn next_frame(&mut self) -> Option<&[f32]> {
        let end = (self.hop + 1) * self.hop_size;
        if end > self.samples.len() {
            return None;
        }
        self.hop += 1;

        let window = self.frame.len();
        let begin = end.saturating_sub(window);
        let pad = window - (end - begin);
        self.frame[..pad].fill(0.0);
        self.frame[pad..].copy_from_slice(&self.samples[begin..end]);
        Some(&self.frame)
    }
}
