//! Adaptive peak picking for novelty curves
//!
//! A novelty value is an onset when it is a local maximum and rises above a
//! threshold that follows the recent level of the curve:
//!
//! `threshold = median(recent) + weight * mean(recent)`
//!
//! The median keeps the threshold robust to isolated spikes, the mean term
//! lifts it during dense passages.
//!
//! # Reference
//!
//! Brossier, P. (2006). Automatic Annotation of Musical Audio for
//! Interactive Applications. PhD thesis, Queen Mary University of London.

use std::collections::VecDeque;

/// Number of novelty values the adaptive threshold looks at
pub const DEFAULT_THRESHOLD_SPAN: usize = 8;

const EPSILON: f32 = 1e-10;

/// Median of `values`, 0 for an empty slice
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.len().is_multiple_of(2) {
        (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) * 0.5
    } else {
        sorted[sorted.len() / 2]
    }
}

/// `median(values) + weight * mean(values)`, 0 for an empty slice
pub fn adaptive_threshold(values: &[f32], weight: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    median(values) + weight * mean
}

/// Causal peak picker with one value of look-ahead
///
/// Each [`PeakPicker::push`] decides whether the value pushed on the
/// previous call was a peak, so detections lag the novelty curve by one hop.
#[derive(Debug, Clone)]
pub struct PeakPicker {
    weight: f32,
    span: usize,
    recent: VecDeque<f32>,
    /// Value awaiting its right-hand neighbour
    candidate: Option<f32>,
    /// Value before the candidate
    before: f32,
}

impl PeakPicker {
    /// Create a picker with threshold weight `weight` over `span` values
    pub fn new(weight: f32, span: usize) -> Self {
        let span = span.max(1);
        Self {
            weight,
            span,
            recent: VecDeque::with_capacity(span),
            candidate: None,
            before: 0.0,
        }
    }

    /// Feed the next novelty value
    ///
    /// Returns true if the previous value was a peak above the adaptive
    /// threshold.
    pub fn push(&mut self, value: f32) -> bool {
        let Some(candidate) = self.candidate.replace(value) else {
            return false;
        };

        if self.recent.len() == self.span {
            self.recent.pop_front();
        }
        self.recent.push_back(candidate);

        let is_local_max = candidate > self.before && candidate >= value;
        self.before = candidate;
        if !is_local_max || candidate <= EPSILON {
            return false;
        }

        let window: Vec<f32> = self.recent.iter().copied().collect();
        candidate > adaptive_threshold(&window, self.weight)
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.recent.clear();
        self.candidate = None;
        self.before = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_adaptive_threshold_robust_to_outlier() {
        let values = [1.0, 1.0, 1.0, 1.0, 100.0];
        let threshold = adaptive_threshold(&values, 0.3);
        // median 1 + 0.3 * mean 20.8
        assert!((threshold - 7.24).abs() < 1e-4);
        assert!(threshold < 100.0);
    }

    #[test]
    fn test_isolated_spike_is_picked_one_hop_late() {
        let mut picker = PeakPicker::new(0.3, DEFAULT_THRESHOLD_SPAN);
        let curve = [0.0, 0.0, 5.0, 1.0, 0.0, 0.0];
        let picks: Vec<bool> = curve.iter().map(|&v| picker.push(v)).collect();
        assert_eq!(picks, vec![false, false, false, true, false, false]);
    }

    #[test]
    fn test_plateau_and_ramps() {
        let mut picker = PeakPicker::new(0.3, DEFAULT_THRESHOLD_SPAN);
        // Rising ramp peaks once at its top
        let curve = [0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0];
        let count = curve.iter().filter(|&&v| picker.push(v)).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_flat_curve_never_peaks() {
        let mut picker = PeakPicker::new(0.3, DEFAULT_THRESHOLD_SPAN);
        assert!((0..32).all(|_| !picker.push(2.0)));
    }

    #[test]
    fn test_small_bump_under_threshold() {
        let mut picker = PeakPicker::new(0.3, 4);
        // Sustained level of 10 with a bump to 10.5: median 10 + 0.3 * ~10.1 > 10.5
        let curve = [10.0, 10.0, 10.0, 10.5, 10.0, 10.0];
        assert!(curve.iter().all(|&v| !picker.push(v)));
    }
}
