//! Periodicity estimation modules
//!
//! Turn a per-hop onset stream into a per-delay periodicity curve using:
//! - A fixed-capacity delay line over hops
//! - A comb filterbank accumulator
//! - Moving-average smoothing over delays

pub mod comb_filter;
pub mod delay_line;
pub mod smoothing;

/// Strongest delay of a periodicity curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantDelay {
    /// Delay in hops
    pub delay: usize,

    /// Curve value at that delay
    pub value: f32,
}

/// Find the largest value of `curve`, ignoring the first `skip` delays
///
/// Returns `None` when nothing beyond `skip` is positive. On ties the
/// shortest delay wins.
pub fn dominant_delay(curve: &[f32], skip: usize) -> Option<DominantDelay> {
    let mut best: Option<DominantDelay> = None;
    for (delay, &value) in curve.iter().enumerate().skip(skip) {
        if value.is_nan() || value <= 0.0 {
            continue;
        }
        match best {
            Some(b) if b.value >= value => {}
            _ => best = Some(DominantDelay { delay, value }),
        }
    }
    best
}

/// Weighted mean delay of `curve` over the `window` delays averaged at `delay`
///
/// Onset times land on whole hops, so a period that is not a whole number
/// of hops spreads over neighbouring delays. The mean recovers it with
/// sub-hop precision. Delays below `skip` are left out. Falls back to
/// `delay` when the window holds nothing positive.
pub fn refine_delay(curve: &[f32], delay: usize, window: usize, skip: usize) -> f32 {
    if window <= 1 {
        return delay as f32;
    }
    let start = delay.saturating_sub(window / 2).max(skip);
    let end = (delay.saturating_sub(window / 2) + window).min(curve.len());

    let (mut weight, mut moment) = (0.0f64, 0.0f64);
    for (d, &value) in curve.iter().enumerate().take(end).skip(start) {
        if value > 0.0 {
            weight += value as f64;
            moment += value as f64 * d as f64;
        }
    }
    if weight <= 0.0 {
        return delay as f32;
    }
    (moment / weight) as f32
}
