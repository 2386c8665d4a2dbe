//! Moving-average smoothing of periodicity curves
//!
//! Box-averages a per-delay curve over `window` consecutive delays. Positions
//! where a full window does not fit (the first and last `window / 2`
//! entries) are set to zero instead of being averaged over a partial
//! window, so the visualization never shows edge artifacts.
//!
//! A window of 0 or 1 copies the input through unchanged.

use crate::error::AnalysisError;

/// Smooth `raw` into a new vector
///
/// # Errors
///
/// Returns `AnalysisError::ConfigurationError` if `window` is non-zero and
/// `window >= raw.len()`.
///
/// # Example
///
/// ```
/// use rhythm_coach::features::period::smoothing::smooth;
///
/// let raw = [0.0, 3.0, 0.0, 3.0, 0.0];
/// let smoothed = smooth(&raw, 3)?;
/// assert_eq!(smoothed, vec![0.0, 1.0, 2.0, 1.0, 0.0]);
/// # Ok::<(), rhythm_coach::AnalysisError>(())
/// ```
pub fn smooth(raw: &[f64], window: usize) -> Result<Vec<f32>, AnalysisError> {
    let mut output = vec![0.0f32; raw.len()];
    smooth_into(raw, window, 1.0, &mut output)?;
    Ok(output)
}

/// Smooth `raw` into `output`, multiplying every average by `scale`
///
/// Sums are taken over the raw values and scaled once at the end, so a
/// caller normalizing by a count passes `1 / count` here instead of
/// pre-dividing the input.
///
/// # Errors
///
/// `ConfigurationError` for a non-zero `window >= raw.len()` or mismatched
/// lengths.
pub fn smooth_into(
    raw: &[f64],
    window: usize,
    scale: f64,
    output: &mut [f32],
) -> Result<(), AnalysisError> {
    let n = raw.len();
    if output.len() != n {
        return Err(AnalysisError::ConfigurationError(format!(
            "Smoothing output length ({}) differs from input length ({})",
            output.len(),
            n
        )));
    }

    if window > 0 && window >= n {
        return Err(AnalysisError::ConfigurationError(format!(
            "Smoothing window ({}) must be smaller than the curve length ({})",
            window, n
        )));
    }

    if window <= 1 {
        for (out, &value) in output.iter_mut().zip(raw) {
            *out = (value * scale) as f32;
        }
        return Ok(());
    }

    let half = window / 2;
    let factor = scale / window as f64;

    // Running sum over raw[i - half .. i - half + window]
    let mut sum: f64 = raw[..window].iter().sum();
    for (i, out) in output.iter_mut().enumerate() {
        if i < half || i >= n - half {
            *out = 0.0;
            continue;
        }
        if i > half {
            sum += raw[i - half + window - 1] - raw[i - half - 1];
        }
        *out = (sum * factor) as f32;
    }

    Ok(())
}
