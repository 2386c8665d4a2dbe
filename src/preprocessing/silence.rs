//! Silence gate for analysis frames

/// Level reported for an all-zero frame
pub const SILENT_LEVEL_DB: f32 = -200.0;

/// RMS level of a frame in dBFS
///
/// Returns [`SILENT_LEVEL_DB`] for empty or all-zero frames instead of
/// negative infinity.
pub fn frame_level_db(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return SILENT_LEVEL_DB;
    }
    let mean_square = frame.iter().map(|&x| x * x).sum::<f32>() / frame.len() as f32;
    if mean_square <= 0.0 {
        return SILENT_LEVEL_DB;
    }
    (10.0 * mean_square.log10()).max(SILENT_LEVEL_DB)
}

/// True when the frame level is below `threshold_db`
pub fn is_silent(frame: &[f32], threshold_db: f32) -> bool {
    frame_level_db(frame) < threshold_db
}
