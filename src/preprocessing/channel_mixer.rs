//! Channel mixing (multichannel to mono conversion)

use crate::error::AnalysisError;

/// Average interleaved frames of `channels` samples down to mono
///
/// A trailing partial frame is dropped.
///
/// # Errors
///
/// `InvalidInput` for `channels == 0`.
pub fn downmix_interleaved(samples: &[f32], channels: usize) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }
    if channels == 1 {
        return Ok(samples.to_vec());
    }

    let mixed = samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok(mixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_downmix() {
        let interleaved = [1.0, 3.0, -2.0, 2.0, 5.0];
        let mono = downmix_interleaved(&interleaved, 2).unwrap();
        assert_eq!(mono, vec![2.0, 0.0]);
        assert!(downmix_interleaved(&interleaved, 0).is_err());
        assert_eq!(downmix_interleaved(&interleaved, 1).unwrap().len(), 5);
    }

    #[test]
    fn test_three_channel_average() {
        let mono = downmix_interleaved(&[0.3, 0.6, 0.0, -0.3, 0.0, 0.0], 3).unwrap();
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] + 0.1).abs() < 1e-6);
    }
}
