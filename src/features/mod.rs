//! Feature extraction modules
//!
//! - Onset detection (energy flux, spectral flux, HFC)
//! - Periodicity estimation (comb filterbank over onsets)

pub mod onset;
pub mod period;
