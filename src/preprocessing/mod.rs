//! Audio preprocessing modules
//!
//! Prepares decoded audio for onset detection:
//! - Channel mixing (multichannel to mono)
//! - Silence gating

pub mod channel_mixer;
pub mod silence;
