//! Stream tracking and correlation
//!
//! - Onset sources (replayed tracks, detection over decoded audio)
//! - Per-channel tracker with comb filterbank and history snapshots
//! - Two-channel lockstep correlator

pub mod channel;
pub mod correlator;
pub mod history;
pub mod source;

pub use channel::ChannelTracker;
pub use correlator::{DualStreamCorrelator, StepOutcome};
pub use history::{ColumnMarkers, HistoryColumn, HistoryTable, PeriodicityImage};
pub use source::{DetectedOnsetSource, OnsetSource, OnsetTrack};
