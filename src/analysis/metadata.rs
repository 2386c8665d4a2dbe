//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Crate version that produced the report
    pub version: String,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: f32,

    /// Onset method per channel, when the onsets were detected from audio
    pub onset_methods: Vec<String>,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            processing_time_ms: 0.0,
            onset_methods: vec![],
        }
    }
}
