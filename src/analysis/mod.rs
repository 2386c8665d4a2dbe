//! Analysis result modules
//!
//! - Result types (records, channel summaries, report)
//! - Metadata

pub mod metadata;
pub mod result;
