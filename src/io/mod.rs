//! Audio and image I/O modules
//!
//! Audio decoding using Symphonia, hop framing, and PNG output of
//! periodicity images using plotters.

pub mod decoder;
pub mod image;
pub mod sample_buffer;
