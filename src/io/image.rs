//! Periodicity image encoding

use std::path::Path;

use plotters::prelude::*;

use crate::error::AnalysisError;
use crate::tracking::history::PeriodicityImage;

/// Maximum-delay marker colour
pub const PEAK_COLOR: RGBColor = RGBColor(255, 0, 0);

/// Half-delay marker colour
pub const HALF_COLOR: RGBColor = RGBColor(0, 255, 0);

/// Double-delay marker colour
pub const DOUBLE_COLOR: RGBColor = RGBColor(0, 0, 255);

/// Writes a [`PeriodicityImage`] to a raster file
pub trait ImageEncoder {
    /// Encode `image` to `path`
    fn encode(&self, image: &PeriodicityImage, path: &Path) -> Result<(), AnalysisError>;
}

/// PNG output through the plotters bitmap backend
///
/// Intensities become gray levels; each column's maximum, half and double
/// delay rows are painted red, green and blue.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngImageEncoder;

impl ImageEncoder for PngImageEncoder {
    fn encode(&self, image: &PeriodicityImage, path: &Path) -> Result<(), AnalysisError> {
        if image.width == 0 || image.height == 0 {
            return Err(AnalysisError::RenderError(format!(
                "Cannot write an empty {}x{} image",
                image.width, image.height
            )));
        }

        let size = (to_u32(image.width)?, to_u32(image.height)?);
        let root = BitMapBackend::new(path, size).into_drawing_area();

        for x in 0..image.width {
            for y in 0..image.height {
                let (r, g, b) = pixel_rgb(image, x, y);
                root.draw_pixel((x as i32, y as i32), &RGBColor(r, g, b))
                    .map_err(render_error)?;
            }
        }
        root.present().map_err(render_error)?;

        log::debug!(
            "Wrote {}x{} periodicity image to {}",
            image.width,
            image.height,
            path.display()
        );
        Ok(())
    }
}

/// Colour of one pixel, markers included
pub fn pixel_rgb(image: &PeriodicityImage, x: usize, y: usize) -> (u8, u8, u8) {
    if let Some(markers) = image.markers.get(x).copied().flatten() {
        if markers.double == Some(y) {
            return rgb(DOUBLE_COLOR);
        }
        if markers.half == y {
            return rgb(HALF_COLOR);
        }
        if markers.peak == y {
            return rgb(PEAK_COLOR);
        }
    }
    let level = (image.get(x, y) * 255.0).round().clamp(0.0, 255.0) as u8;
    (level, level, level)
}

fn rgb(color: RGBColor) -> (u8, u8, u8) {
    (color.0, color.1, color.2)
}

fn to_u32(dimension: usize) -> Result<u32, AnalysisError> {
    u32::try_from(dimension)
        .map_err(|_| AnalysisError::RenderError(format!("Image dimension too large: {}", dimension)))
}

fn render_error<E: std::error::Error>(err: E) -> AnalysisError {
    AnalysisError::RenderError(err.to_string())
}
