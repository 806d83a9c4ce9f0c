use crate::error::PipelineError;
use crate::models::Orientation;
use image::{DynamicImage, GenericImageView, GrayImage};

use super::steps;

/// Grayscale page plus its binarized variant
#[derive(Debug, Clone)]
pub struct NormalizedPage {
    /// Bounded grayscale page consumed by the models
    pub gray: GrayImage,
    /// Otsu-binarized page used by heuristic line scanning
    pub binary: GrayImage,
    /// Threshold chosen for `binary`
    pub threshold: u8,
    /// Skew correction applied to `gray`, in degrees
    pub skew_degrees: f32,
}

/// Image normalizer: decode, bound, grayscale, binarize
#[derive(Debug, Clone)]
pub struct Normalizer {
    max_image_size: u32,
    deskew: bool,
}

impl Normalizer {
    pub fn new(max_image_size: u32, deskew: bool) -> Self {
        Self {
            max_image_size,
            deskew,
        }
    }

    /// Decode an encoded page (PNG, JPEG, TIFF, ...)
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::DecodeError("empty input buffer".to_string()));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| PipelineError::DecodeError(format!("{}", e)))?;
        ensure_area(&image)?;
        Ok(image)
    }

    /// Normalize a decoded page
    pub fn normalize(&self, image: DynamicImage) -> Result<NormalizedPage, PipelineError> {
        ensure_area(&image)?;

        let bounded = steps::resize::bound_dimensions(image, self.max_image_size);
        let mut gray = steps::grayscale::apply(bounded);

        let mut skew_degrees = 0.0;
        if self.deskew {
            let (straightened, angle) = steps::deskew::apply(gray);
            gray = straightened;
            skew_degrees = angle;
        }

        let stretched = steps::contrast::stretch(&gray);
        let threshold = steps::threshold::otsu_level(&stretched);
        let binary = steps::threshold::binarize(&stretched, threshold);

        tracing::debug!(
            "Normalized page to {}x{} (otsu threshold {})",
            gray.width(),
            gray.height(),
            threshold
        );

        Ok(NormalizedPage {
            gray,
            binary,
            threshold,
            skew_degrees,
        })
    }

    /// Decode and normalize in one step
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<NormalizedPage, PipelineError> {
        self.normalize(Self::decode(bytes)?)
    }

    /// Apply quarter-turn orientation correction
    pub fn rotate(gray: GrayImage, orientation: Orientation) -> GrayImage {
        steps::rotate::apply(gray, orientation)
    }
}

fn ensure_area(image: &DynamicImage) -> Result<(), PipelineError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidDimensions { width, height });
    }
    Ok(())
}
