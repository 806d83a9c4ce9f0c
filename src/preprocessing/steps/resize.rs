use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage};

/// Shrink an image so its long edge is at most `max_dimension`
///
/// Aspect ratio is preserved and small images are never enlarged.
pub fn bound_dimensions(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    let long_edge = width.max(height);

    if max_dimension == 0 || long_edge <= max_dimension {
        return image;
    }

    let scale = max_dimension as f32 / long_edge as f32;
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, max_dimension);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, max_dimension);

    tracing::debug!(
        "Bounding {}x{} image to {}x{}",
        width,
        height,
        new_width,
        new_height
    );

    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Bilinear resample to a fixed square model input
pub fn to_square(gray: &GrayImage, side: u32) -> GrayImage {
    image::imageops::resize(gray, side, side, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_limits_long_edge_and_keeps_aspect() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(2000, 1000));
        let result = bound_dimensions(img, 500);
        assert_eq!(result.width(), 500);
        assert_eq!(result.height(), 250);
    }

    #[test]
    fn test_bound_never_upscales() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(100, 40));
        let result = bound_dimensions(img, 4096);
        assert_eq!(result.dimensions(), (100, 40));
    }

    #[test]
    fn test_to_square_produces_model_input_size() {
        let img = GrayImage::new(300, 120);
        let result = to_square(&img, 224);
        assert_eq!(result.dimensions(), (224, 224));
    }
}
