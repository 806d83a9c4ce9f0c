use image::GrayImage;

/// Gain applied around mid-grey before binarization
pub const STRETCH_GAIN: f32 = 1.5;
/// Brightness multiplier of the detailed enhancement profile
pub const BRIGHTEN_FACTOR: f32 = 1.1;

/// Linear contrast stretch around mid-grey:
/// `out = clamp((gray - 128) * 1.5 + 128)`
pub fn stretch(gray: &GrayImage) -> GrayImage {
    map_levels(gray, |v| (v - 128.0) * STRETCH_GAIN + 128.0)
}

/// Scale every sample by `factor`, saturating at white
pub fn brighten(gray: GrayImage, factor: f32) -> GrayImage {
    map_levels(&gray, |v| v * factor)
}

fn map_levels<F>(gray: &GrayImage, f: F) -> GrayImage
where
    F: Fn(f32) -> f32,
{
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        *slot = f(value as f32).round().clamp(0.0, 255.0) as u8;
    }

    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}
