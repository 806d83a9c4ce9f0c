use image::GrayImage;

/// Stretch the occupied intensity range onto 0..=255
///
/// A uniform image has no range to stretch and is returned untouched.
pub fn apply(gray: GrayImage) -> GrayImage {
    let Some((low, high)) = intensity_bounds(&gray) else {
        return gray;
    };
    if high <= low {
        return gray;
    }

    let span = (high - low) as f32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate().skip(low as usize) {
        let offset = (value as u8).min(high) - low;
        *slot = (offset as f32 / span * 255.0) as u8;
    }

    let mut out = gray;
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}

/// Darkest and brightest sample, `None` for an empty image
pub fn intensity_bounds(gray: &GrayImage) -> Option<(u8, u8)> {
    gray.pixels().fold(None, |bounds, pixel| {
        let v = pixel.0[0];
        Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        })
    })
}
