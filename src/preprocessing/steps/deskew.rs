use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Coarse search window in degrees (symmetric)
const COARSE_RANGE: f32 = 5.0;
const COARSE_STEP: f32 = 0.5;
const FINE_STEP: f32 = 0.1;
/// Corrections smaller than this are skipped
const MIN_CORRECTION: f32 = 0.1;
/// Samples darker than this count as ink
const INK_LEVEL: u8 = 128;
/// Long edge of the copy the angle search runs on
const ANALYSIS_EDGE: u32 = 1024;

/// Straighten a slightly skewed page, returning the applied angle in degrees
pub fn apply(gray: GrayImage) -> (GrayImage, f32) {
    let angle = detect_skew_degrees(&gray);
    if angle.abs() < MIN_CORRECTION {
        return (gray, 0.0);
    }

    tracing::debug!("Correcting {:.2} degree skew", angle);
    // The detected angle is the page's tilt; turn the other way to undo it
    let rotated = rotate_about_center(
        &gray,
        (-angle).to_radians(),
        Interpolation::Bilinear,
        Luma([255u8]),
    );
    (rotated, angle)
}

/// Projection-profile skew search: coarse sweep, then a fine sweep around
/// the best coarse angle
///
/// Pages larger than [`ANALYSIS_EDGE`] are searched on a downscaled copy;
/// the angle does not depend on scale.
pub fn detect_skew_degrees(gray: &GrayImage) -> f32 {
    let sample = analysis_copy(gray);
    let gray = sample.as_ref().unwrap_or(gray);

    let ink = ink_points(gray);
    if ink.is_empty() {
        return 0.0;
    }

    let sweep = |from: f32, to: f32, step: f32, mut best: (f32, f32)| {
        let mut angle = from;
        while angle <= to + f32::EPSILON {
            let score = profile_variance(&ink, gray.width(), gray.height(), angle);
            if score > best.1 {
                best = (angle, score);
            }
            angle += step;
        }
        best
    };

    let coarse = sweep(-COARSE_RANGE, COARSE_RANGE, COARSE_STEP, (0.0, 0.0));
    let (best, _) = sweep(
        coarse.0 - COARSE_STEP,
        coarse.0 + COARSE_STEP,
        FINE_STEP,
        coarse,
    );
    best
}

/// Downscaled copy for the angle search, `None` when the page is small enough
fn analysis_copy(gray: &GrayImage) -> Option<GrayImage> {
    let long_edge = gray.width().max(gray.height());
    if long_edge <= ANALYSIS_EDGE {
        return None;
    }

    let scale = ANALYSIS_EDGE as f32 / long_edge as f32;
    let width = ((gray.width() as f32 * scale).round() as u32).max(1);
    let height = ((gray.height() as f32 * scale).round() as u32).max(1);
    Some(imageops::resize(gray, width, height, FilterType::Triangle))
}

fn ink_points(gray: &GrayImage) -> Vec<(f32, f32)> {
    gray.enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] < INK_LEVEL)
        .map(|(x, y, _)| (x as f32, y as f32))
        .collect()
}

/// Variance of the per-row ink histogram after rotating by `degrees`;
/// aligned text lines give sharp peaks and a high variance
fn profile_variance(ink: &[(f32, f32)], width: u32, height: u32, degrees: f32) -> f32 {
    let (sin_a, cos_a) = degrees.to_radians().sin_cos();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    let mut rows = vec![0u32; height as usize];
    for &(x, y) in ink {
        let projected = ((y - cy) * cos_a - (x - cx) * sin_a + cy) as i64;
        if (0..height as i64).contains(&projected) {
            rows[projected as usize] += 1;
        }
    }

    let n = rows.len() as f32;
    let mean = rows.iter().sum::<u32>() as f32 / n;
    rows.iter().map(|&c| (c as f32 - mean).powi(2)).sum::<f32>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_has_no_skew() {
        let mut img = GrayImage::from_pixel(100, 50, Luma([255]));
        for x in 10..90 {
            img.put_pixel(x, 25, Luma([0]));
        }

        let angle = detect_skew_degrees(&img);
        assert!(angle.abs() < 0.5, "Expected near-zero angle, got {}", angle);
    }

    #[test]
    fn test_blank_page_is_returned_unchanged() {
        let img = GrayImage::from_pixel(100, 50, Luma([255]));
        let (result, angle) = apply(img.clone());
        assert_eq!(angle, 0.0);
        assert_eq!(result, img);
    }

    #[test]
    fn test_deskew_preserves_dimensions() {
        let mut img = GrayImage::from_pixel(120, 60, Luma([255]));
        for x in 10..110 {
            let y = 20 + x / 20;
            img.put_pixel(x, y, Luma([0]));
        }
        let (result, _) = apply(img);
        assert_eq!(result.dimensions(), (120, 60));
    }

    /// White page with 2px ink lines falling by `degrees` to the right
    fn tilted_lines(width: u32, height: u32, degrees: f32) -> GrayImage {
        let slope = degrees.to_radians().tan();
        let margin = width / 20;
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        for row in 1..=4 {
            let y0 = height as f32 * row as f32 / 5.0 - 20.0;
            for x in margin..width - margin {
                let y = (y0 + (x - margin) as f32 * slope).round() as u32;
                for dy in 0..2 {
                    img.put_pixel(x, y + dy, Luma([0]));
                }
            }
        }
        img
    }

    /// Least-squares slope of the ink pixels
    fn ink_slope(img: &GrayImage) -> f32 {
        let ink = ink_points(img);
        let n = ink.len() as f32;
        let mean_x = ink.iter().map(|p| p.0).sum::<f32>() / n;
        let mean_y = ink.iter().map(|p| p.1).sum::<f32>() / n;
        let cov: f32 = ink.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
        let var: f32 = ink.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
        cov / var
    }

    #[test]
    fn test_deskew_straightens_tilted_lines() {
        let img = tilted_lines(400, 300, 3.0);
        let before = ink_slope(&img);

        let (result, angle) = apply(img);
        let after = ink_slope(&result);

        assert!((angle - 3.0).abs() < 0.5, "Expected about 3 degrees, got {}", angle);
        assert!(
            after.abs() < before.abs() * 0.3,
            "Skew not reduced: before {} after {}",
            before,
            after
        );
    }

    #[test]
    fn test_large_page_is_searched_on_a_downscaled_copy() {
        let page = GrayImage::new(3000, 1500);
        let copy = analysis_copy(&page).unwrap();
        assert_eq!(copy.dimensions(), (1024, 512));
        assert!(analysis_copy(&GrayImage::new(800, 600)).is_none());
    }

    #[test]
    fn test_skew_detected_on_large_page() {
        let img = tilted_lines(2000, 1400, -2.0);
        let angle = detect_skew_degrees(&img);
        assert!((angle + 2.0).abs() < 0.5, "Expected about -2 degrees, got {}", angle);
    }
}
