use image::{GrayImage, Luma};

/// Number of intensity bins for 8-bit samples
const LEVELS: usize = 256;

/// Build a 256-bin intensity histogram
pub fn histogram(img: &GrayImage) -> [u64; LEVELS] {
    let mut hist = [0u64; LEVELS];
    for pixel in img.pixels() {
        hist[pixel.0[0] as usize] += 1;
    }
    hist
}

/// Otsu's method: the threshold maximising between-class variance
///
/// Class B holds intensities `<= t`, class F the rest. Thresholds leaving a
/// class empty are skipped. Ties resolve to the lowest `t`; a uniform image
/// yields 0.
pub fn otsu_level(img: &GrayImage) -> u8 {
    let hist = histogram(img);
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_variance = 0.0f64;
    let mut w_b = 0u64;
    let mut sum_b = 0.0f64;

    for (t, &count) in hist.iter().enumerate() {
        w_b += count;
        sum_b += t as f64 * count as f64;

        let w_f = total - w_b;
        if w_b == 0 || w_f == 0 {
            continue;
        }

        let m_b = sum_b / w_b as f64;
        let m_f = (weighted_total - sum_b) / w_f as f64;
        let variance = w_b as f64 * w_f as f64 * (m_b - m_f).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_level = t as u8;
        }
    }

    best_level
}

/// Pixels at or below `level` become black, the rest white
pub fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y).0[0] <= level {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Fixed-level binarization used by the tabular enhancement profile:
/// pixels at or above `level` become white
pub fn fixed(img: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y).0[0] >= level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_half_black_half_white_picks_first_maximum() {
        // Every t in 0..=254 splits the page identically; the first wins
        let img = GrayImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Luma([0])
            } else {
                Luma([255])
            }
        });

        assert_eq!(otsu_level(&img), 0);

        let binary = binarize(&img, otsu_level(&img));
        assert_eq!(binary.get_pixel(0, 0).0[0], 0);
        assert_eq!(binary.get_pixel(19, 0).0[0], 255);
    }

    #[test]
    fn test_otsu_separates_bimodal_clusters() {
        let img = GrayImage::from_fn(40, 10, |x, _| {
            if x < 20 {
                Luma([40 + (x % 3) as u8])
            } else {
                Luma([200 + (x % 3) as u8])
            }
        });

        let level = otsu_level(&img);
        assert!((42..200).contains(&level), "unexpected level {}", level);
        assert_eq!(level, 42);
    }

    #[test]
    fn test_otsu_uniform_image_returns_zero() {
        let img = GrayImage::from_pixel(8, 8, Luma([137]));
        assert_eq!(otsu_level(&img), 0);
    }

    #[test]
    fn test_binarize_outputs_only_black_and_white() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8 * 5).min(255)]));
        let result = binarize(&img, otsu_level(&img));

        for pixel in result.pixels() {
            assert!(
                pixel.0[0] == 0 || pixel.0[0] == 255,
                "Expected binary pixel, got {}",
                pixel.0[0]
            );
        }
    }

    #[test]
    fn test_fixed_threshold_is_inclusive_at_level() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[127u8, 128, 129][x as usize]]));
        let result = fixed(&img, 128);
        assert_eq!(result.get_pixel(0, 0).0[0], 0);
        assert_eq!(result.get_pixel(1, 0).0[0], 255);
        assert_eq!(result.get_pixel(2, 0).0[0], 255);
    }
}
