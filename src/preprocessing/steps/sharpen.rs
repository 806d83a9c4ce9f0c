use image::{GrayImage, Luma};
use imageproc::filter::{filter3x3, gaussian_blur_f32};

/// Laplacian 3x3 kernel: centre 5, direct neighbours -1
const LAPLACIAN_SHARPEN: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Unsharp-mask parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unsharp {
    pub sigma: f32,
    pub amount: f32,
}

/// Generic edge enhancement with a fixed Laplacian kernel
pub fn laplacian(gray: GrayImage) -> GrayImage {
    filter3x3(&gray, &LAPLACIAN_SHARPEN)
}

/// Unsharp mask: `out = orig + amount * (orig - blur(orig, sigma))`
pub fn unsharp(gray: GrayImage, params: Unsharp) -> GrayImage {
    if params.sigma <= 0.0 || params.amount == 0.0 {
        return gray;
    }

    let blurred = gaussian_blur_f32(&gray, params.sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let orig = gray.get_pixel(x, y).0[0] as f32;
        let blur = blurred.get_pixel(x, y).0[0] as f32;
        let value = orig + params.amount * (orig - blur);
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}
