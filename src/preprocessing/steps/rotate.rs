use crate::models::Orientation;
use image::{imageops, GrayImage};

/// Quarter-turn rotation correction: the page is turned clockwise by the
/// detected orientation
pub fn apply(gray: GrayImage, orientation: Orientation) -> GrayImage {
    match orientation {
        Orientation::Deg0 => gray,
        Orientation::Deg90 => imageops::rotate90(&gray),
        Orientation::Deg180 => imageops::rotate180(&gray),
        Orientation::Deg270 => imageops::rotate270(&gray),
    }
}
