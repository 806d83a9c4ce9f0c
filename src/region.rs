//! Page geometry shared by the layout, classification and table stages

use serde::{Deserialize, Serialize};

/// Axis-aligned box in page pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Integer crop rectangle `(x, y, width, height)` clipped to an image,
    /// or `None` when nothing of the box lies inside it
    pub fn clip_to(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = self.x.floor().max(0.0) as u32;
        let y1 = self.y.floor().max(0.0) as u32;
        let x2 = ((self.x + self.width).floor().max(0.0) as u32).min(image_width);
        let y2 = ((self.y + self.height).floor().max(0.0) as u32).min(image_height);

        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some((x1, y1, x2 - x1, y2 - y1))
    }
}

/// Semantic region kinds produced by the layout detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    Text,
    Table,
    Image,
    Header,
    Footer,
    Chart,
}

impl RegionType {
    /// Map a detector class id; unknown ids are treated as text
    pub fn from_class_id(class_id: usize) -> Self {
        match class_id {
            0 => Self::Text,
            1 => Self::Table,
            2 => Self::Image,
            3 => Self::Header,
            4 => Self::Footer,
            5 => Self::Chart,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
            Self::Image => "image",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Chart => "chart",
        }
    }
}

/// A detected page region with its position in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegion {
    #[serde(rename = "type")]
    pub region_type: RegionType,
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub reading_order: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_class_ids_map_to_text() {
        assert_eq!(RegionType::from_class_id(1), RegionType::Table);
        assert_eq!(RegionType::from_class_id(5), RegionType::Chart);
        assert_eq!(RegionType::from_class_id(6), RegionType::Text);
        assert_eq!(RegionType::from_class_id(99), RegionType::Text);
    }

    #[test]
    fn test_clip_to_image_bounds() {
        let bbox = BoundingBox::new(-10.0, 20.5, 200.0, 50.0);
        assert_eq!(bbox.clip_to(100, 60), Some((0, 20, 100, 40)));

        let outside = BoundingBox::new(150.0, 0.0, 10.0, 10.0);
        assert_eq!(outside.clip_to(100, 60), None);
    }
}
