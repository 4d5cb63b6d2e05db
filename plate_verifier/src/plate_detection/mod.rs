pub mod bounding_box_render;
pub mod ocr;
pub mod plate_extractor;
pub mod preprocessor;
pub mod video_reader;

use opencv::core::Point;
use opencv::core::Rect;
use opencv::core::Vector;

/// One raw fragment reported by the OCR engine.
#[derive(Clone, Debug)]
pub struct TextRegion {
    pub region: Vector<Point>,
    pub text: String,
    pub confidence: f32,
}

impl TextRegion {
    pub fn new(region: Vector<Point>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            region,
            text: text.into(),
            confidence,
        }
    }

    /// Four corner region from an axis-aligned box, clockwise from top left.
    pub fn from_box(rect: Rect, text: impl Into<String>, confidence: f32) -> Self {
        let right = rect.x + rect.width;
        let bottom = rect.y + rect.height;
        let region = Vector::from_iter([
            Point::new(rect.x, rect.y),
            Point::new(right, rect.y),
            Point::new(right, bottom),
            Point::new(rect.x, bottom),
        ]);
        Self::new(region, text, confidence)
    }
}

/// A plate that survived filtering, with the outcome of its registry lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateReading {
    pub bbox: Rect,
    pub plate: String,
    pub confidence: f32,
    pub registered: bool,
}
