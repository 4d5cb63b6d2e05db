use opencv::core::Point;
use opencv::core::Rect;
use opencv::core::Scalar;
use opencv::imgproc::put_text;
use opencv::imgproc::FONT_HERSHEY_SIMPLEX;
use opencv::imgproc::LINE_8;
use opencv::imgproc::{rectangle, LineTypes};
use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;

use crate::error::Result;

const THICKNESS_PX: i32 = 2;
const FONT_SCALE: f64 = 0.7;
const PLATE_LINE_OFFSET: i32 = 25;
const STATUS_LINE_OFFSET: i32 = 5;
// Baseline of a 0.7 simplex line sits about this far below its top.
const LINE_HEIGHT: i32 = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlateStyle {
    Registered,
    Unregistered,
}

impl PlateStyle {
    pub fn from_registered(registered: bool) -> Self {
        if registered {
            Self::Registered
        } else {
            Self::Unregistered
        }
    }

    /// BGR
    pub fn color(&self) -> Scalar {
        match self {
            Self::Registered => Scalar::from((0.0, 255.0, 0.0)),
            Self::Unregistered => Scalar::from((0.0, 0.0, 255.0)),
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Registered => "Plate Registered",
            Self::Unregistered => "Plate Not Registered",
        }
    }
}

/// Draws the plate box plus two label lines above it (plate and confidence,
/// then registry status). Boxes are clipped to the frame; a box with no
/// visible part draws nothing.
pub fn draw_plate(
    frame: &mut Mat,
    bbox: Rect,
    plate: &str,
    confidence: f32,
    style: PlateStyle,
) -> Result<()> {
    let Some(visible) = clip_to_frame(bbox, frame.cols(), frame.rows()) else {
        log::debug!("Plate {plate} at {bbox:?} is outside the frame, not drawn");
        return Ok(());
    };

    let color = style.color();
    rectangle(
        frame,
        visible,
        color,
        THICKNESS_PX,
        LineTypes::LINE_8 as i32,
        0,
    )?;

    let max_y = frame.rows() - 1;
    let plate_y = (visible.y - PLATE_LINE_OFFSET).max(LINE_HEIGHT).min(max_y);
    let status_y = (visible.y - STATUS_LINE_OFFSET)
        .max(plate_y + LINE_HEIGHT + 2)
        .min(max_y);

    let label = format!("{plate} ({confidence:.2})");
    for (text, y) in [(label.as_str(), plate_y), (style.status_text(), status_y)] {
        put_text(
            frame,
            text,
            Point::new(visible.x, y),
            FONT_HERSHEY_SIMPLEX,
            FONT_SCALE,
            color,
            THICKNESS_PX,
            LINE_8,
            false,
        )?;
    }

    Ok(())
}

fn clip_to_frame(bbox: Rect, cols: i32, rows: i32) -> Option<Rect> {
    let left = bbox.x.max(0);
    let top = bbox.y.max(0);
    let right = (bbox.x + bbox.width).min(cols);
    let bottom = (bbox.y + bbox.height).min(rows);
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(left, top, right - left, bottom - top))
}
