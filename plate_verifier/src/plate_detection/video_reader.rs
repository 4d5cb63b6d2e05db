use opencv::core::Size;

use opencv::imgproc::resize;
use opencv::imgproc::INTER_LINEAR;
use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;

use opencv::prelude::VideoCaptureTrait;
use opencv::prelude::VideoCaptureTraitConst;
use opencv::videoio::VideoCapture;

use opencv::videoio::CAP_ANY;

use crate::error::{PlateError, Result};

pub const FRAME_WIDTH: i32 = 640;
pub const FRAME_HEIGHT: i32 = 480;

/// Yields frames on demand. An error means the source is gone for good.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Mat>;

    fn release(&mut self) {}
}

pub struct VideoReader {
    capture: VideoCapture,
}

impl VideoReader {
    /// Opens a local capture device. Returns `Ok(None)` if the device cannot be opened.
    pub fn open_device(index: i32) -> Result<Option<Self>> {
        let capture = VideoCapture::new(index, CAP_ANY)?;
        if !capture.is_opened()? {
            return Ok(None);
        }
        log::info!("Opened capture device {index}");
        Ok(Some(Self { capture }))
    }
}

impl FrameSource for VideoReader {
    fn next_frame(&mut self) -> Result<Mat> {
        let mut image = Mat::default();
        let grabbed = self.capture.read(&mut image)?;

        if !grabbed || image.empty() {
            return Err(PlateError::Acquisition("no frame from capture device".to_string()));
        }

        resize_frame(&image)
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            log::debug!("Ignoring capture release error: {e}");
        }
    }
}

/// Every frame is brought to 640x480 before anything else looks at it.
pub fn resize_frame(image: &Mat) -> Result<Mat> {
    let mut image_resized = Mat::default();
    resize(
        image,
        &mut image_resized,
        Size::new(FRAME_WIDTH, FRAME_HEIGHT),
        0.0,
        0.0,
        INTER_LINEAR,
    )?;
    Ok(image_resized)
}
