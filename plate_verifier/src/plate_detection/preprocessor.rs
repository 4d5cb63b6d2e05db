use opencv::core::BORDER_DEFAULT;
use opencv::imgproc::bilateral_filter;
use opencv::imgproc::cvt_color;
use opencv::imgproc::threshold;
use opencv::imgproc::COLOR_BGR2GRAY;
use opencv::imgproc::THRESH_BINARY;
use opencv::imgproc::THRESH_OTSU;
use opencv::prelude::Mat;

use crate::error::Result;

const BILATERAL_DIAMETER: i32 = 5;
const BILATERAL_SIGMA_COLOR: f64 = 17.0;
const BILATERAL_SIGMA_SPACE: f64 = 17.0;

/// Grey, denoised and Otsu-binarized copy of a BGR frame, same size, one channel.
/// The frame must not be empty.
pub fn preprocess(frame: &Mat) -> Result<Mat> {
    let mut grey = Mat::default();
    cvt_color(frame, &mut grey, COLOR_BGR2GRAY, 0)?;

    // Bilateral filtering keeps character edges while flattening sensor noise.
    let mut smoothed = Mat::default();
    bilateral_filter(
        &grey,
        &mut smoothed,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
        BORDER_DEFAULT,
    )?;

    let mut binary = Mat::default();
    threshold(&smoothed, &mut binary, 0.0, 255.0, THRESH_BINARY | THRESH_OTSU)?;
    Ok(binary)
}
