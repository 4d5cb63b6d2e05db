use super::TextRegion;

use leptess::tesseract;
use leptess::tesseract::TessApi;
use opencv::core::Rect;
use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;
use opencv::prelude::MatTraitConstManual;
use std::ffi::CString;

use crate::error::{PlateError, Result};

const PLATE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-";
// Sparse text: find as much text as possible in no particular order.
const PAGE_SEG_MODE_SPARSE: &str = "11";
const TSV_WORD_LEVEL: u32 = 5;

/// Text recognition over a whole preprocessed image.
///
/// Implementations report every fragment they find, in their own order,
/// with a confidence in [0, 1]. No filtering happens here.
pub trait OcrEngine {
    fn read_text(&mut self, image: &Mat) -> Result<Vec<TextRegion>>;
}

pub struct TesseractOcr {
    ocr: TessApi,
}

impl TesseractOcr {
    pub fn new(data_path: Option<&str>, lang: &str) -> Result<Self> {
        let mut api = tesseract::TessApi::new(data_path, lang)
            .map_err(|e| PlateError::Ocr(format!("cannot load '{lang}' model: {e:?}")))?;

        set_variable(&mut api, "tessedit_char_whitelist", PLATE_ALPHABET)?;
        set_variable(&mut api, "tessedit_pageseg_mode", PAGE_SEG_MODE_SPARSE)?;

        Ok(Self { ocr: api })
    }
}

fn set_variable(api: &mut TessApi, name: &str, value: &str) -> Result<()> {
    let c_name = CString::new(name).map_err(|e| PlateError::Ocr(e.to_string()))?;
    let c_value = CString::new(value).map_err(|e| PlateError::Ocr(e.to_string()))?;
    api.raw
        .set_variable(&c_name, &c_value)
        .map_err(|_| PlateError::Ocr(format!("cannot set {name}={value}")))
}

impl OcrEngine for TesseractOcr {
    fn read_text(&mut self, image: &Mat) -> Result<Vec<TextRegion>> {
        // Tesseract reads rows back to back.
        let contiguous;
        let image = if image.is_continuous() {
            image
        } else {
            contiguous = image.try_clone()?;
            &contiguous
        };
        let cols = image.cols();
        let rows = image.rows();
        let channels = image.channels();

        self.ocr
            .raw
            .set_image(image.data_bytes()?, cols, rows, channels, cols * channels)
            .map_err(|e| PlateError::Ocr(format!("cannot set image: {e:?}")))?;

        let tsv = self
            .ocr
            .raw
            .get_tsv_text(0)
            .map_err(|e| PlateError::Ocr(format!("recognition failed: {e:?}")))?;
        let tsv = tsv.as_ref().to_string_lossy();

        Ok(parse_tsv_words(&tsv))
    }
}

/// Word rows of tesseract TSV output. Layout rows and rows without a
/// confidence are dropped.
pub fn parse_tsv_words(tsv: &str) -> Vec<TextRegion> {
    tsv.lines().filter_map(parse_tsv_word).collect()
}

fn parse_tsv_word(line: &str) -> Option<TextRegion> {
    let fields: Vec<&str> = line.splitn(12, '\t').collect();
    if fields.len() < 12 {
        return None;
    }
    if fields[0].parse::<u32>().ok()? != TSV_WORD_LEVEL {
        return None;
    }

    let left = fields[6].parse::<i32>().ok()?;
    let top = fields[7].parse::<i32>().ok()?;
    let width = fields[8].parse::<i32>().ok()?;
    let height = fields[9].parse::<i32>().ok()?;
    let conf = fields[10].parse::<f32>().ok()?;
    let text = fields[11];

    if conf < 0.0 || text.trim().is_empty() {
        return None;
    }

    Some(TextRegion::from_box(
        Rect::new(left, top, width, height),
        text,
        (conf / 100.0).clamp(0.0, 1.0),
    ))
}
