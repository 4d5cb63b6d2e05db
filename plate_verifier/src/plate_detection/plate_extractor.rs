use lazy_static::lazy_static;
use opencv::imgproc::bounding_rect;
use opencv::prelude::Mat;
use regex::Regex;

use super::bounding_box_render::{draw_plate, PlateStyle};
use super::ocr::OcrEngine;
use super::{PlateReading, TextRegion};
use crate::error::Result;
use crate::metrics::PLATES_DETECTED;
use crate::notifier::Notifier;
use crate::registry::RegistryClient;

pub const MIN_CONFIDENCE: f32 = 0.30;

lazy_static! {
    // Coarse shape filter, not a jurisdiction format check.
    static ref PLATE_PATTERN: Regex = Regex::new(r"(?i)[A-Z0-9\-]{4,}").expect("valid plate pattern");
}

pub fn normalize_plate(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Normalized plate text if the fragment is confident enough and plate shaped.
pub fn plate_text(region: &TextRegion) -> Option<String> {
    if region.confidence < MIN_CONFIDENCE {
        return None;
    }
    if !PLATE_PATTERN.is_match(&region.text) {
        return None;
    }
    Some(normalize_plate(&region.text))
}

pub struct PlateExtractor {
    ocr: Box<dyn OcrEngine>,
}

impl PlateExtractor {
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    /// Reads plates off the preprocessed image, looks each one up, signals
    /// the notifier on a match and annotates `frame` in place.
    ///
    /// Readings keep the OCR engine's order. Repeated detections of one plate
    /// are looked up and reported independently.
    pub fn extract(
        &mut self,
        frame: &mut Mat,
        preprocessed: &Mat,
        registry: &RegistryClient,
        notifier: &dyn Notifier,
    ) -> Result<Vec<PlateReading>> {
        let regions = self.ocr.read_text(preprocessed)?;

        let mut readings = Vec::new();
        for region in regions {
            let Some(plate) = plate_text(&region) else {
                continue;
            };
            let bbox = bounding_rect(&region.region)?;
            let confidence = region.confidence;

            let registered = registry.is_registered(&plate);
            if registered {
                PLATES_DETECTED.with_label_values(&["registered"]).inc();
                notifier.notify();
                log::info!("Detected registered plate: {plate} (conf: {confidence:.2})");
            } else {
                PLATES_DETECTED.with_label_values(&["unregistered"]).inc();
                log::info!("Detected unregistered plate: {plate} (conf: {confidence:.2})");
            }

            let style = PlateStyle::from_registered(registered);
            if let Err(e) = draw_plate(frame, bbox, &plate, confidence, style) {
                log::warn!("Cannot annotate plate {plate}: {e}");
            }

            readings.push(PlateReading {
                bbox,
                plate,
                confidence,
                registered,
            });
        }

        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlateError;
    use crate::registry::PlateStore;
    use opencv::core::Rect;
    use opencv::core::Scalar;
    use opencv::core::Vec3b;
    use opencv::core::CV_8UC1;
    use opencv::core::CV_8UC3;
    use opencv::prelude::MatTraitConst;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::rc::Rc;

    struct ScriptedOcr(Vec<TextRegion>);

    impl OcrEngine for ScriptedOcr {
        fn read_text(&mut self, _image: &Mat) -> Result<Vec<TextRegion>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenOcr;

    impl OcrEngine for BrokenOcr {
        fn read_text(&mut self, _image: &Mat) -> Result<Vec<TextRegion>> {
            Err(PlateError::Ocr("model not loaded".to_string()))
        }
    }

    struct Store {
        plates: HashSet<&'static str>,
        failing: HashSet<&'static str>,
        queries: Rc<RefCell<Vec<String>>>,
    }

    impl PlateStore for Store {
        fn contains(&self, plate: &str) -> Result<bool> {
            self.queries.borrow_mut().push(plate.to_string());
            if self.failing.contains(plate) {
                return Err(PlateError::Registry("timed out".to_string()));
            }
            Ok(self.plates.contains(plate))
        }
    }

    #[derive(Default)]
    struct CountingNotifier(Cell<usize>);

    impl Notifier for CountingNotifier {
        fn notify(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    struct Fixture {
        registry: RegistryClient,
        queries: Rc<RefCell<Vec<String>>>,
        notifier: CountingNotifier,
        frame: Mat,
        preprocessed: Mat,
    }

    fn fixture(plates: &[&'static str], failing: &[&'static str]) -> Fixture {
        let queries = Rc::new(RefCell::new(vec![]));
        let registry = RegistryClient::new(Box::new(Store {
            plates: plates.iter().copied().collect(),
            failing: failing.iter().copied().collect(),
            queries: queries.clone(),
        }));
        Fixture {
            registry,
            queries,
            notifier: CountingNotifier::default(),
            frame: Mat::new_rows_cols_with_default(480, 640, CV_8UC3, Scalar::all(0.0)).unwrap(),
            preprocessed: Mat::new_rows_cols_with_default(480, 640, CV_8UC1, Scalar::all(0.0))
                .unwrap(),
        }
    }

    fn run(fx: &mut Fixture, regions: Vec<TextRegion>) -> Vec<PlateReading> {
        let mut extractor = PlateExtractor::new(Box::new(ScriptedOcr(regions)));
        extractor
            .extract(&mut fx.frame, &fx.preprocessed, &fx.registry, &fx.notifier)
            .unwrap()
    }

    fn green_at(frame: &Mat, row: i32, col: i32) -> bool {
        let px = frame.at_2d::<Vec3b>(row, col).unwrap();
        px[0] == 0 && px[1] == 255 && px[2] == 0
    }

    #[test]
    fn normalization_is_idempotent() {
        for text in ["  abc-123 ", "ABC-123", "zz99\n", "Ab-Cd-9"] {
            let once = normalize_plate(text);
            assert_eq!(normalize_plate(&once), once);
        }
        assert_eq!(normalize_plate("  abc-123 "), "ABC-123");
    }

    #[test]
    fn low_confidence_is_dropped_whatever_the_text() {
        let rect = Rect::new(0, 0, 10, 10);
        for text in ["ABC-123", "ZZZ-999", "1234", "PLATE"] {
            assert_eq!(plate_text(&TextRegion::from_box(rect, text, 0.29)), None);
        }
        assert_eq!(
            plate_text(&TextRegion::from_box(rect, "ABC-123", 0.30)),
            Some("ABC-123".to_string())
        );
    }

    #[test]
    fn text_must_hold_a_plate_shaped_run() {
        let rect = Rect::new(0, 0, 10, 10);
        for text in ["X1", "AB1", "", "A B C D", "#$%&*", "a.b.c.d"] {
            assert_eq!(plate_text(&TextRegion::from_box(rect, text, 0.99)), None, "{text}");
        }
        for (text, plate) in [("abcd", "ABCD"), ("12-34", "12-34"), (" km-482-xy ", "KM-482-XY")] {
            assert_eq!(
                plate_text(&TextRegion::from_box(rect, text, 0.99)),
                Some(plate.to_string())
            );
        }
    }

    #[test]
    fn registered_plate_is_reported_signalled_and_boxed() {
        let mut fx = fixture(&["ABC-123"], &[]);
        let region = Rect::new(100, 200, 150, 40);
        let readings = run(&mut fx, vec![TextRegion::from_box(region, "abc-123", 0.85)]);

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].plate, "ABC-123");
        assert!(readings[0].registered);
        assert!((readings[0].confidence - 0.85).abs() < 1e-6);
        assert_eq!(readings[0].bbox.x, 100);
        assert_eq!(readings[0].bbox.y, 200);
        assert_eq!(fx.notifier.0.get(), 1);
        assert_eq!(*fx.queries.borrow(), vec!["ABC-123".to_string()]);
        assert!(green_at(&fx.frame, 220, 100));
    }

    #[test]
    fn short_text_never_reaches_the_registry() {
        let mut fx = fixture(&["X1"], &[]);
        let readings = run(
            &mut fx,
            vec![TextRegion::from_box(Rect::new(10, 10, 20, 20), "X1", 0.90)],
        );
        assert!(readings.is_empty());
        assert!(fx.queries.borrow().is_empty());
        assert_eq!(fx.notifier.0.get(), 0);
    }

    #[test]
    fn unconfident_plate_is_dropped() {
        let mut fx = fixture(&["ZZZ-999"], &[]);
        let readings = run(
            &mut fx,
            vec![TextRegion::from_box(Rect::new(10, 10, 80, 20), "ZZZ-999", 0.20)],
        );
        assert!(readings.is_empty());
        assert!(fx.queries.borrow().is_empty());
        assert_eq!(fx.notifier.0.get(), 0);
    }

    #[test]
    fn registry_failure_marks_unregistered_and_moves_on() {
        let mut fx = fixture(&["QQQ-111", "ABC-123"], &["QQQ-111"]);
        let readings = run(
            &mut fx,
            vec![
                TextRegion::from_box(Rect::new(10, 100, 80, 20), "QQQ-111", 0.70),
                TextRegion::from_box(Rect::new(300, 100, 80, 20), "ABC-123", 0.80),
            ],
        );

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].plate, "QQQ-111");
        assert!(!readings[0].registered);
        assert_eq!(readings[1].plate, "ABC-123");
        assert!(readings[1].registered);
        assert_eq!(fx.notifier.0.get(), 1);
    }

    #[test]
    fn duplicates_are_kept_in_engine_order() {
        let mut fx = fixture(&["ABC-123"], &[]);
        let readings = run(
            &mut fx,
            vec![
                TextRegion::from_box(Rect::new(400, 300, 80, 20), "ABC-123", 0.60),
                TextRegion::from_box(Rect::new(10, 10, 80, 20), "n.o.i.s.e", 0.95),
                TextRegion::from_box(Rect::new(402, 301, 80, 20), "abc-123", 0.90),
                TextRegion::from_box(Rect::new(50, 50, 80, 20), "UNK-000", 0.40),
            ],
        );

        let plates: Vec<&str> = readings.iter().map(|r| r.plate.as_str()).collect();
        assert_eq!(plates, vec!["ABC-123", "ABC-123", "UNK-000"]);
        assert_eq!(fx.queries.borrow().len(), 3);
        assert_eq!(fx.notifier.0.get(), 2);
    }

    #[test]
    fn ocr_failure_is_returned() {
        let mut fx = fixture(&[], &[]);
        let mut extractor = PlateExtractor::new(Box::new(BrokenOcr));
        let result = extractor.extract(&mut fx.frame, &fx.preprocessed, &fx.registry, &fx.notifier);
        assert!(matches!(result, Err(PlateError::Ocr(_))));
    }
}
