use opencv::prelude::Mat;

use crate::display::{Display, DisplayControl, HeadlessDisplay};
use crate::error::Result;
use crate::metrics::{self, FRAMES_PROCESSED, FRAMES_READ};
use crate::notifier::Notifier;
use crate::plate_detection::plate_extractor::PlateExtractor;
use crate::plate_detection::preprocessor::preprocess;
use crate::plate_detection::video_reader::FrameSource;
use crate::plate_detection::PlateReading;
use crate::registry::RegistryClient;

pub const SAMPLE_INTERVAL: u64 = 5;

/// Picks every n-th frame for OCR, counting from 1.
pub struct FrameSampler {
    counter: u64,
    interval: u64,
}

impl FrameSampler {
    pub fn new(interval: u64) -> Self {
        Self {
            counter: 0,
            interval: interval.max(1),
        }
    }

    /// Counts one frame and tells whether it gets full processing.
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        self.counter % self.interval == 0
    }

    pub fn frames_seen(&self) -> u64 {
        self.counter
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Quit,
    AcquisitionFailed,
}

/// Single threaded capture, verify and display loop.
pub struct Pipeline {
    source: Box<dyn FrameSource>,
    extractor: PlateExtractor,
    registry: RegistryClient,
    notifier: Box<dyn Notifier>,
    display: Box<dyn Display>,
    sampler: FrameSampler,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn FrameSource>,
        extractor: PlateExtractor,
        registry: RegistryClient,
        notifier: Box<dyn Notifier>,
        display: Box<dyn Display>,
    ) -> Self {
        Self {
            source,
            extractor,
            registry,
            notifier,
            display,
            sampler: FrameSampler::default(),
        }
    }

    /// Loops until the display asks to quit or the source fails, then releases
    /// the source and the display.
    pub fn run(&mut self) -> StopReason {
        println!("Starting live plate detection... Press 'q' to quit.");

        let reason = loop {
            if let Some(reason) = self.step() {
                break reason;
            }
        };

        self.source.release();
        self.display.close();
        log::info!(
            "Stopped after {} frames: {reason:?}",
            self.sampler.frames_seen()
        );
        log::debug!("{}", metrics::render());
        reason
    }

    /// One iteration: acquire, maybe process, display.
    pub fn step(&mut self) -> Option<StopReason> {
        let mut frame = match self.source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                println!("Failed to grab frame");
                log::error!("Stopping, {e}");
                return Some(StopReason::AcquisitionFailed);
            }
        };
        FRAMES_READ.inc();

        if self.sampler.tick() {
            FRAMES_PROCESSED.inc();
            match self.process(&mut frame) {
                Ok(readings) => self.reverify(&readings),
                Err(e) => log::warn!("Skipping frame {}: {e}", self.sampler.frames_seen()),
            }
        }

        match self.display.show(&frame) {
            Ok(DisplayControl::Quit) => return Some(StopReason::Quit),
            Ok(DisplayControl::Continue) => {}
            Err(e) => {
                log::warn!("Display failed: {e}");
                log::info!("Display not available, running in headless mode.");
                self.display.close();
                self.display = Box::new(HeadlessDisplay);
            }
        }

        None
    }

    fn process(&mut self, frame: &mut Mat) -> Result<Vec<PlateReading>> {
        let preprocessed = preprocess(frame)?;
        self.extractor.extract(
            frame,
            &preprocessed,
            &self.registry,
            self.notifier.as_ref(),
        )
    }

    // Confirms each reading with a fresh lookup, independent of the one the
    // extractor already made.
    fn reverify(&self, readings: &[PlateReading]) {
        for reading in readings {
            if self.registry.is_registered(&reading.plate) {
                println!(
                    "{} is REGISTERED (conf: {:.2})",
                    reading.plate, reading.confidence
                );
            } else {
                println!(
                    "{} is NOT REGISTERED (conf: {:.2})",
                    reading.plate, reading.confidence
                );
            }
        }
    }
}
