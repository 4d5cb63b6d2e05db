use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref FRAMES_READ: IntCounter =
        IntCounter::new("frames_read_total", "Frames read from the capture device")
            .expect("metric can be created");
    pub static ref FRAMES_PROCESSED: IntCounter = IntCounter::new(
        "frames_processed_total",
        "Sampled frames that went through OCR"
    )
    .expect("metric can be created");
    pub static ref PLATES_DETECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("plates_detected_total", "Plate candidates by registry status"),
        &["status"]
    )
    .expect("metric can be created");
    pub static ref REGISTRY_ERRORS: IntCounter =
        IntCounter::new("registry_errors_total", "Failed registry lookups")
            .expect("metric can be created");
    pub static ref NOTIFICATIONS_SENT: IntCounter =
        IntCounter::new("notifications_sent_total", "Signals handed to the transport")
            .expect("metric can be created");
    pub static ref NOTIFICATIONS_FAILED: IntCounter =
        IntCounter::new("notifications_failed_total", "Signals the transport rejected")
            .expect("metric can be created");
}

/// Registers every counter once. Safe to call more than once.
pub fn register_metrics() {
    register_into(&REGISTRY);
}

// Returns how many collectors were newly registered.
fn register_into(registry: &Registry) -> usize {
    let collectors: [Box<dyn prometheus::core::Collector>; 6] = [
        Box::new(FRAMES_READ.clone()),
        Box::new(FRAMES_PROCESSED.clone()),
        Box::new(PLATES_DETECTED.clone()),
        Box::new(REGISTRY_ERRORS.clone()),
        Box::new(NOTIFICATIONS_SENT.clone()),
        Box::new(NOTIFICATIONS_FAILED.clone()),
    ];
    let mut added = 0;
    for collector in collectors {
        match registry.register(collector) {
            Ok(()) => added += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => log::warn!("Cannot register metric: {e}"),
        }
    }
    added
}

pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        log::warn!("Cannot encode metrics: {e}");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
