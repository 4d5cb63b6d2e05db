use anyhow::Context;
use clap::Parser;

use plate_verifier::config::{Args, Config, REGISTRY_DATABASE};
use plate_verifier::display::open_display;
use plate_verifier::metrics::register_metrics;
use plate_verifier::notifier::UdpNotifier;
use plate_verifier::pipeline::Pipeline;
use plate_verifier::plate_detection::ocr::TesseractOcr;
use plate_verifier::plate_detection::plate_extractor::PlateExtractor;
use plate_verifier::plate_detection::video_reader::VideoReader;
use plate_verifier::registry::{MongoPlateStore, RegistryClient};

fn main() -> anyhow::Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        println!("Loaded environment from {}", path.display());
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    register_metrics();

    let config = Config::from_args(Args::parse()).context("invalid configuration")?;

    let store = MongoPlateStore::connect(&config.registry_uri(), REGISTRY_DATABASE)
        .context("cannot reach the vehicle registry")?;
    let registry = RegistryClient::new(Box::new(store));

    let notifier = UdpNotifier::new(&config.notifier_host, config.notifier_port)
        .context("cannot create the notifier socket")?;
    log::info!("Registered plates will be signalled to {}", notifier.target());

    let ocr = TesseractOcr::new(config.tessdata_dir.as_deref(), &config.ocr_lang)
        .context("cannot start the OCR engine")?;
    let extractor = PlateExtractor::new(Box::new(ocr));

    let Some(reader) = VideoReader::open_device(config.camera_index)
        .context("cannot create the capture device")?
    else {
        println!("Could not open webcam");
        return Ok(());
    };

    let display = open_display(config.force_headless);

    let mut pipeline = Pipeline::new(
        Box::new(reader),
        extractor,
        registry,
        Box::new(notifier),
        display,
    );
    pipeline.run();

    println!("Done");
    Ok(())
}
