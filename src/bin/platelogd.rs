//! platelogd - plate detection service
//!
//! Two modes:
//! 1. With an image path argument: run the pipeline against that file and
//!    log each resulting record.
//! 2. Without arguments: serve the detect API until Ctrl-C.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use platelog::api::{ApiConfig, ApiServer};
use platelog::config::ServiceConfig;
use platelog::{
    DetectionPipeline, PlateDetector, ResultLedger, StubPlateDetector, StubTextRecognizer,
    TextRecognizer,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image file to process locally. Omit to serve the HTTP API instead.
    image: Option<PathBuf>,
    /// Ledger path override.
    #[arg(long, env = "PLATELOG_LEDGER_PATH")]
    ledger: Option<String>,
    /// API listen address override.
    #[arg(long, env = "PLATELOG_API_ADDR")]
    addr: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = ServiceConfig::load()?;
    if let Some(ledger) = args.ledger {
        cfg.ledger_path = ledger;
    }
    if let Some(addr) = args.addr {
        cfg.api_addr = addr;
    }

    let pipeline = build_pipeline(&cfg)?;

    match args.image {
        Some(path) => process_local_file(pipeline, &path),
        None => serve(pipeline, &cfg),
    }
}

fn build_pipeline(cfg: &ServiceConfig) -> Result<DetectionPipeline> {
    let detector: Box<dyn PlateDetector> = match cfg.detector.as_str() {
        "stub" => Box::new(StubPlateDetector::centered()),
        other => return Err(anyhow!("unknown detector backend '{}'", other)),
    };
    let recognizer: Box<dyn TextRecognizer> = match cfg.recognizer.as_str() {
        "stub" => Box::new(StubTextRecognizer::empty()),
        other => return Err(anyhow!("unknown recognizer backend '{}'", other)),
    };
    Ok(DetectionPipeline::new(
        detector,
        recognizer,
        ResultLedger::new(cfg.ledger_path.clone()),
    ))
}

fn process_local_file(mut pipeline: DetectionPipeline, path: &Path) -> Result<()> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("image path has no filename: {}", path.display()))?;
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgb8();

    let records = pipeline.run(&image, &filename)?;
    log::info!("detections for {}:", filename);
    for record in &records {
        log::info!(
            "  text={} colour={} vehicle_type={} confidence={}",
            record.text,
            record.colour.as_str(),
            record.vehicle_type.as_str(),
            record.confidence
        );
    }
    Ok(())
}

fn serve(pipeline: DetectionPipeline, cfg: &ServiceConfig) -> Result<()> {
    let api_config = ApiConfig {
        addr: cfg.api_addr.clone(),
    };
    let handle = ApiServer::new(api_config, pipeline).spawn()?;
    log::info!("detect api listening on {}", handle.addr);
    log::info!("ledger path: {}", cfg.ledger_path);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("error setting Ctrl-C handler")?;

    log::info!("platelogd waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping API server...");
    handle.stop()?;
    Ok(())
}
