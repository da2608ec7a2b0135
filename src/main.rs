use anyhow::Context;
use gs_cam_rs::capture_pipeline::{
    CaptureConfig, CaptureManager, CaptureReport, CaptureSource, DngWriter, FrameSink,
    OutputFormat, RawWriter, Result, SyntheticSource,
};
use gs_cam_rs::logger;

use tracing::{error, info};

fn capture<S: CaptureSource, W: FrameSink>(
    mut manager: CaptureManager<S, W>,
) -> Result<CaptureReport> {
    info!(
        "Format: {}, mosaic: {}",
        manager.config().output_format,
        manager.config().cfa
    );
    manager.run()
}

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting gs_cam capture...");

    let mut builder = CaptureConfig::builder();
    if let Ok(format) = std::env::var("GS_CAM_FORMAT") {
        builder = builder.output_format(format.parse().context("GS_CAM_FORMAT")?);
    }
    if let Ok(mosaic) = std::env::var("GS_CAM_MOSAIC") {
        builder = builder.cfa(mosaic.parse().context("GS_CAM_MOSAIC")?);
    }
    if let Ok(frames) = std::env::var("GS_CAM_FRAMES") {
        builder = builder.target_frames(frames.parse().context("GS_CAM_FRAMES")?);
    }
    if let Ok(dir) = std::env::var("GS_CAM_OUT") {
        builder = builder.output_dir(dir);
    }
    let config = builder.build();

    let source = SyntheticSource::new(1456, 1088);

    info!("Capture pipeline initialized");
    info!("Source: synthetic {}x{}", source.width(), source.height());

    let report = match config.output_format {
        OutputFormat::Dng => capture(CaptureManager::new(source, DngWriter, config)),
        OutputFormat::Raw => capture(CaptureManager::new(source, RawWriter, config)),
    };

    match report {
        Ok(report) => info!(
            "Saved {} frame(s), dropped {}",
            report.frames_saved, report.frames_dropped
        ),
        Err(e) => error!("Capture failed: {}", e),
    }

    Ok(())
}
