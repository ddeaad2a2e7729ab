mod camera;
mod preview;

use anyhow::Context;
use beer_vision::{DetectorConfig, DetectorLoop, HeadlessPreview, VisionError};
use camera::OpenCvCamera;
use clap::Parser;
use preview::HighGuiPreview;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};

/// Watches a webcam and prints one line per frame saying whether a blue beer can is in view.
#[derive(Debug, Parser)]
#[command(name = "beer_tracker", version)]
struct Args {
    /// TOML file overriding the detector defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Capture device index (default 0).
    #[arg(short, long)]
    device: Option<i32>,
    /// Skip the preview windows. The run then ends only when the stream ends.
    #[arg(long)]
    headless: bool,
}

impl Args {
    fn apply(&self, config: &mut DetectorConfig) {
        if let Some(device) = self.device {
            config.device_index = device;
        }
        if self.headless {
            config.preview = false;
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<DetectorConfig> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("loading detector config from {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Logs go to stderr; stdout carries only the detection lines.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.parse().unwrap_or_default()),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Configuration ---
    let args = Args::parse();
    let config = load_config(&args)?;

    // --- 2. Logging ---
    init_tracing(&config.logging.level);
    info!(
        device = config.device_index,
        preview = config.preview,
        ratio_threshold = config.detection.ratio_threshold,
        lower = ?config.detection.color_range.lower,
        upper = ?config.detection.color_range.upper,
        "starting beer tracker"
    );

    // --- 3. Detector Initialization ---
    let mut detector = DetectorLoop::new(&config);
    let mut camera = OpenCvCamera;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // --- 4. Main Processing Loop ---
    let result = if config.preview {
        detector.run(&mut camera, &mut HighGuiPreview::new(), &mut out)
    } else {
        detector.run(&mut camera, &mut HeadlessPreview, &mut out)
    };

    // --- 5. Teardown & Summary ---
    match result {
        Ok(summary) => {
            info!(
                frames = summary.frames_processed,
                detections = summary.detections,
                state_changes = summary.state_changes,
                points = detector.points().displayed(),
                stop_reason = ?summary.stop_reason,
                "detector stopped"
            );
            Ok(())
        }
        Err(VisionError::DeviceUnavailable { index }) => {
            // The loop has already printed the user-facing message.
            error!(index, "no camera, exiting");
            Ok(())
        }
        Err(e) => Err(e).context("detector loop failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_keeps_the_stock_detector() {
        let args = Args::try_parse_from(["beer_tracker"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.device_index, 0);
        assert!(config.preview);
        assert_eq!(config.detection.ratio_threshold, 0.05);
    }

    #[test]
    fn flags_override_device_and_preview() {
        let args = Args::try_parse_from(["beer_tracker", "--device", "2", "--headless"]).unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.device_index, 2);
        assert!(!config.preview);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let args =
            Args::try_parse_from(["beer_tracker", "--config", "/nonexistent/beer.toml"]).unwrap();
        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/beer.toml"));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Args::try_parse_from(["beer_tracker", "--verbose"]).is_err());
    }
}
