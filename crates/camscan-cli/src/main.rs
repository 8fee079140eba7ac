//! # camscan CLI Entry Point
//!
//! Runs scripted scan sessions against the mock camera platform. Useful for
//! watching the scanner's state flow and log output without a camera.
//!
//! ```sh
//! RUST_LOG=debug camscan scan --code "  SN12345 " --code SN12345 --code SN777
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use camscan_core::{ScannerConfig, ScannerState};
use camscan_hardware::mock::{MockCameraHandle, MockCameraPlatform};
use camscan_scanner::{ChannelConsumer, Scanner, StartOutcome, TracingNotifier};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Camera serial scanner demo.
#[derive(Parser, Debug)]
#[command(name = "camscan", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the simulated cameras and the default selection.
    Devices(CameraArgs),
    /// Run one scan session per code.
    Scan(ScanArgs),
    /// Print the effective configuration as JSON.
    Config,
}

#[derive(Args, Debug)]
struct CameraArgs {
    /// Simulated camera as `ID=LABEL`. Repeatable.
    #[arg(long = "camera", value_parser = parse_camera)]
    cameras: Vec<(String, String)>,

    /// Hide labels until the first stream is granted.
    #[arg(long)]
    hide_labels: bool,
}

#[derive(Args, Debug)]
struct ScanArgs {
    #[command(flatten)]
    cameras: CameraArgs,

    /// Code to present to the camera. Repeatable; one session per code.
    #[arg(long = "code", required = true)]
    codes: Vec<String>,

    /// Preferred camera id, overriding the configuration.
    #[arg(long)]
    device: Option<String>,

    /// Switch to the next camera before presenting each code.
    #[arg(long)]
    switch: bool,

    /// Frames per presented code.
    #[arg(long, default_value_t = 5)]
    frames: usize,

    /// How long to wait for a value before giving up on a session.
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,

    /// Print the state transition history as JSON when done.
    #[arg(long)]
    history: bool,
}

fn parse_camera(s: &str) -> Result<(String, String), String> {
    let (id, label) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=LABEL, got `{s}`"))?;
    if id.trim().is_empty() {
        return Err("camera id must not be empty".to_string());
    }
    Ok((id.trim().to_string(), label.trim().to_string()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ScannerConfig> {
    let config = match path {
        Some(path) => ScannerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ScannerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn mock_platform(args: &CameraArgs) -> (MockCameraPlatform, MockCameraHandle) {
    let cameras = if args.cameras.is_empty() {
        vec![
            ("front".to_string(), "Front Camera".to_string()),
            ("back".to_string(), "Back Camera".to_string()),
        ]
    } else {
        args.cameras.clone()
    };

    let refs: Vec<(&str, &str)> = cameras
        .iter()
        .map(|(id, label)| (id.as_str(), label.as_str()))
        .collect();
    let (platform, handle) = MockCameraPlatform::with_devices(&refs);
    handle.hide_labels_until_granted(args.hide_labels);
    (platform, handle)
}

async fn list_devices(config: ScannerConfig, args: CameraArgs) -> anyhow::Result<()> {
    let (platform, _camera) = mock_platform(&args);
    let scanner = Scanner::builder(platform).config(config).build()?;

    let devices = scanner.refresh_devices().await;
    let default = camscan_scanner::DeviceInventory::new(devices.clone())
        .default_device()
        .map(|d| d.device_id.clone());

    for device in &devices {
        let marker = if default.as_deref() == Some(device.device_id.as_str()) {
            "*"
        } else {
            " "
        };
        let label = if device.has_label() {
            device.label.as_str()
        } else {
            "<hidden>"
        };
        println!("{marker} {:<12} {:<24} {:?}", device.device_id, label, device.facing());
    }
    Ok(())
}

async fn scan(mut config: ScannerConfig, args: ScanArgs) -> anyhow::Result<()> {
    if let Some(device) = args.device.clone() {
        config = config.with_preferred_device(device);
    }

    let (platform, camera) = mock_platform(&args.cameras);
    let (consumer, mut values) = ChannelConsumer::new();
    let scanner = Scanner::builder(platform)
        .config(config)
        .consumer(consumer)
        .notifier(TracingNotifier)
        .build()?;

    let capability = scanner.probe_capability();
    if !capability.is_supported() {
        bail!("camera scanning unavailable: {capability:?}");
    }

    let mut states = scanner.subscribe_state();
    let timeout = Duration::from_millis(args.timeout_ms);

    for code in &args.codes {
        let device_id = match scanner.start_scanning().await? {
            StartOutcome::Started { device_id } => device_id,
            StartOutcome::Cancelled => bail!("scan session cancelled"),
        };
        info!(device_id = %device_id, "Session started");

        if args.switch {
            let outcome = scanner.switch_device().await?;
            info!(outcome = ?outcome, "Switch requested");
        }

        camera.present_miss();
        camera.present_code_frames(code, args.frames);

        match tokio::time::timeout(timeout, values.recv()).await {
            Ok(Some(value)) => {
                println!("{value}");
                states
                    .wait_for(|state| *state == ScannerState::Idle)
                    .await
                    .context("scanner state channel closed")?;
            }
            Ok(None) => bail!("scan consumer closed"),
            Err(_) => {
                warn!(code = %code, "No value accepted, stopping session");
                scanner.stop_scanning();
            }
        }
    }

    let stats = scanner.pipeline_stats();
    info!(
        attempts = stats.attempts,
        accepted = stats.accepted,
        duplicates = stats.duplicates,
        discarded = stats.discarded,
        "Pipeline statistics"
    );

    if args.history {
        println!("{}", serde_json::to_string_pretty(&scanner.history())?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Devices(args) => list_devices(config, args).await,
        Commands::Scan(args) => scan(config, args).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camera() {
        assert_eq!(
            parse_camera("B=Back Camera").unwrap(),
            ("B".to_string(), "Back Camera".to_string())
        );
        assert_eq!(
            parse_camera("usb0=").unwrap(),
            ("usb0".to_string(), String::new())
        );
        assert!(parse_camera("no-separator").is_err());
        assert!(parse_camera("=label").is_err());
    }

    #[test]
    fn test_cli_parses_scan() {
        let cli = Cli::try_parse_from([
            "camscan", "scan", "--camera", "A=Front", "--code", "SN1", "--code", "SN2", "--switch",
        ])
        .unwrap();

        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.codes, vec!["SN1", "SN2"]);
                assert_eq!(args.cameras.cameras.len(), 1);
                assert!(args.switch);
                assert_eq!(args.frames, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_default_config_when_no_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, ScannerConfig::default());
    }
}
