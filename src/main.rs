//! Device-capture binary for testing camera capture.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use device_capture::{CaptureBackend, Config, DeviceCapture, MockBackend, V4l2Backend};
use tracing_subscriber::EnvFilter;

/// Open a camera and grab frames from it.
#[derive(Debug, Parser)]
#[command(name = "device-capture", version)]
struct Args {
    /// Device id (/dev/video{id}); overrides the config file.
    #[arg(short, long, allow_hyphen_values = true)]
    device: Option<i32>,

    /// Number of frames to capture.
    #[arg(short = 'n', long, default_value_t = 1)]
    frames: u32,

    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the simulated backend instead of V4L2.
    #[arg(long)]
    mock: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let device_id = args.device.unwrap_or(config.device);

    if args.mock {
        let backend = MockBackend::from_config(&config.capture);
        run(DeviceCapture::with_backend(backend, device_id), args.frames)
    } else {
        let backend = V4l2Backend::new(config.capture);
        run(DeviceCapture::with_backend(backend, device_id), args.frames)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run<B: CaptureBackend>(mut capture: DeviceCapture<B>, frames: u32) -> ExitCode {
    println!("Device {}: open = {}", capture.device_id(), capture.is_open());
    if !capture.is_open() {
        return ExitCode::FAILURE;
    }

    for _ in 0..frames {
        let Some(frame) = capture.capture_frame() else {
            println!("No frame");
            break;
        };
        println!(
            "Frame {}: {}x{}, {} bytes, timestamp: {:?}",
            frame.metadata.sequence,
            frame.width,
            frame.height,
            frame.data.len(),
            frame.metadata.timestamp
        );
    }

    capture.close();
    ExitCode::SUCCESS
}
