//! Webcam service demo with test-pattern cameras
//!
//! Run with: cargo run --example webcam_server [CAMERAS] [INTERVAL_MS]
//!
//! Examples:
//!   cargo run --example webcam_server                  # one camera: 0=Cam1
//!   cargo run --example webcam_server 0=Left,1=Right   # two cameras
//!   cargo run --example webcam_server 0=Cam1 100       # ~10 frames per second
//!
//! The demo starts streaming on every camera and connects two in-process pipe
//! subscribers to each. One of them stops reading after a few frames, so its
//! queue fills up and the pump drops it while the other keeps receiving.

use std::sync::Arc;
use std::time::Duration;

use webcam_rs::{
    ChannelKey, HostConfig, PipeEvent, StreamConfig, StreamStatus, TestPatternSource, Webcam,
    WebcamHost,
};

/// Parse a camera list such as "0=Left,1=Right"
fn parse_cameras(arg: &str) -> Result<Vec<(i32, String)>, String> {
    arg.split(',')
        .map(|entry| {
            let (id, name) = entry
                .split_once('=')
                .ok_or_else(|| format!("Invalid camera entry: '{}'. Expected ID=NAME", entry))?;
            let id = id
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("Invalid camera id: '{}'", id))?;
            Ok((id, name.trim().to_string()))
        })
        .collect()
}

fn print_usage() {
    eprintln!("Usage: webcam_server [CAMERAS] [INTERVAL_MS]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  CAMERAS      Comma-separated ID=NAME list (default: 0=Cam1)");
    eprintln!("  INTERVAL_MS  Pause between streamed frames (default: 250)");
}

async fn watch_subscriber(
    webcam: Arc<Webcam<TestPatternSource>>,
    index: i32,
    mut read_limit: Option<usize>,
) {
    let key = ChannelKey::new(webcam.id() as u64, index);
    let mut pipe = webcam.frame_stream().connect(key);
    let mut frames = 0usize;

    while let Some(event) = pipe.recv().await {
        match event {
            PipeEvent::Frame(frame) => {
                frames += 1;
                tracing::debug!(
                    device = webcam.name(),
                    channel = %key,
                    width = frame.width(),
                    height = frame.height(),
                    frames = frames,
                    "Frame received"
                );
            }
            PipeEvent::StreamEnded(reason) => {
                tracing::info!(device = webcam.name(), channel = %key, reason = %reason, "Stream ended");
            }
        }

        if read_limit.is_some_and(|limit| frames >= limit) {
            tracing::info!(channel = %key, "Subscriber stalling on purpose");
            // Stop reading long enough for the queue to overflow
            tokio::time::sleep(Duration::from_secs(5)).await;
            read_limit = None;
        }
    }

    println!("[{}] Pipe {} closed after {} frames", webcam.name(), key, frames);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let cameras = match args.get(1) {
        Some(list) => match parse_cameras(list) {
            Ok(cameras) => cameras,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => vec![(0, "Cam1".to_string())],
    };

    let interval = match args.get(2) {
        Some(ms) => Duration::from_millis(ms.parse()?),
        None => Duration::from_millis(250),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("webcam_rs=debug".parse()?)
                .add_directive("webcam_server=info".parse()?),
        )
        .init();

    let config = cameras
        .into_iter()
        .fold(HostConfig::empty(), |config, (id, name)| config.camera(id, name))
        .stream(StreamConfig::default().frame_interval(interval).pipe_capacity(4));

    let host = WebcamHost::with_test_pattern(&config)?;

    println!("Cameras:");
    let mut names: Vec<_> = host.webcam_names().into_iter().collect();
    names.sort();
    for (id, name) in names {
        println!("  {} -> {}", id, name);
    }
    println!();

    for webcam in host.webcams() {
        let frame = webcam.capture_frame().await?;
        println!(
            "[{}] Snapshot: {}x{} stride {} ({} bytes)",
            webcam.name(),
            frame.width(),
            frame.height(),
            frame.stride(),
            frame.len()
        );

        tokio::spawn(watch_subscriber(Arc::clone(webcam), 0, None));
        tokio::spawn(watch_subscriber(Arc::clone(webcam), 1, Some(3)));

        let mut status = webcam.status();
        let name = webcam.name().to_string();
        tokio::spawn(async move {
            while status.changed().await.is_ok() {
                if let StreamStatus::Failed(e) = &*status.borrow() {
                    eprintln!("[{}] Streaming failed: {}", name, e);
                }
            }
        });

        webcam.start_streaming()?;
    }

    println!("Streaming, press Ctrl+C to quit...");
    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    for webcam in host.webcams() {
        let stats = webcam.stats();
        println!(
            "[{}] captured={} delivered={} send_failures={} subscribers={}",
            webcam.name(),
            stats.frames_captured,
            stats.frames_delivered,
            stats.send_failures,
            stats.subscriber_count
        );
    }

    host.shutdown().await;

    Ok(())
}
