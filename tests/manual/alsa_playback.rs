//! Plays the bundled track on a real ALSA device
//!
//! A diagnostic utility to check the audio path without the terminal front end.
//! Run with: cargo run --bin alsa_playback -- [--device hw:0,0] [--seconds 5]

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use timeplayer::audio::{format_elapsed, AlsaEngine, AudioSource, EngineEvent, PlaybackEngine};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ALSA device name
    #[arg(short, long, default_value = "default")]
    device: String,

    /// Seconds to play before pausing and resuming once
    #[arg(short, long, default_value_t = 5)]
    seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter("timeplayer=debug").init();
    let args = Args::parse();

    let (events_tx, mut events_rx) = mpsc::channel(8);
    let mut engine = AlsaEngine::new(&args.device, events_tx);
    engine.set_source(AudioSource::bundled())?;

    println!("Preparing on '{}'...", args.device);
    engine.prepare_async()?;
    match events_rx.recv().await {
        Some(EngineEvent::Prepared) => println!("Prepared."),
        other => return Err(format!("Preparation failed: {:?}", other).into()),
    }

    engine.start().await?;
    for _ in 0..args.seconds {
        tokio::time::sleep(Duration::from_secs(1)).await;
        println!("Elapsed: {}", format_elapsed(engine.current_position_ms().await));
    }

    println!("Pausing for 2 seconds...");
    engine.pause().await?;
    tokio::time::sleep(Duration::from_secs(2)).await;
    engine.start().await?;

    println!("Resumed, waiting for the end of the track (Ctrl+C to abort).");
    tokio::select! {
        event = events_rx.recv() => println!("Engine event: {:?}", event),
        _ = tokio::signal::ctrl_c() => println!("Interrupted."),
    }

    engine.release().await?;
    println!("Released.");
    Ok(())
}
