//! Drowsiness monitor - replays recorded detector output through the engine

use alerting::AlertSinks;
use drowsiness_engine::{
    init_logging, replay, DrowsinessEngine, EngineSettings, SimulatedDevices,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(recording) = args.next().map(PathBuf::from) else {
        eprintln!("usage: drowsiness-monitor <recording.jsonl> [settings-file]");
        std::process::exit(2);
    };
    let settings_path = args.next().map(PathBuf::from);

    let settings = EngineSettings::load(settings_path.as_deref())?;
    init_logging(&settings.logging)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let devices = Arc::new(SimulatedDevices::default());
    let engine = Arc::new(DrowsinessEngine::new(
        settings.detection,
        settings.alert,
        AlertSinks::from_shared(devices.clone()),
    )?);

    let frames = replay::load_frames(&recording).await?;

    tokio::select! {
        _ = replay::replay(engine.clone(), frames) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping replay"),
    }

    engine.shutdown().await;

    let stats = engine.stats();
    info!(
        admitted = stats.admitted,
        dropped = stats.dropped,
        plays = devices.plays(),
        pulses = devices.pulses(),
        volume = devices.volume_level(),
        "Monitor finished"
    );

    Ok(())
}
