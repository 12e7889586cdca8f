//! Ricochet command-line entry point
//!
//! Fires one payload into a scene and prints the shot record as JSON.
//!
//! Usage: `ricochet <scene.json> <payload.json> [x y direction]`
//! Set `RICOCHET_CONFIG` to an engine config file to override defaults.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), ricochet::EngineError> {
    use std::sync::Arc;

    use glam::DVec2;
    use ricochet::net::{BroadcastMode, Broadcaster, LoopbackTransport};
    use ricochet::{BallisticExecutor, EngineConfig, FireRequest, ObstacleSnapshot, Payload};

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: ricochet <scene.json> <payload.json> [x y direction]");
        std::process::exit(2);
    }

    let config = match std::env::var("RICOCHET_CONFIG") {
        Ok(path) => EngineConfig::load(path)?,
        Err(_) => EngineConfig::default(),
    };
    let scene = ObstacleSnapshot::from_json_str(&std::fs::read_to_string(&args[0])?)?;
    let payload = Payload::from_json_str(&std::fs::read_to_string(&args[1])?)?;

    let number = |i: usize| -> Result<f64, ricochet::EngineError> {
        match args.get(i) {
            Some(s) => s.parse().map_err(|_| {
                ricochet::EngineError::InvalidConfig(format!("'{s}' is not a number"))
            }),
            None => Ok(0.0),
        }
    };
    let source = DVec2::new(number(2)?, number(3)?);
    let direction = number(4)?;

    log::info!(
        "Firing '{}' from ({}, {}) at {}° into {} bodies, {} barriers, {} areas",
        payload.name,
        source.x,
        source.y,
        direction,
        scene.bodies.len(),
        scene.barriers.len(),
        scene.areas.len()
    );

    let executor = BallisticExecutor::builder()
        .config(config)
        .obstacles(Arc::new(scene))
        .build()?;
    let shot = executor.fire(FireRequest::new(source, direction, payload, "cli"));

    let broadcaster = Broadcaster::new(LoopbackTransport::new(), BroadcastMode::Authoritative);
    let report = broadcaster.broadcast(&shot);
    log::info!("Broadcast: {} sent, {} dropped", report.sent, report.dropped);

    println!("{}", serde_json::to_string_pretty(&shot)?);
    Ok(())
}
