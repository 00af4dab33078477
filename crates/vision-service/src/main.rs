use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing::info;
use vision_service::engine::stub::{ScriptedOcr, StubDetector};
use vision_service::{EngineContext, VisionConfig, VisionPipeline};

fn main() -> Result<()> {
    telemetry::init_with_service("vision-service");

    let config = VisionConfig::from_env()?;
    info!(
        max_candidates = config.max_candidates,
        whitelist = %config.char_whitelist,
        "vision service configuration loaded"
    );

    let engines = Arc::new(build_engines());
    let pipeline = VisionPipeline::new(config, engines);

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--health") {
        println!("{}", serde_json::to_string_pretty(&pipeline.health())?);
        return Ok(());
    }

    if args.is_empty() {
        anyhow::bail!("usage: vision-service [--health] <image>...");
    }

    for path in &args {
        let bytes =
            std::fs::read(path).with_context(|| format!("could not read image {path}"))?;
        let outcome = pipeline.process(&bytes);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    Ok(())
}

/// Build the engine context once at process start. Real engines are wired
/// in by the embedding deployment; the stubs are available for demo runs.
fn build_engines() -> EngineContext {
    let use_stubs = env::var("VISION_STUB_ENGINES")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if use_stubs {
        info!("registering stub detector and OCR engines");
        return EngineContext::new(
            Some(Arc::new(StubDetector::vehicle("car", 0.9))),
            Some(Arc::new(ScriptedOcr::new())),
        );
    }

    info!("no external engines configured, running in degraded mode");
    EngineContext::disconnected()
}
