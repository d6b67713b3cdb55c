//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{PresenterKind, RedactionBlueprint};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args)?;
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after applying CLI overrides")?;

    info!(
        input = %blueprint.input.path,
        kind = ?blueprint.input.kind,
        presenter = ?blueprint.output.presenter,
        channel_capacity = blueprint.pipeline.channel_capacity,
        protocol = ?blueprint.pipeline.protocol,
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                frames_rendered = stats.sink.frames_rendered,
                duration_secs = stats.duration.as_secs_f64(),
                fps = format!("{:.2}", stats.fps()),
                "Pipeline completed successfully"
            );
            stats.print_summary();
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Motion Redact finished");
    Ok(())
}

fn load_blueprint(args: &RunArgs) -> Result<RedactionBlueprint> {
    let Some(path) = &args.config else {
        info!("No configuration file given, using defaults");
        return Ok(RedactionBlueprint::default());
    };

    info!(config = %path.display(), "Loading configuration");
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// CLI flags win over file values
fn apply_overrides(blueprint: &mut RedactionBlueprint, args: &RunArgs) {
    if let Some(ref path) = args.path {
        blueprint.input.path = path.clone();
    }
    if let Some(source) = args.source {
        blueprint.input.kind = source.into();
    }
    if let Some(max_frames) = args.max_frames {
        blueprint.input.max_frames = Some(max_frames);
    }
    if let Some(capacity) = args.channel_capacity {
        blueprint.pipeline.channel_capacity = capacity;
    }
    if let Some(protocol) = args.protocol {
        blueprint.pipeline.protocol = protocol.into();
    }
    if let Some(min_area) = args.min_area {
        blueprint.redaction.min_detection_area = min_area;
    }
    if args.show_boxes {
        blueprint.redaction.show_boxes = true;
    }
    if let Some(ref output) = args.output {
        blueprint.output.directory = Some(output.clone());
        blueprint.output.presenter = PresenterKind::File;
    }
    if let Some(presenter) = args.presenter {
        blueprint.output.presenter = presenter.into();
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
