//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{InputKind, PresenterKind, RedactionBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    input: String,
    input_kind: String,
    presenter: String,
    channel_capacity: usize,
    protocol: String,
    min_detection_area: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    input: blueprint.input.path.clone(),
                    input_kind: format!("{:?}", blueprint.input.kind),
                    presenter: format!("{:?}", blueprint.output.presenter),
                    channel_capacity: blueprint.pipeline.channel_capacity,
                    protocol: format!("{:?}", blueprint.pipeline.protocol),
                    min_detection_area: blueprint.redaction.min_detection_area,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RedactionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.input.kind == InputKind::ImageSequence
        && !std::path::Path::new(&blueprint.input.path).is_dir()
    {
        warnings.push(format!(
            "input.path '{}' is not a directory - the run will end with zero frames",
            blueprint.input.path
        ));
    }

    if blueprint.output.presenter == PresenterKind::Null {
        warnings.push("output.presenter is 'null' - rendered frames are discarded".to_string());
    }

    if blueprint.output.presenter != PresenterKind::File && blueprint.output.directory.is_some() {
        warnings.push("output.directory is ignored unless output.presenter is 'file'".to_string());
    }

    if blueprint.pipeline.max_buffered.is_some() && blueprint.pipeline.channel_capacity == 0 {
        warnings.push(
            "pipeline.max_buffered is set but channels are unbounded - memory is bounded only at the sink"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Input: {} ({})", summary.input, summary.input_kind);
            println!("  Presenter: {}", summary.presenter);
            println!("  Channel capacity: {}", summary.channel_capacity);
            println!("  Protocol: {}", summary.protocol);
            println!("  Min detection area: {}", summary.min_detection_area);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
