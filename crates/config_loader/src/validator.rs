//! Configuration validation
//!
//! Rules:
//! - input path not empty
//! - fps > 0
//! - synthetic stream has a non-empty canvas and a block that fits inside it
//! - pixelate grid >= 1
//! - reorder buffer bound, when set, > 0
//! - file presenter has an output directory

use contracts::{ContractError, InputKind, PresenterKind, RedactionBlueprint};

/// Validate a RedactionBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RedactionBlueprint) -> Result<(), ContractError> {
    validate_input(blueprint)?;
    validate_pipeline(blueprint)?;
    validate_redaction(blueprint)?;
    validate_output(blueprint)?;
    Ok(())
}

fn validate_input(blueprint: &RedactionBlueprint) -> Result<(), ContractError> {
    let input = &blueprint.input;

    if input.path.trim().is_empty() {
        return Err(ContractError::config_validation(
            "input.path",
            "input path cannot be empty",
        ));
    }

    if input.fps.is_nan() || input.fps <= 0.0 {
        return Err(ContractError::config_validation(
            "input.fps",
            format!("fps must be > 0, got {}", input.fps),
        ));
    }

    if input.kind == InputKind::Synthetic {
        let synthetic = &input.synthetic;
        if synthetic.width == 0 || synthetic.height == 0 {
            return Err(ContractError::config_validation(
                "input.synthetic",
                format!(
                    "canvas must be non-empty, got {}x{}",
                    synthetic.width, synthetic.height
                ),
            ));
        }
        if synthetic.block_size == 0
            || synthetic.block_size > synthetic.width
            || synthetic.block_size > synthetic.height
        {
            return Err(ContractError::config_validation(
                "input.synthetic.block_size",
                format!(
                    "block_size ({}) must be in 1..={}",
                    synthetic.block_size,
                    synthetic.width.min(synthetic.height)
                ),
            ));
        }
    }

    Ok(())
}

fn validate_pipeline(blueprint: &RedactionBlueprint) -> Result<(), ContractError> {
    if blueprint.pipeline.max_buffered == Some(0) {
        return Err(ContractError::config_validation(
            "pipeline.max_buffered",
            "max_buffered must be > 0 when set",
        ));
    }
    Ok(())
}

fn validate_redaction(blueprint: &RedactionBlueprint) -> Result<(), ContractError> {
    if blueprint.redaction.pixelate_grid == 0 {
        return Err(ContractError::config_validation(
            "redaction.pixelate_grid",
            "pixelate_grid must be >= 1",
        ));
    }
    if blueprint.redaction.text_scale == 0 {
        return Err(ContractError::config_validation(
            "redaction.text_scale",
            "text_scale must be >= 1",
        ));
    }
    Ok(())
}

fn validate_output(blueprint: &RedactionBlueprint) -> Result<(), ContractError> {
    let output = &blueprint.output;
    if output.presenter == PresenterKind::File && output.directory.is_none() {
        return Err(ContractError::config_validation(
            "output.directory",
            "file presenter requires an output directory",
        ));
    }
    Ok(())
}
