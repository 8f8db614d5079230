//! Run command: calibrate, neighbourhood-process and blend the configured
//! sources into one probability field.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use zephyr_blend::blend;
use zephyr_calibrate::{CalibrationConfig, CalibrationSet, calibrate_field};
use zephyr_grid::{GriddedField, Threshold};
use zephyr_neighbourhood::{Kernel, neighbourhood_probability, neighbourhood_probability_chunked};

use crate::cli::RunArgs;
use crate::config::PipelineConfig;
use crate::convert;
use crate::document::{read_field, write_field};

/// Run the pipeline described by the config file.
pub fn run(args: RunArgs) -> Result<()> {
    let _cmd = info_span!("run").entered();
    // Step 1: Load project TOML
    let toml_str = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read config file: {}", args.config.display()))?;
    let config: PipelineConfig = toml::from_str(&toml_str).context("failed to parse TOML config")?;
    let base_dir = args.config.parent().unwrap_or(Path::new("."));

    // Step 2: Resolve output path
    let output = match (args.output, &config.output.path) {
        (Some(p), _) => p,
        (None, Some(p)) => resolve(base_dir, p),
        (None, None) => bail!("no output path: set [output].path in config or use --output"),
    };

    // Step 3: Run the stages
    let field = execute(&config, base_dir)?;

    // Step 4: Write the result
    write_field(&output, &field)?;
    info!(path = %output.display(), "output written");
    Ok(())
}

/// Relative paths in the config are taken from the config file's directory.
fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Calibration stage: shared table plus its config.
struct Calibration {
    set: CalibrationSet,
    config: CalibrationConfig,
}

/// Runs every stage and returns the final probability field.
///
/// Each source is calibrated (when configured) while it still has its
/// realization axis, then turned into a neighbourhood probability. Two or
/// more sources are blended; a single source is returned as is.
pub fn execute(config: &PipelineConfig, base_dir: &Path) -> Result<GriddedField> {
    if config.sources.is_empty() {
        bail!("no sources: add at least one [[source]] table");
    }

    let kernel = convert::build_kernel(&config.neighbourhood)?;
    let threshold = convert::build_threshold(&config.neighbourhood)?;
    let kind = convert::parse_blend_kind(&config.blend.kind)?;
    let weights = convert::build_source_weights(&config.sources, config.weights.as_ref())?;
    let calibration = config
        .calibration
        .as_ref()
        .map(|c| -> Result<Calibration> {
            Ok(Calibration {
                set: CalibrationSet::shared(convert::build_calibration_table(c)?),
                config: convert::build_calibration_config(c)?,
            })
        })
        .transpose()?;

    let mut probabilities = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let path = resolve(base_dir, &source.path);
        let _src = info_span!("source", path = %path.display()).entered();
        let field = read_field(&path)?;
        let p = process_source(
            field,
            calibration.as_ref(),
            &kernel,
            threshold,
            config.neighbourhood.chunk_rows,
        )
        .with_context(|| format!("failed to process source: {}", path.display()))?;
        probabilities.push(p);
    }

    let result = if probabilities.len() == 1 {
        info!("single source, skipping blend");
        probabilities.remove(0)
    } else {
        info!(n_sources = probabilities.len(), ?kind, "blending sources");
        blend(&probabilities, &weights, kind).context("blend failed")?
    };

    Ok(match &config.output.name {
        Some(name) => result.renamed(name.clone()),
        None => result,
    })
}

fn process_source(
    field: GriddedField,
    calibration: Option<&Calibration>,
    kernel: &Kernel,
    threshold: Threshold,
    chunk_rows: Option<usize>,
) -> Result<GriddedField> {
    let field = match calibration {
        Some(c) => {
            let calibrated =
                calibrate_field(&field, &c.set, &c.config).context("calibration failed")?;
            info!(
                n_clamped = calibrated.n_clamped(),
                n_short_columns = calibrated.n_short_columns(),
                "members calibrated"
            );
            calibrated.into_field()
        }
        None => field,
    };

    let probability = match chunk_rows {
        Some(rows) => neighbourhood_probability_chunked(&field, kernel, threshold, rows),
        None => neighbourhood_probability(&field, kernel, threshold),
    }
    .context("neighbourhood processing failed")?;
    info!(
        name = probability.name(),
        n_valid = probability.n_valid(),
        "neighbourhood probability computed"
    );
    Ok(probability)
}
