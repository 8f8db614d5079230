//! Verify command: score a forecast document against an observation.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use zephyr_grid::{GriddedField, Threshold};
use zephyr_verify::{ScoreKind, Truth, score, to_json};

use crate::cli::VerifyArgs;
use crate::convert;
use crate::document::read_field;

/// Run the verification scorer and print or write its JSON.
pub fn run(args: VerifyArgs) -> Result<()> {
    let _cmd = info_span!("verify").entered();
    let kind = convert::parse_score(&args.score, args.bins)?;

    let forecast = read_field(&args.forecast)?;
    let observation = read_field(&args.observation)?;
    let truth = build_truth(observation, kind, args.threshold, &args.comparator)?;

    let result = score(&forecast, &truth, kind).context("scoring failed")?;
    let json = to_json(&result)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("failed to write score: {}", path.display()))?;
            info!(path = %path.display(), "score written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Rank histograms compare raw values; probability scores need binary
/// outcomes, either given directly or derived with `--threshold`.
fn build_truth(
    observation: GriddedField,
    kind: ScoreKind,
    threshold: Option<f64>,
    comparator: &str,
) -> Result<Truth> {
    if kind == ScoreKind::RankHistogram {
        return Ok(Truth::Values(observation));
    }
    Ok(match threshold {
        Some(value) => {
            let t = Threshold::new(value, convert::parse_comparator(comparator)?)
                .context("invalid --threshold")?;
            Truth::Continuous(observation, t)
        }
        None => Truth::Binary(observation),
    })
}
