//! Offer to pull a missing model.

use crate::config::Config;
use crate::env::Environment;
use crate::input::LineSource;
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use tracing::info;

/// What happened when the model was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Pulled,
    Declined,
}

/// Whether an answer to a y/n question is a yes.
///
/// Only the first word counts, and only an exact `y` or `Y`.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.split_whitespace().next(), Some("y" | "Y"))
}

/// Tell the user how to pull `model`, ask whether to do it now, and pull if so.
///
/// With `assume_yes` the question is skipped. The pull runs attached to the
/// terminal so Ollama's own progress output is shown.
pub async fn prompt_and_pull(
    env: &dyn Environment,
    lines: &mut dyn LineSource,
    out: &mut dyn Write,
    config: &Config,
    model: &str,
    assume_yes: bool,
) -> Result<PullOutcome> {
    writeln!(out, "Required model not found. Pull it with:")?;
    writeln!(out, "{} pull {}", config.binary, model)?;

    if !assume_yes {
        write!(out, "Do you want to pull the model now? (y/n): ")?;
        out.flush()?;

        let answer = lines.read_line().await?.unwrap_or_default();
        if !is_affirmative(&answer) {
            info!("Pull of {} declined", model);
            return Ok(PullOutcome::Declined);
        }
    }

    writeln!(out, "Pulling {} model...", model)?;
    out.flush()?;

    let exit = env
        .run_streaming(&config.binary, &["pull", model])
        .await
        .with_context(|| format!("Error pulling model {}", model))?;
    if !exit.success() {
        return Err(anyhow!(
            "Error pulling model {}: `{} pull {}` failed with {}",
            model,
            config.binary,
            model,
            exit
        ));
    }

    writeln!(out, "Model successfully pulled!")?;
    Ok(PullOutcome::Pulled)
}
