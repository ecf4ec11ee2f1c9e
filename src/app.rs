//! One askcmd run, from the precondition checks to the clipboard.

use crate::clipboard;
use crate::config::Config;
use crate::env::Environment;
use crate::generate::{self, InferenceClient};
use crate::input::{self, LineSource};
use crate::probe;
use crate::provision::{self, PullOutcome};
use anyhow::{Context, Result};
use crossterm::style::{style, StyledContent, Stylize};
use std::io::Write;
use tracing::{info, warn};

/// Why a run stopped before producing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    BinaryMissing,
    ApiUnreachable,
    PullDeclined,
    NoPrompt,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Command { command: String, copied: bool },
    Aborted(Abort),
}

/// Per-run switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Request given on the command line instead of stdin.
    pub query: Option<String>,
    /// Pull a missing model without asking.
    pub assume_yes: bool,
    /// Print the command but leave the clipboard alone.
    pub no_copy: bool,
}

/// Everything a run talks to.
pub struct Session<'a> {
    pub env: &'a dyn Environment,
    pub client: &'a dyn InferenceClient,
    pub lines: &'a mut dyn LineSource,
    pub out: &'a mut dyn Write,
    pub config: &'a Config,
    /// Emit ANSI styling; off when `out` is not a terminal.
    pub styled: bool,
}

fn paint(enabled: bool, content: StyledContent<String>) -> String {
    if enabled {
        content.to_string()
    } else {
        content.content().clone()
    }
}

impl Session<'_> {
    /// Run the whole flow for `model`.
    ///
    /// Missing preconditions and a declined pull are reported to the user and
    /// returned as [`Outcome::Aborted`]. A failed pull, a failed inference
    /// call and a rejected reply are errors.
    pub async fn run(&mut self, model: &str, options: &RunOptions) -> Result<Outcome> {
        if let Some(abort) = self.ensure_ready(model, options.assume_yes).await? {
            return Ok(Outcome::Aborted(abort));
        }

        let prompt = match &options.query {
            Some(query) => Some(query.clone()),
            None => {
                writeln!(self.out, "Enter your prompt:")?;
                self.out.flush()?;
                input::read_prompt(&mut *self.lines).await?
            }
        };
        let Some(prompt) = prompt else {
            writeln!(self.out, "No prompt given; nothing to do.")?;
            return Ok(Outcome::Aborted(Abort::NoPrompt));
        };

        info!("Generating command with {}", model);
        let command = match generate::generate(self.client, self.config, model, &prompt).await {
            Ok(command) => command,
            Err(e) => {
                if let Some(raw) = e.raw_reply() {
                    writeln!(self.out, "Model replied (not copied):\n{}", raw.trim())?;
                }
                return Err(e).context("Error generating command");
            }
        };

        let shown = paint(self.styled, style(command.clone()).bold());
        writeln!(self.out, "🔧 Command: {}", shown)?;

        let copied = if options.no_copy {
            false
        } else {
            match clipboard::publish(self.env, &command).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Clipboard write failed: {:#}", e);
                    let warning = format!("Could not copy to clipboard: {:#}", e).yellow();
                    writeln!(self.out, "{}", paint(self.styled, warning))?;
                    false
                }
            }
        };

        writeln!(self.out, "Model Used:  {}", model)?;
        if copied {
            let done = "✅ Command copied to clipboard. Paste it with Ctrl+Shift+V or Cmd+V."
                .to_string()
                .green();
            writeln!(self.out, "{}", paint(self.styled, done))?;
        }

        Ok(Outcome::Command { command, copied })
    }

    /// Check the preconditions, pulling the model if the user agrees.
    async fn ensure_ready(&mut self, model: &str, assume_yes: bool) -> Result<Option<Abort>> {
        if !probe::is_binary_installed(self.env, self.config) {
            writeln!(self.out, "Ollama is not installed. Install it with:")?;
            writeln!(self.out, "curl -fsSL https://ollama.com/install.sh | sh")?;
            return Ok(Some(Abort::BinaryMissing));
        }

        if !probe::is_api_reachable(self.env, self.config).await {
            writeln!(
                self.out,
                "Ollama API is not reachable at {}. Make sure Ollama is running.",
                self.config.host
            )?;
            writeln!(
                self.out,
                "You can start it by running '{} serve' in a terminal.",
                self.config.binary
            )?;
            return Ok(Some(Abort::ApiUnreachable));
        }

        if !probe::is_model_available(self.env, self.config, model).await {
            let outcome = provision::prompt_and_pull(
                self.env,
                &mut *self.lines,
                &mut *self.out,
                self.config,
                model,
                assume_yes,
            )
            .await?;
            if outcome == PullOutcome::Declined {
                writeln!(self.out, "Model not pulled; nothing to do.")?;
                return Ok(Some(Abort::PullDeclined));
            }
        }

        Ok(None)
    }
}
