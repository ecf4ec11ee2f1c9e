//! askcmd - ask a local model for one shell command.
//!
//! Checks that Ollama is installed, running and has the model, reads a
//! natural-language request, asks the model for a single command, validates
//! its shape and copies it to the clipboard. The command is never executed.

mod app;
mod clipboard;
mod config;
mod env;
mod generate;
mod input;
mod probe;
mod provision;
mod validate;

#[cfg(test)]
mod testing;

use anyhow::{anyhow, Context, Result};
use app::{Outcome, RunOptions, Session};
use clap::{Parser, Subcommand};
use crossterm::tty::IsTty;
use env::{Environment, SystemEnvironment};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "askcmd")]
#[command(author, version, about = "Ask a local Ollama model for one shell command")]
#[command(long_about = "Reads a natural-language request, asks a local Ollama model for a single \
shell command and copies it to the clipboard.\n\nThe command is printed and copied, never run.")]
struct Cli {
    /// Request to turn into a command (read from stdin when omitted)
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Override the model from the config file
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Pull a missing model without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print the command without copying it
    #[arg(long)]
    no_copy: bool,

    /// Log debug output to stderr
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that Ollama is installed, running and has the model
    Check,
    /// Manage Ollama models (list, pull)
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Open configuration file in $EDITOR
    Config,
}

#[derive(Subcommand)]
enum ModelsAction {
    /// List locally available models
    List,
    /// Pull/download a model from Ollama registry
    Pull {
        /// Model name (e.g., qwen2.5-coder:3b, llama3.2:3b)
        model: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let env = SystemEnvironment::new()?;
    let mut stdout = std::io::stdout();

    match cli.command {
        // Never parses the file, so a broken config can still be edited.
        Some(Commands::Config) => {
            let path = config::Config::config_path()?;
            handle_config(&env, &path, &mut stdout).await
        }
        Some(Commands::Check) => {
            let (config, model) = load_config(cli.model)?;
            handle_check(&env, &config, &model, &mut stdout).await
        }
        Some(Commands::Models { action }) => {
            let (config, _) = load_config(cli.model)?;
            handle_models(&env, &config, &action, &mut stdout).await
        }
        None => {
            let (config, model) = load_config(cli.model)?;
            let options = RunOptions {
                query: cli.query,
                assume_yes: cli.yes,
                no_copy: cli.no_copy,
            };
            handle_query(&env, &config, &model, &options).await
        }
    }
}

/// Log to stderr, honouring `RUST_LOG` when set.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "askcmd=debug,reqwest=warn"
    } else {
        "askcmd=warn,reqwest=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file and pick the model, `--model` winning.
fn load_config(model: Option<String>) -> Result<(config::Config, String)> {
    let config = config::Config::load().context("Failed to load configuration")?;
    let model = model.unwrap_or_else(|| config.model.clone());
    debug!("Using model {} via {}", model, config.host);
    Ok((config, model))
}

/// Handle query mode.
///
/// Precondition failures and a declined pull exit normally; generation and
/// pull failures exit with status 1.
async fn handle_query(
    env: &SystemEnvironment,
    config: &config::Config,
    model: &str,
    options: &RunOptions,
) -> Result<()> {
    let client = generate::OllamaClient::new(config).context("Failed to create HTTP client")?;
    let mut lines = input::LineReader::stdin();
    let mut stdout = std::io::stdout();
    let styled = stdout.is_tty();

    let mut session = Session {
        env,
        client: &client,
        lines: &mut lines,
        out: &mut stdout,
        config,
        styled,
    };

    match session.run(model, options).await {
        Ok(Outcome::Command { command, copied }) => {
            debug!("Done: {:?} (copied: {})", command, copied);
            Ok(())
        }
        Ok(Outcome::Aborted(reason)) => {
            debug!("Run aborted: {:?}", reason);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run the preconditions and report each one.
async fn handle_check(
    env: &dyn Environment,
    config: &config::Config,
    model: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let result = probe::preflight(env, config, model).await;

    let mark = |ok: bool| if ok { "ok" } else { "missing" };
    writeln!(out, "Ollama binary ({}): {}", config.binary, mark(result.binary))?;
    if result.binary {
        writeln!(out, "Ollama API ({}): {}", config.host, mark(result.api))?;
    }
    if result.api {
        writeln!(out, "Model {}: {}", model, mark(result.model))?;
    }

    if result.ready() {
        writeln!(out, "\nReady.")?;
    } else if !result.binary {
        writeln!(out, "\nInstall Ollama with: curl -fsSL https://ollama.com/install.sh | sh")?;
    } else if !result.api {
        writeln!(out, "\nStart Ollama with: {} serve", config.binary)?;
    } else {
        writeln!(out, "\nPull the model with: askcmd models pull {}", model)?;
    }
    Ok(())
}

/// Handle models subcommand by handing the terminal to the Ollama binary.
async fn handle_models(
    env: &dyn Environment,
    config: &config::Config,
    action: &ModelsAction,
    out: &mut dyn Write,
) -> Result<()> {
    if !probe::is_binary_installed(env, config) {
        return Err(anyhow!(
            "{} not found on PATH. Install it with: curl -fsSL https://ollama.com/install.sh | sh",
            config.binary
        ));
    }

    let exit = match action {
        ModelsAction::List => env.run_streaming(&config.binary, &["list"]).await?,
        ModelsAction::Pull { model } => {
            writeln!(out, "Pulling model: {}", model)?;
            out.flush()?;
            env.run_streaming(&config.binary, &["pull", model.as_str()])
                .await?
        }
    };

    if !exit.success() {
        return Err(anyhow!("{} exited with {}", config.binary, exit));
    }
    Ok(())
}

/// Handle the config command: create `path` if missing, then open it in
/// `$EDITOR`. The existing file is not parsed.
async fn handle_config(env: &dyn Environment, path: &Path, out: &mut dyn Write) -> Result<()> {
    if !path.exists() {
        config::Config::default().save_to(path)?;
        writeln!(out, "Created default config at {}", path.display())?;
    }

    let editor = env.var("EDITOR").unwrap_or_else(|| "vi".to_string());
    let path = path.to_string_lossy().into_owned();
    let exit = env
        .run_streaming(&editor, &[path.as_str()])
        .await
        .context("Failed to open editor")?;

    if !exit.success() {
        warn!("Editor exited with {}", exit);
    }

    Ok(())
}
