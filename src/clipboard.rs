//! Copy the generated command to the system clipboard.
//!
//! There is no clipboard API in std, so this pipes the text into whichever
//! platform utility is installed.

use crate::env::Environment;
use anyhow::{anyhow, Result};
use tracing::debug;

/// A clipboard utility and the arguments that make it read stdin.
type Backend = (&'static str, &'static [&'static str]);

const NO_ARGS: &[&str] = &[];

#[cfg(target_os = "macos")]
fn candidates(_env: &dyn Environment) -> Vec<Backend> {
    vec![("pbcopy", NO_ARGS)]
}

#[cfg(target_os = "windows")]
fn candidates(_env: &dyn Environment) -> Vec<Backend> {
    vec![("clip", NO_ARGS)]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn candidates(env: &dyn Environment) -> Vec<Backend> {
    let mut backends: Vec<Backend> = Vec::new();
    if env.var("WAYLAND_DISPLAY").is_some() {
        backends.push(("wl-copy", NO_ARGS));
    }
    backends.push(("xclip", &["-selection", "clipboard"]));
    backends.push(("xsel", &["--clipboard", "--input"]));
    backends
}

/// Write `text` to the clipboard with the first available utility.
pub async fn publish(env: &dyn Environment, text: &str) -> Result<()> {
    let backends = candidates(env);
    let (program, args) = backends
        .iter()
        .find(|(program, _)| env.resolve_binary(program).is_some())
        .ok_or_else(|| {
            let names: Vec<_> = backends.iter().map(|(program, _)| *program).collect();
            anyhow!("no clipboard utility found (tried {})", names.join(", "))
        })?;

    debug!("Copying to clipboard with {}", program);
    let exit = env.run_with_stdin(program, args, text).await?;
    if !exit.success() {
        return Err(anyhow!("{} failed with {}", program, exit));
    }
    Ok(())
}
