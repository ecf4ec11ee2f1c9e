//! Preconditions for a run: Ollama installed, serving, and the model pulled.
//!
//! Every probe answers with a plain boolean. Failures of the probe itself
//! (a missing binary, a refused connection, a crashing `ollama list`) count
//! as "no" rather than as errors.

use crate::config::Config;
use crate::env::Environment;
use tracing::debug;

/// Result of running all probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preflight {
    pub binary: bool,
    pub api: bool,
    pub model: bool,
}

impl Preflight {
    pub fn ready(&self) -> bool {
        self.binary && self.api && self.model
    }
}

/// Whether the Ollama executable resolves on `PATH`.
pub fn is_binary_installed(env: &dyn Environment, config: &Config) -> bool {
    match env.resolve_binary(&config.binary) {
        Some(path) => {
            debug!("Found {} at {}", config.binary, path.display());
            true
        }
        None => false,
    }
}

/// Whether the local API answers within the probe timeout.
pub async fn is_api_reachable(env: &dyn Environment, config: &Config) -> bool {
    env.probe_endpoint(&config.tags_url(), config.probe_timeout())
        .await
}

/// Whether `model` shows up in `ollama list`.
///
/// This is a substring match on the listing, so `qwen2.5-coder:3b` is also
/// reported present when only `qwen2.5-coder:3b-instruct` is installed.
pub async fn is_model_available(env: &dyn Environment, config: &Config, model: &str) -> bool {
    match env.run_captured(&config.binary, &["list"]).await {
        Ok(output) if output.exit.success() => output.stdout.contains(model),
        Ok(output) => {
            debug!("{} list failed with {}", config.binary, output.exit);
            false
        }
        Err(e) => {
            debug!("{} list could not run: {:#}", config.binary, e);
            false
        }
    }
}

/// Run the probes in order. Later probes are skipped once one fails.
pub async fn preflight(env: &dyn Environment, config: &Config, model: &str) -> Preflight {
    let binary = is_binary_installed(env, config);
    let api = binary && is_api_reachable(env, config).await;
    let model = api && is_model_available(env, config, model).await;
    Preflight { binary, api, model }
}
