//! Access to the process environment.
//!
//! Everything askcmd needs from the outside world that is not the inference
//! call itself goes through [`Environment`]: resolving binaries on `PATH`,
//! reading environment variables, running subprocesses and probing the local
//! HTTP endpoint. Tests substitute a fake so no Ollama install, network or
//! clipboard is needed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// How a subprocess ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl std::fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "termination by signal"),
        }
    }
}

/// Exit status and captured stdout of a subprocess.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub exit: ProcessExit,
    pub stdout: String,
}

/// Capabilities askcmd takes from the process environment.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Resolve an executable on the search path.
    fn resolve_binary(&self, name: &str) -> Option<PathBuf>;

    /// Read an environment variable.
    fn var(&self, key: &str) -> Option<String>;

    /// Run a program and capture its stdout. Stderr is discarded.
    async fn run_captured(&self, program: &str, args: &[&str]) -> Result<CapturedOutput>;

    /// Run a program with the terminal's stdin, stdout and stderr.
    async fn run_streaming(&self, program: &str, args: &[&str]) -> Result<ProcessExit>;

    /// Run a program, write `input` to its stdin and wait for it to exit.
    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &str)
        -> Result<ProcessExit>;

    /// `GET` the URL; true only for a success status within `timeout`.
    async fn probe_endpoint(&self, url: &str, timeout: Duration) -> bool;
}

/// True when `url` points at this machine. Such requests never go through
/// the proxies named in `HTTP_PROXY`/`ALL_PROXY`.
pub fn is_loopback(url: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

/// The real environment of the running process.
pub struct SystemEnvironment {
    /// Honours the proxy environment variables.
    client: Client,
    /// Ignores them, for loopback URLs.
    direct: Client,
}

impl SystemEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .build()
                .context("Failed to create HTTP client")?,
            direct: Client::builder()
                .no_proxy()
                .build()
                .context("Failed to create HTTP client")?,
        })
    }
}

#[async_trait]
impl Environment for SystemEnvironment {
    fn resolve_binary(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    async fn run_captured(&self, program: &str, args: &[&str]) -> Result<CapturedOutput> {
        debug!("Running {} {:?}", program, args);
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", program))?;

        Ok(CapturedOutput {
            exit: ProcessExit {
                code: output.status.code(),
            },
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    async fn run_streaming(&self, program: &str, args: &[&str]) -> Result<ProcessExit> {
        debug!("Running {} {:?} attached to the terminal", program, args);
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Failed to run {}", program))?;

        Ok(ProcessExit {
            code: status.code(),
        })
    }

    async fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<ProcessExit> {
        debug!("Piping {} bytes into {} {:?}", input.len(), program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .with_context(|| format!("Failed to write to {}", program))?;
            // Dropping stdin closes the pipe so the program sees EOF.
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for {}", program))?;

        Ok(ProcessExit {
            code: status.code(),
        })
    }

    async fn probe_endpoint(&self, url: &str, timeout: Duration) -> bool {
        let client = if is_loopback(url) {
            &self.direct
        } else {
            &self.client
        };
        match client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                debug!("Probe {} answered {}", url, response.status());
                response.status().is_success()
            }
            Err(e) => {
                debug!("Probe {} failed: {}", url, e);
                false
            }
        }
    }
}
