//! Fakes shared by the unit tests.

use crate::env::{CapturedOutput, Environment, ProcessExit};
use crate::generate::{InferenceClient, InferenceError};
use crate::input::LineSource;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable stand-in for the process environment.
#[derive(Default)]
pub struct FakeEnvironment {
    pub binaries: HashSet<String>,
    pub vars: HashMap<String, String>,
    /// Captured output keyed by the full command line, e.g. `"ollama list"`.
    pub captured: HashMap<String, CapturedOutput>,
    /// Exit codes for streamed and piped commands, keyed by program name.
    pub exit_codes: HashMap<String, i32>,
    pub reachable: bool,
    pub calls: Mutex<Vec<String>>,
    pub piped: Mutex<Vec<(String, String)>>,
    pub probes: Mutex<Vec<(String, Duration)>>,
}

impl FakeEnvironment {
    /// Ollama installed, serving, with `listing` as the `ollama list` output.
    pub fn ollama_ready(listing: &str) -> Self {
        let mut env = Self {
            reachable: true,
            ..Self::default()
        };
        env.binaries.insert("ollama".to_string());
        env.captured.insert(
            "ollama list".to_string(),
            CapturedOutput {
                exit: ProcessExit { code: Some(0) },
                stdout: listing.to_string(),
            },
        );
        env
    }

    pub fn with_binary(mut self, name: &str) -> Self {
        self.binaries.insert(name.to_string());
        self
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_exit_code(mut self, program: &str, code: i32) -> Self {
        self.exit_codes.insert(program.to_string(), code);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn piped(&self) -> Vec<(String, String)> {
        self.piped.lock().unwrap().clone()
    }

    fn record(&self, program: &str, args: &[&str]) -> String {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());
        line
    }

    fn exit_for(&self, program: &str) -> Result<ProcessExit> {
        if !self.binaries.contains(program) {
            return Err(anyhow!("Failed to start {}", program));
        }
        Ok(ProcessExit {
            code: Some(self.exit_codes.get(program).copied().unwrap_or(0)),
        })
    }
}

#[async_trait]
impl Environment for FakeEnvironment {
    fn resolve_binary(&self, name: &str) -> Option<PathBuf> {
        self.binaries
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }

    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    async fn run_captured(&self, program: &str, args: &[&str]) -> Result<CapturedOutput> {
        let line = self.record(program, args);
        self.captured
            .get(&line)
            .cloned()
            .ok_or_else(|| anyhow!("Failed to run {}", program))
    }

    async fn run_streaming(&self, program: &str, args: &[&str]) -> Result<ProcessExit> {
        self.record(program, args);
        self.exit_for(program)
    }

    async fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<ProcessExit> {
        let line = self.record(program, args);
        self.piped.lock().unwrap().push((line, input.to_string()));
        self.exit_for(program)
    }

    async fn probe_endpoint(&self, url: &str, timeout: Duration) -> bool {
        self.probes.lock().unwrap().push((url.to_string(), timeout));
        self.reachable
    }
}

/// Line source fed from a fixed script.
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Inference client that replays one canned reply and records its calls.
pub struct FakeClient {
    reply: Result<String, String>,
    pub requests: Mutex<Vec<(String, String, f32)>>,
}

impl FakeClient {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, String, f32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for FakeClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, InferenceError> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string(), temperature));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(InferenceError::Status {
                status: 500,
                body: message.clone(),
            }),
        }
    }
}
