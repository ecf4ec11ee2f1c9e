//! Structural validation of model output.
//!
//! The model is asked for one raw shell command, but small models still wrap
//! answers in code fences or append comments. This module strips the fences
//! and rejects anything that is not shaped like a single command line. It is
//! an allow-list on shape only: flags, targets and semantics are not vetted.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

const FENCE: &str = "```";
const BASH_FENCE: &str = "```bash";

/// Why a completion was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("output contains markdown or comments")]
    ContainsMarkdownOrComment,
    #[error("output contains multiple lines")]
    MultipleLines,
    #[error("output does not look like a valid shell command")]
    NotShapedLikeCommand,
}

/// Validate a raw completion and return the cleaned command.
pub fn validate(raw: &str) -> Result<String, ValidationError> {
    let output = strip_fences(raw);

    if output.contains(FENCE) || output.contains('#') {
        return Err(ValidationError::ContainsMarkdownOrComment);
    }

    if output.contains('\n') {
        return Err(ValidationError::MultipleLines);
    }

    if !command_shape().is_match(output) {
        return Err(ValidationError::NotShapedLikeCommand);
    }

    Ok(output.to_string())
}

/// Trim, drop an opening "```bash" and then an opening "```", drop one
/// closing fence, trim again.
fn strip_fences(raw: &str) -> &str {
    let mut output = raw.trim();
    output = output.strip_prefix(BASH_FENCE).unwrap_or(output);
    output = output.strip_prefix(FENCE).unwrap_or(output);
    output = output.strip_suffix(FENCE).unwrap_or(output);
    output.trim()
}

/// First token from a narrow alphabet, then any tokens separated by ASCII
/// whitespace. Vertical tab and Unicode spaces are not separators.
fn command_shape() -> &'static Regex {
    static COMMAND_RE: OnceLock<Regex> = OnceLock::new();
    COMMAND_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9/\-_.:]+(?:[\t\n\x0C\r ]+[^\t\n\x0C\r ]+)*$")
            .expect("valid command shape regex")
    })
}
