//! Line-oriented user input.
//!
//! Both interactive reads (the pull confirmation and the request itself) go
//! through one [`LineSource`], so nothing typed ahead is lost between them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Yields one line of user input per call.
#[async_trait]
pub trait LineSource: Send {
    /// Wait for the next line. The trailing newline is kept; `None` on EOF.
    async fn read_line(&mut self) -> Result<Option<String>>;
}

/// Line source over any buffered async reader.
pub struct LineReader<R> {
    reader: R,
}

impl<R> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl LineReader<BufReader<Stdin>> {
    /// Line source over the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> LineSource for LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .context("Failed to read from standard input")?;
        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}

/// Read the user's request.
///
/// The line is returned as typed, newline included; it is embedded in the
/// prompt template verbatim. Blank input counts as no request.
pub async fn read_prompt(lines: &mut dyn LineSource) -> Result<Option<String>> {
    Ok(lines
        .read_line()
        .await?
        .filter(|line| !line.trim().is_empty()))
}
