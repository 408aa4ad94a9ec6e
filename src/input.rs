use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::dispatcher::Submitter;
use crate::error::{NotifierError, Result};

/// Reads newline-delimited text and submits every non-empty line.
#[derive(Debug, Clone)]
pub struct LineReader {
    max_line_length: usize,
    echo: bool,
}

impl LineReader {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            echo: false,
        }
    }

    /// Also print each accepted line to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Feed `input` into the pipeline until it is exhausted.
    ///
    /// Returns the number of lines submitted once the stream ends, or once the
    /// pipeline stops accepting. A line longer than the limit, or an unreadable
    /// stream, is an error the caller must treat as fatal.
    pub async fn run<R>(&self, input: R, submitter: Submitter) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = FramedRead::new(input, LinesCodec::new_with_max_length(self.max_line_length));
        let mut submitted = 0u64;

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let echoed = self.echo.then(|| line.clone());

            match submitter.submit(line).await {
                Ok(()) => {
                    submitted += 1;
                    if let Some(line) = echoed {
                        println!("{}", line);
                    }
                }
                Err(NotifierError::Closed) => {
                    tracing::debug!(submitted, "pipeline closed, reader stopping");
                    return Ok(submitted);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(submitted, "end of input");
        Ok(submitted)
    }
}
