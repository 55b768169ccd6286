//! Subprocess execution for the git gateway.
//!
//! A run resolves only after the process exited and both of its output
//! streams reported end-of-stream, so trailing buffered lines are never lost.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedSender};

use super::GitError;

/// Which stream of the child process a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Exit status of a finished command. `code` is `None` when the process was
/// terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: Option<i32>,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one version-control subcommand to completion, reporting each output
/// line through `on_line` in arrival order.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        args: &[String],
        on_line: &mut (dyn for<'l> FnMut(&'l str, Stream) + Send),
    ) -> Result<ExitInfo, GitError>;
}

/// Spawns `<program> <args>` in a fixed working directory.
pub struct ProcessRunner {
    program: String,
    workdir: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: &str, workdir: &Path) -> Self {
        Self {
            program: program.to_string(),
            workdir: workdir.to_path_buf(),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        args: &[String],
        on_line: &mut (dyn for<'l> FnMut(&'l str, Stream) + Send),
    ) -> Result<ExitInfo, GitError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GitError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(GitError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(GitError::MissingPipe("stderr"))?;

        // The channel closes once both pumps hit EOF and drop their senders.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let out_task = tokio::spawn(pump(stdout, Stream::Stdout, tx.clone()));
        let err_task = tokio::spawn(pump(stderr, Stream::Stderr, tx));

        while let Some((line, stream)) = rx.recv().await {
            on_line(&line, stream);
        }

        out_task.await??;
        err_task.await??;
        let status = child.wait().await?;

        Ok(ExitInfo {
            code: status.code(),
        })
    }
}

/// Forward every line of `reader` to `tx`. Bytes are decoded lossily since
/// blame output embeds file contents in arbitrary encodings.
async fn pump<R>(reader: R, stream: Stream, tx: UnboundedSender<(String, Stream)>) -> io::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if tx.send((line.to_string(), stream)).is_err() {
            return Ok(());
        }
    }
}
