//! Version-control gateway: typed async operations over the `git` command
//! line, executed against one working tree.
//!
//! The working tree is shared mutable state (`checkout` changes what every
//! following `blame` sees), so operations are only reachable through a
//! [`GitSession`], an exclusive handle held for a whole analysis pass.
//! Failures of the external tool are not raised as errors: each operation
//! returns a [`GitOutput`] carrying the best-effort parsed value together
//! with the exit code and the stderr diagnostics.

pub mod blame;
pub mod log;
pub mod runner;
#[cfg(test)]
pub mod testing;

use std::io;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::config::GitSettings;
use crate::fragment::Range;
use blame::{BlameParser, BlameRecord};
use log::{LogParser, LogRecord, parse_git_date};
use runner::{CommandRunner, ExitInfo, ProcessRunner, Stream};

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("child process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("reading command output: {0}")]
    Io(#[from] io::Error),

    #[error("output reader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Stateful consumer of one command's stdout, one instance per invocation.
pub trait LineParser {
    type Output;

    fn read_line(&mut self, line: &str);

    fn finish(self) -> Self::Output;
}

/// Keeps the last non-blank stdout line.
#[derive(Debug, Default)]
struct LastLine(Option<String>);

impl LineParser for LastLine {
    type Output = Option<String>;

    fn read_line(&mut self, line: &str) {
        let line = line.trim();
        if !line.is_empty() {
            self.0 = Some(line.to_string());
        }
    }

    fn finish(self) -> Option<String> {
        self.0
    }
}

/// Ignores stdout, for commands run only for their side effect.
struct Discard;

impl LineParser for Discard {
    type Output = ();

    fn read_line(&mut self, _line: &str) {}

    fn finish(self) {}
}

/// Whether a parsed value holds anything.
pub trait Found {
    fn is_found(&self) -> bool;
}

impl<T> Found for Vec<T> {
    fn is_found(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Found for Option<T> {
    fn is_found(&self) -> bool {
        self.is_some()
    }
}

impl Found for () {
    fn is_found(&self) -> bool {
        false
    }
}

/// How a gateway call ended, separating "legitimately nothing found" from
/// "the tool invocation failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Exit 0 with a non-empty result.
    Success,
    /// Exit 0 with nothing to report.
    Empty,
    /// Non-zero exit, but some output was parsed before it.
    Partial,
    /// Non-zero exit and nothing parsed.
    Failed,
}

/// Result of one gateway call.
#[derive(Debug, Clone)]
pub struct GitOutput<T> {
    pub value: T,
    pub exit: ExitInfo,
    pub diagnostics: Vec<String>,
}

impl<T: Found> GitOutput<T> {
    pub fn completion(&self) -> Completion {
        match (self.exit.success(), self.value.is_found()) {
            (true, true) => Completion::Success,
            (true, false) => Completion::Empty,
            (false, true) => Completion::Partial,
            (false, false) => Completion::Failed,
        }
    }
}

impl<T> GitOutput<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GitOutput<U> {
        GitOutput {
            value: f(self.value),
            exit: self.exit,
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// A repository working tree plus the tool that operates on it.
pub struct Git {
    runner: Box<dyn CommandRunner>,
    trunk: String,
    remote: Option<String>,
    lock: Mutex<()>,
}

impl Git {
    /// Gateway invoking the configured executable in `settings.repository`.
    pub fn open(settings: &GitSettings) -> Self {
        let runner = ProcessRunner::new(&settings.executable, Path::new(&settings.repository));
        Self::with_runner(runner, &settings.trunk, &settings.remote)
    }

    /// Gateway over an arbitrary runner. An empty `remote` means refs are
    /// used unqualified.
    pub fn with_runner(runner: impl CommandRunner + 'static, trunk: &str, remote: &str) -> Self {
        Self {
            runner: Box::new(runner),
            trunk: trunk.to_string(),
            remote: (!remote.is_empty()).then(|| remote.to_string()),
            lock: Mutex::new(()),
        }
    }

    pub fn trunk(&self) -> &str {
        &self.trunk
    }

    /// Acquire exclusive use of the working tree until the session drops.
    pub async fn session(&self) -> GitSession<'_> {
        GitSession {
            git: self,
            _guard: self.lock.lock().await,
        }
    }
}

/// Exclusive handle on a [`Git`] working tree. Commands issued through one
/// session run strictly in the order they are awaited.
pub struct GitSession<'a> {
    git: &'a Git,
    _guard: MutexGuard<'a, ()>,
}

impl GitSession<'_> {
    pub fn trunk(&self) -> &str {
        self.git.trunk()
    }

    /// Switch the working tree to `reference`.
    pub async fn checkout(&mut self, reference: &str) -> Result<GitOutput<()>, GitError> {
        self.run(vec!["checkout".into(), reference.into()], Discard)
            .await
    }

    /// Switch the working tree to the trunk branch.
    pub async fn checkout_trunk(&mut self) -> Result<GitOutput<()>, GitError> {
        let trunk = self.git.trunk.clone();
        self.checkout(&trunk).await
    }

    /// Porcelain blame of `path` at the current HEAD.
    pub async fn blame(&mut self, path: &str) -> Result<GitOutput<Vec<BlameRecord>>, GitError> {
        let args = vec!["blame".into(), "-p".into(), "--".into(), path.into()];
        self.run(args, BlameParser::new()).await
    }

    /// Reverse blame over `base..head`: for each line of `path` as of `base`,
    /// the last commit in the range where the line still existed.
    pub async fn blame_reverse(
        &mut self,
        path: &str,
        base: &str,
        head: &str,
    ) -> Result<GitOutput<Vec<BlameRecord>>, GitError> {
        let args = vec![
            "blame".into(),
            "-p".into(),
            "--reverse".into(),
            format!("{base}..{head}"),
            "--".into(),
            path.into(),
        ];
        self.run(args, BlameParser::new()).await
    }

    /// Commits of `base..head` on the ancestry path, oldest first, optionally
    /// limited to those touching `path`.
    pub async fn reverse_log(
        &mut self,
        path: Option<&str>,
        base: &str,
        head: &str,
    ) -> Result<GitOutput<Vec<LogRecord>>, GitError> {
        let mut args = vec![
            "log".into(),
            "--reverse".into(),
            "--ancestry-path".into(),
            format!("{base}..{head}"),
        ];
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            args.push("--".into());
            args.push(path.into());
        }
        self.run(args, LogParser::new()).await
    }

    /// Commits of `base..head` that touched `lines` of `path`.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn log_lines(
        &mut self,
        path: &str,
        base: &str,
        head: &str,
        lines: Range,
    ) -> Result<GitOutput<Vec<LogRecord>>, GitError> {
        let args = vec![
            "log".into(),
            "--ancestry-path".into(),
            format!("{base}..{head}"),
            "-L".into(),
            format!("{},{}:{path}", lines.start(), lines.end()),
        ];
        self.run(args, LogParser::new()).await
    }

    /// Metadata of a single commit, `None` when git does not know it.
    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn log_commit(&mut self, commit: &str) -> Result<GitOutput<Option<LogRecord>>, GitError> {
        let args = vec!["log".into(), "--date=rfc".into(), "-1".into(), commit.into()];
        let output = self.run(args, LogParser::new()).await?;
        Ok(output.map(|records| records.into_iter().next()))
    }

    /// Merge base of `reference` and the trunk branch, both qualified with the
    /// configured remote.
    pub async fn common_ancestor_with_trunk(
        &mut self,
        reference: &str,
    ) -> Result<GitOutput<Option<String>>, GitError> {
        let qualify = |r: &str| match &self.git.remote {
            Some(remote) => format!("{remote}/{r}"),
            None => r.to_string(),
        };
        let args = vec!["merge-base".into(), qualify(reference), qualify(&self.git.trunk)];
        self.run(args, LastLine::default()).await
    }

    /// Committer date of `commit`.
    pub async fn commit_date(
        &mut self,
        commit: &str,
    ) -> Result<GitOutput<Option<DateTime<FixedOffset>>>, GitError> {
        let args = vec!["show".into(), "-s".into(), "--format=%cD".into(), commit.into()];
        let output = self.run(args, LastLine::default()).await?;
        Ok(output.map(|line| line.as_deref().and_then(parse_git_date)))
    }

    /// Synchronize remote refs and prune stale ones.
    pub async fn fetch_prune(&mut self) -> Result<GitOutput<()>, GitError> {
        self.run(vec!["fetch".into(), "--prune".into()], Discard).await
    }

    async fn run<P>(&mut self, args: Vec<String>, mut parser: P) -> Result<GitOutput<P::Output>, GitError>
    where
        P: LineParser + Send,
        P::Output: Found,
    {
        let command = args.join(" ");
        debug!("git {command}");

        let mut diagnostics = Vec::new();
        let mut on_line = |line: &str, stream: Stream| match stream {
            Stream::Stdout => parser.read_line(line),
            Stream::Stderr => {
                debug!("git {}: {line}", args[0]);
                diagnostics.push(line.to_string());
            }
        };
        let exit = self.git.runner.run(&args, &mut on_line).await?;

        let output = GitOutput {
            value: parser.finish(),
            exit,
            diagnostics,
        };
        if output.completion() == Completion::Failed {
            warn!(
                "git {command} exited with {:?}: {}",
                output.exit.code,
                output.diagnostics.join(" | ")
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
