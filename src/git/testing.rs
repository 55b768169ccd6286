//! Scripted command runner replaying canned git output.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::GitError;
use super::runner::{CommandRunner, ExitInfo, Stream};

struct Reply {
    stdout: Vec<String>,
    stderr: Vec<String>,
    code: i32,
}

/// Answers commands by their space-joined argument list. Unknown commands
/// succeed with no output. Every issued command is recorded in order.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: HashMap<String, Reply>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, stdout: &[&str]) -> Self {
        self.replies.insert(
            command.to_string(),
            Reply {
                stdout: stdout.iter().map(|s| s.to_string()).collect(),
                stderr: Vec::new(),
                code: 0,
            },
        );
        self
    }

    pub fn fail(mut self, command: &str, stderr: &[&str], code: i32) -> Self {
        self.replies.insert(
            command.to_string(),
            Reply {
                stdout: Vec::new(),
                stderr: stderr.iter().map(|s| s.to_string()).collect(),
                code,
            },
        );
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        args: &[String],
        on_line: &mut (dyn for<'l> FnMut(&'l str, Stream) + Send),
    ) -> Result<ExitInfo, GitError> {
        let command = args.join(" ");
        self.calls.lock().unwrap().push(command.clone());

        let Some(reply) = self.replies.get(&command) else {
            return Ok(ExitInfo { code: Some(0) });
        };
        for line in &reply.stdout {
            on_line(line, Stream::Stdout);
        }
        for line in &reply.stderr {
            on_line(line, Stream::Stderr);
        }
        Ok(ExitInfo {
            code: Some(reply.code),
        })
    }
}

/// Whether the `git` binary can be executed; tests needing it skip otherwise.
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

pub fn create_test_repo() -> (tempfile::TempDir, git2::Repository) {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();

    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test").unwrap();
    config.set_str("user.email", "test@test.com").unwrap();

    (dir, repo)
}

/// Write `files` and commit them on HEAD as `name <email>` at `epoch`.
pub fn commit_as(
    repo: &git2::Repository,
    name: &str,
    email: &str,
    files: &[(&str, &str)],
    message: &str,
    epoch: i64,
) -> git2::Oid {
    let sig = git2::Signature::new(name, email, &git2::Time::new(epoch, 0)).unwrap();
    let mut index = repo.index().unwrap();

    for (path, content) in files {
        let full_path = repo.workdir().unwrap().join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();
        index.add_path(std::path::Path::new(path)).unwrap();
    }

    index.write().unwrap();
    let tree_oid = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}
