use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use synq_dbt_core::api::{GitContext, GitContextProvider};
use tokio::process::Command;

/// Reads branch, commit and origin URL by shelling out to `git`.
pub struct ShellGitContext {
    git: Option<PathBuf>,
    timeout: Duration,
}

impl ShellGitContext {
    pub fn new(timeout: Duration) -> Self {
        let git = which::which("git").ok();
        if git.is_none() {
            tracing::debug!("git not found on PATH, git context disabled");
        }
        Self { git, timeout }
    }

    async fn query(&self, git: &Path, dir: &Path, args: &[&str]) -> String {
        let mut cmd = Command::new(git);
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(out)) if out.status.success() => {
                String::from_utf8_lossy(&out.stdout).trim().to_string()
            }
            Ok(Ok(_)) => String::new(),
            Ok(Err(e)) => {
                tracing::debug!(?args, error = %e, "git query failed");
                String::new()
            }
            Err(_) => {
                tracing::debug!(?args, timeout = ?self.timeout, "git query timed out");
                String::new()
            }
        }
    }
}

#[async_trait]
impl GitContextProvider for ShellGitContext {
    fn name(&self) -> &str {
        "git"
    }

    async fn collect(&self, dir: &Path) -> Option<GitContext> {
        let git = self.git.as_deref()?;
        let (branch, commit_sha, clone_url) = tokio::join!(
            self.query(git, dir, &["rev-parse", "--abbrev-ref", "HEAD"]),
            self.query(git, dir, &["rev-parse", "HEAD"]),
            self.query(git, dir, &["remote", "get-url", "origin"]),
        );
        Some(GitContext {
            clone_url,
            branch,
            commit_sha,
        })
    }
}
