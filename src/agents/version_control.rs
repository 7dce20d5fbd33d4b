use crate::error::{Result, SweepError};
use crate::utils::path_validator::PathValidator;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Ahead/behind counts of a branch relative to its upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStatus {
    pub ahead: u32,
    pub behind: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched,
    NoRemote,
}

/// Finds the working tree a path belongs to.
pub trait VcsBackend {
    fn locate(&self, path: &Path) -> Result<Option<Box<dyn Repository>>>;
}

/// Operations on one working tree.
pub trait Repository {
    fn root(&self) -> &Path;
    fn branch(&self) -> Result<String>;
    fn is_clean(&self) -> Result<bool>;
    /// `None` when the current branch has no upstream.
    fn tracking_status(&self) -> Result<Option<TrackingStatus>>;
    fn fetch(&self) -> Result<FetchOutcome>;
    fn stage_all(&self) -> Result<()>;
    fn commit(&self, message: &str) -> Result<()>;
    /// Push the current branch and return the combined push output.
    fn push(&self, atomic: bool) -> Result<String>;
}

/// Git backend driving the `git` command line client.
#[derive(Debug, Default)]
pub struct GitCli;

impl VcsBackend for GitCli {
    fn locate(&self, path: &Path) -> Result<Option<Box<dyn Repository>>> {
        let path = validate_git_path(path)?;

        // rev-parse walks up the tree and honours GIT_DIR / GIT_WORK_TREE.
        let output = run_git(&path, &["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            debug!(
                "{} is not inside a Git working tree: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        let root = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        Ok(Some(Box::new(VersionControlAgent { root })))
    }
}

/// VersionControlAgent handles Git operations for one working tree.
pub struct VersionControlAgent {
    root: PathBuf,
}

impl VersionControlAgent {
    fn git(&self, args: &[&str]) -> Result<Output> {
        run_git(&self.root, args)
    }

    fn git_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args)?;
        ensure_success(&output, &format!("git {}", args.join(" ")))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Repository for VersionControlAgent {
    fn root(&self) -> &Path {
        &self.root
    }

    fn branch(&self) -> Result<String> {
        let output = self.git(&["symbolic-ref", "--short", "-q", "HEAD"])?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }
        // Detached HEAD: report the commit like `git status` does.
        self.git_checked(&["rev-parse", "--short", "HEAD"])
    }

    fn is_clean(&self) -> Result<bool> {
        let output = self.git(&["status", "--porcelain"])?;
        ensure_success(&output, "git status")?;
        Ok(output.stdout.is_empty())
    }

    fn tracking_status(&self) -> Result<Option<TrackingStatus>> {
        let upstream = self.git(&[
            "rev-parse",
            "--abbrev-ref",
            "--symbolic-full-name",
            "@{upstream}",
        ])?;
        if !upstream.status.success() {
            return Ok(None);
        }

        let counts =
            self.git_checked(&["rev-list", "--left-right", "--count", "HEAD...@{upstream}"])?;
        parse_ahead_behind(&counts).map(Some)
    }

    fn fetch(&self) -> Result<FetchOutcome> {
        let remotes = self
            .git_checked(&["remote"])
            .map_err(|e| SweepError::FetchFailed(e.to_string()))?;
        if remotes.is_empty() {
            return Ok(FetchOutcome::NoRemote);
        }

        let output = self.git(&["fetch"]).map_err(|e| SweepError::FetchFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(SweepError::FetchFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(FetchOutcome::Fetched)
    }

    fn stage_all(&self) -> Result<()> {
        self.git_checked(&["add", "-A"])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.git_checked(&["commit", "-m", message])?;
        Ok(())
    }

    fn push(&self, atomic: bool) -> Result<String> {
        let args: &[&str] = if atomic { &["push", "--atomic"] } else { &["push"] };
        let output = self.git(args)?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(SweepError::PushFailed {
                message: format!(
                    "exit code {}",
                    output.status.code().map_or("none".to_string(), |c| c.to_string())
                ),
                output: combined,
            });
        }
        Ok(combined)
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(|e| {
            SweepError::GitOperation(format!(
                "Failed to execute git command '{}': {e}",
                args.join(" ")
            ))
        })
}

fn ensure_success(output: &Output, command: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(SweepError::GitOperation(format!(
        "{} failed: {}",
        command,
        String::from_utf8_lossy(&output.stderr).trim()
    )))
}

fn validate_git_path(path: &Path) -> Result<PathBuf> {
    if !path.is_absolute() {
        return Err(SweepError::GitOperation(
            "Only absolute paths are allowed for Git operations".to_string(),
        ));
    }

    PathValidator::validate_directory(path)
        .map_err(|err| SweepError::GitOperation(format!("Invalid Git path: {}", err)))
}

fn parse_ahead_behind(counts: &str) -> Result<TrackingStatus> {
    let mut parts = counts.split_whitespace().map(str::parse::<u32>);
    match (parts.next(), parts.next()) {
        (Some(Ok(ahead)), Some(Ok(behind))) => Ok(TrackingStatus { ahead, behind }),
        _ => Err(SweepError::GitOperation(format!(
            "Unexpected 'git rev-list --count' output: '{counts}'"
        ))),
    }
}
