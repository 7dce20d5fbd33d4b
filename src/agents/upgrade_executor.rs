use crate::agents::project_metadata::ProjectMetadata;
use crate::agents::version_control::VcsBackend;
use crate::config::UpgradeConfig;
use crate::console::ProgressSink;
use crate::error::SweepError;
use crate::gradle::backend::{BuildBackend, WrapperLauncher};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// How an upgrade attempt ended. Every failure stops the remaining steps for
/// that project only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Success { notes: Vec<String> },
    BuildFailedBefore(String),
    WrapperUpgradeFailed(String),
    BuildFailedAfter(String),
    CommitPushFailed { message: String, output: String },
}

impl UpgradeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpgradeOutcome::Success { .. })
    }

    /// Human readable name of the failing step.
    pub fn step(&self) -> &'static str {
        match self {
            UpgradeOutcome::Success { .. } => "upgrade",
            UpgradeOutcome::BuildFailedBefore(_) => "pre-upgrade build",
            UpgradeOutcome::WrapperUpgradeFailed(_) => "wrapper upgrade",
            UpgradeOutcome::BuildFailedAfter(_) => "post-upgrade build",
            UpgradeOutcome::CommitPushFailed { .. } => "commit/push",
        }
    }
}

impl fmt::Display for UpgradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeOutcome::Success { .. } => write!(f, "upgrade successful"),
            UpgradeOutcome::BuildFailedBefore(msg)
            | UpgradeOutcome::WrapperUpgradeFailed(msg)
            | UpgradeOutcome::BuildFailedAfter(msg) => write!(f, "{} failed: {msg}", self.step()),
            UpgradeOutcome::CommitPushFailed { message, .. } => {
                write!(f, "{} failed: {message}", self.step())
            }
        }
    }
}

/// Forwards task progress with a fixed prefix.
struct PrefixedProgress<'a> {
    prefix: &'static str,
    sink: &'a dyn ProgressSink,
}

impl ProgressSink for PrefixedProgress<'_> {
    fn progress(&self, message: &str) {
        self.sink.progress(&format!("{}{}", self.prefix, message));
    }
}

/// Runs the verify, bump, verify, commit sequence for one project.
pub struct UpgradeExecutor<'a> {
    build: &'a dyn BuildBackend,
    vcs: &'a dyn VcsBackend,
    launcher: &'a dyn WrapperLauncher,
    progress: &'a dyn ProgressSink,
}

impl<'a> UpgradeExecutor<'a> {
    pub fn new(
        build: &'a dyn BuildBackend,
        vcs: &'a dyn VcsBackend,
        launcher: &'a dyn WrapperLauncher,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            build,
            vcs,
            launcher,
            progress,
        }
    }

    pub fn execute(&self, project: &ProjectMetadata, config: &UpgradeConfig) -> UpgradeOutcome {
        let dir = project.project_dir.as_path();
        let target = project.latest_version.as_str();
        let mut notes = Vec::new();

        self.progress.progress(">> Building before upgrading...");
        if let Err(e) = self.verify_build(dir, &config.check_tasks, ">> Pre-upgrade build: ") {
            return UpgradeOutcome::BuildFailedBefore(e.to_string());
        }
        notes.push("Pre-upgrade build successful".to_string());

        self.progress.progress(">> Upgrading the Gradle wrapper...");
        match self.launcher.upgrade(dir, target) {
            Ok(run) if run.succeeded() => {
                if run.exit_code != Some(0) {
                    debug!(
                        "wrapper exited with {:?} but reported a successful build",
                        run.exit_code
                    );
                }
            }
            Ok(run) => {
                return UpgradeOutcome::WrapperUpgradeFailed(format!(
                    "process returned non-zero value ({}). Output: {}",
                    run.exit_code.map_or("none".to_string(), |c| c.to_string()),
                    run.output
                ));
            }
            Err(e) => return UpgradeOutcome::WrapperUpgradeFailed(e.to_string()),
        }
        notes.push("Wrapper upgrade successful".to_string());

        // The Gradle version changed, so verify through a fresh connection.
        self.progress.progress(">> Building after upgrading...");
        if let Err(e) = self.verify_build(dir, &config.check_tasks, ">> Post-upgrade build: ") {
            return UpgradeOutcome::BuildFailedAfter(e.to_string());
        }
        notes.push("Post-upgrade build successful".to_string());

        if !project.is_under_version_control() {
            notes.push("Project not under version control".to_string());
            return UpgradeOutcome::Success { notes };
        }
        if !config.commit {
            notes.push("Committing disabled".to_string());
            return UpgradeOutcome::Success { notes };
        }

        match self.commit_and_push(project, config, &mut notes) {
            Ok(()) => {
                info!(
                    "upgraded {} from {} to {}",
                    dir.display(),
                    project.gradle_version,
                    target
                );
                UpgradeOutcome::Success { notes }
            }
            Err(SweepError::PushFailed { message, output }) => {
                UpgradeOutcome::CommitPushFailed { message, output }
            }
            Err(e) => UpgradeOutcome::CommitPushFailed {
                message: e.to_string(),
                output: String::new(),
            },
        }
    }

    fn verify_build(
        &self,
        dir: &Path,
        tasks: &[String],
        prefix: &'static str,
    ) -> crate::error::Result<()> {
        let connection = self.build.connect(dir)?;
        connection.run_tasks(
            tasks,
            &PrefixedProgress {
                prefix,
                sink: self.progress,
            },
        )
    }

    fn commit_and_push(
        &self,
        project: &ProjectMetadata,
        config: &UpgradeConfig,
        notes: &mut Vec<String>,
    ) -> crate::error::Result<()> {
        let repository = self.vcs.locate(&project.project_dir)?.ok_or_else(|| {
            SweepError::GitOperation(format!(
                "{} is no longer inside a Git working tree",
                project.project_dir.display()
            ))
        })?;

        self.progress.progress(">> Adding changes to Git index...");
        repository.stage_all()?;

        self.progress.progress(">> Committing...");
        repository.commit(&commit_message(&project.gradle_version, &project.latest_version))?;
        notes.push("Commit successful".to_string());

        if config.push {
            self.progress.progress(">> Pushing...");
            let output = repository.push(true)?;
            debug!("push output: {}", output.trim());
            notes.push("Push successful".to_string());
        }
        Ok(())
    }
}

pub fn commit_message(from: &str, to: &str) -> String {
    format!("build: upgrade Gradle from v{from} to v{to}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::project_analyzer::testing::{FakeBuild, FakeRepo, FakeVcs};
    use crate::agents::project_metadata::{RemoteSync, VcsStatus};
    use crate::console::Console;
    use crate::gradle::backend::WrapperRun;
    use std::cell::RefCell;
    use std::path::PathBuf;

    struct FakeLauncher {
        run: Option<WrapperRun>,
        build: FakeBuild,
        calls: RefCell<Vec<String>>,
    }

    impl WrapperLauncher for FakeLauncher {
        fn upgrade(&self, project_dir: &Path, version: &str) -> crate::error::Result<WrapperRun> {
            self.calls
                .borrow_mut()
                .push(format!("{} {version}", project_dir.display()));
            self.build.log.borrow_mut().push("wrapper".to_string());
            match &self.run {
                Some(run) => {
                    if run.succeeded() {
                        *self.build.version.borrow_mut() = version.to_string();
                    }
                    Ok(run.clone())
                }
                None => Err(SweepError::GradleExecution("Failed to spawn process".to_string())),
            }
        }
    }

    fn launcher(build: &FakeBuild, exit_code: i32, output: &str) -> FakeLauncher {
        FakeLauncher {
            run: Some(WrapperRun {
                exit_code: Some(exit_code),
                output: output.to_string(),
            }),
            build: build.clone(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn project(vcs: VcsStatus) -> ProjectMetadata {
        ProjectMetadata {
            project_dir: PathBuf::from("/work/app"),
            gradle_version: "8.5".to_string(),
            latest_version: "8.9".to_string(),
            up_to_date: false,
            same_major_as_latest: true,
            vcs,
        }
    }

    fn tracked() -> VcsStatus {
        VcsStatus::Tracked {
            branch: "main".to_string(),
            clean: true,
            remote: RemoteSync::Tracking { ahead: 0, behind: 0 },
        }
    }

    #[test]
    fn full_upgrade_commits_and_pushes() {
        let build = FakeBuild::reporting("8.5");
        let repo = FakeRepo::clean_in_sync(Path::new("/work/app"));
        let vcs = FakeVcs(Some(repo.clone()));
        let launcher = launcher(&build, 0, "BUILD SUCCESSFUL");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);

        let outcome = executor.execute(&project(tracked()), &UpgradeConfig::default());

        assert!(outcome.is_success(), "{outcome}");
        assert_eq!(
            *build.log.borrow(),
            vec![
                "connect",
                "build clean,build,assemble",
                "wrapper",
                "connect",
                "build clean,build,assemble",
            ]
        );
        assert_eq!(*launcher.calls.borrow(), vec!["/work/app 8.9".to_string()]);
        assert_eq!(
            *repo.log.borrow(),
            vec![
                "add".to_string(),
                "commit build: upgrade Gradle from v8.5 to v8.9".to_string(),
                "push atomic=true".to_string(),
            ]
        );
    }

    #[test]
    fn failing_pre_build_stops_everything() {
        let build = FakeBuild::reporting("8.5");
        build.fail_builds.borrow_mut().push(0);
        let vcs = FakeVcs(None);
        let launcher = launcher(&build, 0, "");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);

        let outcome = executor.execute(&project(VcsStatus::NotTracked), &UpgradeConfig::default());

        assert!(matches!(
            outcome,
            UpgradeOutcome::BuildFailedBefore(ref m) if m.contains("compilation failed")
        ));
        assert!(launcher.calls.borrow().is_empty());
    }

    #[test]
    fn wrapper_nonzero_exit_with_success_marker_is_accepted() {
        let build = FakeBuild::reporting("8.5");
        let vcs = FakeVcs(None);
        let launcher = launcher(&build, 1, "BUILD SUCCESSFUL in 2s");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);

        let outcome = executor.execute(&project(VcsStatus::NotTracked), &UpgradeConfig::default());
        assert_eq!(
            outcome,
            UpgradeOutcome::Success {
                notes: vec![
                    "Pre-upgrade build successful".to_string(),
                    "Wrapper upgrade successful".to_string(),
                    "Post-upgrade build successful".to_string(),
                    "Project not under version control".to_string(),
                ]
            }
        );
    }

    #[test]
    fn wrapper_failure_skips_post_build() {
        let build = FakeBuild::reporting("8.5");
        let vcs = FakeVcs(None);
        let launcher = launcher(&build, 1, "FAILURE: Build failed with an exception.");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);

        let outcome = executor.execute(&project(VcsStatus::NotTracked), &UpgradeConfig::default());
        assert!(matches!(
            outcome,
            UpgradeOutcome::WrapperUpgradeFailed(ref m) if m.contains("non-zero value (1)")
        ));
        assert_eq!(
            build.log.borrow().iter().filter(|l| *l == "connect").count(),
            1
        );
    }

    #[test]
    fn wrapper_spawn_error_is_reported() {
        let build = FakeBuild::reporting("8.5");
        let vcs = FakeVcs(None);
        let launcher = FakeLauncher {
            run: None,
            build: build.clone(),
            calls: RefCell::new(Vec::new()),
        };
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);

        let outcome = executor.execute(&project(VcsStatus::NotTracked), &UpgradeConfig::default());
        assert_eq!(outcome.step(), "wrapper upgrade");
    }

    #[test]
    fn failing_post_build_does_not_commit() {
        let build = FakeBuild::reporting("8.5");
        build.fail_builds.borrow_mut().push(1);
        let repo = FakeRepo::clean_in_sync(Path::new("/work/app"));
        let vcs = FakeVcs(Some(repo.clone()));
        let launcher = launcher(&build, 0, "");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);

        let outcome = executor.execute(&project(tracked()), &UpgradeConfig::default());
        assert!(matches!(outcome, UpgradeOutcome::BuildFailedAfter(_)));
        assert!(repo.log.borrow().is_empty());
    }

    #[test]
    fn commit_disabled_is_success_with_note() {
        let build = FakeBuild::reporting("8.5");
        let repo = FakeRepo::clean_in_sync(Path::new("/work/app"));
        let vcs = FakeVcs(Some(repo.clone()));
        let launcher = launcher(&build, 0, "");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);
        let config = UpgradeConfig {
            commit: false,
            push: false,
            ..UpgradeConfig::default()
        };

        match executor.execute(&project(tracked()), &config) {
            UpgradeOutcome::Success { notes } => {
                assert_eq!(notes.last().map(String::as_str), Some("Committing disabled"));
            }
            other => panic!("unexpected outcome: {other}"),
        }
        assert!(repo.log.borrow().is_empty());
    }

    #[test]
    fn push_disabled_still_commits() {
        let build = FakeBuild::reporting("8.5");
        let repo = FakeRepo::clean_in_sync(Path::new("/work/app"));
        let vcs = FakeVcs(Some(repo.clone()));
        let launcher = launcher(&build, 0, "");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);
        let config = UpgradeConfig {
            push: false,
            ..UpgradeConfig::default()
        };

        assert!(executor.execute(&project(tracked()), &config).is_success());
        assert_eq!(repo.log.borrow().len(), 2);
    }

    #[test]
    fn rejected_push_carries_output() {
        let build = FakeBuild::reporting("8.5");
        let mut repo = FakeRepo::clean_in_sync(Path::new("/work/app"));
        repo.fail_push = true;
        let vcs = FakeVcs(Some(repo));
        let launcher = launcher(&build, 0, "");
        let console = Console::hidden();
        let executor = UpgradeExecutor::new(&build, &vcs, &launcher, &console);

        let outcome = executor.execute(&project(tracked()), &UpgradeConfig::default());
        match outcome {
            UpgradeOutcome::CommitPushFailed { message, output } => {
                assert_eq!(message, "rejected");
                assert!(output.contains("[rejected]"));
            }
            other => panic!("unexpected outcome: {other}"),
        }
    }
}
