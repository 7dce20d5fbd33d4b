use crate::console::ProgressSink;
use crate::error::{Result, SweepError};
use crate::gradle::backend::{
    BuildBackend, BuildConnection, WrapperLauncher, WrapperRun, resolve_build_root, wrapper_script,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

const FAILURE_TAIL_LINES: usize = 40;

static VERSION_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Gradle\s+(\S+)\s*$").unwrap());

/// Build backend that drives each project through its own Gradle wrapper.
#[derive(Debug, Default)]
pub struct WrapperBackend;

impl BuildBackend for WrapperBackend {
    fn connect(&self, project_dir: &Path) -> Result<Box<dyn BuildConnection>> {
        Ok(Box::new(GradleExecutionAgent::new(project_dir)?))
    }
}

/// GradleExecutionAgent executes Gradle commands through the wrapper script
pub struct GradleExecutionAgent {
    gradlew_path: PathBuf,
    project_path: PathBuf,
}

impl GradleExecutionAgent {
    pub fn new(project_path: &Path) -> Result<Self> {
        let project_path = project_path.canonicalize().map_err(|e| {
            SweepError::ProjectValidation(format!("Invalid path '{}': {e}", project_path.display()))
        })?;
        let gradlew_path = wrapper_script(&project_path);
        if !gradlew_path.is_file() {
            return Err(SweepError::ProjectValidation(format!(
                "Gradle wrapper not found at {}",
                gradlew_path.display()
            )));
        }

        Ok(Self {
            gradlew_path,
            project_path,
        })
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.gradlew_path);
        command
            .current_dir(&self.project_path)
            .args(args)
            .arg("--console=plain")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Execute a Gradle command, streaming stdout lines to `on_line` and
    /// keeping the tail of the output for error reporting.
    fn execute_gradle_command(
        &self,
        args: &[&str],
        mut on_line: impl FnMut(&str),
    ) -> Result<String> {
        debug!(
            "executing {} {} in {}",
            self.gradlew_path.display(),
            args.join(" "),
            self.project_path.display()
        );

        let mut child = self
            .command(args)
            .spawn()
            .map_err(|e| SweepError::GradleExecution(format!("Failed to spawn process: {e}")))?;

        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buffer = String::new();
                let _ = stderr.read_to_string(&mut buffer);
                buffer
            })
        });

        let mut tail = VecDeque::with_capacity(FAILURE_TAIL_LINES);
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(std::io::Result::ok) {
                on_line(&line);
                if tail.len() == FAILURE_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child
            .wait()
            .map_err(|e| SweepError::GradleExecution(format!("Failed to wait for process: {e}")))?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        let stdout = tail.into_iter().collect::<Vec<_>>().join("\n");
        if !status.success() {
            return Err(SweepError::GradleExecution(format!(
                "'gradlew {}' exited with code {}\n{}\n{}",
                args.join(" "),
                status.code().unwrap_or(-1),
                stdout,
                stderr.trim_end()
            )));
        }

        Ok(stdout)
    }
}

impl BuildConnection for GradleExecutionAgent {
    fn gradle_version(&self) -> Result<String> {
        let output = self.execute_gradle_command(&["--version"], |_| {})?;
        parse_gradle_version(&output).ok_or_else(|| {
            SweepError::GradleExecution(format!(
                "Unable to read Gradle version from 'gradlew --version' output:\n{output}"
            ))
        })
    }

    fn canonical_root(&self) -> Result<PathBuf> {
        resolve_build_root(&self.project_path)
    }

    fn run_tasks(&self, tasks: &[String], progress: &dyn ProgressSink) -> Result<()> {
        let args: Vec<&str> = tasks.iter().map(String::as_str).collect();
        self.execute_gradle_command(&args, |line| {
            if line.starts_with("> Task ") {
                progress.progress(line);
            }
        })?;
        Ok(())
    }
}

/// Extract the version from the `Gradle x.y` banner of `gradlew --version`.
pub fn parse_gradle_version(output: &str) -> Option<String> {
    VERSION_BANNER
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Runs `<wrapper> wrapper --gradle-version <v>` as a plain child process.
#[derive(Debug, Default)]
pub struct SystemWrapperLauncher;

impl WrapperLauncher for SystemWrapperLauncher {
    fn upgrade(&self, project_dir: &Path, version: &str) -> Result<WrapperRun> {
        let script = wrapper_script(project_dir).canonicalize().map_err(|e| {
            SweepError::GradleExecution(format!(
                "Wrapper script missing in {}: {e}",
                project_dir.display()
            ))
        })?;

        debug!("running {} wrapper --gradle-version {version}", script.display());
        let output = Command::new(&script)
            .current_dir(project_dir)
            .args(["wrapper", "--gradle-version", version])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SweepError::GradleExecution(format!("Failed to spawn process: {e}")))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(WrapperRun {
            exit_code: output.status.code(),
            output: combined,
        })
    }
}
