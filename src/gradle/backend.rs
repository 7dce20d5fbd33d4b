use crate::console::ProgressSink;
use crate::error::Result;
use std::path::{Path, PathBuf};

pub const BUILD_MARKERS: &[&str] = &["build.gradle", "build.gradle.kts"];
const SETTINGS_FILES: &[&str] = &["settings.gradle", "settings.gradle.kts"];

/// Text Gradle prints when a build finishes without failure.
pub const BUILD_SUCCESS_MARKER: &str = "BUILD SUCCESSFUL";

/// Opens connections to a Gradle build.
pub trait BuildBackend {
    fn connect(&self, project_dir: &Path) -> Result<Box<dyn BuildConnection>>;
}

/// A live connection to one build. Dropping it releases the connection.
pub trait BuildConnection {
    /// Gradle version the build runs with.
    fn gradle_version(&self) -> Result<String>;

    /// Root directory of the build the project belongs to.
    fn canonical_root(&self) -> Result<PathBuf>;

    /// Run the given tasks, reporting task progress to `progress`.
    fn run_tasks(&self, tasks: &[String], progress: &dyn ProgressSink) -> Result<()>;
}

/// Result of invoking the wrapper task through the project's launcher script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperRun {
    pub exit_code: Option<i32>,
    pub output: String,
}

impl WrapperRun {
    /// A non-zero exit still counts when the nested build reports success.
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0) || self.output.contains(BUILD_SUCCESS_MARKER)
    }
}

/// Regenerates a project's wrapper at another Gradle version.
pub trait WrapperLauncher {
    fn upgrade(&self, project_dir: &Path, version: &str) -> Result<WrapperRun>;
}

/// Platform specific launcher script name.
pub fn wrapper_script_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "gradlew.bat"
    } else {
        "gradlew"
    }
}

pub fn wrapper_script(dir: &Path) -> PathBuf {
    dir.join(wrapper_script_name())
}

pub fn has_wrapper(dir: &Path) -> bool {
    wrapper_script(dir).is_file()
}

pub fn has_build_marker(dir: &Path) -> bool {
    BUILD_MARKERS.iter().any(|marker| dir.join(marker).is_file())
}

fn has_settings(dir: &Path) -> bool {
    SETTINGS_FILES.iter().any(|name| dir.join(name).is_file())
}

/// Resolve the root of the build containing `project_dir`.
///
/// A wrapper script marks a build root, so a directory with its own wrapper
/// or settings file is its own root. Otherwise the nearest ancestor holding
/// both a settings file and a wrapper wins, falling back to the directory.
pub fn resolve_build_root(project_dir: &Path) -> Result<PathBuf> {
    let canonical = project_dir.canonicalize()?;
    if has_wrapper(&canonical) || has_settings(&canonical) {
        return Ok(canonical);
    }

    let root = canonical
        .ancestors()
        .skip(1)
        .find(|dir| has_wrapper(dir) && has_settings(dir))
        .map(Path::to_path_buf)
        .unwrap_or_else(|| canonical.clone());

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn module_without_wrapper_resolves_to_enclosing_build() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("multi");
        let module = root.join("app");
        fs::create_dir_all(&module).unwrap();
        fs::write(root.join("settings.gradle.kts"), "").unwrap();
        fs::write(wrapper_script(&root), "").unwrap();
        fs::write(module.join("build.gradle.kts"), "").unwrap();

        let resolved = resolve_build_root(&module).unwrap();
        assert_eq!(resolved, root.canonicalize().unwrap());
    }

    #[test]
    fn sibling_wrapper_projects_keep_their_own_roots() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("settings.gradle"), "").unwrap();
        for name in ["a", "b"] {
            let project = dir.path().join(name);
            fs::create_dir_all(&project).unwrap();
            fs::write(project.join("build.gradle"), "").unwrap();
            fs::write(wrapper_script(&project), "").unwrap();

            let resolved = resolve_build_root(&project).unwrap();
            assert_eq!(resolved, project.canonicalize().unwrap());
            assert!(has_wrapper(&resolved));
        }
    }

    #[test]
    fn settings_without_wrapper_does_not_claim_module() {
        let dir = tempdir().unwrap();
        let module = dir.path().join("lib");
        fs::create_dir_all(&module).unwrap();
        fs::write(dir.path().join("settings.gradle"), "").unwrap();
        fs::write(module.join("build.gradle"), "").unwrap();

        let resolved = resolve_build_root(&module).unwrap();
        assert_eq!(resolved, module.canonicalize().unwrap());
    }

    #[test]
    fn build_root_defaults_to_project_dir() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("single");
        fs::create_dir_all(&project).unwrap();

        let resolved = resolve_build_root(&project).unwrap();
        assert_eq!(resolved, project.canonicalize().unwrap());
    }

    #[test]
    fn wrapper_success_accepts_nested_build_marker() {
        let ok = WrapperRun {
            exit_code: Some(0),
            output: String::new(),
        };
        let nested = WrapperRun {
            exit_code: Some(1),
            output: "> Task :wrapper\n\nBUILD SUCCESSFUL in 3s".to_string(),
        };
        let failed = WrapperRun {
            exit_code: Some(1),
            output: "FAILURE: Build failed with an exception.".to_string(),
        };
        let killed = WrapperRun {
            exit_code: None,
            output: String::new(),
        };

        assert!(ok.succeeded());
        assert!(nested.succeeded());
        assert!(!failed.succeeded());
        assert!(!killed.succeeded());
    }

    #[test]
    fn detects_groovy_and_kotlin_markers() {
        let dir = tempdir().unwrap();
        assert!(!has_build_marker(dir.path()));
        fs::write(dir.path().join("build.gradle.kts"), "").unwrap();
        assert!(has_build_marker(dir.path()));
    }
}
